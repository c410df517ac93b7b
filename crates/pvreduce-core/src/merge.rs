use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use tracing::{debug, info};

use crate::aggregate::groups::{assign_group_codes, factorize};
use crate::consts::{FILM_ID_COLUMN, FILM_REDUNDANT_COLUMNS, PROCESSED_FILE_NAME};
use crate::dataset::{Column, Dataset, Index, Value};
use crate::error::Result;
use crate::ingest::load_film_database;
use crate::io::{read_dataset, write_dataset, Stage};
use crate::pipeline::PipelineContext;

/// Left join of `dataset.film_id` against `films."Film ID"`.
///
/// Keys are compared by their rendered text, so a numeric id `7` matches a
/// text id `"7"`. A row with several matching films is repeated once per
/// match; a row with none gets missing film columns. Column names present
/// on both sides get `_x` (left) and `_y` (right) suffixes.
pub fn join_films(dataset: &Dataset, films: &Dataset) -> Result<Dataset> {
    dataset.require(&["film_id"])?;
    films.require(&[FILM_ID_COLUMN])?;

    let film_keys = films.column(FILM_ID_COLUMN)?;
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for r in 0..films.len() {
        let key = film_keys.value(r);
        if !key.is_missing() {
            by_key.entry(key.key()).or_default().push(r);
        }
    }

    let left_keys = dataset.column("film_id")?;
    let mut pairs: Vec<(usize, Option<usize>)> = Vec::with_capacity(dataset.len());
    let mut unmatched = 0usize;
    for r in 0..dataset.len() {
        let key = left_keys.value(r);
        match by_key.get(&key.key()).filter(|_| !key.is_missing()) {
            Some(matches) => pairs.extend(matches.iter().map(|&f| (r, Some(f)))),
            None => {
                unmatched += 1;
                pairs.push((r, None));
            }
        }
    }
    if unmatched > 0 {
        debug!(unmatched, "Rows without a film database entry");
    }

    let left_rows: Vec<usize> = pairs.iter().map(|&(r, _)| r).collect();
    let left = dataset.take(&left_rows);
    let mut out = Dataset::new(Index::range(pairs.len()));
    for (name, column) in left.columns() {
        let name = if films.has_column(name) && name != "film_id" {
            format!("{name}_x")
        } else {
            name.to_string()
        };
        out.insert(name, column.clone())?;
    }
    for (name, column) in films.columns() {
        let name = if dataset.has_column(name) && name != FILM_ID_COLUMN {
            format!("{name}_y")
        } else {
            name.to_string()
        };
        let values = pairs
            .iter()
            .map(|&(_, f)| f.map_or(Value::Missing, |f| column.value(f)))
            .collect();
        out.insert(name, Column::from_values(values))?;
    }
    Ok(out)
}

/// Join the film database, drop its bookkeeping columns and derive `group`.
pub fn films_merged(dataset: &Dataset, films: &Dataset) -> Result<Dataset> {
    let mut merged = join_films(dataset, films)?;
    for name in FILM_REDUNDANT_COLUMNS {
        merged.drop_column(name);
    }
    assign_group_codes(&mut merged)?;
    merged.reset_index();
    info!(rows = merged.len(), films = films.len(), "Merged film database");
    Ok(merged)
}

/// Film-database merge stage, cached as `Processed_IV.xlsx`.
pub fn merge_film_database(ctx: &mut PipelineContext, film_db: &Path, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::FilmMerged, overwrite, |ctx| {
        let films = load_film_database(film_db)?;
        films_merged(ctx.dataset()?, &films)
    })
}

fn tag_groups(dataset: &Dataset, tag: usize) -> Result<Vec<String>> {
    let codes = dataset.column("group")?;
    Ok((0..dataset.len())
        .map(|r| format!("{}-{tag}", codes.value(r).key()))
        .collect())
}

/// First `Processed_IV.xlsx`, `Processed_IV(1).xlsx`, ... not yet taken in
/// `dir`.
pub fn free_output_path(dir: &Path) -> PathBuf {
    let candidate = dir.join(PROCESSED_FILE_NAME);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = PROCESSED_FILE_NAME
        .rsplit_once('.')
        .unwrap_or((PROCESSED_FILE_NAME, "xlsx"));
    (1..)
        .map(|n| dir.join(format!("{stem}({n}).{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Combine two processed datasets. Groups of each side stay distinct and
/// are renumbered in order of first appearance after sorting by `datetime`.
pub fn combine_processed(first: Dataset, second: Dataset) -> Result<Dataset> {
    let mut parts = [first, second];
    for (i, part) in parts.iter_mut().enumerate() {
        let tagged = tag_groups(part, i + 1)?;
        part.reset_index();
        part.insert("group", Column::Text(tagged.into_iter().map(Some).collect()))?;
    }

    let mut merged = Dataset::concat(&parts)?.sort_by_datetime()?;
    let keys: Vec<String> = match merged.column("group")? {
        Column::Text(values) => values.iter().map(|v| v.clone().unwrap_or_default()).collect(),
        other => (0..other.len()).map(|r| other.value(r).key()).collect(),
    };
    let codes: Array1<f64> = factorize(&keys).into_iter().map(|c| c as f64).collect();
    merged.insert("group", Column::Float(codes))?;
    merged.reset_index();
    Ok(merged)
}

/// Merge two processed files into a new processed file in `output_dir`,
/// never overwriting an existing one. Returns the written path.
pub fn merge_processed_files(first: &Path, second: &Path, output_dir: &Path) -> Result<PathBuf> {
    let merged = combine_processed(read_dataset(first)?, read_dataset(second)?)?;
    std::fs::create_dir_all(output_dir)?;
    let path = free_output_path(output_dir);
    write_dataset(&merged, &path)?;
    info!(
        first = %first.display(),
        second = %second.display(),
        output = %path.display(),
        rows = merged.len(),
        "Merged processed files"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn numeric_film_ids_match_text_ids() {
        let mut data = Dataset::new(Index::range(2));
        data.insert("film_id", Column::Float(array![7.0, 9.0])).unwrap();
        let mut films = Dataset::new(Index::range(1));
        films
            .insert(FILM_ID_COLUMN, Column::Text(vec![Some("7".into())]))
            .unwrap();
        films
            .insert("Matrix", Column::Text(vec![Some("PMMA".into())]))
            .unwrap();

        let joined = join_films(&data, &films).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.value(0, "Matrix").unwrap(), Value::Text("PMMA".into()));
        assert!(joined.value(1, "Matrix").unwrap().is_missing());
    }

    #[test]
    fn shared_column_names_get_suffixes() {
        let mut data = Dataset::new(Index::range(1));
        data.insert("film_id", Column::Float(array![1.0])).unwrap();
        data.insert("name", Column::Text(vec![Some("a".into())])).unwrap();
        let mut films = Dataset::new(Index::range(1));
        films.insert(FILM_ID_COLUMN, Column::Float(array![1.0])).unwrap();
        films.insert("name", Column::Text(vec![Some("b".into())])).unwrap();

        let joined = join_films(&data, &films).unwrap();
        assert!(joined.has_column("name_x"));
        assert!(joined.has_column("name_y"));
        assert!(!joined.has_column("name"));
    }

    #[test]
    fn free_path_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(free_output_path(dir.path()), dir.path().join("Processed_IV.xlsx"));
        std::fs::write(dir.path().join("Processed_IV.xlsx"), b"").unwrap();
        std::fs::write(dir.path().join("Processed_IV(1).xlsx"), b"").unwrap();
        assert_eq!(free_output_path(dir.path()), dir.path().join("Processed_IV(2).xlsx"));
    }
}
