use std::path::Path;

use chrono::{Local, NaiveDateTime, TimeZone};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::{INSTRUMENT_COLUMNS, REQUIRED_SOURCE_COLUMNS, SUMMARY_FILE_NAME};
use crate::dataset::{Column, Dataset, Index};
use crate::error::{PvError, Result};
use crate::io::{read_dataset, read_table, Stage};
use crate::pipeline::PipelineContext;

/// Experiment key of a summary file: the first whitespace-delimited token of
/// its parent directory name.
pub fn experiment_key(summary: &Path) -> String {
    summary
        .parent()
        .and_then(Path::file_name)
        .map(|name| {
            name.to_string_lossy()
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default()
}

/// Convert Unix epoch seconds to local wall-clock time.
pub fn local_datetime(timestamp: f64) -> Option<NaiveDateTime> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    let nanos = (((timestamp - secs) * 1e9).round() as u32).min(999_999_999);
    Local
        .timestamp_opt(secs as i64, nanos)
        .earliest()
        .map(|dt| dt.naive_local())
}

fn read_summary(path: &Path) -> Result<Dataset> {
    let table = read_table(path)?;
    table.require(&REQUIRED_SOURCE_COLUMNS)?;
    let key = experiment_key(path);
    let mut tagged = Dataset::new(Index::Reading {
        experiments: vec![key; table.len()],
        readings: (0..table.len() as i64).collect(),
    });
    for (name, column) in table.columns() {
        tagged.insert(name, column.clone())?;
    }
    debug!(path = %path.display(), rows = tagged.len(), "Read experiment summary");
    Ok(tagged)
}

/// Walk `root` for per-experiment summary sheets and build the raw dataset.
///
/// Files are visited in file-name order so the result is deterministic.
pub fn collect_experiments(root: &Path) -> Result<Dataset> {
    let mut parts = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name() == SUMMARY_FILE_NAME {
            parts.push(read_summary(entry.path())?);
        }
    }
    if parts.is_empty() {
        return Err(PvError::EmptySelection(format!(
            "no {} found under {}",
            SUMMARY_FILE_NAME,
            root.display()
        )));
    }

    let mut dataset = Dataset::concat(&parts)?;
    for name in INSTRUMENT_COLUMNS {
        if dataset.drop_column(name).is_some() {
            debug!(column = name, "Dropped instrument column");
        }
    }

    let datetimes = dataset
        .float("timestamp")?
        .iter()
        .map(|&ts| local_datetime(ts))
        .collect();
    dataset.insert("datetime", Column::DateTime(datetimes))?;

    info!(
        experiments = parts.len(),
        rows = dataset.len(),
        "Collected experiment summaries"
    );
    Ok(dataset)
}

/// Ingestion stage: load the cached raw summary, or rebuild it from `root`.
pub fn load_experiments(ctx: &mut PipelineContext, root: &Path, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::Raw, overwrite, |_| collect_experiments(root))
}

/// Make a previously processed spreadsheet the active dataset.
pub fn load_processed(ctx: &mut PipelineContext, path: &Path) -> Result<()> {
    let dataset = read_dataset(path)?;
    info!(path = %path.display(), rows = dataset.len(), "Loaded processed file");
    ctx.replace_dataset(dataset);
    Ok(())
}

/// Read the film-property lookup table.
pub fn load_film_database(path: &Path) -> Result<Dataset> {
    let films = read_table(path)?;
    debug!(path = %path.display(), films = films.len(), "Read film database");
    Ok(films)
}
