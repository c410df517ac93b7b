use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use ndarray::Array1;
use tracing::{info, warn};

use crate::dataset::{Column, Dataset, Index, Value};
use crate::error::{PvError, Result};
use crate::io::Stage;
use crate::pipeline::PipelineContext;

/// Mean and sample standard deviation (n - 1) of the non-missing values.
/// The deviation of a single value is NaN; both are NaN for no values.
pub fn mean_std(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, f64::NAN);
    }
    let var_sum: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (var_sum / (n - 1) as f64).sqrt())
}

fn first_value(column: &Column, rows: &[usize]) -> Value {
    rows.iter()
        .map(|&r| column.value(r))
        .find(|v| !v.is_missing())
        .unwrap_or(Value::Missing)
}

/// How a carried column is reduced over a group.
#[derive(Clone, Copy)]
enum Reduce {
    First,
    Mean,
}

/// Reduce `groups` of rows into one row each: mean/std columns for every
/// `(source, mean, std)` metric and one column per carried `(name, reduce)`,
/// emitted in `layout` order.
fn aggregate(dataset: &Dataset, groups: &[Vec<usize>], layout: &[Slot]) -> Result<Vec<(String, Column)>> {
    let mut out = Vec::with_capacity(layout.len() + 3);
    for slot in layout {
        match *slot {
            Slot::Stats { source, mean, std } => {
                let values = dataset.float(source)?;
                let (means, stds): (Vec<f64>, Vec<f64>) = groups
                    .iter()
                    .map(|rows| mean_std(rows.iter().map(|&r| values[r])))
                    .unzip();
                out.push((mean.to_string(), Column::Float(Array1::from(means))));
                out.push((std.to_string(), Column::Float(Array1::from(stds))));
            }
            Slot::Carry { name, reduce } => {
                let column = dataset.column(name)?;
                let reduced = match reduce {
                    Reduce::First => Column::from_values(
                        groups.iter().map(|rows| first_value(column, rows)).collect(),
                    ),
                    Reduce::Mean => {
                        let values = dataset.float(name)?;
                        Column::Float(
                            groups
                                .iter()
                                .map(|rows| mean_std(rows.iter().map(|&r| values[r])).0)
                                .collect(),
                        )
                    }
                };
                out.push((name.to_string(), reduced));
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Copy)]
enum Slot {
    Stats {
        source: &'static str,
        mean: &'static str,
        std: &'static str,
    },
    Carry {
        name: &'static str,
        reduce: Reduce,
    },
}

const fn stats(source: &'static str, mean: &'static str, std: &'static str) -> Slot {
    Slot::Stats { source, mean, std }
}

const fn first(name: &'static str) -> Slot {
    Slot::Carry {
        name,
        reduce: Reduce::First,
    }
}

const fn mean(name: &'static str) -> Slot {
    Slot::Carry {
        name,
        reduce: Reduce::Mean,
    }
}

const EXPERIMENT_LAYOUT: [Slot; 9] = [
    first("timestamp"),
    stats("isc_fit", "isc", "disc"),
    stats("voc_fit", "voc", "dvoc"),
    stats("pmax_fit", "pmax", "dpmax"),
    first("name"),
    first("film_id"),
    first("t_room"),
    first("rh_room"),
    first("datetime"),
];

const GROUP_LAYOUT: [Slot; 9] = [
    first("timestamp"),
    stats("isc", "isc", "disc"),
    stats("voc", "voc", "dvoc"),
    stats("pmax", "pmax", "dpmax"),
    first("name"),
    first("film_id"),
    mean("t_room"),
    mean("rh_room"),
    first("datetime"),
];

fn layout_sources(layout: &[Slot]) -> Vec<&'static str> {
    layout
        .iter()
        .map(|slot| match *slot {
            Slot::Stats { source, .. } => source,
            Slot::Carry { name, .. } => name,
        })
        .collect()
}

/// One row per experiment: mean and deviation of the repeated readings,
/// first value of the descriptive columns. Rows are ordered by experiment
/// key.
pub fn average_experiments(dataset: &Dataset) -> Result<Dataset> {
    let keys = dataset.index().experiment_keys().ok_or_else(|| {
        PvError::Precondition(format!(
            "averaging by experiment needs an experiment index, found {}",
            dataset.index()
        ))
    })?;
    dataset.require(&layout_sources(&EXPERIMENT_LAYOUT))?;

    let mut by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (r, key) in keys.iter().enumerate() {
        by_key.entry(key.as_str()).or_default().push(r);
    }
    let labels: Vec<String> = by_key.keys().map(|k| k.to_string()).collect();
    let groups: Vec<Vec<usize>> = by_key.into_values().collect();

    let mut out = Dataset::new(Index::Experiment(labels));
    for (name, column) in aggregate(dataset, &groups, &EXPERIMENT_LAYOUT)? {
        out.insert(name, column)?;
    }
    Ok(out)
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        _ => a.key().cmp(&b.key()),
    }
}

/// Average rows that share a `column` value; rows whose value is unique
/// pass through unchanged. The result is sorted by `datetime` and
/// re-labelled `0..n`. Rows with a missing `column` value are discarded.
pub fn average_by_column(dataset: &Dataset, column: &str) -> Result<Dataset> {
    let mut required: Vec<&str> = layout_sources(&GROUP_LAYOUT);
    required.push(column);
    dataset.require(&required)?;

    let key_column = dataset.column(column)?;
    let mut members: HashMap<String, Vec<usize>> = HashMap::new();
    let mut first_seen: Vec<(String, Value)> = Vec::new();
    let mut discarded = 0usize;
    for r in 0..dataset.len() {
        let value = key_column.value(r);
        if value.is_missing() {
            discarded += 1;
            continue;
        }
        let key = value.key();
        let rows = members.entry(key.clone()).or_default();
        if rows.is_empty() {
            first_seen.push((key, value));
        }
        rows.push(r);
    }
    if discarded > 0 {
        warn!(column, discarded, "Discarded rows without a grouping value");
    }

    let mut unique_rows: Vec<usize> = Vec::new();
    let mut shared: Vec<(Value, Vec<usize>)> = Vec::new();
    for (key, value) in first_seen {
        let rows = members.remove(&key).unwrap_or_default();
        if rows.len() == 1 {
            unique_rows.extend(rows);
        } else {
            shared.push((value, rows));
        }
    }
    unique_rows.sort_unstable();
    shared.sort_by(|a, b| compare_keys(&a.0, &b.0));

    let mut unique = dataset.take(&unique_rows);
    unique.reset_index();

    let groups: Vec<Vec<usize>> = shared.iter().map(|(_, rows)| rows.clone()).collect();
    let mut averaged = Dataset::new(Index::range(groups.len()));
    for (name, col) in aggregate(dataset, &groups, &GROUP_LAYOUT)? {
        averaged.insert(name, col)?;
    }
    if !averaged.has_column(column) {
        averaged.insert(
            column,
            Column::from_values(shared.into_iter().map(|(value, _)| value).collect()),
        )?;
    }

    info!(
        column,
        unique = unique.len(),
        averaged_groups = averaged.len(),
        "Averaged by column"
    );

    let mut merged = Dataset::concat(&[unique, averaged])?.sort_by_datetime()?;
    merged.reset_index();
    Ok(merged)
}

/// Per-experiment averaging stage, cached as `IV_Summary_Average.xlsx`.
pub fn average_by_experiment(ctx: &mut PipelineContext, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::ExperimentAverage, overwrite, |ctx| {
        average_experiments(ctx.dataset()?)
    })
}

/// Per-film (or per-name) averaging stage, cached as
/// `IV_Summary_Average_by_Film.xlsx`.
pub fn average_by(ctx: &mut PipelineContext, column: &str, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::GroupAverage, overwrite, |ctx| {
        average_by_column(ctx.dataset()?, column)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sample_deviation_uses_n_minus_one() {
        let (m, s) = mean_std([1.0, 2.0, 3.0]);
        assert_relative_eq!(m, 2.0);
        assert_relative_eq!(s, 1.0);
    }

    #[test]
    fn single_value_has_no_deviation() {
        let (m, s) = mean_std([4.0, f64::NAN]);
        assert_relative_eq!(m, 4.0);
        assert!(s.is_nan());
    }
}
