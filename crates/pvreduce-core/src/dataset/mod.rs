pub mod column;

use std::fmt::Write as _;

use indexmap::IndexMap;
use ndarray::Array1;

use crate::error::{PvError, Result};

pub use column::{Column, Value};

/// Row labels of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum Index {
    /// Composite (experiment key, reading number) labels of raw readings.
    Reading {
        experiments: Vec<String>,
        readings: Vec<i64>,
    },
    /// One label per experiment, after per-experiment averaging.
    Experiment(Vec<String>),
    /// Plain integer labels.
    Rows(Vec<i64>),
}

impl Index {
    /// Dense `0..len` row labels.
    pub fn range(len: usize) -> Self {
        Self::Rows((0..len as i64).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Reading { experiments, .. } => experiments.len(),
            Self::Experiment(keys) => keys.len(),
            Self::Rows(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Experiment key of every row, if the index carries one.
    pub fn experiment_keys(&self) -> Option<&[String]> {
        match self {
            Self::Reading { experiments, .. } => Some(experiments),
            Self::Experiment(keys) => Some(keys),
            Self::Rows(_) => None,
        }
    }

    pub fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Reading {
                experiments,
                readings,
            } => Self::Reading {
                experiments: rows.iter().map(|&r| experiments[r].clone()).collect(),
                readings: rows.iter().map(|&r| readings[r]).collect(),
            },
            Self::Experiment(keys) => Self::Experiment(rows.iter().map(|&r| keys[r].clone()).collect()),
            Self::Rows(labels) => Self::Rows(rows.iter().map(|&r| labels[r]).collect()),
        }
    }

    fn concat(&self, other: &Index) -> Result<Self> {
        match (self, other) {
            (
                Self::Reading {
                    experiments: ea,
                    readings: ra,
                },
                Self::Reading {
                    experiments: eb,
                    readings: rb,
                },
            ) => Ok(Self::Reading {
                experiments: ea.iter().chain(eb).cloned().collect(),
                readings: ra.iter().chain(rb).copied().collect(),
            }),
            (Self::Experiment(a), Self::Experiment(b)) => {
                Ok(Self::Experiment(a.iter().chain(b).cloned().collect()))
            }
            (Self::Rows(a), Self::Rows(b)) => Ok(Self::Rows(a.iter().chain(b).copied().collect())),
            _ => Err(PvError::Precondition(format!(
                "cannot concatenate {} index with {} index",
                self, other
            ))),
        }
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading { .. } => write!(f, "experiment/reading"),
            Self::Experiment(_) => write!(f, "experiment"),
            Self::Rows(_) => write!(f, "row"),
        }
    }
}

/// The tabular dataset every pipeline stage reads and replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    index: Index,
    columns: IndexMap<String, Column>,
}

impl Dataset {
    /// A dataset with the given row labels and no columns yet.
    pub fn new(index: Index) -> Self {
        Self {
            index,
            columns: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns.get(name).ok_or_else(|| PvError::missing(name))
    }

    pub fn float(&self, name: &str) -> Result<&Array1<f64>> {
        match self.column(name)? {
            Column::Float(values) => Ok(values),
            _ => Err(PvError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    pub fn float_mut(&mut self, name: &str) -> Result<&mut Array1<f64>> {
        match self.columns.get_mut(name) {
            Some(Column::Float(values)) => Ok(values),
            Some(_) => Err(PvError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
            None => Err(PvError::missing(name)),
        }
    }

    /// Fail with `MissingColumn` on the first absent name.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n)) {
            Some(name) => Err(PvError::missing(*name)),
            None => Ok(()),
        }
    }

    /// Insert or replace a column. A replaced column keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.len() {
            return Err(PvError::LengthMismatch {
                column: name,
                expected: self.len(),
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Remove a column, keeping the order of the others.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        self.columns.shift_remove(name)
    }

    pub fn value(&self, row: usize, name: &str) -> Result<Value> {
        Ok(self.column(name)?.value(row))
    }

    /// Row positions whose `name` value renders as `key`.
    pub fn rows_matching(&self, name: &str, key: &str) -> Result<Vec<usize>> {
        let column = self.column(name)?;
        Ok((0..self.len())
            .filter(|&r| {
                let v = column.value(r);
                !v.is_missing() && v.key() == key
            })
            .collect())
    }

    /// Gather rows by position, index included.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            index: self.index.take(rows),
            columns: self
                .columns
                .iter()
                .map(|(k, c)| (k.clone(), c.take(rows)))
                .collect(),
        }
    }

    /// Keep rows whose mask entry is true.
    pub fn filter(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(r, &k)| k.then_some(r))
            .collect();
        self.take(&rows)
    }

    /// Stack datasets vertically. Columns are the union in first-seen order;
    /// cells a part does not have are missing.
    pub fn concat(parts: &[Dataset]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(PvError::EmptySelection("no datasets to concatenate".into()));
        };

        let mut names: Vec<&str> = Vec::new();
        for part in parts {
            for name in part.column_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut index = first.index.clone();
        for part in &parts[1..] {
            index = index.concat(&part.index)?;
        }

        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let mut merged: Option<Column> = None;
            for part in parts {
                let piece = match part.columns.get(name) {
                    Some(c) => c.clone(),
                    None => Column::missing(part.len()),
                };
                merged = Some(match merged {
                    None => piece,
                    Some(acc) => concat_missing_aware(&acc, &piece),
                });
            }
            if let Some(column) = merged {
                columns.insert(name.to_string(), column);
            }
        }

        Ok(Self { index, columns })
    }

    /// Stable row order by the `datetime` column, missing values last.
    pub fn sort_by_datetime(&self) -> Result<Self> {
        let times = match self.column("datetime")? {
            Column::DateTime(values) => values,
            Column::Float(values) if values.iter().all(|v| v.is_nan()) => {
                return Ok(self.clone());
            }
            _ => {
                return Err(PvError::ColumnType {
                    column: "datetime".into(),
                    expected: "datetime",
                })
            }
        };
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| match (times[a], times[b]) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(self.take(&order))
    }

    /// Replace the row labels with `0..len`.
    pub fn reset_index(&mut self) {
        self.index = Index::range(self.len());
    }

    /// Human-readable summary: row count, index kind, per-column kind and
    /// non-missing count.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} rows, {} index", self.len(), self.index);
        let _ = writeln!(out, "{} columns:", self.columns.len());
        let width = self.columns.keys().map(String::len).max().unwrap_or(0);
        for (i, (name, column)) in self.columns.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3}  {:<width$}  {:>6} non-missing  {}",
                i,
                name,
                column.non_missing(),
                column.kind(),
                width = width
            );
        }
        out
    }
}

/// Concatenate two columns where an all-missing filler column must not force
/// the real one to text.
fn concat_missing_aware(a: &Column, b: &Column) -> Column {
    let all_missing = |c: &Column| c.non_missing() == 0;
    match (a, b) {
        (Column::Float(_), other) if all_missing(a) && !matches!(other, Column::Float(_)) => {
            Column::from_values(
                (0..a.len())
                    .map(|_| Value::Missing)
                    .chain((0..b.len()).map(|r| b.value(r)))
                    .collect(),
            )
        }
        (other, Column::Float(_)) if all_missing(b) && !matches!(other, Column::Float(_)) => {
            Column::from_values(
                (0..a.len())
                    .map(|r| a.value(r))
                    .chain((0..b.len()).map(|_| Value::Missing))
                    .collect(),
            )
        }
        _ => a.concat(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn rows(values: Array1<f64>) -> Dataset {
        let mut ds = Dataset::new(Index::range(values.len()));
        ds.insert("x", Column::Float(values)).unwrap();
        ds
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let mut ds = rows(array![1.0, 2.0]);
        let err = ds.insert("y", Column::Float(array![1.0])).unwrap_err();
        assert!(matches!(err, PvError::LengthMismatch { .. }));
    }

    #[test]
    fn concat_fills_absent_columns() {
        let a = rows(array![1.0]);
        let mut b = rows(array![2.0]);
        b.insert("name", Column::Text(vec![Some("film".into())]))
            .unwrap();
        let merged = Dataset::concat(&[a, b]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.column("name").unwrap(),
            &Column::Text(vec![None, Some("film".into())])
        );
    }

    #[test]
    fn drop_column_keeps_order() {
        let mut ds = rows(array![1.0]);
        ds.insert("y", Column::Float(array![2.0])).unwrap();
        ds.insert("z", Column::Float(array![3.0])).unwrap();
        ds.drop_column("y");
        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["x", "z"]);
    }
}
