use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::consts::SUMMARY_ATTRIBUTES;
use crate::dataset::{Column, Dataset, Value};
use crate::error::Result;

/// One line of the group overview table.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub group: i64,
    pub rows: usize,
    /// Most common value of each summary attribute, in attribute order.
    pub attributes: Vec<(String, String)>,
    pub manufactured: Option<NaiveDate>,
    pub measured: Option<NaiveDate>,
}

/// Most common rendering among `rows`; missing counts as `None`, ties go to
/// the smallest text.
fn mode(column: &Column, rows: &[usize]) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for &r in rows {
        let value = column.value(r);
        let text = if value.is_missing() {
            "None".to_string()
        } else {
            value.key()
        };
        *counts.entry(text).or_default() += 1;
    }
    let best = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .find(|(_, n)| *n == best)
        .map(|(text, _)| text)
        .unwrap_or_else(|| "None".to_string())
}

fn first_date(dataset: &Dataset, name: &str, rows: &[usize]) -> Option<NaiveDate> {
    let column = dataset.column(name).ok()?;
    rows.iter().find_map(|&r| match column.value(r) {
        Value::DateTime(dt) => Some(dt.date()),
        Value::Text(text) => NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok(),
        _ => None,
    })
}

/// Summarize each group code `0, 1, 2, ...` for as long as the code is
/// present in `dataset`.
///
/// Attributes the dataset does not carry are reported as `None`.
pub fn group_summary(dataset: &Dataset) -> Result<Vec<GroupSummary>> {
    let codes = dataset.float("group")?;
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (r, &code) in codes.iter().enumerate() {
        if !code.is_nan() {
            members.entry(code as i64).or_default().push(r);
        }
    }

    let mut summaries = Vec::new();
    for group in 0.. {
        let Some(rows) = members.get(&group) else {
            break;
        };
        let attributes = SUMMARY_ATTRIBUTES
            .iter()
            .map(|&name| {
                let value = match dataset.column(name) {
                    Ok(column) => mode(column, rows),
                    Err(_) => "None".to_string(),
                };
                (name.to_string(), value)
            })
            .collect();
        summaries.push(GroupSummary {
            group,
            rows: rows.len(),
            attributes,
            manufactured: first_date(dataset, "Manufactured", rows),
            measured: first_date(dataset, "datetime", rows),
        });
    }
    Ok(summaries)
}
