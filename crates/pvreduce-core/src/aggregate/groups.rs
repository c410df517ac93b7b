use std::collections::HashMap;

use ndarray::Array1;

use crate::consts::{GROUP_ATTRIBUTES, GROUP_KEY_SEPARATOR};
use crate::dataset::{Column, Dataset};
use crate::error::Result;

/// Dense integer codes for `keys`, assigned in the order each distinct key
/// is first seen.
pub fn factorize<S: AsRef<str>>(keys: &[S]) -> Vec<i64> {
    let mut codes: HashMap<&str, i64> = HashMap::new();
    keys.iter()
        .map(|key| {
            let next = codes.len() as i64;
            *codes.entry(key.as_ref()).or_insert(next)
        })
        .collect()
}

/// Composite film-composition key of every row.
pub fn composite_keys(dataset: &Dataset) -> Result<Vec<String>> {
    dataset.require(&GROUP_ATTRIBUTES)?;
    let columns = GROUP_ATTRIBUTES
        .iter()
        .map(|name| dataset.column(name))
        .collect::<Result<Vec<_>>>()?;
    let separator = GROUP_KEY_SEPARATOR.to_string();
    Ok((0..dataset.len())
        .map(|r| {
            columns
                .iter()
                .map(|c| c.value(r).key())
                .collect::<Vec<_>>()
                .join(&separator)
        })
        .collect())
}

/// Derive the `group` column from the film-composition attributes.
pub fn assign_group_codes(dataset: &mut Dataset) -> Result<()> {
    let keys = composite_keys(dataset)?;
    let codes: Array1<f64> = factorize(&keys).into_iter().map(|c| c as f64).collect();
    dataset.insert("group", Column::Float(codes))
}
