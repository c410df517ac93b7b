use tracing::info;

use crate::dataset::Dataset;
use crate::error::{PvError, Result};
use crate::pipeline::PipelineContext;

/// Parse a comma-separated list of integer ids such as `"1, 4,7"`.
///
/// Blank input yields an empty list. Any token that is not an integer is an
/// error; nothing is skipped or coerced.
pub fn parse_id_list(text: &str) -> Result<Vec<i64>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| PvError::InvalidIdList(format!("{token:?} in {text:?}")))
        })
        .collect()
}

fn experiment_keys(dataset: &Dataset) -> Result<&[String]> {
    dataset.index().experiment_keys().ok_or_else(|| {
        PvError::Precondition(format!(
            "filtering by experiment needs an experiment index, found {}",
            dataset.index()
        ))
    })
}

/// Numeric value of the last three characters of an experiment key.
pub fn experiment_number(key: &str) -> Result<i64> {
    let suffix: String = {
        let chars: Vec<char> = key.chars().collect();
        chars[chars.len().saturating_sub(3)..].iter().collect()
    };
    suffix
        .parse()
        .map_err(|_| PvError::InvalidExperimentKey(key.to_string()))
}

/// Rows whose experiment key does not end with the 3-digit form of any id.
pub fn without_experiments(dataset: &Dataset, ids: &[i64]) -> Result<Dataset> {
    let suffixes: Vec<String> = ids.iter().map(|id| format!("{id:03}")).collect();
    let keep: Vec<bool> = experiment_keys(dataset)?
        .iter()
        .map(|key| !suffixes.iter().any(|s| key.ends_with(s.as_str())))
        .collect();
    Ok(dataset.filter(&keep))
}

/// Rows whose experiment number lies in `[min, max]`.
pub fn experiment_range(dataset: &Dataset, min: i64, max: i64) -> Result<Dataset> {
    let keep = experiment_keys(dataset)?
        .iter()
        .map(|key| experiment_number(key).map(|n| (min..=max).contains(&n)))
        .collect::<Result<Vec<bool>>>()?;
    Ok(dataset.filter(&keep))
}

/// Remove the given experiments from the active dataset. Not reversible
/// without reloading.
pub fn drop_experiments(ctx: &mut PipelineContext, ids: &[i64]) -> Result<()> {
    let before = ctx.dataset()?.len();
    let kept = without_experiments(ctx.dataset()?, ids)?;
    info!(?ids, dropped = before - kept.len(), "Excluded experiments");
    ctx.replace_dataset(kept);
    Ok(())
}

/// Keep only experiments numbered `min..=max` in the active dataset.
pub fn select_experiment_range(ctx: &mut PipelineContext, min: i64, max: i64) -> Result<()> {
    let before = ctx.dataset()?.len();
    let kept = experiment_range(ctx.dataset()?, min, max)?;
    info!(min, max, dropped = before - kept.len(), "Selected experiment range");
    ctx.replace_dataset(kept);
    Ok(())
}
