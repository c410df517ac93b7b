use ndarray::Array1;
use tracing::info;

use crate::dataset::Dataset;
use crate::error::{PvError, Result};
use crate::pipeline::{FitKind, FitParameters, PipelineContext};

use super::regression::weighted_least_squares;
use super::{FitReport, MetricFit};

/// Efficiency metrics fitted against the structural x-axis.
pub const REFERENCE_METRICS: [&str; 2] = ["isc_eff", "pmax_eff"];

/// Row positions whose integer `group` code is one of `groups`.
pub fn group_rows(dataset: &Dataset, groups: &[i64]) -> Result<Vec<usize>> {
    let codes = dataset.float("group")?;
    Ok((0..dataset.len())
        .filter(|&r| !codes[r].is_nan() && groups.contains(&(codes[r] as i64)))
        .collect())
}

/// Weighted baseline fit of the reference groups' efficiencies against
/// `x_axis`. Each point is weighted by the inverse of its uncertainty;
/// points without a finite value or a positive uncertainty are left out of
/// the fit but still get a prediction.
pub fn fit_reference(
    dataset: &Dataset,
    groups: &[i64],
    x_axis: &str,
) -> Result<(FitReport, FitParameters)> {
    dataset.require(&[x_axis, "group", "isc_eff", "disc_eff", "pmax_eff", "dpmax_eff"])?;

    let xs = dataset.float(x_axis)?;
    let mut rows = group_rows(dataset, groups)?;
    if rows.is_empty() {
        return Err(PvError::EmptySelection(format!("no rows in groups {groups:?}")));
    }
    rows.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
    let x: Array1<f64> = rows.iter().map(|&r| xs[r]).collect();

    let mut fits = Vec::with_capacity(REFERENCE_METRICS.len());
    let mut reported = Vec::with_capacity(REFERENCE_METRICS.len());
    for metric in REFERENCE_METRICS {
        let ys = dataset.float(metric)?;
        let errs = dataset.float(&format!("d{metric}"))?;
        let usable: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&r| xs[r].is_finite() && ys[r].is_finite() && errs[r].is_finite() && errs[r] > 0.0)
            .collect();
        if usable.is_empty() {
            return Err(PvError::EmptySelection(format!(
                "no usable {metric} points in groups {groups:?}"
            )));
        }

        let fx: Array1<f64> = usable.iter().map(|&r| xs[r]).collect();
        let fy: Array1<f64> = usable.iter().map(|&r| ys[r]).collect();
        let fw: Array1<f64> = usable.iter().map(|&r| 1.0 / errs[r]).collect();
        let fit = weighted_least_squares(&fx, &fy, &fw)?;
        info!(metric, x_axis, slope = fit.slope, intercept = fit.intercept, "Reference fit");

        fits.push((metric.to_string(), fit));
        reported.push(MetricFit {
            metric: metric.to_string(),
            fit,
            observed: rows.iter().map(|&r| ys[r]).collect(),
            predicted: fit.predict_all(&x),
        });
    }

    let params = FitParameters {
        kind: FitKind::Reference {
            x_axis: x_axis.to_string(),
        },
        fits,
    };
    let report = FitReport {
        x_axis: x_axis.to_string(),
        x,
        metrics: reported,
    };
    Ok((report, params))
}

/// Fit the baseline curve of the reference groups and make it the active
/// fit parameters.
pub fn reference_fit(ctx: &mut PipelineContext, groups: &[i64], x_axis: &str) -> Result<FitReport> {
    let (report, params) = fit_reference(ctx.dataset()?, groups, x_axis)?;
    ctx.set_fit(params);
    Ok(report)
}
