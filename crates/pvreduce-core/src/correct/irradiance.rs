use ndarray::{Array1, Zip};
use tracing::{debug, info};

use crate::consts::RAW_METRICS;
use crate::dataset::Dataset;
use crate::error::{PvError, Result};
use crate::io::Stage;
use crate::pipeline::{FitKind, FitParameters, PipelineContext};

use super::regression::least_squares;
use super::{FitReport, MetricFit};

/// Name of the photodiode column for `channel`.
pub fn irradiance_column(channel: &str) -> String {
    format!("irrad{channel}")
}

/// Fit each raw metric of the baseline film against the photodiode reading.
///
/// Only baseline rows with no missing cell in any column take part, so an
/// incomplete reading never enters the fit. Returns the report together
/// with the parameters to store.
pub fn fit_irradiance(
    dataset: &Dataset,
    baseline: &str,
    channel: &str,
) -> Result<(FitReport, FitParameters)> {
    let x_axis = irradiance_column(channel);
    dataset.require(&[x_axis.as_str(), "name"])?;
    dataset.require(&RAW_METRICS)?;

    let irrad = dataset.float(&x_axis)?;
    let metrics = RAW_METRICS
        .iter()
        .map(|m| dataset.float(m))
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<usize> = dataset
        .rows_matching("name", baseline)?
        .into_iter()
        .filter(|&r| dataset.columns().all(|(_, c)| !c.value(r).is_missing()))
        .collect();
    debug!(baseline, kept = rows.len(), "Complete baseline rows");
    if rows.is_empty() {
        return Err(PvError::EmptySelection(format!(
            "no complete {x_axis} readings for baseline {baseline:?}"
        )));
    }

    let x: Array1<f64> = rows.iter().map(|&r| irrad[r]).collect();
    let mut fits = Vec::with_capacity(RAW_METRICS.len());
    let mut reported = Vec::with_capacity(RAW_METRICS.len());
    for (name, values) in RAW_METRICS.iter().zip(&metrics) {
        let observed: Array1<f64> = rows.iter().map(|&r| values[r]).collect();
        let fit = least_squares(&x, &observed)?;
        info!(metric = *name, slope = fit.slope, intercept = fit.intercept, "Irradiance fit");
        fits.push((name.to_string(), fit));
        reported.push(MetricFit {
            metric: name.to_string(),
            fit,
            predicted: fit.predict_all(&x),
            observed,
        });
    }

    let params = FitParameters {
        kind: FitKind::Irradiance {
            channel: channel.to_string(),
        },
        fits,
    };
    let report = FitReport {
        x_axis,
        x,
        metrics: reported,
    };
    Ok((report, params))
}

/// Diagnostic irradiance fit of the baseline film. Stores the fitted lines
/// as the active fit parameters; the dataset is not modified.
pub fn irradiance_fit(ctx: &mut PipelineContext, baseline: &str, channel: &str) -> Result<FitReport> {
    let (report, params) = fit_irradiance(ctx.dataset()?, baseline, channel)?;
    ctx.set_fit(params);
    Ok(report)
}

/// Correct the raw readings to the one-sun photodiode value.
///
/// Isc and Pmax scale linearly with irradiance, Voc with its logarithm.
/// Non-positive slopes mean no measurable dependence and apply no change.
pub fn apply_irradiance_correction(
    dataset: &Dataset,
    params: Option<&FitParameters>,
    channel: &str,
    one_sun: f64,
) -> Result<Dataset> {
    let params = match params {
        Some(p) if p.kind == (FitKind::Irradiance { channel: channel.to_string() }) => p,
        Some(p) => {
            return Err(PvError::Precondition(format!(
                "active fit is {:?}, irradiance fit for channel {channel} required",
                p.kind
            )))
        }
        None => {
            return Err(PvError::Precondition(
                "irradiance correction requires a prior irradiance fit".into(),
            ))
        }
    };
    let slope = |metric: &str| params.get(metric).map(|f| f.slope.max(0.0));
    let (isc_slope, voc_slope, pmax_slope) = (slope("isc_fit")?, slope("voc_fit")?, slope("pmax_fit")?);

    dataset.require(&RAW_METRICS)?;
    let irrad = dataset.float(&irradiance_column(channel))?.clone();
    let ln_one_sun = one_sun.ln();

    let mut out = dataset.clone();
    if isc_slope > 0.0 {
        Zip::from(out.float_mut("isc_fit")?)
            .and(&irrad)
            .for_each(|isc, &g| *isc += isc_slope * (one_sun - g));
    }
    if voc_slope > 0.0 {
        Zip::from(out.float_mut("voc_fit")?)
            .and(&irrad)
            .for_each(|voc, &g| *voc += voc_slope * (ln_one_sun - g.ln()));
    }
    if pmax_slope > 0.0 {
        Zip::from(out.float_mut("pmax_fit")?)
            .and(&irrad)
            .for_each(|pmax, &g| *pmax += pmax_slope * (one_sun - g));
    }
    Ok(out)
}

/// Irradiance-correction stage, cached as `IV_Summary_TI_corr.xlsx`.
pub fn irradiance_correction(
    ctx: &mut PipelineContext,
    channel: &str,
    one_sun: f64,
    overwrite: bool,
) -> Result<()> {
    ctx.run_cached(Stage::IrradianceCorrected, overwrite, |ctx| {
        apply_irradiance_correction(ctx.dataset()?, ctx.fit(), channel, one_sun)
    })
}
