use ndarray::Zip;

use crate::consts::{ISC_TEMP_COEFF, PMAX_TEMP_COEFF, REFERENCE_TEMPERATURE, VOC_TEMP_COEFF};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::io::Stage;
use crate::pipeline::PipelineContext;

/// Correct the raw readings to 25 C using the fixed coefficients of the
/// measured cell technology.
pub fn apply_temperature_correction(dataset: &Dataset) -> Result<Dataset> {
    dataset.require(&["isc_fit", "voc_fit", "pmax_fit", "t_sample"])?;
    let delta = dataset.float("t_sample")?.mapv(|t| REFERENCE_TEMPERATURE - t);

    let mut out = dataset.clone();
    Zip::from(out.float_mut("isc_fit")?)
        .and(&delta)
        .for_each(|isc, &dt| *isc *= 1.0 + ISC_TEMP_COEFF * dt);
    Zip::from(out.float_mut("voc_fit")?)
        .and(&delta)
        .for_each(|voc, &dt| *voc -= VOC_TEMP_COEFF * dt);
    Zip::from(out.float_mut("pmax_fit")?)
        .and(&delta)
        .for_each(|pmax, &dt| *pmax *= 1.0 - PMAX_TEMP_COEFF * dt);
    Ok(out)
}

/// Temperature-correction stage, cached as `IV_Summary_T_corr.xlsx`.
pub fn temperature_correction(ctx: &mut PipelineContext, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::TemperatureCorrected, overwrite, |ctx| {
        apply_temperature_correction(ctx.dataset()?)
    })
}
