use std::path::Path;

use ndarray::Array1;
use tracing::info;

use crate::correct::reference::group_rows;
use crate::dataset::{Column, Dataset};
use crate::error::{PvError, Result};
use crate::io::{write_dataset, Stage};
use crate::pipeline::{FitKind, PipelineContext};

/// Relative change of `value ± err` against `reference ± ref_err`, in
/// percent, with the interval bounds propagated.
///
/// Returns `(centre, half_width)` of the interval spanned by the most
/// optimistic and most pessimistic ratio.
pub fn relative_change(value: f64, err: f64, reference: f64, ref_err: f64) -> (f64, f64) {
    let upper = ((value + err) / (reference - ref_err) - 1.0) * 100.0;
    let lower = ((value - err) / (reference + ref_err) - 1.0) * 100.0;
    ((upper + lower) / 2.0, (upper - lower) / 2.0)
}

/// Add `pmax_eff`/`dpmax_eff` and `isc_eff`/`disc_eff` relative to the first
/// row named `reference_name`.
pub fn efficiency_table(dataset: &Dataset, reference_name: &str) -> Result<Dataset> {
    dataset.require(&["name", "pmax", "dpmax", "isc", "disc"])?;
    let reference = *dataset
        .rows_matching("name", reference_name)?
        .first()
        .ok_or_else(|| {
            PvError::EmptySelection(format!("reference {reference_name:?} not in dataset"))
        })?;

    let mut out = dataset.clone();
    for (metric, eff) in [("pmax", "pmax_eff"), ("isc", "isc_eff")] {
        let values = dataset.float(metric)?;
        let errs = dataset.float(&format!("d{metric}"))?;
        let (ref_value, ref_err) = (values[reference], errs[reference]);
        info!(metric, reference = reference_name, value = ref_value, err = ref_err, "Efficiency reference");

        let (centres, widths): (Vec<f64>, Vec<f64>) = values
            .iter()
            .zip(errs.iter())
            .map(|(&v, &dv)| relative_change(v, dv, ref_value, ref_err))
            .unzip();
        out.insert(eff, Column::Float(Array1::from(centres)))?;
        out.insert(format!("d{eff}"), Column::Float(Array1::from(widths)))?;
    }
    Ok(out)
}

/// Efficiency stage, cached as `IV_Summary_Efficiency.xlsx`.
pub fn calc_efficiency(ctx: &mut PipelineContext, reference_name: &str, overwrite: bool) -> Result<()> {
    ctx.run_cached(Stage::Efficiency, overwrite, |ctx| {
        efficiency_table(ctx.dataset()?, reference_name)
    })
}

fn column_or_missing(dataset: &Dataset, name: &str) -> Result<Array1<f64>> {
    if dataset.has_column(name) {
        Ok(dataset.float(name)?.clone())
    } else {
        Ok(Array1::from_elem(dataset.len(), f64::NAN))
    }
}

/// Improvement of each row in `groups` over the active reference fit for
/// `x_axis`: `isc_impr`, `pmax_impr` and their uncertainties. Rows outside
/// `groups` keep whatever improvement they already had.
pub fn improvement_table(
    ctx: &PipelineContext,
    groups: &[i64],
    x_axis: &str,
) -> Result<Dataset> {
    let params = match ctx.fit() {
        Some(p) if p.kind == (FitKind::Reference { x_axis: x_axis.to_string() }) => p,
        Some(p) => {
            return Err(PvError::Precondition(format!(
                "active fit is {:?}, reference fit against {x_axis} required",
                p.kind
            )))
        }
        None => {
            return Err(PvError::Precondition(
                "improvement requires a prior reference fit".into(),
            ))
        }
    };
    let isc_line = params.get("isc_eff")?;
    let pmax_line = params.get("pmax_eff")?;

    let dataset = ctx.dataset()?;
    dataset.require(&[x_axis, "group", "isc_eff", "disc_eff", "pmax_eff", "dpmax_eff"])?;
    let rows = group_rows(dataset, groups)?;
    let x = dataset.float(x_axis)?;
    let isc_eff = dataset.float("isc_eff")?;
    let disc_eff = dataset.float("disc_eff")?;
    let pmax_eff = dataset.float("pmax_eff")?;
    let dpmax_eff = dataset.float("dpmax_eff")?;

    let mut isc_impr = column_or_missing(dataset, "isc_impr")?;
    let mut disc_impr = column_or_missing(dataset, "disc_impr")?;
    let mut pmax_impr = column_or_missing(dataset, "pmax_impr")?;
    let mut dpmax_impr = column_or_missing(dataset, "dpmax_impr")?;
    for &r in &rows {
        isc_impr[r] = isc_eff[r] - isc_line.predict(x[r]);
        disc_impr[r] = disc_eff[r];
        pmax_impr[r] = pmax_eff[r] - pmax_line.predict(x[r]);
        dpmax_impr[r] = dpmax_eff[r];
    }

    let mut out = dataset.clone();
    out.insert("isc_impr", Column::Float(isc_impr))?;
    out.insert("disc_impr", Column::Float(disc_impr))?;
    out.insert("pmax_impr", Column::Float(pmax_impr))?;
    out.insert("dpmax_impr", Column::Float(dpmax_impr))?;
    info!(rows = rows.len(), x_axis, ?groups, "Computed improvement over reference fit");
    Ok(out)
}

/// Compute the improvement over the reference baseline and write the whole
/// dataset to `improve_file`. The file is rewritten on every call.
pub fn pce_vs_reference(
    ctx: &mut PipelineContext,
    groups: &[i64],
    x_axis: &str,
    improve_file: &Path,
) -> Result<()> {
    let next = improvement_table(ctx, groups, x_axis)?;
    if let Some(parent) = improve_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_dataset(&next, improve_file)?;
    info!(path = %improve_file.display(), "Wrote improvement file");
    ctx.replace_dataset(next);
    Ok(())
}
