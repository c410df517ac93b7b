#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;
use tempfile::TempDir;

use pvreduce_core::correct::irradiance::{apply_irradiance_correction, fit_irradiance};
use pvreduce_core::correct::reference::fit_reference;
use pvreduce_core::correct::temperature::apply_temperature_correction;
use pvreduce_core::correct::{irradiance_correction, irradiance_fit, reference_fit};
use pvreduce_core::error::PvError;
use pvreduce_core::pipeline::{FitKind, PipelineContext};

use common::{floats, readings_dataset, rows_dataset, text};

fn raw(t_sample: &[f64], irrad: &[f64]) -> pvreduce_core::dataset::Dataset {
    let n = t_sample.len();
    let keys: Vec<&str> = vec!["EXP001"; n];
    readings_dataset(
        &keys,
        vec![
            ("isc_fit", floats(&vec![10.0; n])),
            ("voc_fit", floats(&vec![600.0; n])),
            ("pmax_fit", floats(&vec![5.0; n])),
            ("t_sample", floats(t_sample)),
            ("irrad2", floats(irrad)),
            ("name", text(&vec!["PV masked"; n])),
        ],
    )
}

#[test]
fn temperature_correction_at_reference_is_identity() {
    let ds = raw(&[25.0, 25.0], &[515.0, 515.0]);
    let corrected = apply_temperature_correction(&ds).unwrap();
    assert_eq!(corrected, ds);
}

#[test]
fn temperature_correction_uses_fixed_coefficients() {
    let ds = raw(&[35.0], &[515.0]);
    let corrected = apply_temperature_correction(&ds).unwrap();
    // dT = 25 - 35 = -10
    assert_relative_eq!(corrected.float("isc_fit").unwrap()[0], 10.0 * (1.0 - 0.006), epsilon = 1e-12);
    assert_relative_eq!(corrected.float("voc_fit").unwrap()[0], 600.0 + 22.0, epsilon = 1e-12);
    assert_relative_eq!(corrected.float("pmax_fit").unwrap()[0], 5.0 * (1.0 + 0.045), epsilon = 1e-12);
}

#[test]
fn irradiance_fit_recovers_linear_dependence() {
    let irrad = [400.0, 450.0, 500.0, 550.0];
    let mut ds = raw(&[25.0; 4], &irrad);
    ds.insert("isc_fit", floats(&irrad.map(|g| 0.02 * g + 1.0))).unwrap();

    let (report, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    assert_eq!(report.x_axis, "irrad2");
    assert_eq!(report.metrics.len(), 3);
    assert_eq!(report.metrics[0].predicted.len(), 4);

    let isc = params.get("isc_fit").unwrap();
    assert_relative_eq!(isc.slope, 0.02, epsilon = 1e-9);
    assert_relative_eq!(isc.intercept, 1.0, epsilon = 1e-9);
    // Constant metrics have no slope.
    assert_relative_eq!(params.get("voc_fit").unwrap().slope, 0.0, epsilon = 1e-12);
}

#[test]
fn irradiance_fit_without_baseline_rows_is_empty_selection() {
    let ds = raw(&[25.0], &[515.0]);
    let err = fit_irradiance(&ds, "unknown film", "2").unwrap_err();
    assert!(matches!(err, PvError::EmptySelection(_)));
}

#[test]
fn non_positive_slopes_change_nothing() {
    let irrad = [400.0, 500.0, 600.0];
    let mut ds = raw(&[25.0; 3], &irrad);
    // Isc falls with irradiance, the others are flat.
    ds.insert("isc_fit", floats(&[12.0, 11.0, 10.0])).unwrap();

    let (_, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    assert!(params.get("isc_fit").unwrap().slope < 0.0);

    let corrected = apply_irradiance_correction(&ds, Some(&params), "2", 515.0).unwrap();
    assert_eq!(corrected, ds);
}

#[test]
fn positive_slope_moves_readings_to_one_sun() {
    let irrad = [400.0, 500.0, 600.0];
    let mut ds = raw(&[25.0; 3], &irrad);
    ds.insert("isc_fit", floats(&irrad.map(|g| 0.02 * g))).unwrap();

    let (_, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    let corrected = apply_irradiance_correction(&ds, Some(&params), "2", 515.0).unwrap();
    for v in corrected.float("isc_fit").unwrap() {
        assert_relative_eq!(*v, 0.02 * 515.0, epsilon = 1e-9);
    }
}

#[test]
fn voc_follows_log_irradiance_and_pmax_follows_irradiance() {
    let irrad = [400.0, 500.0, 600.0];
    let mut ds = raw(&[25.0; 3], &irrad);
    ds.insert("voc_fit", floats(&irrad.map(|g| 0.1 * g + 550.0))).unwrap();
    ds.insert("pmax_fit", floats(&irrad.map(|g| 0.01 * g))).unwrap();

    let (_, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    assert_relative_eq!(params.get("voc_fit").unwrap().slope, 0.1, epsilon = 1e-9);
    assert_relative_eq!(params.get("pmax_fit").unwrap().slope, 0.01, epsilon = 1e-9);

    let corrected = apply_irradiance_correction(&ds, Some(&params), "2", 515.0).unwrap();
    let voc = corrected.float("voc_fit").unwrap();
    let pmax = corrected.float("pmax_fit").unwrap();
    for (i, &g) in irrad.iter().enumerate() {
        let expected_voc = 0.1 * g + 550.0 + 0.1 * (515.0_f64.ln() - g.ln());
        assert_relative_eq!(voc[i], expected_voc, epsilon = 1e-9);
        assert_relative_eq!(pmax[i], 0.01 * 515.0, epsilon = 1e-9);
    }
    // 400 -> 515 on a log scale is a shift of about 0.025, not 11.5.
    assert_relative_eq!(voc[0], 590.0253, epsilon = 1e-4);
    // Isc stays flat, so it is left alone.
    assert_eq!(corrected.float("isc_fit").unwrap(), ds.float("isc_fit").unwrap());
}

#[test]
fn irradiance_fit_skips_incomplete_baseline_rows() {
    let mut ds = raw(&[25.0; 3], &[400.0, 500.0, 600.0]);
    ds.insert("isc_fit", floats(&[8.0, 10.0, 30.0])).unwrap();
    ds.insert("t_room", floats(&[21.0, 21.0, f64::NAN])).unwrap();

    let (report, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    assert_eq!(report.x.to_vec(), vec![400.0, 500.0]);
    assert_eq!(report.metrics[0].observed.len(), 2);
    assert_relative_eq!(params.get("isc_fit").unwrap().slope, 0.02, epsilon = 1e-9);
}

#[test]
fn correction_requires_matching_irradiance_fit() {
    let ds = raw(&[25.0; 2], &[500.0, 520.0]);
    let err = apply_irradiance_correction(&ds, None, "2", 515.0).unwrap_err();
    assert!(matches!(err, PvError::Precondition(_)));

    let (_, params) = fit_irradiance(&ds, "PV masked", "2").unwrap();
    let err = apply_irradiance_correction(&ds, Some(&params), "3", 515.0).unwrap_err();
    assert!(matches!(err, PvError::Precondition(_)));
}

#[test]
fn correction_stage_rejects_reference_fit() {
    let out = TempDir::new().unwrap();
    let mut ctx = PipelineContext::new(out.path());
    ctx.replace_dataset(rows_dataset(
        3,
        vec![
            ("group", floats(&[0.0, 0.0, 0.0])),
            ("thickness", floats(&[1.0, 2.0, 3.0])),
            ("isc_eff", floats(&[1.0, 2.0, 3.0])),
            ("disc_eff", floats(&[0.5, 0.5, 0.5])),
            ("pmax_eff", floats(&[2.0, 4.0, 6.0])),
            ("dpmax_eff", floats(&[0.5, 0.5, 0.5])),
        ],
    ));
    reference_fit(&mut ctx, &[0], "thickness").unwrap();

    let err = irradiance_correction(&mut ctx, "2", 515.0, true).unwrap_err();
    assert!(matches!(err, PvError::Precondition(_)));
}

#[test]
fn irradiance_fit_stage_keeps_dataset_and_sets_fit() {
    let out = TempDir::new().unwrap();
    let mut ctx = PipelineContext::new(out.path());
    let ds = raw(&[25.0; 2], &[500.0, 520.0]);
    ctx.replace_dataset(ds.clone());

    irradiance_fit(&mut ctx, "PV masked", "2").unwrap();
    assert_eq!(ctx.dataset().unwrap(), &ds);
    assert_eq!(
        ctx.fit().unwrap().kind,
        FitKind::Irradiance {
            channel: "2".to_string()
        }
    );
}

#[test]
fn reference_fit_weights_by_inverse_uncertainty() {
    let ds = rows_dataset(
        4,
        vec![
            ("group", floats(&[1.0, 1.0, 1.0, 2.0])),
            ("thickness", floats(&[3.0, 1.0, 2.0, 10.0])),
            ("isc_eff", floats(&[7.0, 3.0, 5.0, 100.0])),
            ("disc_eff", floats(&[1.0, 1.0, 1.0, 1.0])),
            ("pmax_eff", floats(&[1.0, 1.0, 1.0, 1.0])),
            ("dpmax_eff", floats(&[0.0, 1.0, 1.0, 1.0])),
        ],
    );
    let (report, params) = fit_reference(&ds, &[1], "thickness").unwrap();

    // Sorted by x, group 2 left out.
    assert_eq!(report.x.to_vec(), vec![1.0, 2.0, 3.0]);
    let isc = params.get("isc_eff").unwrap();
    assert_relative_eq!(isc.slope, 2.0, epsilon = 1e-9);
    assert_relative_eq!(isc.intercept, 1.0, epsilon = 1e-9);
    // The zero-uncertainty point is excluded from the fit but still predicted.
    assert_eq!(report.metrics[1].predicted.len(), 3);
}
