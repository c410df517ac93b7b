use tracing::info;

use crate::aggregate::{average_by, average_by_experiment};
use crate::correct::{irradiance_correction, irradiance_fit, temperature_correction};
use crate::efficiency::calc_efficiency;
use crate::error::Result;
use crate::filter::{drop_experiments, select_experiment_range};
use crate::ingest::load_experiments;
use crate::io::Stage;
use crate::merge::merge_film_database;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

fn stage<T>(
    reporter: &dyn ProgressReporter,
    stage: PipelineStage,
    work: impl FnOnce() -> Result<T>,
) -> Result<T> {
    reporter.begin_stage(stage);
    let out = work()?;
    reporter.finish_stage();
    Ok(out)
}

/// Run the full reduction pipeline with a progress reporter.
///
/// Stages run in order: load, filter, temperature correction, irradiance
/// fit and correction, per-experiment averaging, averaging by the configured
/// column, efficiency, and the film-database merge when one is configured.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<PipelineOutput> {
    let overwrite = |s: Stage| config.overwrite.for_stage(s);
    let mut ctx = PipelineContext::new(&config.output_dir);
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        "Starting pipeline"
    );

    stage(reporter, PipelineStage::Loading, || {
        load_experiments(&mut ctx, &config.input_dir, overwrite(Stage::Raw))
    })?;

    if !config.exclude.is_empty() || config.range.is_some() {
        stage(reporter, PipelineStage::Filtering, || {
            if !config.exclude.is_empty() {
                drop_experiments(&mut ctx, &config.exclude)?;
            }
            if let Some(range) = config.range {
                select_experiment_range(&mut ctx, range.min, range.max)?;
            }
            Ok(())
        })?;
    }

    if config.temperature.enabled {
        stage(reporter, PipelineStage::TemperatureCorrection, || {
            temperature_correction(&mut ctx, overwrite(Stage::TemperatureCorrected))
        })?;
    }

    let mut irradiance_report = None;
    if let Some(irr) = &config.irradiance {
        let report = stage(reporter, PipelineStage::IrradianceFit, || {
            irradiance_fit(&mut ctx, &irr.baseline, &irr.channel)
        })?;
        irradiance_report = Some(report);
        stage(reporter, PipelineStage::IrradianceCorrection, || {
            irradiance_correction(
                &mut ctx,
                &irr.channel,
                irr.one_sun,
                overwrite(Stage::IrradianceCorrected),
            )
        })?;
    }

    stage(reporter, PipelineStage::ExperimentAverage, || {
        average_by_experiment(&mut ctx, overwrite(Stage::ExperimentAverage))
    })?;
    stage(reporter, PipelineStage::GroupAverage, || {
        average_by(
            &mut ctx,
            config.average_by.column(),
            overwrite(Stage::GroupAverage),
        )
    })?;
    stage(reporter, PipelineStage::Efficiency, || {
        calc_efficiency(&mut ctx, &config.reference_name, overwrite(Stage::Efficiency))
    })?;

    if let Some(film_db) = &config.film_db {
        stage(reporter, PipelineStage::FilmMerge, || {
            merge_film_database(&mut ctx, film_db, overwrite(Stage::FilmMerged))
        })?;
    }

    info!(rows = ctx.dataset()?.len(), "Pipeline complete");
    Ok(PipelineOutput {
        context: ctx,
        irradiance_fit: irradiance_report,
    })
}

/// Run the full reduction pipeline.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    run_pipeline_reported(config, &NoOpReporter)
}
