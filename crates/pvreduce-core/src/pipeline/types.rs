use crate::correct::FitReport;

use super::context::PipelineContext;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Loading,
    Filtering,
    TemperatureCorrection,
    IrradianceFit,
    IrradianceCorrection,
    ExperimentAverage,
    GroupAverage,
    Efficiency,
    FilmMerge,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading experiments"),
            Self::Filtering => write!(f, "Filtering experiments"),
            Self::TemperatureCorrection => write!(f, "Correcting temperature"),
            Self::IrradianceFit => write!(f, "Fitting irradiance"),
            Self::IrradianceCorrection => write!(f, "Correcting irradiance"),
            Self::ExperimentAverage => write!(f, "Averaging experiments"),
            Self::GroupAverage => write!(f, "Averaging groups"),
            Self::Efficiency => write!(f, "Computing efficiency"),
            Self::FilmMerge => write!(f, "Merging film database"),
        }
    }
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Context holding the final dataset and the last fit parameters.
    pub context: PipelineContext,
    /// Baseline irradiance fit, when irradiance correction ran.
    pub irradiance_fit: Option<FitReport>,
}

/// Progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars or logging. All methods
/// have default no-op implementations.
pub trait ProgressReporter {
    /// A new pipeline stage has started.
    fn begin_stage(&self, _stage: PipelineStage) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
