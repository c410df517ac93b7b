pub mod config;
mod context;
mod orchestrator;
mod types;

pub use context::{FitKind, FitParameters, PipelineContext};
pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use types::{PipelineOutput, PipelineStage, ProgressReporter};
