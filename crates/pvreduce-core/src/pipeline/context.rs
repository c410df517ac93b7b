use std::path::PathBuf;

use crate::correct::regression::LinearFit;
use crate::dataset::Dataset;
use crate::error::{PvError, Result};
use crate::io::{Stage, StageCache};

/// What produced the active fit parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum FitKind {
    /// Metrics against the photodiode reading `irrad<channel>`.
    Irradiance { channel: String },
    /// Efficiencies against a structural column of the reference groups.
    Reference { x_axis: String },
}

/// Most recent regression result: one line per fitted metric.
#[derive(Clone, Debug, PartialEq)]
pub struct FitParameters {
    pub kind: FitKind,
    pub fits: Vec<(String, LinearFit)>,
}

impl FitParameters {
    pub fn get(&self, metric: &str) -> Result<LinearFit> {
        self.fits
            .iter()
            .find(|(m, _)| m == metric)
            .map(|(_, f)| *f)
            .ok_or_else(|| PvError::Precondition(format!("no fit for {metric}")))
    }
}

/// Exclusive owner of the active dataset and the single fit-parameter slot.
///
/// Every stage takes the context by `&mut`, so one pipeline run at a time
/// is enforced by the borrow checker.
#[derive(Debug)]
pub struct PipelineContext {
    cache: StageCache,
    dataset: Option<Dataset>,
    fit: Option<FitParameters>,
}

impl PipelineContext {
    /// A fresh context caching stage outputs in `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: StageCache::new(output_dir),
            dataset: None,
            fit: None,
        }
    }

    pub fn cache(&self) -> &StageCache {
        &self.cache
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Result<&Dataset> {
        self.dataset
            .as_ref()
            .ok_or_else(|| PvError::Precondition("no dataset loaded".into()))
    }

    /// Make `dataset` the active one, returning the previous.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> Option<Dataset> {
        self.dataset.replace(dataset)
    }

    pub fn fit(&self) -> Option<&FitParameters> {
        self.fit.as_ref()
    }

    pub fn set_fit(&mut self, fit: FitParameters) {
        self.fit = Some(fit);
    }

    /// Load `stage` from the cache, or recompute it.
    ///
    /// Recomputing removes the stale cache file first, builds the new dataset
    /// completely, persists it, and only then swaps it in. A failing
    /// `compute` leaves the active dataset untouched and nothing on disk.
    pub fn run_cached<F>(&mut self, stage: Stage, overwrite: bool, compute: F) -> Result<()>
    where
        F: FnOnce(&Self) -> Result<Dataset>,
    {
        if let Some(cached) = self.cache.lookup(stage, overwrite)? {
            self.dataset = Some(cached);
            return Ok(());
        }
        self.cache.invalidate(stage)?;
        let next = compute(self)?;
        self.cache.store(stage, &next)?;
        self.dataset = Some(next);
        Ok(())
    }
}
