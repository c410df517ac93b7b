use std::path::PathBuf;

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::Result;

use super::xlsx::{read_dataset, write_dataset};

/// Pipeline stages whose output is cached on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Raw,
    TemperatureCorrected,
    IrradianceCorrected,
    ExperimentAverage,
    GroupAverage,
    Efficiency,
    FilmMerged,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Self::Raw,
        Self::TemperatureCorrected,
        Self::IrradianceCorrected,
        Self::ExperimentAverage,
        Self::GroupAverage,
        Self::Efficiency,
        Self::FilmMerged,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Raw => "IV_Summary.xlsx",
            Self::TemperatureCorrected => "IV_Summary_T_corr.xlsx",
            Self::IrradianceCorrected => "IV_Summary_TI_corr.xlsx",
            Self::ExperimentAverage => "IV_Summary_Average.xlsx",
            Self::GroupAverage => "IV_Summary_Average_by_Film.xlsx",
            Self::Efficiency => "IV_Summary_Efficiency.xlsx",
            Self::FilmMerged => crate::consts::PROCESSED_FILE_NAME,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw summary"),
            Self::TemperatureCorrected => write!(f, "temperature corrected"),
            Self::IrradianceCorrected => write!(f, "irradiance corrected"),
            Self::ExperimentAverage => write!(f, "experiment average"),
            Self::GroupAverage => write!(f, "group average"),
            Self::Efficiency => write!(f, "efficiency"),
            Self::FilmMerged => write!(f, "film merged"),
        }
    }
}

/// On-disk memoization of stage outputs, one fixed file per stage in a
/// single output directory. Entries are keyed by stage only; there is no
/// content hash.
#[derive(Clone, Debug)]
pub struct StageCache {
    dir: PathBuf,
}

impl StageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, stage: Stage) -> PathBuf {
        self.dir.join(stage.file_name())
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.path(stage).is_file()
    }

    /// The cached dataset, unless `overwrite` is set or nothing is cached.
    pub fn lookup(&self, stage: Stage, overwrite: bool) -> Result<Option<Dataset>> {
        let path = self.path(stage);
        if overwrite || !path.is_file() {
            return Ok(None);
        }
        let dataset = read_dataset(&path)?;
        info!(%stage, path = %path.display(), rows = dataset.len(), "Loaded cached stage");
        Ok(Some(dataset))
    }

    /// Delete a stale entry. Absent entries are not an error.
    pub fn invalidate(&self, stage: Stage) -> Result<()> {
        let path = self.path(stage);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            debug!(%stage, path = %path.display(), "Removed stale cache file");
        }
        Ok(())
    }

    pub fn store(&self, stage: Stage, dataset: &Dataset) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(stage);
        write_dataset(dataset, &path)?;
        info!(%stage, path = %path.display(), rows = dataset.len(), "Cached stage output");
        Ok(())
    }
}
