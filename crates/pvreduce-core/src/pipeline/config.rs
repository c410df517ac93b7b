use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::io::Stage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory searched for per-experiment `IV_Summary.xlsx` files.
    pub input_dir: PathBuf,
    /// Directory holding the cached stage outputs.
    pub output_dir: PathBuf,
    /// Film-property spreadsheet joined in as the last stage.
    #[serde(default)]
    pub film_db: Option<PathBuf>,
    #[serde(default)]
    pub overwrite: OverwriteConfig,
    /// Experiment numbers dropped after loading.
    #[serde(default)]
    pub exclude: Vec<i64>,
    #[serde(default)]
    pub range: Option<ExperimentRange>,
    #[serde(default)]
    pub temperature: TemperatureConfig,
    #[serde(default)]
    pub irradiance: Option<IrradianceConfig>,
    #[serde(default)]
    pub average_by: AverageBy,
    #[serde(default = "default_reference_name")]
    pub reference_name: String,
}

impl PipelineConfig {
    /// Lab defaults for the given directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            film_db: None,
            overwrite: OverwriteConfig::default(),
            exclude: Vec::new(),
            range: None,
            temperature: TemperatureConfig::default(),
            irradiance: Some(IrradianceConfig::default()),
            average_by: AverageBy::default(),
            reference_name: default_reference_name(),
        }
    }
}

fn default_reference_name() -> String {
    "PV masked".to_string()
}

/// Whether each cached stage is recomputed even when its file exists.
/// Per-stage entries override `all`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverwriteConfig {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub raw: Option<bool>,
    #[serde(default)]
    pub temperature: Option<bool>,
    #[serde(default)]
    pub irradiance: Option<bool>,
    #[serde(default)]
    pub experiment_average: Option<bool>,
    #[serde(default)]
    pub group_average: Option<bool>,
    #[serde(default)]
    pub efficiency: Option<bool>,
    #[serde(default)]
    pub film_merge: Option<bool>,
}

impl OverwriteConfig {
    pub fn for_stage(&self, stage: Stage) -> bool {
        let specific = match stage {
            Stage::Raw => self.raw,
            Stage::TemperatureCorrected => self.temperature,
            Stage::IrradianceCorrected => self.irradiance,
            Stage::ExperimentAverage => self.experiment_average,
            Stage::GroupAverage => self.group_average,
            Stage::Efficiency => self.efficiency,
            Stage::FilmMerged => self.film_merge,
        };
        specific.unwrap_or(self.all)
    }
}

/// Inclusive bounds on the experiment number.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureConfig {
    pub enabled: bool,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IrradianceConfig {
    /// Film name whose readings calibrate the irradiance dependence.
    pub baseline: String,
    /// Photodiode channel, read from column `irrad<channel>`.
    pub channel: String,
    /// Photodiode reading at one sun.
    pub one_sun: f64,
}

impl Default for IrradianceConfig {
    fn default() -> Self {
        Self {
            baseline: default_reference_name(),
            channel: "2".to_string(),
            one_sun: 515.0,
        }
    }
}

/// Column whose repeated values are averaged together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageBy {
    #[default]
    Name,
    FilmId,
}

impl AverageBy {
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::FilmId => "film_id",
        }
    }
}

impl std::fmt::Display for AverageBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}
