use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pvreduce_core::filter::parse_id_list;
use pvreduce_core::io::Stage;
use pvreduce_core::pipeline::config::{
    AverageBy, ExperimentRange, IrradianceConfig, OverwriteConfig, PipelineConfig,
    TemperatureConfig,
};
use pvreduce_core::pipeline::{run_pipeline_reported, PipelineStage, ProgressReporter};
use tracing::{debug, info};

use crate::summary::{print_fit_report, print_pipeline_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum AverageByArg {
    Name,
    FilmId,
}

#[derive(Args)]
pub struct RunArgs {
    /// Root directory containing per-experiment IV_Summary.xlsx files
    pub input_dir: Option<PathBuf>,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for cached stage outputs
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Film database spreadsheet to merge in
    #[arg(long)]
    pub film_db: Option<PathBuf>,

    /// Recompute every stage even when its cached file exists
    #[arg(long)]
    pub overwrite: bool,

    /// Comma-separated experiment numbers to drop
    #[arg(long)]
    pub exclude: Option<String>,

    /// Lowest experiment number to keep
    #[arg(long, requires = "max")]
    pub min: Option<i64>,

    /// Highest experiment number to keep
    #[arg(long, requires = "min")]
    pub max: Option<i64>,

    /// Skip temperature correction
    #[arg(long)]
    pub no_temperature: bool,

    /// Skip irradiance fit and correction
    #[arg(long)]
    pub no_irradiance: bool,

    /// Film name used as irradiance baseline
    #[arg(long, default_value = "PV masked")]
    pub baseline: String,

    /// Photodiode channel
    #[arg(long, default_value = "2")]
    pub channel: String,

    /// Photodiode reading at one sun
    #[arg(long, default_value = "515")]
    pub one_sun: f64,

    /// Column whose repeated values are averaged together
    #[arg(long, value_enum, default_value = "name")]
    pub average_by: AverageByArg,

    /// Film name efficiencies are relative to
    #[arg(long, default_value = "PV masked")]
    pub reference: String,
}

struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage) {
        self.bar.set_message(stage.to_string());
    }

    fn finish_stage(&self) {
        self.bar.inc(1);
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: PipelineConfig = toml::from_str(&contents).context("Invalid pipeline config")?;
        info!(path = %config_path.display(), "Loaded pipeline config");
        config
    } else {
        build_config_from_args(args)?
    };

    print_pipeline_summary(&config);

    let stages = stage_count(&config);
    debug!(stages, input = %config.input_dir.display(), "Starting pipeline");
    let pb = ProgressBar::new(stages);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:28} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = BarReporter { bar: pb };

    let output = run_pipeline_reported(&config, &reporter).with_context(|| {
        format!("Pipeline failed for {}", config.input_dir.display())
    })?;
    reporter.bar.finish_with_message("Done");

    if let Some(ref report) = output.irradiance_fit {
        print_fit_report("Irradiance Fit", report);
    }

    let dataset = output.context.dataset()?;
    let last = if config.film_db.is_some() {
        Stage::FilmMerged
    } else {
        Stage::Efficiency
    };
    println!(
        "\n{} rows written to {}",
        dataset.len(),
        output.context.cache().path(last).display()
    );

    Ok(())
}

fn stage_count(config: &PipelineConfig) -> u64 {
    let mut count = 4;
    if !config.exclude.is_empty() || config.range.is_some() {
        count += 1;
    }
    if config.temperature.enabled {
        count += 1;
    }
    if config.irradiance.is_some() {
        count += 2;
    }
    if config.film_db.is_some() {
        count += 1;
    }
    count
}

fn build_config_from_args(args: &RunArgs) -> Result<PipelineConfig> {
    let input_dir = args
        .input_dir
        .clone()
        .context("An input directory or --config is required")?;
    let exclude = match args.exclude {
        Some(ref text) => parse_id_list(text).context("Invalid --exclude list")?,
        None => Vec::new(),
    };
    let range = match (args.min, args.max) {
        (Some(min), Some(max)) => Some(ExperimentRange { min, max }),
        _ => None,
    };
    let irradiance = if args.no_irradiance {
        None
    } else {
        Some(IrradianceConfig {
            baseline: args.baseline.clone(),
            channel: args.channel.clone(),
            one_sun: args.one_sun,
        })
    };
    let average_by = match args.average_by {
        AverageByArg::Name => AverageBy::Name,
        AverageByArg::FilmId => AverageBy::FilmId,
    };

    Ok(PipelineConfig {
        input_dir,
        output_dir: args.output_dir.clone(),
        film_db: args.film_db.clone(),
        overwrite: OverwriteConfig {
            all: args.overwrite,
            ..Default::default()
        },
        exclude,
        range,
        temperature: TemperatureConfig {
            enabled: !args.no_temperature,
        },
        irradiance,
        average_by,
        reference_name: args.reference.clone(),
    })
}
