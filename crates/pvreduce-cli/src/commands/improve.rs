use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pvreduce_core::correct::reference_fit;
use pvreduce_core::efficiency::pce_vs_reference;
use pvreduce_core::filter::parse_id_list;
use pvreduce_core::ingest::load_processed;
use pvreduce_core::pipeline::PipelineContext;

use crate::summary::print_fit_report;

#[derive(Args)]
pub struct ImproveArgs {
    /// Processed spreadsheet with efficiency and group columns
    pub file: PathBuf,

    /// Comma-separated group codes forming the reference baseline
    #[arg(long)]
    pub reference_groups: String,

    /// Comma-separated group codes to compare against the baseline
    #[arg(long)]
    pub groups: String,

    /// Column used as x-axis of the baseline fit
    #[arg(long)]
    pub x_axis: String,

    /// Output file (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ImproveArgs) -> Result<()> {
    let reference_groups =
        parse_id_list(&args.reference_groups).context("Invalid --reference-groups list")?;
    let groups = parse_id_list(&args.groups).context("Invalid --groups list")?;
    let output = args.output.clone().unwrap_or_else(|| args.file.clone());

    let cache_dir = args
        .file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let mut ctx = PipelineContext::new(cache_dir);
    load_processed(&mut ctx, &args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let report = reference_fit(&mut ctx, &reference_groups, &args.x_axis)
        .context("Reference fit failed")?;
    print_fit_report("Reference Fit", &report);

    pce_vs_reference(&mut ctx, &groups, &args.x_axis, &output)
        .context("Improvement calculation failed")?;
    println!("\nImprovement saved to {}", output.display());

    Ok(())
}
