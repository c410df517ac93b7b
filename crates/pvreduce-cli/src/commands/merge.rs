use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pvreduce_core::merge::merge_processed_files;

#[derive(Args)]
pub struct MergeArgs {
    /// First processed file
    pub first: PathBuf,

    /// Second processed file
    pub second: PathBuf,

    /// Directory the merged file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

pub fn run(args: &MergeArgs) -> Result<()> {
    let path = merge_processed_files(&args.first, &args.second, &args.output_dir).with_context(
        || {
            format!(
                "Failed to merge {} and {}",
                args.first.display(),
                args.second.display()
            )
        },
    )?;
    println!("Merged file saved to {}", path.display());
    Ok(())
}
