use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pvreduce_core::io::read_dataset;

#[derive(Args)]
pub struct InfoArgs {
    /// Spreadsheet to describe
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let dataset = read_dataset(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    println!("File:        {}", args.file.display());
    print!("{}", dataset.describe());

    Ok(())
}
