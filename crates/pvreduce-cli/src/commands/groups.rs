use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pvreduce_core::io::read_dataset;
use pvreduce_core::report::group_summary;

use crate::summary::print_group_table;

#[derive(Args)]
pub struct GroupsArgs {
    /// Processed spreadsheet with a `group` column
    pub file: PathBuf,
}

pub fn run(args: &GroupsArgs) -> Result<()> {
    let dataset = read_dataset(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let groups = group_summary(&dataset).context("Failed to summarize groups")?;
    print_group_table(&groups);
    Ok(())
}
