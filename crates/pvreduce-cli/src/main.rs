mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pvreduce", about = "PV IV-curve data reduction tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full reduction pipeline
    Run(commands::pipeline::RunArgs),
    /// Print or save a default pipeline config
    Config(commands::config::ConfigArgs),
    /// Describe a spreadsheet
    Info(commands::info::InfoArgs),
    /// List the film groups of a processed file
    Groups(commands::groups::GroupsArgs),
    /// Fit the reference baseline and compute improvement over it
    Improve(commands::improve::ImproveArgs),
    /// Merge two processed files
    Merge(commands::merge::MergeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Groups(args) => commands::groups::run(args),
        Commands::Improve(args) => commands::improve::run(args),
        Commands::Merge(args) => commands::merge::run(args),
    }
}
