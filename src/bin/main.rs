#[cfg(feature = "cli")]
mod commands;

#[cfg(feature = "cli")]
use crate::commands::build;
#[cfg(feature = "cli")]
use crate::commands::layout;
#[cfg(feature = "cli")]
use crate::commands::stats;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use hibf::error::HibfError;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(clap::Subcommand)]
enum Commands {
    /// Compute a hierarchical binning layout from k-mer counts.
    Layout(layout::LayoutArgs),
    /// Build the IBF hierarchy described by a layout file.
    Build(build::BuildArgs),
    /// Summarize a layout file's structure.
    Stats(stats::StatsArgs),
}

#[cfg(feature = "cli")]
pub fn run() -> Result<(), HibfError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Layout(args) => layout::run(args),
        Commands::Build(args) => build::run(args),
        Commands::Stats(args) => stats::run(args),
    }
}

fn main() {
    #[cfg(feature = "cli")]
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI feature not enabled. Please rebuild with --features cli");
        std::process::exit(1);
    }
}
