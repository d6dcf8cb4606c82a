// bin/commands/stats.rs

use clap::Args;
use hibf::error::HibfError;
use hibf::LayoutReader;
use std::path::PathBuf;

#[derive(Args)]
pub struct StatsArgs {
    /// Layout file to summarize.
    #[arg(long, value_name = "FILE")]
    pub layout: PathBuf,
}

pub fn run(args: StatsArgs) -> Result<(), HibfError> {
    let text = std::fs::read_to_string(&args.layout)?;
    let tree = LayoutReader::parse(&text)?;

    let max_depth = tree.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let total_technical_bins: usize = tree
        .nodes
        .iter()
        .map(|n| n.number_of_technical_bins)
        .sum();
    let total_user_bins: usize = tree
        .nodes
        .iter()
        .map(|n| n.remaining_records.len())
        .sum();

    eprintln!("Layout Analysis Summary:");
    eprintln!("  nodes:                {}", tree.nodes.len());
    eprintln!("  max depth:            {}", max_depth);
    eprintln!("  total technical bins: {}", total_technical_bins);
    eprintln!("  total user bins:      {}", total_user_bins);

    Ok(())
}
