// bin/commands/layout.rs

use clap::Args;
use csv::ReaderBuilder;
use hibf::error::HibfError;
use hibf::{HierarchicalBinning, PackConfig};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args)]
pub struct LayoutArgs {
    /// TSV of `filename<TAB>kmer_count` pairs, one per line. `#`-prefixed
    /// comment lines are skipped.
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Total technical bins available at the root IBF.
    #[arg(long)]
    pub bins: usize,

    /// Cost weight penalizing merged bins relative to split bins.
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Target false-positive rate for a single technical bin.
    #[arg(long = "fpr", default_value_t = 0.05)]
    pub false_positive_rate: f64,

    /// Number of hash functions used by each IBF.
    #[arg(long = "hashes", default_value_t = 2)]
    pub num_hash_functions: usize,

    /// k-mer length used by the builder.
    #[arg(long, default_value_t = 20)]
    pub k: usize,

    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

pub fn run(args: LayoutArgs) -> Result<(), HibfError> {
    let start = Instant::now();

    eprintln!("Reading k-mer counts from {}", args.input.display());
    let (filenames, counts) = read_counts(&args.input)?;
    if filenames.is_empty() {
        return Err(HibfError::EmptyInput);
    }

    let config = PackConfig::new(
        args.bins,
        args.alpha,
        args.false_positive_rate,
        args.num_hash_functions,
        args.k,
    )?;

    eprintln!(
        "Laying out {} user bins into {} technical bins",
        filenames.len(),
        args.bins
    );
    let binning = HierarchicalBinning::new(filenames, counts, config)?;
    let output = binning.execute()?;

    std::fs::write(&args.output, output.to_text())?;

    eprintln!(
        "Wrote layout ({} records, max_bin_id {}) to {} in {:?}",
        output.records.len(),
        output.max_bin_id,
        args.output.display(),
        start.elapsed()
    );
    Ok(())
}

fn read_counts(path: &std::path::Path) -> Result<(Vec<String>, Vec<u64>), HibfError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(file);

    let mut filenames = Vec::new();
    let mut counts = Vec::new();
    for (line_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() < 2 {
            eprintln!(
                "Warning: skipping line {} - expected 2 fields",
                line_no + 1
            );
            continue;
        }
        filenames.push(record.get(0).unwrap().to_string());
        counts.push(record.get(1).unwrap().parse()?);
    }
    Ok((filenames, counts))
}
