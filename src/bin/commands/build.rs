// bin/commands/build.rs

use clap::Args;
use hibf::error::HibfError;
use hibf::{BuildConfig, HibfIndex, IbfBuilder, LayoutReader};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args)]
pub struct BuildArgs {
    /// Layout file produced by `hibf layout`.
    #[arg(long, value_name = "FILE")]
    pub layout: PathBuf,

    /// Directory sequence filenames in the layout are resolved relative to.
    #[arg(long, default_value = ".")]
    pub input_dir: PathBuf,

    #[arg(long, default_value_t = 20)]
    pub k: usize,

    #[arg(long = "fpr", default_value_t = 0.05)]
    pub false_positive_rate: f64,

    #[arg(long = "hashes", default_value_t = 2)]
    pub num_hash_functions: usize,

    /// Optional path to serialize the built index with bincode.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: BuildArgs) -> Result<(), HibfError> {
    let start = Instant::now();

    eprintln!("Parsing layout from {}", args.layout.display());
    let text = std::fs::read_to_string(&args.layout)?;
    let tree = LayoutReader::parse(&text)?;

    let config = BuildConfig {
        k: args.k,
        false_positive_rate: args.false_positive_rate,
        num_hash_functions: args.num_hash_functions,
        seed: None,
    };

    let pb = ProgressBar::new(tree.nodes.len() as u64).with_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue}⟩ {pos}/{len} ibfs")?
            .progress_chars("=> "),
    );

    let builder = IbfBuilder::new(&tree, config, &args.input_dir)?;
    let hierarchy = builder.build()?;
    pb.set_position(hierarchy.ibfs.iter().filter(|slot| slot.is_some()).count() as u64);
    pb.finish_with_message("Build complete!");

    for built in hierarchy.ibfs.iter().flatten() {
        eprintln!(
            "  node {} (depth {}): {} bins x {} bits",
            built.node_id,
            built.depth,
            built.ibf.bin_count(),
            built.ibf.bin_bits()
        );
    }

    if let Some(output) = args.output {
        let index = HibfIndex {
            tree,
            ibfs: hierarchy.ibfs,
        };
        index.save(&output)?;
        eprintln!("Serialized index to {}", output.display());
    }

    eprintln!("Built HIBF in {:?}", start.elapsed());
    Ok(())
}
