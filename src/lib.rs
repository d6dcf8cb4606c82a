pub mod build;
pub mod config;
pub mod error;
pub mod fp_correction;
pub mod index;
pub mod layout;
pub mod seq;
pub mod stats;

pub use build::{BuiltIbf, IbfBuilder, IbfHierarchy, InterleavedBloomFilter};
pub use config::{BuildConfig, PackConfig};
pub use error::HibfError;
pub use fp_correction::FpCorrection;
pub use index::HibfIndex;
pub use layout::{HierarchicalBinning, IbfNode, LayoutOutput, LayoutReader, LayoutRecord, LayoutTree};
pub use stats::HibfStats;

#[cfg(test)]
pub(crate) mod test_utils;
