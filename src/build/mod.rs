// build/mod.rs

pub mod builder;
pub mod ibf;
pub mod kmer;

pub use builder::{BuiltIbf, IbfBuilder, IbfHierarchy};
pub use ibf::{compute_bin_size, InterleavedBloomFilter};
pub use kmer::{collect_kmer_hashes, kmer_hashes};
