// layout/mod.rs

pub mod binning;
pub mod reader;
pub mod record;

pub use binning::{HierarchicalBinning, LayoutOutput};
pub use reader::{IbfNode, LayoutReader, LayoutTree};
pub use record::LayoutRecord;
