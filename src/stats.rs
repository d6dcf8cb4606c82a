// stats.rs
//
// Summary statistics over a built hierarchical index, in the spirit of the
// teacher's BinningStats: a structure worth inspecting on its own, plus a
// human-readable report for the CLI.

use serde::{Deserialize, Serialize};

use crate::index::HibfIndex;

#[derive(Debug, Serialize, Deserialize)]
pub struct LevelStats {
    pub depth: usize,
    pub ibf_count: usize,
    pub total_technical_bins: usize,
    pub avg_bin_bits: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HibfStats {
    pub total_ibfs: usize,
    pub total_user_bins: usize,
    pub max_depth: usize,
    pub level_stats: Vec<LevelStats>,
}

impl HibfStats {
    pub fn analyze(index: &HibfIndex) -> Self {
        let built: Vec<_> = index.ibfs.iter().filter_map(|slot| slot.as_ref()).collect();
        let max_depth = built.iter().map(|b| b.depth).max().unwrap_or(0);

        let mut level_stats = Vec::new();
        for depth in 0..=max_depth {
            let at_depth: Vec<_> = built.iter().filter(|b| b.depth == depth).collect();
            if at_depth.is_empty() {
                continue;
            }
            let total_bins: usize = at_depth.iter().map(|b| b.ibf.bin_count()).sum();
            let avg_bits = at_depth.iter().map(|b| b.ibf.bin_bits() as f64).sum::<f64>()
                / at_depth.len() as f64;
            level_stats.push(LevelStats {
                depth,
                ibf_count: at_depth.len(),
                total_technical_bins: total_bins,
                avg_bin_bits: avg_bits,
            });
        }

        let total_user_bins = index
            .tree
            .nodes
            .iter()
            .map(|node| node.remaining_records.len())
            .sum();

        Self {
            total_ibfs: built.len(),
            total_user_bins,
            max_depth,
            level_stats,
        }
    }

    pub fn print_summary(&self) {
        eprintln!("Total IBFs:      {}", self.total_ibfs);
        eprintln!("Total user bins: {}", self.total_user_bins);
        eprintln!("Max depth:       {}", self.max_depth);
        for level in &self.level_stats {
            eprintln!(
                "  depth {}: {} ibf(s), {} technical bins, avg {:.1} bits/bin",
                level.depth, level.ibf_count, level.total_technical_bins, level.avg_bin_bits
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::builder::BuiltIbf;
    use crate::build::ibf::InterleavedBloomFilter;
    use crate::layout::{IbfNode, LayoutTree};
    use indexmap::IndexMap;

    #[test]
    fn analyzes_single_node_index() {
        let root = IbfNode {
            depth: 0,
            number_of_technical_bins: 1,
            max_bin_index: 0,
            favourite_child: None,
            remaining_records: Vec::new(),
            children: IndexMap::new(),
            technical_bin_sizes: IndexMap::new(),
        };
        let index = HibfIndex {
            tree: LayoutTree {
                nodes: vec![root],
                root: 0,
            },
            ibfs: vec![Some(BuiltIbf {
                node_id: 0,
                depth: 0,
                ibf: InterleavedBloomFilter::new(1, 64, 2),
                ibf_mapping: vec![0],
            })],
        };
        let stats = HibfStats::analyze(&index);
        assert_eq!(stats.total_ibfs, 1);
        assert_eq!(stats.max_depth, 0);
    }
}
