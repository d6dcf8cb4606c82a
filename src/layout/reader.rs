// layout/reader.rs
//
// Parses the textual layout format produced by `HierarchicalBinning` back
// into a tree of `IbfNode`s addressable by arena index.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::HibfError;
use crate::layout::record::LayoutRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IbfNode {
    /// Depth of this node: 0 for the root, 1 for its direct merged children, etc.
    pub depth: usize,
    /// Number of technical bins in this IBF.
    pub number_of_technical_bins: usize,
    /// The technical bin whose contents size this IBF.
    pub max_bin_index: usize,
    /// Arena index of the child occupying `max_bin_index`, if any.
    pub favourite_child: Option<usize>,
    /// Leaf records (full path retained) placed directly in this IBF.
    pub remaining_records: Vec<LayoutRecord>,
    /// parent_bin_index -> child arena index, in discovery order.
    pub children: IndexMap<usize, usize>,
    /// technical_bin_index -> the layout's estimated k-mer cardinality for
    /// that bin at this node's depth, used to size this node's IBF.
    pub technical_bin_sizes: IndexMap<usize, u64>,
}

impl IbfNode {
    /// This node's own local bin index for `record`, i.e. the index into
    /// `record.bin_indices`/`number_of_bins`/`est_max_tb_sizes` describing the
    /// placement at this node's level.
    pub fn local_index(&self, _record: &LayoutRecord) -> usize {
        self.depth
    }

    /// The layout's estimated cardinality of `max_bin_index`, used to size
    /// this node's IBF. Missing entries (an empty node) size as empty.
    pub fn max_bin_est_size(&self) -> u64 {
        self.technical_bin_sizes
            .get(&self.max_bin_index)
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutTree {
    pub nodes: Vec<IbfNode>,
    pub root: usize,
}

impl LayoutTree {
    pub fn node(&self, id: usize) -> &IbfNode {
        &self.nodes[id]
    }
}

struct ParsedHeader {
    local_id: usize,
    max_bin_id: usize,
}

/// Parses layout text into a `LayoutTree`, validating the invariants from the
/// data model (coverage, max-bin placement) as it goes.
pub struct LayoutReader;

impl LayoutReader {
    pub fn parse(text: &str) -> Result<LayoutTree, HibfError> {
        let mut merged_headers: Vec<ParsedHeader> = Vec::new();
        let mut root_max_bin_id: Option<usize> = None;
        let mut record_lines: Vec<(usize, &str)> = Vec::new();

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("#FILES") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("#HIGH_LEVEL_IBF ") {
                root_max_bin_id = Some(parse_max_bin_id(rest, line_no + 1)?);
                continue;
            }
            if let Some(rest) = line.strip_prefix("#MERGED_BIN_") {
                let (id_str, tail) = rest.split_once(' ').ok_or_else(|| HibfError::MalformedLayout {
                    line: line_no + 1,
                    reason: "malformed MERGED_BIN header".to_string(),
                })?;
                let local_id: usize = id_str.parse().map_err(|_| HibfError::MalformedLayout {
                    line: line_no + 1,
                    reason: format!("invalid MERGED_BIN id '{id_str}'"),
                })?;
                let max_bin_id = parse_max_bin_id(tail, line_no + 1)?;
                merged_headers.push(ParsedHeader { local_id, max_bin_id });
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            record_lines.push((line_no + 1, line));
        }

        if record_lines.is_empty() {
            let root = IbfNode {
                depth: 0,
                number_of_technical_bins: 0,
                max_bin_index: root_max_bin_id.unwrap_or(0),
                favourite_child: None,
                remaining_records: Vec::new(),
                children: IndexMap::new(),
                technical_bin_sizes: IndexMap::new(),
            };
            return Ok(LayoutTree {
                nodes: vec![root],
                root: 0,
            });
        }

        let mut nodes: Vec<IbfNode> = vec![IbfNode {
            depth: 0,
            number_of_technical_bins: 0,
            max_bin_index: 0,
            favourite_child: None,
            remaining_records: Vec::new(),
            children: IndexMap::new(),
            technical_bin_sizes: IndexMap::new(),
        }];
        let mut path_to_node: IndexMap<Vec<usize>, usize> = IndexMap::new();
        path_to_node.insert(Vec::new(), 0);
        let mut header_queue = merged_headers.into_iter();

        for (line_no, line) in record_lines {
            let record = LayoutRecord::parse_line(line, line_no)?;
            let depth = record.bin_indices.len();
            if depth == 0 || record.number_of_bins.len() != depth || record.est_max_tb_sizes.len() != depth {
                return Err(HibfError::MalformedLayout {
                    line: line_no,
                    reason: "record path arrays must be non-empty and equal length".to_string(),
                });
            }

            // Ensure every ancestor node along this record's path exists.
            for level in 0..depth - 1 {
                let path: Vec<usize> = record.bin_indices[..=level].to_vec();
                if path_to_node.contains_key(&path) {
                    continue;
                }
                let parent_path = &path[..path.len() - 1];
                let parent_id = *path_to_node
                    .get(parent_path)
                    .expect("parent path must already exist by construction");
                let local_bin_index = path[path.len() - 1];

                let header = header_queue.next().ok_or_else(|| HibfError::MalformedLayout {
                    line: line_no,
                    reason: "more merged bins referenced than header lines provided".to_string(),
                })?;
                if header.local_id != local_bin_index {
                    return Err(HibfError::MalformedLayout {
                        line: line_no,
                        reason: format!(
                            "MERGED_BIN header id {} does not match referencing bin index {local_bin_index}",
                            header.local_id
                        ),
                    });
                }

                let child_id = nodes.len();
                nodes.push(IbfNode {
                    depth: level + 1,
                    number_of_technical_bins: 0,
                    max_bin_index: header.max_bin_id,
                    favourite_child: None,
                    remaining_records: Vec::new(),
                    children: IndexMap::new(),
                    technical_bin_sizes: IndexMap::new(),
                });
                nodes[parent_id].children.insert(local_bin_index, child_id);
                nodes[parent_id]
                    .technical_bin_sizes
                    .entry(local_bin_index)
                    .or_insert(record.est_max_tb_sizes[level]);
                path_to_node.insert(path, child_id);
            }

            let leaf_path = &record.bin_indices[..depth - 1];
            let leaf_node_id = *path_to_node
                .get(leaf_path)
                .expect("leaf parent path must exist by construction");
            let leaf_depth = depth - 1;
            let start = record.bin_indices[leaf_depth];
            let span = record.number_of_bins[leaf_depth];
            let est = record.est_max_tb_sizes[leaf_depth];
            for bin in start..start + span {
                nodes[leaf_node_id]
                    .technical_bin_sizes
                    .entry(bin)
                    .or_insert(est);
            }
            nodes[leaf_node_id].remaining_records.push(record);
        }

        nodes[0].max_bin_index = root_max_bin_id.unwrap_or(nodes[0].max_bin_index);

        for node_id in 0..nodes.len() {
            let mut total_bins = nodes[node_id].children.len();
            for record in &nodes[node_id].remaining_records {
                let local_depth = nodes[node_id].depth;
                total_bins += record.number_of_bins[local_depth];
            }
            nodes[node_id].number_of_technical_bins = total_bins;

            if let Some(&child_id) = nodes[node_id].children.get(&nodes[node_id].max_bin_index) {
                nodes[node_id].favourite_child = Some(child_id);
            }
        }

        validate_tree(&nodes)?;

        Ok(LayoutTree { nodes, root: 0 })
    }
}

fn parse_max_bin_id(rest: &str, line_no: usize) -> Result<usize, HibfError> {
    rest.trim()
        .strip_prefix("max_bin_id:")
        .ok_or_else(|| HibfError::MalformedLayout {
            line: line_no,
            reason: "expected 'max_bin_id:<N>'".to_string(),
        })?
        .parse()
        .map_err(|_| HibfError::MalformedLayout {
            line: line_no,
            reason: "max_bin_id is not an integer".to_string(),
        })
}

fn validate_tree(nodes: &[IbfNode]) -> Result<(), HibfError> {
    for node in nodes {
        if node.number_of_technical_bins == 0 {
            continue;
        }
        if node.max_bin_index >= node.number_of_technical_bins {
            return Err(HibfError::MalformedLayout {
                line: 0,
                reason: format!(
                    "max_bin_index {} out of range for {} technical bins",
                    node.max_bin_index, node.number_of_technical_bins
                ),
            });
        }
        let covered_by_max = node.favourite_child.is_some()
            || node
                .remaining_records
                .first()
                .map(|r| r.bin_indices[node.depth] == node.max_bin_index)
                .unwrap_or(false);
        if !covered_by_max {
            return Err(HibfError::MalformedLayout {
                line: 0,
                reason: "max_bin_index is not covered by favourite_child or remaining_records[0]"
                    .to_string(),
            });
        }
    }
    Ok(())
}
