// index.rs
//
// On-disk persistence for a built hierarchical index: the layout tree plus
// every constructed IBF, serialized together with bincode behind a magic
// header so stray files are rejected early instead of failing deep inside
// deserialization.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::build::builder::BuiltIbf;
use crate::build::ibf::InterleavedBloomFilter;
use crate::error::HibfError;
use crate::layout::LayoutTree;

const MAGIC: [u8; 4] = *b"HIBF";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredIbf {
    node_id: usize,
    depth: usize,
    ibf: InterleavedBloomFilter,
    ibf_mapping: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct StoredIndex {
    tree: LayoutTree,
    ibfs: Vec<StoredIbf>,
}

/// A fully built hierarchical index, ready to be saved or loaded as a single
/// file.
pub struct HibfIndex {
    pub tree: LayoutTree,
    pub ibfs: Vec<Option<BuiltIbf>>,
}

impl HibfIndex {
    pub fn save(&self, path: &Path) -> Result<(), HibfError> {
        let stored = StoredIndex {
            tree: self.tree.clone(),
            ibfs: self
                .ibfs
                .iter()
                .filter_map(|slot| slot.as_ref())
                .map(|built| StoredIbf {
                    node_id: built.node_id,
                    depth: built.depth,
                    ibf: built.ibf.clone(),
                    ibf_mapping: built.ibf_mapping.clone(),
                })
                .collect(),
        };

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, &stored)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, HibfError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(HibfError::InvalidConfig(format!(
                "not a hibf index file: {}",
                path.display()
            )));
        }
        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(HibfError::InvalidConfig(format!(
                "unsupported hibf index format version {version}"
            )));
        }

        let stored: StoredIndex = bincode::deserialize_from(&mut reader)?;
        let mut ibfs: Vec<Option<BuiltIbf>> = (0..stored.tree.nodes.len()).map(|_| None).collect();
        for stored_ibf in stored.ibfs {
            ibfs[stored_ibf.node_id] = Some(BuiltIbf {
                node_id: stored_ibf.node_id,
                depth: stored_ibf.depth,
                ibf: stored_ibf.ibf,
                ibf_mapping: stored_ibf.ibf_mapping,
            });
        }

        Ok(Self {
            tree: stored.tree,
            ibfs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ibf::InterleavedBloomFilter;
    use crate::layout::IbfNode;
    use indexmap::IndexMap;

    #[test]
    fn round_trips_through_save_and_load() {
        let root = IbfNode {
            depth: 0,
            number_of_technical_bins: 1,
            max_bin_index: 0,
            favourite_child: None,
            remaining_records: Vec::new(),
            children: IndexMap::new(),
            technical_bin_sizes: IndexMap::new(),
        };
        let tree = LayoutTree {
            nodes: vec![root],
            root: 0,
        };
        let index = HibfIndex {
            tree,
            ibfs: vec![Some(BuiltIbf {
                node_id: 0,
                depth: 0,
                ibf: InterleavedBloomFilter::new(1, 64, 2),
                ibf_mapping: vec![0],
            })],
        };

        let dir = crate::test_utils::test_utils::TestDir::new("hibf_index_round_trip").unwrap();
        let path = dir.path().join("out.hibf");
        index.save(&path).unwrap();
        let loaded = HibfIndex::load(&path).unwrap();

        assert_eq!(loaded.tree.nodes.len(), 1);
        assert!(loaded.ibfs[0].is_some());
        assert_eq!(loaded.ibfs[0].as_ref().unwrap().ibf_mapping, vec![0]);
    }

    #[test]
    fn rejects_file_missing_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.hibf");
        std::fs::write(&path, b"not a hibf file").unwrap();
        assert!(HibfIndex::load(&path).is_err());
    }
}
