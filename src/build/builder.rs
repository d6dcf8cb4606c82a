// build/builder.rs
//
// Post-order construction of the whole IBF hierarchy from a parsed layout
// tree. Each node's own IBF is sized from the *real* max-bin k-mer
// cardinality (spec.md §4.4 steps 1-2) — hashed from actual sequence data,
// never from the layout's `est_max_tb_sizes` estimate — then filled by
// inserting those hashes plus every other technical bin's content. A merged
// technical bin carries the union of every user bin nested beneath it, since
// a hit anywhere in that subtree must register as a hit on the merged bin.

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::build::ibf::{compute_bin_size, InterleavedBloomFilter};
use crate::build::kmer::collect_kmer_hashes;
use crate::config::BuildConfig;
use crate::error::HibfError;
use crate::layout::{LayoutRecord, LayoutTree};
use crate::seq;

/// One constructed IBF, keyed by its originating layout-tree node id.
///
/// `ibf_mapping` is spec.md §4.4's per-IBF mapping table: `ibf_mapping[b]`
/// names the index into the hierarchy's `ibfs` array (here, a layout node
/// id — see the root-reservation note on [`IbfHierarchy`]) reachable from
/// technical bin `b`, or this IBF's own index if `b` is a split/leaf bin.
#[derive(Debug)]
pub struct BuiltIbf {
    pub node_id: usize,
    pub depth: usize,
    pub ibf: InterleavedBloomFilter,
    pub ibf_mapping: Vec<usize>,
}

/// The full set of IBFs making up a hierarchical index. Indexed by layout
/// node id, so the root is always at `ibfs[0]` (the tree's root is always
/// node 0; see [`crate::layout::reader::LayoutReader`]) — this is the
/// pre-reservation reading of spec.md §4.4's root special case, rather than
/// appending the root last and shifting every other index.
#[derive(Debug, Default)]
pub struct IbfHierarchy {
    pub ibfs: Vec<Option<BuiltIbf>>,
}

impl IbfHierarchy {
    pub fn root(&self) -> &BuiltIbf {
        self.ibfs[0]
            .as_ref()
            .expect("root IBF must always be built")
    }

    pub fn get(&self, node_id: usize) -> Option<&BuiltIbf> {
        self.ibfs.get(node_id).and_then(|slot| slot.as_ref())
    }

    /// Walks `ibf_mapping` from the root, following every technical bin that
    /// names a different IBF than its own, and returns the set of node ids
    /// reached. Used to check testable property #6 (spec.md §8): every
    /// built IBF must be reachable exactly once this way.
    pub fn reachable_from_root(&self) -> FxHashSet<usize> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![0usize];
        while let Some(node_id) = stack.pop() {
            if !seen.insert(node_id) {
                continue;
            }
            if let Some(built) = self.get(node_id) {
                for &target in &built.ibf_mapping {
                    if target != node_id {
                        stack.push(target);
                    }
                }
            }
        }
        seen
    }
}

/// Builds every IBF described by a [`LayoutTree`] from sequence files rooted
/// at `input_root`.
pub struct IbfBuilder<'a> {
    tree: &'a LayoutTree,
    config: BuildConfig,
    input_root: &'a Path,
}

impl<'a> IbfBuilder<'a> {
    pub fn new(
        tree: &'a LayoutTree,
        config: BuildConfig,
        input_root: &'a Path,
    ) -> Result<Self, HibfError> {
        config.validate()?;
        Ok(Self {
            tree,
            config,
            input_root,
        })
    }

    pub fn build(&self) -> Result<IbfHierarchy, HibfError> {
        info!(nodes = self.tree.nodes.len(), "starting ibf construction");
        let mut hierarchy = IbfHierarchy {
            ibfs: (0..self.tree.nodes.len()).map(|_| None).collect(),
        };
        self.build_node(self.tree.root, &mut hierarchy)?;
        let built = hierarchy.ibfs.iter().filter(|slot| slot.is_some()).count();
        info!(built, "ibf construction done");
        Ok(hierarchy)
    }

    /// Builds `node_id` and everything beneath it, returning the union of
    /// k-mer hashes across all user bins in its subtree, for the parent to
    /// insert into its own merged technical bin.
    fn build_node(
        &self,
        node_id: usize,
        hierarchy: &mut IbfHierarchy,
    ) -> Result<FxHashSet<u64>, HibfError> {
        let node = self.tree.node(node_id).clone();
        let depth = node.depth;
        debug!(node_id, depth, "building ibf node");

        // Step 1: compute the real max-bin k-mers before sizing anything.
        let (max_bin_kmers, number_of_max_bin_tbs) = if let Some(fav_id) = node.favourite_child {
            let set = self.build_node(fav_id, hierarchy)?;
            (set, 1usize)
        } else {
            let max_record = node
                .remaining_records
                .iter()
                .find(|record| record_covers_bin(record, depth, node.max_bin_index))
                .ok_or_else(|| {
                    HibfError::MalformedLayout {
                        line: 0,
                        reason: format!(
                            "max_bin_index {} at node {node_id} has no occupant",
                            node.max_bin_index
                        ),
                    }
                })?;
            let tbs = record_span(max_record, depth);
            let hashes = self.hash_record(max_record)?;
            (hashes, tbs)
        };

        // Step 2: size the IBF from that real cardinality, not the layout estimate.
        let per_bin_cardinality = (max_bin_kmers.len() as u64).div_ceil(number_of_max_bin_tbs as u64);
        let bin_bits = compute_bin_size(
            self.config.false_positive_rate,
            self.config.num_hash_functions,
            per_bin_cardinality,
        );
        let bin_count = node.number_of_technical_bins.max(1);
        if max_bin_kmers.is_empty() {
            warn!(node_id, "max bin carries no k-mers; sizing IBF at the empty-set floor");
        }
        let mut ibf =
            InterleavedBloomFilter::new(bin_count, bin_bits, self.config.num_hash_functions);

        // Step 3: insert the max bin's k-mers, split across its technical bins.
        insert_split(&mut ibf, max_bin_kmers.clone(), node.max_bin_index, number_of_max_bin_tbs);

        // Step 4: merge into the running total, then the max-bin set is done.
        let mut own_total = max_bin_kmers;

        // Step 5: every non-favourite child.
        for (&local_bin, &child_id) in &node.children {
            if Some(child_id) == node.favourite_child {
                continue;
            }
            let set = self.build_node(child_id, hierarchy)?;
            for &hash in &set {
                ibf.emplace(hash, local_bin);
            }
            own_total.extend(set.iter().copied());
        }

        // Step 6: every remaining record other than the one already inserted as the max bin.
        for record in &node.remaining_records {
            if node.favourite_child.is_none() && record_covers_bin(record, depth, node.max_bin_index) {
                continue;
            }
            let start = record.bin_indices[depth];
            let span = record_span(record, depth);
            let hashes = self.hash_record(record)?;
            own_total.extend(hashes.iter().copied());
            insert_split(&mut ibf, hashes, start, span);
        }

        // Step 7: append, then fill in ibf_mapping. Positions are node ids directly
        // (root pre-reserved at 0), so "the just-appended index" is simply `node_id`.
        let mut ibf_mapping = vec![node_id; bin_count];
        for (&local_bin, &child_id) in &node.children {
            if local_bin < ibf_mapping.len() {
                ibf_mapping[local_bin] = child_id;
            }
        }

        debug!(node_id, bin_bits, bin_count, "finished ibf node");
        hierarchy.ibfs[node_id] = Some(BuiltIbf {
            node_id,
            depth,
            ibf,
            ibf_mapping,
        });

        Ok(own_total)
    }

    fn hash_record(&self, record: &LayoutRecord) -> Result<FxHashSet<u64>, HibfError> {
        let mut hashes = FxHashSet::default();
        for filename in &record.filenames {
            let path = self.input_root.join(filename);
            for sequence in seq::read_sequences(&path)? {
                collect_kmer_hashes(&sequence, self.config.k, &mut hashes);
            }
        }
        Ok(hashes)
    }
}

/// Whether `record`'s span at `depth` contains technical bin `bin`.
fn record_covers_bin(record: &LayoutRecord, depth: usize, bin: usize) -> bool {
    let start = record.bin_indices[depth];
    let span = record_span(record, depth);
    bin >= start && bin < start + span
}

fn record_span(record: &LayoutRecord, depth: usize) -> usize {
    record.number_of_bins[depth].max(1)
}

/// Distributes a user bin's k-mer hashes across `span` consecutive technical
/// bins starting at `start`. Sorting first keeps the distribution
/// deterministic across runs and platforms, since `FxHashSet` iteration
/// order is not (spec.md §9 Design Notes, option (a)).
fn insert_split(ibf: &mut InterleavedBloomFilter, hashes: FxHashSet<u64>, start: usize, span: usize) {
    if span <= 1 {
        for hash in hashes {
            ibf.emplace(hash, start);
        }
        return;
    }
    let mut sorted: Vec<u64> = hashes.into_iter().collect();
    sorted.sort_unstable();
    for (i, hash) in sorted.into_iter().enumerate() {
        ibf.emplace(hash, start + i % span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackConfig;
    use crate::layout::{HierarchicalBinning, LayoutReader};
    use std::io::Write;

    fn write_fasta(dir: &Path, name: &str, sequences: &[&str]) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for (i, seq) in sequences.iter().enumerate() {
            writeln!(file, ">r{i}").unwrap();
            writeln!(file, "{seq}").unwrap();
        }
        name.to_string()
    }

    #[test]
    fn builds_one_ibf_per_layout_node() {
        let dir = tempfile::tempdir().unwrap();
        let names = vec![
            write_fasta(dir.path(), "a.fa", &["ACGTACGTACGTACGTACGTA"]),
            write_fasta(dir.path(), "b.fa", &["TTTTGGGGCCCCAAAATTTTG"]),
        ];
        let counts = vec![10u64, 10u64];
        let config = PackConfig {
            bins: 2,
            k: 4,
            ..PackConfig::default()
        };
        let binning = HierarchicalBinning::new(names, counts, config.clone()).unwrap();
        let layout = binning.execute().unwrap();
        let tree = LayoutReader::parse(&layout.to_text()).unwrap();

        let build_config = crate::config::BuildConfig::from_pack_config(&config);
        let builder = IbfBuilder::new(&tree, build_config, dir.path()).unwrap();
        let hierarchy = builder.build().unwrap();

        assert!(hierarchy.get(tree.root).is_some());
        assert_eq!(hierarchy.root().ibf.bin_count(), tree.node(tree.root).number_of_technical_bins.max(1));
    }

    #[test]
    fn merged_group_shares_kmers_across_members() {
        let dir = tempfile::tempdir().unwrap();
        let mut names = Vec::new();
        let mut counts = Vec::new();
        for i in 0..8 {
            let seq = "ACGTACGTACGTACGTACGTACGT".to_string() + &"A".repeat(i);
            names.push(write_fasta(dir.path(), &format!("s{i}.fa"), &[&seq]));
            counts.push(20u64);
        }
        let config = PackConfig {
            bins: 2,
            k: 4,
            ..PackConfig::default()
        };
        let binning = HierarchicalBinning::new(names, counts, config.clone()).unwrap();
        let layout = binning.execute().unwrap();
        let tree = LayoutReader::parse(&layout.to_text()).unwrap();

        let build_config = crate::config::BuildConfig::from_pack_config(&config);
        let builder = IbfBuilder::new(&tree, build_config, dir.path()).unwrap();
        let hierarchy = builder.build().unwrap();

        // At least one merged child IBF must have been built alongside the root.
        assert!(hierarchy.ibfs.iter().filter(|slot| slot.is_some()).count() >= 2);
    }

    #[test]
    fn ibf_size_tracks_real_kmer_cardinality_not_the_layout_estimate() {
        // Two leaf-only bins where the real k-mer content is far larger than the
        // (deliberately wrong) kmer_counts estimate fed to the DP: the bin sizing
        // must come from the hashed sequence data, so a generously-sized bin is
        // produced even though the layout estimate alone would undersize it.
        let dir = tempfile::tempdir().unwrap();
        let long_seq: String = "ACGT".repeat(200);
        let names = vec![
            write_fasta(dir.path(), "big.fa", &[&long_seq]),
            write_fasta(dir.path(), "small.fa", &["ACGTACGT"]),
        ];
        let counts = vec![1u64, 1u64]; // wildly underestimated on purpose
        let config = PackConfig {
            bins: 2,
            k: 4,
            ..PackConfig::default()
        };
        let binning = HierarchicalBinning::new(names, counts, config.clone()).unwrap();
        let layout = binning.execute().unwrap();
        let tree = LayoutReader::parse(&layout.to_text()).unwrap();

        let build_config = crate::config::BuildConfig::from_pack_config(&config);
        let builder = IbfBuilder::new(&tree, build_config, dir.path()).unwrap();
        let hierarchy = builder.build().unwrap();

        let from_estimate = compute_bin_size(0.05, 2, 1);
        assert!(
            hierarchy.root().ibf.bin_bits() > from_estimate,
            "bin sized from the stale layout estimate ({from_estimate} bits) instead of real k-mer content"
        );
    }

    #[test]
    fn ibf_mapping_reaches_every_built_ibf_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut names = Vec::new();
        let mut counts = Vec::new();
        for i in 0..8 {
            let seq = "ACGTACGTACGTACGTACGTACGT".to_string() + &"A".repeat(i);
            names.push(write_fasta(dir.path(), &format!("s{i}.fa"), &[&seq]));
            counts.push(20u64);
        }
        let config = PackConfig {
            bins: 2,
            k: 4,
            ..PackConfig::default()
        };
        let binning = HierarchicalBinning::new(names, counts, config.clone()).unwrap();
        let layout = binning.execute().unwrap();
        let tree = LayoutReader::parse(&layout.to_text()).unwrap();

        let build_config = crate::config::BuildConfig::from_pack_config(&config);
        let builder = IbfBuilder::new(&tree, build_config, dir.path()).unwrap();
        let hierarchy = builder.build().unwrap();

        let built_ids: FxHashSet<usize> = hierarchy
            .ibfs
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
            .collect();
        let reached = hierarchy.reachable_from_root();
        assert_eq!(reached, built_ids, "ibf_mapping must reach every built ibf exactly once");

        for built in hierarchy.ibfs.iter().flatten() {
            assert_eq!(built.ibf_mapping.len(), built.ibf.bin_count());
            for &target in &built.ibf_mapping {
                assert!(
                    built_ids.contains(&target),
                    "ibf_mapping entry {target} is not a valid ibfs index"
                );
            }
        }
    }
}
