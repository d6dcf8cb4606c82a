// layout/binning.rs
//
// Dynamic-programming layout of user bins into a hierarchy of IBFs.
//
// `M[i][j]` holds the minimum achievable max-technical-bin cardinality when
// placing the first `i` (cardinality-sorted) user bins into the first `j`
// technical bins; `choice[i][j]` records which option attained it so the
// layout can be reconstructed by tracing back from `M[n][t]`.
//
// Technical-bin indices within a level are not the DP's column indices —
// traceback walks from the tail of the sorted bin list toward its head, and
// the bin-index assigned to each discovered placement is the order in which
// it was discovered (the first placement found, covering the smallest-
// cardinality tail of the sorted list, becomes technical bin 0).

use tracing::info;

use crate::config::PackConfig;
use crate::error::HibfError;
use crate::fp_correction::FpCorrection;
use crate::layout::record::LayoutRecord;

const COST_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutOutput {
    /// `#MERGED_BIN_<id> max_bin_id:<b>` lines for every merged bin discovered
    /// at or below this level, in traceback (ascending bin-index) order.
    pub headers: Vec<String>,
    pub records: Vec<LayoutRecord>,
    pub max_bin_id: usize,
}

impl LayoutOutput {
    /// Renders the full layout file text for this output treated as the root
    /// (high-level) IBF: `self.headers`, then the `#HIGH_LEVEL_IBF` line, the
    /// column header, and one line per record.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for header in &self.headers {
            text.push_str(header);
            text.push('\n');
        }
        text.push_str(&format!("#HIGH_LEVEL_IBF max_bin_id:{}\n", self.max_bin_id));
        text.push_str(crate::layout::record::FILES_HEADER);
        text.push('\n');
        for record in &self.records {
            text.push_str(&record.to_line());
            text.push('\n');
        }
        text
    }
}

/// Computes the hierarchical binning layout for a set of user bins.
pub struct HierarchicalBinning {
    filenames: Vec<String>,
    kmer_counts: Vec<u64>,
    extra_info: Vec<Option<String>>,
    config: PackConfig,
}

impl HierarchicalBinning {
    pub fn new(
        filenames: Vec<String>,
        kmer_counts: Vec<u64>,
        config: PackConfig,
    ) -> Result<Self, HibfError> {
        let extra_info = vec![None; filenames.len()];
        Self::with_extra_info(filenames, kmer_counts, extra_info, config)
    }

    /// Same as [`Self::new`], additionally carrying a `UserBin.extra_info`
    /// (spec.md §3) alongside each filename/cardinality pair. `extra_info`
    /// has no column in the textual layout grammar (§6), so it is only
    /// visible to in-process consumers of the produced `LayoutRecord`s, not
    /// to anything that goes through `LayoutReader`.
    pub fn with_extra_info(
        filenames: Vec<String>,
        kmer_counts: Vec<u64>,
        extra_info: Vec<Option<String>>,
        config: PackConfig,
    ) -> Result<Self, HibfError> {
        config.validate()?;
        if filenames.len() != kmer_counts.len() || filenames.len() != extra_info.len() {
            return Err(HibfError::InvalidConfig(
                "filenames, kmer_counts and extra_info must have the same length".to_string(),
            ));
        }
        Ok(Self {
            filenames,
            kmer_counts,
            extra_info,
            config,
        })
    }

    /// Runs the layout algorithm and returns the root-level output.
    pub fn execute(&self) -> Result<LayoutOutput, HibfError> {
        info!(user_bins = self.filenames.len(), bins = self.config.bins, "starting hierarchical binning");
        let output = layout_level(&self.filenames, &self.kmer_counts, &self.extra_info, &self.config)?;
        info!(records = output.records.len(), max_bin_id = output.max_bin_id, "hierarchical binning done");
        Ok(output)
    }
}

#[derive(Clone, Copy, Debug)]
enum Choice {
    Split { s: usize },
    Merge { i_prime: usize },
}

enum Discovered {
    Split { sorted_idx: usize, s: usize },
    Merge { start: usize, end: usize },
}

/// Layout for one level of the hierarchy: sorts the given user bins, runs the
/// DP, traces back a placement, and recurses into merged groups.
fn layout_level(
    filenames: &[String],
    kmer_counts: &[u64],
    extra_info: &[Option<String>],
    config: &PackConfig,
) -> Result<LayoutOutput, HibfError> {
    let n = filenames.len();
    let t = config.bins;

    if n == 0 || t < 1 {
        return Ok(LayoutOutput::default());
    }

    let mut order: Vec<usize> = (0..n).collect();
    if config.sort_bins {
        order.sort_by(|&a, &b| kmer_counts[b].cmp(&kmer_counts[a]));
    }
    let sorted_names: Vec<&String> = order.iter().map(|&i| &filenames[i]).collect();
    let sorted_counts: Vec<u64> = order.iter().map(|&i| kmer_counts[i]).collect();
    let sorted_extra: Vec<&Option<String>> = order.iter().map(|&i| &extra_info[i]).collect();

    let mut prefix = vec![0u64; n + 1];
    for i in 0..n {
        prefix[i + 1] = prefix[i] + sorted_counts[i];
    }

    let fp = FpCorrection::compute(config.false_positive_rate, config.num_hash_functions, t)?;

    let neg_inf = f64::INFINITY;
    let mut m = vec![vec![neg_inf; t + 1]; n + 1];
    let mut choice: Vec<Vec<Option<Choice>>> = vec![vec![None; t + 1]; n + 1];
    for j in 0..=t {
        m[0][j] = 0.0;
    }

    for i in 1..=n {
        for j in 1..=t {
            let mut best_cost = f64::INFINITY;
            let mut best_priority = (u8::MAX, usize::MAX);
            let mut best_choice: Option<Choice> = None;

            // Split option: user bin i alone, split across s = j - j' bins.
            if i - 1 < j {
                for jp in (i - 1)..j {
                    let prev = m[i - 1][jp];
                    if prev.is_infinite() {
                        continue;
                    }
                    let s = j - jp;
                    let cost = split_size(sorted_counts[i - 1], s, &fp);
                    let candidate = prev.max(cost);
                    let priority = (0u8, s);
                    consider(
                        &mut best_cost,
                        &mut best_priority,
                        &mut best_choice,
                        candidate,
                        priority,
                        Choice::Split { s },
                    );
                }
            }

            // Merge option: user bins (i', i] combined into one technical bin.
            for i_prime in 0..i {
                let prev = m[i_prime][j - 1];
                if prev.is_infinite() {
                    continue;
                }
                let merged = prefix[i] - prefix[i_prime];
                let candidate = prev.max(config.alpha * merged as f64);
                let priority = (1u8, i - i_prime);
                consider(
                    &mut best_cost,
                    &mut best_priority,
                    &mut best_choice,
                    candidate,
                    priority,
                    Choice::Merge { i_prime },
                );
            }

            m[i][j] = best_cost;
            choice[i][j] = best_choice;
        }
    }

    if m[n][t].is_infinite() {
        return Err(HibfError::SizeOverflow(format!(
            "no valid placement of {n} user bins into {t} technical bins"
        )));
    }

    let mut discovered = Vec::new();
    let (mut i, mut j) = (n, t);
    while i > 0 {
        match choice[i][j].expect("DP cell reachable from M[n][t] must have a recorded choice") {
            Choice::Split { s } => {
                discovered.push(Discovered::Split {
                    sorted_idx: i - 1,
                    s,
                });
                i -= 1;
                j -= s;
            }
            Choice::Merge { i_prime } => {
                discovered.push(Discovered::Merge {
                    start: i_prime,
                    end: i,
                });
                i = i_prime;
                j -= 1;
            }
        }
    }

    let mut headers = Vec::new();
    let mut records = Vec::new();
    let mut max_bin_id = 0usize;
    let mut max_bin_own_size: Option<f64> = None;
    let mut bin_cursor = 0usize;

    for placement in discovered {
        let bin_index = bin_cursor;
        match placement {
            Discovered::Split { sorted_idx, s } => {
                let count = sorted_counts[sorted_idx];
                let own_size = (count as f64 / s as f64).ceil();
                records.push(LayoutRecord {
                    filenames: vec![sorted_names[sorted_idx].clone()],
                    bin_indices: vec![bin_index],
                    number_of_bins: vec![s],
                    est_max_tb_sizes: vec![own_size as u64],
                    extra_info: sorted_extra[sorted_idx].clone(),
                });
                update_max_bin(&mut max_bin_id, &mut max_bin_own_size, bin_index, own_size);
                bin_cursor += s;
            }
            Discovered::Merge { start, end } => {
                let child_names: Vec<String> = sorted_names[start..end]
                    .iter()
                    .map(|s| (*s).clone())
                    .collect();
                let child_counts: Vec<u64> = sorted_counts[start..end].to_vec();
                let child_extra: Vec<Option<String>> = sorted_extra[start..end]
                    .iter()
                    .map(|e| (*e).clone())
                    .collect();
                let merged_sum = prefix[end] - prefix[start];

                let inner = layout_level(
                    &child_names,
                    &child_counts,
                    &child_extra,
                    &config.for_merged_level(),
                )?;

                for header in &inner.headers {
                    headers.push(header.clone());
                }
                headers.push(format!(
                    "#MERGED_BIN_{bin_index} max_bin_id:{}",
                    inner.max_bin_id
                ));

                for mut record in inner.records {
                    record.bin_indices.insert(0, bin_index);
                    record.number_of_bins.insert(0, 1);
                    record.est_max_tb_sizes.insert(0, merged_sum);
                    records.push(record);
                }

                update_max_bin(
                    &mut max_bin_id,
                    &mut max_bin_own_size,
                    bin_index,
                    merged_sum as f64,
                );
                bin_cursor += 1;
            }
        }
    }

    Ok(LayoutOutput {
        headers,
        records,
        max_bin_id,
    })
}

fn update_max_bin(
    max_bin_id: &mut usize,
    max_bin_own_size: &mut Option<f64>,
    bin_index: usize,
    own_size: f64,
) {
    let is_larger = match *max_bin_own_size {
        None => true,
        Some(current) => own_size > current,
    };
    if is_larger {
        *max_bin_id = bin_index;
        *max_bin_own_size = Some(own_size);
    }
}

#[allow(clippy::too_many_arguments)]
fn consider(
    best_cost: &mut f64,
    best_priority: &mut (u8, usize),
    best_choice: &mut Option<Choice>,
    candidate_cost: f64,
    candidate_priority: (u8, usize),
    candidate_choice: Choice,
) {
    let strictly_better = candidate_cost < *best_cost - COST_EPSILON;
    let tied_but_preferred =
        (candidate_cost - *best_cost).abs() <= COST_EPSILON && candidate_priority < *best_priority;
    if strictly_better || tied_but_preferred {
        *best_cost = candidate_cost;
        *best_priority = candidate_priority;
        *best_choice = Some(candidate_choice);
    }
}

fn split_size(count: u64, s: usize, fp: &FpCorrection) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (count as f64 / s as f64).ceil() * fp.get(s)
}
