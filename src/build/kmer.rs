// build/kmer.rs
//
// Ungapped k-mer extraction over the 4-letter nucleotide alphabet, hashed to
// `u64` keys for insertion into an IBF.

use rustc_hash::{FxHashSet, FxHasher};
use std::hash::Hasher;

/// Produces the distinct k-mer hashes found in `sequence`, skipping any
/// window containing a byte outside `ACGTacgt`.
pub fn kmer_hashes(sequence: &[u8], k: usize) -> FxHashSet<u64> {
    let mut out = FxHashSet::default();
    collect_kmer_hashes(sequence, k, &mut out);
    out
}

/// Same as [`kmer_hashes`] but accumulates into an existing set, avoiding a
/// fresh allocation per sequence record.
pub fn collect_kmer_hashes(sequence: &[u8], k: usize, out: &mut FxHashSet<u64>) {
    if k == 0 || sequence.len() < k {
        return;
    }
    for window in sequence.windows(k) {
        if let Some(hash) = hash_window(window) {
            out.insert(hash);
        }
    }
}

fn hash_window(window: &[u8]) -> Option<u64> {
    let mut hasher = FxHasher::default();
    for &byte in window {
        if !is_acgt(byte) {
            return None;
        }
        hasher.write_u8(byte.to_ascii_uppercase());
    }
    Some(hasher.finish())
}

fn is_acgt(byte: u8) -> bool {
    matches!(byte.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}
