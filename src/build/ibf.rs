// build/ibf.rs
//
// A minimal Interleaved Bloom Filter primitive: a fixed-size bit-matrix with
// `bin_count` columns of `bin_bits` bits each, addressed by `hash_count`
// independent hash functions per inserted key. No query operations are
// implemented; the builder only ever calls `emplace`.

/// Computes the minimum per-bin bit width, rounded up to a multiple of 64,
/// so that `max_cardinality` distinct keys inserted with `num_hash_functions`
/// hashes keep a single bin's false-positive rate at or below `fp_rate`.
pub fn compute_bin_size(fp_rate: f64, num_hash_functions: usize, max_cardinality: u64) -> usize {
    if max_cardinality == 0 {
        return 64;
    }
    let h = num_hash_functions as f64;
    let n = max_cardinality as f64;
    let denom = -(1.0 - fp_rate.powf(1.0 / h)).ln();
    let m = (h * n / denom).ceil() as u64;
    next_multiple_of_64(m.max(1)) as usize
}

fn next_multiple_of_64(n: u64) -> u64 {
    n.div_ceil(64) * 64
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InterleavedBloomFilter {
    bin_count: usize,
    bin_bits: usize,
    hash_count: usize,
    bits: Vec<u64>,
}

impl InterleavedBloomFilter {
    pub fn new(bin_count: usize, bin_bits: usize, hash_count: usize) -> Self {
        let total_bits = bin_count * bin_bits;
        let words = total_bits.div_ceil(64);
        Self {
            bin_count,
            bin_bits,
            hash_count,
            bits: vec![0u64; words],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn bin_bits(&self) -> usize {
        self.bin_bits
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Inserts `hash` into technical bin `bin`, setting `hash_count` bits
    /// derived from independently mixed variants of `hash`.
    pub fn emplace(&mut self, hash: u64, bin: usize) {
        debug_assert!(bin < self.bin_count, "bin {bin} out of range");
        let base = bin * self.bin_bits;
        for i in 0..self.hash_count {
            let mixed = splitmix64(hash ^ (i as u64).wrapping_mul(0x9E3779B97F4A7C15));
            let offset = (mixed % self.bin_bits as u64) as usize;
            self.set_bit(base + offset);
        }
    }

    fn set_bit(&mut self, index: usize) {
        let word = index / 64;
        let bit = index % 64;
        self.bits[word] |= 1u64 << bit;
    }

    /// Returns whether the bit at `index` (within bin `bin`, `0..bin_bits`) is set.
    /// Exposed for tests; not part of the build-time contract.
    #[cfg(test)]
    fn bit_is_set(&self, bin: usize, index: usize) -> bool {
        let global = bin * self.bin_bits + index;
        let word = global / 64;
        let bit = global % 64;
        (self.bits[word] >> bit) & 1 == 1
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
