// fp_correction.rs
//
// Precomputes the per-split-count multiplier that keeps a split user bin's
// false-positive rate at the requested target even though it is queried
// independently across several technical bins.

use crate::error::HibfError;

/// `c[s]`, indexed by split count, for `s` in `[1, S]`.
#[derive(Clone, Debug, PartialEq)]
pub struct FpCorrection {
    values: Vec<f64>,
}

impl FpCorrection {
    /// Computes corrections for split counts up to `next_multiple_of_64(requested_max_tb)`.
    pub fn compute(
        false_positive_rate: f64,
        num_hash_functions: usize,
        requested_max_tb: usize,
    ) -> Result<Self, HibfError> {
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(HibfError::InvalidConfig(
                "false_positive_rate must be in (0, 1)".to_string(),
            ));
        }
        if num_hash_functions < 1 {
            return Err(HibfError::InvalidConfig(
                "num_hash_functions must be >= 1".to_string(),
            ));
        }

        let max_tb = next_multiple_of_64(requested_max_tb);
        let mut values = vec![0.0; max_tb + 1];
        values[1] = 1.0;

        let h = num_hash_functions as f64;
        let denominator = (1.0 - (false_positive_rate.ln() / h).exp()).ln();

        for s in 2..=max_tb {
            let t = 1.0 - (1.0 - false_positive_rate).powi(s as i32);
            let c = (1.0 - (t.ln() / h).exp()).ln() / denominator;
            debug_assert!(c >= 1.0, "fp_correction[{s}] = {c} must be >= 1");
            values[s] = c;
        }

        Ok(Self { values })
    }

    /// `c[s]`. Panics if `s` is 0 or exceeds the precomputed range.
    pub fn get(&self, s: usize) -> f64 {
        self.values[s]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn next_multiple_of_64(n: usize) -> usize {
    n.div_ceil(64) * 64
}
