//! Brute-force blocking over a fully stored sample vector.
//!
//! Slow, allocating counterpart of the streaming accumulator; tests compare
//! the two level by level.

/// Averages of the completed 2^level blocks; leftover samples that never
/// filled a block are dropped, matching what the accumulator has folded.
pub fn block_values(samples: &[f64], level: usize) -> Vec<f64> {
    let width = 1usize << level;
    samples
        .chunks_exact(width)
        .map(|chunk| chunk.iter().sum::<f64>() / width as f64)
        .collect()
}

/// Two-pass mean and sum of squared deviations.
pub fn mean_and_m2(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let m2 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (mean, m2)
}

/// Standard error of the mean of `values`; NaN below two entries.
pub fn standard_error(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let (_, m2) = mean_and_m2(values);
    (m2 / (n - 1) as f64 / n as f64).sqrt()
}
