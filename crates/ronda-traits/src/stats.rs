//! Statistical helpers shared across the workspace.
//!
//! Everything here is absent-aware: absent inputs are skipped for
//! estimation and preserved in outputs, and degenerate denominators
//! (zero variance, empty samples) produce absent results instead of
//! arithmetic errors.

use crate::absent::{absent, is_present};

/// Minimum threshold for a standard deviation to count as non-zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean over present values; absent when no value is present.
#[must_use]
pub fn mean_present(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values {
        if is_present(v) {
            sum += v;
            n += 1;
        }
    }
    if n == 0 { absent() } else { sum / n as f64 }
}

/// Standard deviation over present values with the given delta degrees of
/// freedom; absent when fewer than `ddof + 1` values are present.
#[must_use]
pub fn std_present(values: &[f64], ddof: usize) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| is_present(*v)).collect();
    if present.len() <= ddof {
        return absent();
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (present.len() - ddof) as f64).sqrt()
}

/// Number of present values.
#[must_use]
pub fn count_present(values: &[f64]) -> usize {
    values.iter().filter(|v| is_present(**v)).count()
}

/// Empirical quantile with linear interpolation over the sorted present
/// values; absent when nothing is present. `q` is clamped to `[0, 1]`.
#[must_use]
pub fn quantile_present(values: &[f64], q: f64) -> f64 {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| is_present(*v)).collect();
    if present.is_empty() {
        return absent();
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let pos = q * (present.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        present[lo]
    } else {
        let frac = pos - lo as f64;
        present[lo] * (1.0 - frac) + present[hi] * frac
    }
}

/// Ranks of `values` (0-based), ties receiving their average rank.
///
/// Callers filter to present values first; ranks over a slice containing
/// absent values are not meaningful.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < f64::EPSILON {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Pearson correlation between two equal-length slices, skipping pairs
/// where either side is absent. Absent when fewer than 2 usable pairs or
/// either side has zero variance.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return absent();
    }
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| is_present(**a) && is_present(**b))
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return absent();
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x < MIN_STD_THRESHOLD || var_y < MIN_STD_THRESHOLD {
        return absent();
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Spearman rank correlation, skipping pairs where either side is absent.
/// Absent when fewer than 2 usable pairs or a side has constant rank.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return absent();
    }
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| is_present(**a) && is_present(**b))
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return absent();
    }
    let xs: Vec<f64> = pairs.iter().map(|(a, _)| *a).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, b)| *b).collect();
    pearson(&average_ranks(&xs), &average_ranks(&ys))
}

/// Z-scores a slice in place over its present values.
///
/// Returns `true` if standardization was applied. When fewer than 2
/// values are present, or the present-value standard deviation is within
/// tolerance of zero, the slice is left **unmodified** (preserving the
/// original magnitudes) and `false` is returned. Discrete-valued factors
/// hit the zero-variance path on many dates, so this guard is load-bearing.
///
/// Uses population standard deviation (ddof = 0).
pub fn zscore_inplace(values: &mut [f64]) -> bool {
    let mean = mean_present(values);
    let std = std_present(values, 0);
    if !is_present(mean) || !is_present(std) || std < MIN_STD_THRESHOLD {
        return false;
    }
    for v in values.iter_mut() {
        if is_present(*v) {
            *v = (*v - mean) / std;
        }
    }
    true
}

/// Causal rolling mean over a series, absent while fewer than
/// `min_periods` present values are inside the trailing window.
#[must_use]
pub fn rolling_mean(series: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(series, window, min_periods, mean_present)
}

/// Causal rolling standard deviation (ddof = 1), absent while fewer than
/// `min_periods` present values are inside the trailing window.
#[must_use]
pub fn rolling_std(series: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(series, window, min_periods, |w| std_present(w, 1))
}

fn rolling_apply<F: Fn(&[f64]) -> f64>(
    series: &[f64],
    window: usize,
    min_periods: usize,
    f: F,
) -> Vec<f64> {
    let min_periods = min_periods.max(1);
    let mut out = vec![absent(); series.len()];
    if window == 0 {
        return out;
    }
    for t in 0..series.len() {
        let start = (t + 1).saturating_sub(window);
        let slice = &series[start..=t];
        if count_present(slice) >= min_periods {
            out[t] = f(slice);
        }
    }
    out
}
