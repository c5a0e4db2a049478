//! Causal rolling kernels shared by the factor modules.
//!
//! All kernels here enforce the full-window contract: an output at date
//! `t` is defined only when the trailing window holds exactly `window`
//! observations, none of them absent. Warm-up rows and windows touching an
//! absent input yield absent. Nothing at date `t` reads past `t`.

use ronda_traits::stats::MIN_STD_THRESHOLD;
use ronda_traits::{absent, is_present, Panel};

/// Applies a per-column series kernel to every instrument of a panel.
/// The kernel receives one column (oldest first) and must return a vector
/// of the same length.
pub fn map_columns<F>(src: &Panel, f: F) -> Panel
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut out = Panel::absent_like(src);
    for j in 0..src.n_instruments() {
        let col: Vec<f64> = src.column(j).to_vec();
        let mapped = f(&col);
        debug_assert_eq!(mapped.len(), col.len());
        for (t, v) in mapped.into_iter().enumerate() {
            out.set(t, j, v);
        }
    }
    out
}

/// Two-panel variant of [`map_columns`]. Panels must share shape, which
/// `OhlcvPanels::validate` guarantees for the engine's inputs.
pub fn map_columns2<F>(a: &Panel, b: &Panel, f: F) -> Panel
where
    F: Fn(&[f64], &[f64]) -> Vec<f64>,
{
    let mut out = Panel::absent_like(a);
    for j in 0..a.n_instruments() {
        let ca: Vec<f64> = a.column(j).to_vec();
        let cb: Vec<f64> = b.column(j).to_vec();
        for (t, v) in f(&ca, &cb).into_iter().enumerate() {
            out.set(t, j, v);
        }
    }
    out
}

/// Three-panel variant of [`map_columns`].
pub fn map_columns3<F>(a: &Panel, b: &Panel, c: &Panel, f: F) -> Panel
where
    F: Fn(&[f64], &[f64], &[f64]) -> Vec<f64>,
{
    let mut out = Panel::absent_like(a);
    for j in 0..a.n_instruments() {
        let ca: Vec<f64> = a.column(j).to_vec();
        let cb: Vec<f64> = b.column(j).to_vec();
        let cc: Vec<f64> = c.column(j).to_vec();
        for (t, v) in f(&ca, &cb, &cc).into_iter().enumerate() {
            out.set(t, j, v);
        }
    }
    out
}

/// Four-panel variant of [`map_columns`], for full OHLC candles.
pub fn map_columns4<F>(a: &Panel, b: &Panel, c: &Panel, d: &Panel, f: F) -> Panel
where
    F: Fn(&[f64], &[f64], &[f64], &[f64]) -> Vec<f64>,
{
    let mut out = Panel::absent_like(a);
    for j in 0..a.n_instruments() {
        let ca: Vec<f64> = a.column(j).to_vec();
        let cb: Vec<f64> = b.column(j).to_vec();
        let cc: Vec<f64> = c.column(j).to_vec();
        let cd: Vec<f64> = d.column(j).to_vec();
        for (t, v) in f(&ca, &cb, &cc, &cd).into_iter().enumerate() {
            out.set(t, j, v);
        }
    }
    out
}

/// Division that yields absent on absent operands or a (near-)zero
/// denominator instead of propagating infinities.
#[inline]
#[must_use]
pub fn safe_div(num: f64, den: f64) -> f64 {
    if !is_present(num) || !is_present(den) || den.abs() < MIN_STD_THRESHOLD {
        absent()
    } else {
        num / den
    }
}

/// Full-window rolling reduction: `f` sees each complete, fully-present
/// trailing window of length `window`; everything else is absent.
pub fn roll_full<F>(series: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![absent(); series.len()];
    if window == 0 || window > series.len() {
        return out;
    }
    for t in (window - 1)..series.len() {
        let slice = &series[t + 1 - window..=t];
        if slice.iter().all(|v| is_present(*v)) {
            out[t] = f(slice);
        }
    }
    out
}

/// Rolling mean under the full-window contract.
#[must_use]
pub fn roll_mean(series: &[f64], window: usize) -> Vec<f64> {
    roll_full(series, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sample standard deviation (ddof = 1) under the full-window
/// contract. A window of 1 yields absent.
#[must_use]
pub fn roll_std(series: &[f64], window: usize) -> Vec<f64> {
    if window < 2 {
        return vec![absent(); series.len()];
    }
    roll_full(series, window, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let ss: f64 = w.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (w.len() - 1) as f64).sqrt()
    })
}

/// Rolling maximum under the full-window contract.
#[must_use]
pub fn roll_max(series: &[f64], window: usize) -> Vec<f64> {
    roll_full(series, window, |w| w.iter().copied().fold(f64::MIN, f64::max))
}

/// Rolling minimum under the full-window contract.
#[must_use]
pub fn roll_min(series: &[f64], window: usize) -> Vec<f64> {
    roll_full(series, window, |w| w.iter().copied().fold(f64::MAX, f64::min))
}

/// Percentage change over `periods` steps. Absent while the lagged value
/// is unavailable, absent, or (near-)zero.
#[must_use]
pub fn pct_change(series: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![absent(); series.len()];
    if periods == 0 {
        return out;
    }
    for t in periods..series.len() {
        out[t] = safe_div(series[t] - series[t - periods], series[t - periods]);
    }
    out
}

/// One-step differences. The first row is absent.
#[must_use]
pub fn diff(series: &[f64]) -> Vec<f64> {
    let mut out = vec![absent(); series.len()];
    for t in 1..series.len() {
        if is_present(series[t]) && is_present(series[t - 1]) {
            out[t] = series[t] - series[t - 1];
        }
    }
    out
}

/// Exponential moving average with smoothing `alpha = 2 / (window + 1)`,
/// seeded by the simple mean of the first complete window.
///
/// An absent input resets the recursion: output goes absent and a fresh
/// seed window must accumulate before values resume. This keeps the
/// kernel causal and deterministic without inventing data across gaps.
#[must_use]
pub fn ema(series: &[f64], window: usize) -> Vec<f64> {
    smoothed(series, window, 2.0 / (window as f64 + 1.0))
}

/// Wilder's smoothing (`alpha = 1 / window`), the RSI/ATR recursion.
/// Same seeding and reset rules as [`ema`].
#[must_use]
pub fn wilder(series: &[f64], window: usize) -> Vec<f64> {
    smoothed(series, window, 1.0 / window as f64)
}

fn smoothed(series: &[f64], window: usize, alpha: f64) -> Vec<f64> {
    let mut out = vec![absent(); series.len()];
    if window == 0 {
        return out;
    }
    let mut prev: Option<f64> = None;
    let mut seed: Vec<f64> = Vec::with_capacity(window);
    for (t, &v) in series.iter().enumerate() {
        if !is_present(v) {
            prev = None;
            seed.clear();
            continue;
        }
        match prev {
            Some(p) => {
                let next = alpha * v + (1.0 - alpha) * p;
                out[t] = next;
                prev = Some(next);
            }
            None => {
                seed.push(v);
                if seed.len() == window {
                    let s = seed.iter().sum::<f64>() / window as f64;
                    out[t] = s;
                    prev = Some(s);
                    seed.clear();
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::is_absent;

    #[test]
    fn test_roll_mean_full_window() {
        let out = roll_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(is_absent(out[0]));
        assert!(is_absent(out[1]));
        assert_relative_eq!(out[2], 2.0);
        assert_relative_eq!(out[3], 3.0);
    }

    #[test]
    fn test_roll_mean_absent_poisons_window() {
        let out = roll_mean(&[1.0, absent(), 3.0, 4.0, 5.0], 3);
        assert!(is_absent(out[2]));
        assert!(is_absent(out[3]));
        assert_relative_eq!(out[4], 4.0);
    }

    #[test]
    fn test_roll_std_window_one_is_absent() {
        let out = roll_std(&[1.0, 2.0], 1);
        assert!(out.iter().all(|v| is_absent(*v)));
    }

    #[test]
    fn test_pct_change() {
        let out = pct_change(&[100.0, 110.0, 99.0], 1);
        assert!(is_absent(out[0]));
        assert_relative_eq!(out[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(out[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_safe_div_guards_zero() {
        assert!(is_absent(safe_div(1.0, 0.0)));
        assert!(is_absent(safe_div(absent(), 1.0)));
        assert_relative_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_ema_seeds_with_sma() {
        let out = ema(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(is_absent(out[0]));
        assert!(is_absent(out[1]));
        assert_relative_eq!(out[2], 2.0);
        // alpha = 0.5: 0.5 * 4 + 0.5 * 2 = 3
        assert_relative_eq!(out[3], 3.0);
    }

    #[test]
    fn test_ema_resets_after_gap() {
        let out = ema(&[1.0, 2.0, absent(), 3.0, 4.0], 2);
        assert!(is_absent(out[2]));
        assert!(is_absent(out[3]));
        assert_relative_eq!(out[4], 3.5);
    }

    #[test]
    fn test_wilder_alpha() {
        let out = wilder(&[3.0, 3.0, 6.0], 2);
        assert_relative_eq!(out[1], 3.0);
        // alpha = 0.5 for window 2
        assert_relative_eq!(out[2], 4.5);
    }

    #[test]
    fn test_roll_extrema() {
        let series = [3.0, 1.0, 2.0];
        assert_relative_eq!(roll_max(&series, 2)[1], 3.0);
        assert_relative_eq!(roll_min(&series, 2)[2], 1.0);
    }
}
