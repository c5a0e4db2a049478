//! Cross-sectional preprocessing: forward-fill, winsorize, z-score.
//!
//! The order is fixed. Forward-fill runs per instrument along the date
//! axis; winsorize and z-score run per date across instruments. Each step
//! can be switched off independently in the configuration, but when
//! enabled they always run in this order.

use ronda_config::PreprocessingConfig;
use ronda_traits::stats::{count_present, quantile_present, zscore_inplace};
use ronda_traits::{is_present, Panel};

/// Carries the last observation forward along each instrument's series,
/// but only across gaps of at most `max_gap_days` calendar days. Leading
/// absents stay absent; a value older than the gap limit is not reused.
#[must_use]
pub fn forward_fill(panel: &Panel, max_gap_days: i64) -> Panel {
    let mut out = panel.clone();
    let dates = panel.dates().to_vec();
    for j in 0..panel.n_instruments() {
        let mut last: Option<(usize, f64)> = None;
        for t in 0..panel.n_dates() {
            let v = out.get(t, j);
            if is_present(v) {
                last = Some((t, v));
            } else if let Some((t0, v0)) = last {
                let gap = (dates[t] - dates[t0]).num_days();
                if gap <= max_gap_days {
                    out.set(t, j, v0);
                }
            }
        }
    }
    out
}

/// Clamps each date's cross-section to its empirical `[lower, upper]`
/// quantiles. Rows with fewer than 2 present values are left unmodified.
#[must_use]
pub fn winsorize(panel: &Panel, lower: f64, upper: f64) -> Panel {
    let mut out = panel.clone();
    for t in 0..panel.n_dates() {
        let row: Vec<f64> = panel.row(t).to_vec();
        if count_present(&row) < 2 {
            continue;
        }
        let lo = quantile_present(&row, lower);
        let hi = quantile_present(&row, upper);
        if !is_present(lo) || !is_present(hi) {
            continue;
        }
        let mut out_row = out.row_mut(t);
        for v in out_row.iter_mut() {
            if is_present(*v) {
                *v = v.clamp(lo, hi);
            }
        }
    }
    out
}

/// Standardizes each date's cross-section to zero mean and unit variance
/// over its present values. Degenerate rows (fewer than 2 present values,
/// or near-zero dispersion) keep their original magnitudes.
#[must_use]
pub fn zscore(panel: &Panel) -> Panel {
    let mut out = panel.clone();
    for t in 0..panel.n_dates() {
        let mut row: Vec<f64> = out.row(t).to_vec();
        if zscore_inplace(&mut row) {
            for (j, v) in row.into_iter().enumerate() {
                out.set(t, j, v);
            }
        }
    }
    out
}

/// Runs the configured preprocessing steps in their fixed order.
#[must_use]
pub fn preprocess(panel: &Panel, cfg: &PreprocessingConfig) -> Panel {
    let mut out = panel.clone();
    if cfg.forward_fill.enabled {
        out = forward_fill(&out, cfg.forward_fill.max_gap_days);
    }
    if cfg.winsorize.enabled {
        out = winsorize(&out, cfg.winsorize.lower, cfg.winsorize.upper);
    }
    if cfg.zscore.enabled {
        out = zscore(&out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use ronda_traits::{absent, is_absent};

    fn panel(dates: Vec<NaiveDate>, values: Vec<f64>, n_inst: usize) -> Panel {
        let n = dates.len();
        let instruments: Vec<String> = (0..n_inst).map(|i| format!("I{i}")).collect();
        Panel::new(
            dates,
            instruments,
            Array2::from_shape_vec((n, n_inst), values).unwrap(),
        )
        .unwrap()
    }

    fn days(specs: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
        specs
            .iter()
            .map(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d).unwrap())
            .collect()
    }

    #[test]
    fn test_forward_fill_within_gap() {
        let dates = days(&[(2024, 1, 1), (2024, 1, 2), (2024, 1, 3)]);
        let p = panel(dates, vec![1.0, absent(), absent()], 1);
        let out = forward_fill(&p, 5);
        assert_relative_eq!(out.get(1, 0), 1.0);
        assert_relative_eq!(out.get(2, 0), 1.0);
    }

    #[test]
    fn test_forward_fill_respects_calendar_gap() {
        // second date is 10 calendar days after the observation
        let dates = days(&[(2024, 1, 1), (2024, 1, 11)]);
        let p = panel(dates, vec![1.0, absent()], 1);
        let out = forward_fill(&p, 5);
        assert!(is_absent(out.get(1, 0)));
    }

    #[test]
    fn test_forward_fill_leading_absent_stays() {
        let dates = days(&[(2024, 1, 1), (2024, 1, 2)]);
        let p = panel(dates, vec![absent(), 2.0], 1);
        let out = forward_fill(&p, 5);
        assert!(is_absent(out.get(0, 0)));
    }

    #[test]
    fn test_winsorize_clamps_extremes() {
        let dates = days(&[(2024, 1, 1)]);
        let values = vec![1.0, 2.0, 3.0, 4.0, 100.0];
        let p = panel(dates, values, 5);
        let out = winsorize(&p, 0.0, 0.75);
        // 75th percentile of the row is 4.0
        assert_relative_eq!(out.get(0, 4), 4.0);
        assert_relative_eq!(out.get(0, 0), 1.0);
    }

    #[test]
    fn test_winsorize_sparse_row_unmodified() {
        let dates = days(&[(2024, 1, 1)]);
        let p = panel(dates, vec![5.0, absent(), absent()], 3);
        let out = winsorize(&p, 0.25, 0.75);
        assert_relative_eq!(out.get(0, 0), 5.0);
    }

    #[test]
    fn test_zscore_rows_standardized() {
        let dates = days(&[(2024, 1, 1), (2024, 1, 2)]);
        let p = panel(dates, vec![1.0, 2.0, 3.0, 7.0, 7.0, 7.0], 3);
        let out = zscore(&p);
        // first row standardizes
        let std3: f64 = (2.0f64 / 3.0).sqrt();
        assert_relative_eq!(out.get(0, 0), -1.0 / std3, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 2), 1.0 / std3, epsilon = 1e-12);
        // constant row keeps its magnitudes
        assert_relative_eq!(out.get(1, 0), 7.0);
        assert_relative_eq!(out.get(1, 2), 7.0);
    }

    #[test]
    fn test_pipeline_order_and_toggles() {
        let dates = days(&[(2024, 1, 1), (2024, 1, 2)]);
        let p = panel(dates, vec![1.0, 3.0, absent(), absent()], 2);

        let mut cfg = ronda_config::PreprocessingConfig::default();
        cfg.winsorize.enabled = false;
        cfg.zscore.enabled = false;
        let ff_only = preprocess(&p, &cfg);
        assert_relative_eq!(ff_only.get(1, 0), 1.0);
        assert_relative_eq!(ff_only.get(1, 1), 3.0);

        cfg.forward_fill.enabled = false;
        let untouched = preprocess(&p, &cfg);
        assert!(is_absent(untouched.get(1, 0)));
    }

    #[test]
    fn test_zscore_idempotent_on_panel() {
        let dates = days(&[(2024, 1, 1)]);
        let p = panel(dates, vec![1.0, 4.0, 9.0], 3);
        let once = zscore(&p);
        let twice = zscore(&once);
        for j in 0..3 {
            assert_relative_eq!(once.get(0, j), twice.get(0, j), epsilon = 1e-12);
        }
    }
}
