//! Summary statistics over an IC time series.

use ronda_traits::stats::{
    count_present, mean_present, rolling_mean, rolling_std, std_present, MIN_STD_THRESHOLD,
};
use ronda_traits::{absent, is_present};
use serde::Serialize;

use crate::ic::IcSeries;

/// Summary of an IC series. All fields skip absent ICs; an empty series
/// yields absent statistics across the board.
#[derive(Debug, Clone, Serialize)]
pub struct IcSummary {
    pub factor: String,
    /// Mean IC over defined dates.
    pub mean_ic: f64,
    /// Sample standard deviation (ddof = 1) of the IC series.
    pub std_ic: f64,
    /// Information ratio: mean / std. Absent when the std is (near-)zero
    /// or undefined.
    pub ir: f64,
    /// Fraction of defined ICs sharing the sign of the mean IC.
    pub win_rate: f64,
    /// Mean absolute IC.
    pub abs_mean_ic: f64,
    /// Number of dates with a defined IC.
    pub n_observations: usize,
}

impl IcSummary {
    /// Summarizes an IC series.
    #[must_use]
    pub fn from_series(series: &IcSeries) -> Self {
        let values = &series.values;
        let n_observations = count_present(values);
        if n_observations == 0 {
            return Self {
                factor: series.factor.clone(),
                mean_ic: absent(),
                std_ic: absent(),
                ir: absent(),
                win_rate: absent(),
                abs_mean_ic: absent(),
                n_observations: 0,
            };
        }

        let mean_ic = mean_present(values);
        let std_ic = std_present(values, 1);
        let ir = if is_present(std_ic) && std_ic > MIN_STD_THRESHOLD {
            mean_ic / std_ic
        } else {
            absent()
        };

        let sign = if mean_ic >= 0.0 { 1.0 } else { -1.0 };
        let wins = values
            .iter()
            .filter(|v| is_present(**v) && **v * sign > 0.0)
            .count();
        let win_rate = wins as f64 / n_observations as f64;

        let abs_values: Vec<f64> = values
            .iter()
            .map(|v| if is_present(*v) { v.abs() } else { absent() })
            .collect();
        let abs_mean_ic = mean_present(&abs_values);

        Self {
            factor: series.factor.clone(),
            mean_ic,
            std_ic,
            ir,
            win_rate,
            abs_mean_ic,
            n_observations,
        }
    }

    /// True when the summary carries no information (all-absent series).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_observations == 0
    }
}

/// Rolling mean and std of an IC series. `min_periods` present ICs must
/// be inside the trailing window for an output to be defined.
#[must_use]
pub fn rolling_ic(
    series: &IcSeries,
    window: usize,
    min_periods: usize,
) -> (Vec<f64>, Vec<f64>) {
    (
        rolling_mean(&series.values, window, min_periods),
        rolling_std(&series.values, window, min_periods),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::{is_absent, Date};

    fn series(values: Vec<f64>) -> IcSeries {
        let dates: Vec<Date> = (0..values.len())
            .map(|i| {
                Date::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
            })
            .collect();
        IcSeries { factor: "f".to_string(), dates, values }
    }

    #[test]
    fn test_summary_basic() {
        let s = series(vec![0.2, 0.4, 0.6]);
        let summary = IcSummary::from_series(&s);
        assert_relative_eq!(summary.mean_ic, 0.4, epsilon = 1e-12);
        assert_relative_eq!(summary.std_ic, 0.2, epsilon = 1e-12);
        assert_relative_eq!(summary.ir, 2.0, epsilon = 1e-12);
        assert_relative_eq!(summary.win_rate, 1.0);
        assert_eq!(summary.n_observations, 3);
    }

    #[test]
    fn test_win_rate_follows_sign_of_mean() {
        // negative mean: wins are the negative ICs
        let s = series(vec![-0.5, -0.3, 0.1]);
        let summary = IcSummary::from_series(&s);
        assert!(summary.mean_ic < 0.0);
        assert_relative_eq!(summary.win_rate, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_ics_do_not_count_as_wins() {
        let s = series(vec![0.0, 0.0, 0.3]);
        let summary = IcSummary::from_series(&s);
        assert_relative_eq!(summary.win_rate, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_absent_ics_skipped() {
        let s = series(vec![0.5, ronda_traits::absent(), 0.7]);
        let summary = IcSummary::from_series(&s);
        assert_eq!(summary.n_observations, 2);
        assert_relative_eq!(summary.mean_ic, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_series_all_absent() {
        let s = series(vec![ronda_traits::absent(); 3]);
        let summary = IcSummary::from_series(&s);
        assert!(summary.is_empty());
        assert!(is_absent(summary.mean_ic));
        assert!(is_absent(summary.ir));
        assert!(is_absent(summary.win_rate));
    }

    #[test]
    fn test_constant_series_has_absent_ir() {
        let s = series(vec![0.3; 5]);
        let summary = IcSummary::from_series(&s);
        assert!(is_absent(summary.ir));
        assert_relative_eq!(summary.win_rate, 1.0);
    }

    #[test]
    fn test_rolling_ic_warm_up() {
        let s = series(vec![0.1, 0.2, 0.3, 0.4]);
        let (mean, std) = rolling_ic(&s, 3, 3);
        assert!(is_absent(mean[1]));
        assert_relative_eq!(mean[2], 0.2, epsilon = 1e-12);
        assert_relative_eq!(std[3], 0.1, epsilon = 1e-12);
    }
}
