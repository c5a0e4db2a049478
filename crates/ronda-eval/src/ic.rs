//! Per-date information coefficients.
//!
//! The IC at date `t` is the Spearman rank correlation between the
//! factor's cross-section at `t` and the forward returns at `t`. Dates
//! with fewer than `min_samples` usable pairs carry an absent IC.

use ronda_traits::stats::spearman;
use ronda_traits::{absent, is_present, Date, Panel, Result};

/// An IC time series for one factor, aligned with the evaluation dates.
#[derive(Debug, Clone)]
pub struct IcSeries {
    pub factor: String,
    pub dates: Vec<Date>,
    pub values: Vec<f64>,
}

impl IcSeries {
    /// Number of dates with a defined IC.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.values.iter().filter(|v| is_present(**v)).count()
    }

    /// True when no date produced a defined IC.
    #[must_use]
    pub fn is_all_absent(&self) -> bool {
        self.n_observations() == 0
    }
}

/// Computes the per-date Spearman IC of a factor panel against forward
/// returns. The panels are aligned on their common dates and instruments
/// first; the result is indexed by the aligned dates.
pub fn ic_series(
    factor_name: &str,
    factor: &Panel,
    forward: &Panel,
    min_samples: usize,
) -> Result<IcSeries> {
    let (f, r) = factor.align(forward)?;
    let mut values = Vec::with_capacity(f.n_dates());
    for t in 0..f.n_dates() {
        let fx: Vec<f64> = f.row(t).to_vec();
        let ry: Vec<f64> = r.row(t).to_vec();
        let usable = fx
            .iter()
            .zip(ry.iter())
            .filter(|(a, b)| is_present(**a) && is_present(**b))
            .count();
        if usable < min_samples {
            values.push(absent());
        } else {
            values.push(spearman(&fx, &ry));
        }
    }
    Ok(IcSeries {
        factor: factor_name.to_string(),
        dates: f.dates().to_vec(),
        values,
    })
}
