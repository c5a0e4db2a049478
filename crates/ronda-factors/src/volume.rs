//! Volume flow and trading-range factors.

use ronda_traits::{absent, is_present, OhlcvPanels, Panel, Result};

use crate::registry::{FactorCategory, FactorDef, FactorParams};
use crate::rolling::{map_columns2, map_columns3, roll_mean, safe_div, wilder};

pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "obv_signal",
            category: FactorCategory::Volume,
            description: "On-balance volume minus its rolling mean",
            defaults: &[("window", 20.0)],
            compute: obv_signal,
        },
        FactorDef {
            name: "atr",
            category: FactorCategory::Volume,
            description: "Average true range with Wilder smoothing",
            defaults: &[("window", 14.0)],
            compute: atr,
        },
        FactorDef {
            name: "natr",
            category: FactorCategory::Volume,
            description: "Average true range as a percentage of close",
            defaults: &[("window", 14.0)],
            compute: natr,
        },
        FactorDef {
            name: "true_range",
            category: FactorCategory::Volume,
            description: "Daily true range of high, low, and prior close",
            defaults: &[],
            compute: true_range,
        },
    ]
}

/// Cumulative on-balance volume. State survives an absent row but the
/// row itself is absent; the series resumes from the retained total.
fn obv_series(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut out = vec![absent(); close.len()];
    let mut total = 0.0;
    let mut prev_close: Option<f64> = None;
    for t in 0..close.len() {
        if !is_present(close[t]) || !is_present(volume[t]) {
            continue;
        }
        if let Some(pc) = prev_close {
            if close[t] > pc {
                total += volume[t];
            } else if close[t] < pc {
                total -= volume[t];
            }
            out[t] = total;
        }
        prev_close = Some(close[t]);
    }
    out
}

fn obv_signal(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns2(&data.close, &data.volume, |c, v| {
        let obv = obv_series(c, v);
        let mean = roll_mean(&obv, window);
        obv.iter()
            .zip(mean.iter())
            .map(|(o, m)| {
                if is_present(*o) && is_present(*m) {
                    o - m
                } else {
                    absent()
                }
            })
            .collect()
    }))
}

fn true_range_series(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut out = vec![absent(); close.len()];
    for t in 1..close.len() {
        if is_present(high[t]) && is_present(low[t]) && is_present(close[t - 1]) {
            let hl = high[t] - low[t];
            let hc = (high[t] - close[t - 1]).abs();
            let lc = (low[t] - close[t - 1]).abs();
            out[t] = hl.max(hc).max(lc);
        }
    }
    out
}

fn true_range(data: &OhlcvPanels, _params: &FactorParams) -> Result<Panel> {
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        true_range_series(h, l, c)
    }))
}

fn atr(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        wilder(&true_range_series(h, l, c), window)
    }))
}

fn natr(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        let atr = wilder(&true_range_series(h, l, c), window);
        (0..c.len())
            .map(|t| safe_div(100.0 * atr[t], c[t]))
            .collect()
    }))
}
