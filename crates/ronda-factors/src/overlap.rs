//! Overlap factors: close displacement from moving-average baselines.

use ronda_traits::{absent, is_present, OhlcvPanels, Panel, Result};

use crate::registry::{FactorCategory, FactorDef, FactorParams};
use crate::rolling::{ema, map_columns, map_columns3, roll_max, roll_mean, roll_min, safe_div};

pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "sma_gap",
            category: FactorCategory::Overlap,
            description: "Close relative to its simple moving average, minus one",
            defaults: &[("window", 20.0)],
            compute: sma_gap,
        },
        FactorDef {
            name: "ema_gap",
            category: FactorCategory::Overlap,
            description: "Close relative to its exponential moving average, minus one",
            defaults: &[("window", 20.0)],
            compute: ema_gap,
        },
        FactorDef {
            name: "midpoint_gap",
            category: FactorCategory::Overlap,
            description: "Close relative to the rolling close midpoint",
            defaults: &[("window", 14.0)],
            compute: midpoint_gap,
        },
        FactorDef {
            name: "midprice_gap",
            category: FactorCategory::Overlap,
            description: "Close relative to the rolling high-low midprice",
            defaults: &[("window", 14.0)],
            compute: midprice_gap,
        },
        FactorDef {
            name: "typical_price_gap",
            category: FactorCategory::Overlap,
            description: "Close relative to the moving average of the typical price",
            defaults: &[("window", 20.0)],
            compute: typical_price_gap,
        },
    ]
}

fn gap(series: &[f64], baseline: &[f64]) -> Vec<f64> {
    series
        .iter()
        .zip(baseline.iter())
        .map(|(s, b)| {
            let r = safe_div(*s, *b);
            if is_present(r) { r - 1.0 } else { r }
        })
        .collect()
}

fn sma_gap(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| gap(c, &roll_mean(c, window))))
}

fn ema_gap(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| gap(c, &ema(c, window))))
}

fn midpoint_gap(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        let hi = roll_max(c, window);
        let lo = roll_min(c, window);
        let mid: Vec<f64> = hi
            .iter()
            .zip(lo.iter())
            .map(|(h, l)| {
                if is_present(*h) && is_present(*l) {
                    (h + l) / 2.0
                } else {
                    absent()
                }
            })
            .collect();
        gap(c, &mid)
    }))
}

fn midprice_gap(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        let hh = roll_max(h, window);
        let ll = roll_min(l, window);
        let mid: Vec<f64> = hh
            .iter()
            .zip(ll.iter())
            .map(|(a, b)| {
                if is_present(*a) && is_present(*b) {
                    (a + b) / 2.0
                } else {
                    absent()
                }
            })
            .collect();
        gap(c, &mid)
    }))
}

fn typical_price_gap(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        let tp: Vec<f64> = (0..c.len())
            .map(|t| {
                if is_present(h[t]) && is_present(l[t]) && is_present(c[t]) {
                    (h[t] + l[t] + c[t]) / 3.0
                } else {
                    absent()
                }
            })
            .collect();
        gap(c, &roll_mean(&tp, window))
    }))
}
