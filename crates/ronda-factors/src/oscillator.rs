//! Bounded oscillator factors.

use ronda_traits::{absent, is_present, OhlcvPanels, Panel, Result};

use crate::registry::{FactorCategory, FactorDef, FactorParams};
use crate::rolling::{
    diff, ema, map_columns, map_columns3, roll_full, roll_max, roll_mean, roll_min, safe_div,
    wilder,
};

pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "rsi",
            category: FactorCategory::Oscillator,
            description: "Relative strength index with Wilder smoothing",
            defaults: &[("window", 14.0)],
            compute: rsi,
        },
        FactorDef {
            name: "cmo",
            category: FactorCategory::Oscillator,
            description: "Chande momentum oscillator",
            defaults: &[("window", 14.0)],
            compute: cmo,
        },
        FactorDef {
            name: "williams_r",
            category: FactorCategory::Oscillator,
            description: "Williams %R of close within the rolling high-low range",
            defaults: &[("window", 14.0)],
            compute: williams_r,
        },
        FactorDef {
            name: "stochastic_k",
            category: FactorCategory::Oscillator,
            description: "Fast stochastic %K smoothed by a short moving average",
            defaults: &[("window", 14.0), ("smooth", 3.0)],
            compute: stochastic_k,
        },
        FactorDef {
            name: "cci",
            category: FactorCategory::Oscillator,
            description: "Commodity channel index of the typical price",
            defaults: &[("window", 14.0)],
            compute: cci,
        },
        FactorDef {
            name: "apo",
            category: FactorCategory::Oscillator,
            description: "Absolute price oscillator: fast EMA minus slow EMA",
            defaults: &[("fast", 12.0), ("slow", 26.0)],
            compute: apo,
        },
        FactorDef {
            name: "ppo",
            category: FactorCategory::Oscillator,
            description: "Percentage price oscillator: APO relative to the slow EMA",
            defaults: &[("fast", 12.0), ("slow", 26.0)],
            compute: ppo,
        },
    ]
}

fn rsi(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        let deltas = diff(c);
        let gains: Vec<f64> = deltas.iter().map(|d| clip_side(*d, true)).collect();
        let losses: Vec<f64> = deltas.iter().map(|d| clip_side(*d, false)).collect();
        let avg_gain = wilder(&gains, window);
        let avg_loss = wilder(&losses, window);
        (0..c.len())
            .map(|t| {
                let g = avg_gain[t];
                let l = avg_loss[t];
                if !is_present(g) || !is_present(l) {
                    return absent();
                }
                let scaled = safe_div(100.0 * g, g + l);
                // both averages at zero means a perfectly flat window
                if is_present(scaled) { scaled } else { absent() }
            })
            .collect()
    }))
}

fn clip_side(delta: f64, up: bool) -> f64 {
    if !is_present(delta) {
        return absent();
    }
    if up {
        delta.max(0.0)
    } else {
        (-delta).max(0.0)
    }
}

fn cmo(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        let deltas = diff(c);
        roll_full(&deltas, window, |w| {
            let up: f64 = w.iter().filter(|d| **d > 0.0).sum();
            let down: f64 = w.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
            safe_div(100.0 * (up - down), up + down)
        })
    }))
}

fn williams_r(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        let hh = roll_max(h, window);
        let ll = roll_min(l, window);
        (0..c.len())
            .map(|t| safe_div(-100.0 * (hh[t] - c[t]), hh[t] - ll[t]))
            .collect()
    }))
}

fn stochastic_k(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    let smooth = params.window("smooth")?;
    Ok(map_columns3(&data.high, &data.low, &data.close, |h, l, c| {
        let hh = roll_max(h, window);
        let ll = roll_min(l, window);
        let fast_k: Vec<f64> = (0..c.len())
            .map(|t| safe_div(100.0 * (c[t] - ll[t]), hh[t] - ll[t]))
            .collect();
        roll_mean(&fast_k, smooth)
    }))
}

fn cci(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
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
        let sma = roll_mean(&tp, window);
        let mean_dev = roll_full(&tp, window, |w| {
            let m = w.iter().sum::<f64>() / w.len() as f64;
            w.iter().map(|v| (v - m).abs()).sum::<f64>() / w.len() as f64
        });
        (0..c.len())
            .map(|t| safe_div(tp[t] - sma[t], 0.015 * mean_dev[t]))
            .collect()
    }))
}

fn apo(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let fast = params.window("fast")?;
    let slow = params.window("slow")?;
    Ok(map_columns(&data.close, |c| apo_series(c, fast, slow)))
}

fn ppo(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let fast = params.window("fast")?;
    let slow = params.window("slow")?;
    Ok(map_columns(&data.close, |c| {
        let line = apo_series(c, fast, slow);
        let slow_ema = ema(c, slow);
        (0..c.len())
            .map(|t| safe_div(100.0 * line[t], slow_ema[t]))
            .collect()
    }))
}

fn apo_series(close: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);
    fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| {
            if is_present(*f) && is_present(*s) {
                f - s
            } else {
                absent()
            }
        })
        .collect()
}
