//! Discrete candlestick pattern factors.
//!
//! Outputs take values in {-1, 0, +1}. On many dates every instrument
//! flags 0, which makes these factors the routine exercisers of the
//! zero-variance guard in the z-score step.

use ronda_traits::{absent, is_present, OhlcvPanels, Panel, Result};

use crate::registry::{FactorCategory, FactorDef, FactorParams};
use crate::rolling::map_columns4;

pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "doji",
            category: FactorCategory::Pattern,
            description: "Doji: open and close within a tenth of the day's range",
            defaults: &[],
            compute: doji,
        },
        FactorDef {
            name: "hammer",
            category: FactorCategory::Pattern,
            description: "Hammer: long lower shadow with a small body near the high",
            defaults: &[],
            compute: hammer,
        },
        FactorDef {
            name: "engulfing",
            category: FactorCategory::Pattern,
            description: "Engulfing: current body fully covers the prior body, signed",
            defaults: &[],
            compute: engulfing,
        },
    ]
}

fn candle_present(o: f64, h: f64, l: f64, c: f64) -> bool {
    is_present(o) && is_present(h) && is_present(l) && is_present(c)
}

fn doji(data: &OhlcvPanels, _params: &FactorParams) -> Result<Panel> {
    Ok(map_columns4(
        &data.open,
        &data.high,
        &data.low,
        &data.close,
        |o, h, l, c| {
            (0..c.len())
                .map(|t| {
                    if !candle_present(o[t], h[t], l[t], c[t]) {
                        return absent();
                    }
                    let range = h[t] - l[t];
                    if range <= 0.0 {
                        return 0.0;
                    }
                    if (c[t] - o[t]).abs() <= 0.1 * range {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        },
    ))
}

fn hammer(data: &OhlcvPanels, _params: &FactorParams) -> Result<Panel> {
    Ok(map_columns4(
        &data.open,
        &data.high,
        &data.low,
        &data.close,
        |o, h, l, c| {
            (0..c.len())
                .map(|t| {
                    if !candle_present(o[t], h[t], l[t], c[t]) {
                        return absent();
                    }
                    let body = (c[t] - o[t]).abs();
                    let lower = o[t].min(c[t]) - l[t];
                    let upper = h[t] - o[t].max(c[t]);
                    if body > 0.0 && lower >= 2.0 * body && upper <= body {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        },
    ))
}

fn engulfing(data: &OhlcvPanels, _params: &FactorParams) -> Result<Panel> {
    Ok(map_columns4(
        &data.open,
        &data.high,
        &data.low,
        &data.close,
        |o, h, l, c| {
            (0..c.len())
                .map(|t| {
                    if t == 0
                        || !candle_present(o[t], h[t], l[t], c[t])
                        || !is_present(o[t - 1])
                        || !is_present(c[t - 1])
                    {
                        return absent();
                    }
                    let prev_bear = c[t - 1] < o[t - 1];
                    let prev_bull = c[t - 1] > o[t - 1];
                    let covers = o[t].min(c[t]) <= o[t - 1].min(c[t - 1])
                        && o[t].max(c[t]) >= o[t - 1].max(c[t - 1]);
                    if covers && prev_bear && c[t] > o[t] {
                        1.0
                    } else if covers && prev_bull && c[t] < o[t] {
                        -1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        },
    ))
}
