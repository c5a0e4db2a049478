//! Price-derived factors: returns, dispersion, and liquidity.

use ronda_traits::{absent, is_present, OhlcvPanels, Panel, Result};

use crate::registry::{FactorCategory, FactorDef, FactorParams};
use crate::rolling::{ema, map_columns, map_columns2, pct_change, roll_mean, roll_std, safe_div};

pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "momentum",
            category: FactorCategory::Price,
            description: "Percentage change of close over the window",
            defaults: &[("window", 20.0)],
            compute: momentum,
        },
        FactorDef {
            name: "short_reversal",
            category: FactorCategory::Price,
            description: "Negated short-horizon percentage change of close",
            defaults: &[("window", 5.0)],
            compute: short_reversal,
        },
        FactorDef {
            name: "volatility",
            category: FactorCategory::Price,
            description: "Rolling standard deviation of one-day returns",
            defaults: &[("window", 20.0)],
            compute: volatility,
        },
        FactorDef {
            name: "roc",
            category: FactorCategory::Price,
            description: "Rate of change of close, in percent",
            defaults: &[("window", 10.0)],
            compute: roc,
        },
        FactorDef {
            name: "macd_signal",
            category: FactorCategory::Price,
            description: "MACD line (fast EMA minus slow EMA) smoothed by the signal EMA",
            defaults: &[("fast", 12.0), ("slow", 26.0), ("signal", 9.0)],
            compute: macd_signal,
        },
        FactorDef {
            name: "macd_histogram",
            category: FactorCategory::Price,
            description: "MACD line minus its signal EMA",
            defaults: &[("fast", 12.0), ("slow", 26.0), ("signal", 9.0)],
            compute: macd_histogram,
        },
        FactorDef {
            name: "bollinger_position",
            category: FactorCategory::Price,
            description: "Close displacement from the rolling mean in band half-widths",
            defaults: &[("window", 20.0)],
            compute: bollinger_position,
        },
        FactorDef {
            name: "amihud_illiquidity",
            category: FactorCategory::Price,
            description: "Negated Amihud illiquidity: mean |return| per dollar of volume",
            defaults: &[("window", 20.0)],
            compute: amihud_illiquidity,
        },
        FactorDef {
            name: "log_volume_mean",
            category: FactorCategory::Price,
            description: "Rolling mean of log volume",
            defaults: &[("window", 20.0)],
            compute: log_volume_mean,
        },
    ]
}

fn momentum(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| pct_change(c, window)))
}

fn short_reversal(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        pct_change(c, window)
            .into_iter()
            .map(|v| if is_present(v) { -v } else { v })
            .collect()
    }))
}

fn volatility(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| roll_std(&pct_change(c, 1), window)))
}

fn roc(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        pct_change(c, window)
            .into_iter()
            .map(|v| if is_present(v) { v * 100.0 } else { v })
            .collect()
    }))
}

fn macd_line(close: &[f64], fast: usize, slow: usize) -> Vec<f64> {
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

fn macd_signal(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let fast = params.window("fast")?;
    let slow = params.window("slow")?;
    let signal = params.window("signal")?;
    Ok(map_columns(&data.close, |c| {
        ema(&macd_line(c, fast, slow), signal)
    }))
}

fn macd_histogram(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let fast = params.window("fast")?;
    let slow = params.window("slow")?;
    let signal = params.window("signal")?;
    Ok(map_columns(&data.close, |c| {
        let line = macd_line(c, fast, slow);
        let sig = ema(&line, signal);
        line.iter()
            .zip(sig.iter())
            .map(|(l, s)| {
                if is_present(*l) && is_present(*s) {
                    l - s
                } else {
                    absent()
                }
            })
            .collect()
    }))
}

fn bollinger_position(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.close, |c| {
        let mean = roll_mean(c, window);
        let std = roll_std(c, window);
        (0..c.len())
            .map(|t| safe_div(c[t] - mean[t], 2.0 * std[t]))
            .collect()
    }))
}

fn amihud_illiquidity(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns2(&data.close, &data.volume, |c, v| {
        let impact: Vec<f64> = pct_change(c, 1)
            .iter()
            .enumerate()
            .map(|(t, r)| safe_div(r.abs(), v[t] * c[t]))
            .collect();
        // Negated so that higher values mean more liquid, keeping the
        // factor's expected return direction aligned with the others.
        roll_mean(&impact, window)
            .into_iter()
            .map(|m| if is_present(m) { -m } else { m })
            .collect()
    }))
}

fn log_volume_mean(data: &OhlcvPanels, params: &FactorParams) -> Result<Panel> {
    let window = params.window("window")?;
    Ok(map_columns(&data.volume, |v| {
        let logs: Vec<f64> = v
            .iter()
            .map(|x| {
                if is_present(*x) && *x > 0.0 {
                    x.ln()
                } else {
                    absent()
                }
            })
            .collect();
        roll_mean(&logs, window)
    }))
}
