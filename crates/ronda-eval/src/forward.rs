//! Forward returns over a fixed horizon.

use ronda_traits::{absent, is_present, Panel, Result, RondaError};

/// Computes `close[t + horizon] / close[t] - 1` per instrument.
///
/// The last `horizon` rows are absent by construction: the return is not
/// yet observable there. Absent closes on either end of the span, or a
/// (near-)zero base price, yield absent.
pub fn forward_returns(close: &Panel, horizon: usize) -> Result<Panel> {
    if horizon == 0 {
        return Err(RondaError::InvalidData(
            "forward-return horizon must be at least 1".to_string(),
        ));
    }
    let mut out = Panel::absent_like(close);
    let n = close.n_dates();
    for j in 0..close.n_instruments() {
        for t in 0..n.saturating_sub(horizon) {
            let base = close.get(t, j);
            let future = close.get(t + horizon, j);
            if is_present(base) && is_present(future) && base.abs() > f64::EPSILON {
                out.set(t, j, future / base - 1.0);
            } else {
                out.set(t, j, absent());
            }
        }
    }
    Ok(out)
}
