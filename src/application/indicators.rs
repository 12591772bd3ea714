//! Rolling indicator math over bar series.
//!
//! Every function takes the full series plus a target index and returns
//! `None` while the lookback window is incomplete. Values are identical
//! whether computed row-by-row or via the `*_series` batch helpers, so a
//! single trailing-window computation at inference time reproduces the
//! bulk historical value exactly.

use crate::domain::bar::Bar;

/// Percent change of close over `period` bars: undefined for `t < period`.
pub fn pct_return(closes: &[f64], period: usize, t: usize) -> Option<f64> {
    if period == 0 || t < period || t >= closes.len() {
        return None;
    }
    let base = closes[t - period];
    if base == 0.0 {
        return None;
    }
    Some((closes[t] - base) / base * 100.0)
}

/// Deviation of close from its `period`-bar simple moving average, in
/// percent. Undefined for the first `period - 1` rows.
pub fn sma_deviation(closes: &[f64], period: usize, t: usize) -> Option<f64> {
    if period == 0 || t + 1 < period || t >= closes.len() {
        return None;
    }
    let window = &closes[t + 1 - period..=t];
    let sma = window.iter().sum::<f64>() / period as f64;
    if sma == 0.0 {
        return None;
    }
    Some((closes[t] - sma) / sma * 100.0)
}

/// True range at `t`: the largest of high-low, |high - prev close| and
/// |low - prev close|. Undefined at row 0, which has no previous close.
pub fn true_range(bars: &[Bar], t: usize) -> Option<f64> {
    if t == 0 || t >= bars.len() {
        return None;
    }
    let bar = &bars[t];
    let prev_close = bars[t - 1].close;
    let high_low = bar.high - bar.low;
    let high_close = (bar.high - prev_close).abs();
    let low_close = (bar.low - prev_close).abs();
    Some(high_low.max(high_close).max(low_close))
}

/// Rolling mean of true range over `period` bars. Undefined for the first
/// `period` rows: the window must not include row 0's undefined true range.
pub fn average_true_range(bars: &[Bar], period: usize, t: usize) -> Option<f64> {
    if period == 0 || t < period || t >= bars.len() {
        return None;
    }
    let mut sum = 0.0;
    for i in t + 1 - period..=t {
        sum += true_range(bars, i)?;
    }
    Some(sum / period as f64)
}

/// Relative Strength Index over `period` close-to-close deltas.
///
/// Plain rolling means of gains and sign-flipped losses, transformed as
/// `100 - 100 / (1 + gain_mean / loss_mean)`. A window with zero loss mean
/// has no defined relative strength and yields `None`; the caller trims
/// the row like any other incomplete one.
pub fn rsi(closes: &[f64], period: usize, t: usize) -> Option<f64> {
    if period == 0 || t < period || t >= closes.len() {
        return None;
    }
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for i in t + 1 - period..=t {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += -delta;
        }
    }
    let gain_mean = gain_sum / period as f64;
    let loss_mean = loss_sum / period as f64;
    if loss_mean == 0.0 {
        return None;
    }
    let rs = gain_mean / loss_mean;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Percent change of close over the next `horizon` bars, used for label
/// construction. Undefined for the last `horizon` rows: the future is not
/// available yet.
pub fn forward_return(closes: &[f64], horizon: usize, t: usize) -> Option<f64> {
    if horizon == 0 || t + horizon >= closes.len() {
        return None;
    }
    let base = closes[t];
    if base == 0.0 {
        return None;
    }
    Some((closes[t + horizon] - base) / base * 100.0)
}

/// Batch variant of [`pct_return`], one entry per input row.
pub fn pct_return_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|t| pct_return(closes, period, t))
        .collect()
}

/// Batch variant of [`sma_deviation`].
pub fn sma_deviation_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|t| sma_deviation(closes, period, t))
        .collect()
}

/// Batch variant of [`average_true_range`].
pub fn average_true_range_series(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|t| average_true_range(bars, period, t))
        .collect()
}

/// Batch variant of [`rsi`].
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len()).map(|t| rsi(closes, period, t)).collect()
}
