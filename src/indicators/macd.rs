//! Moving Average Convergence Divergence.
//!
//! Fast and slow EMA series seeded by SMA, MACD line aligned by the
//! `slow - fast` offset, signal line as an SMA-seeded EMA of the MACD
//! series.

use serde::{Deserialize, Serialize};

use super::sma;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD over a close-price series. Returns all zeros when fewer than
/// `max(fast, slow) + signal_period` prices exist.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    if prices.len() < fast.max(slow) + signal_period {
        return Macd::default();
    }

    let fast_emas = ema_series(prices, fast);
    let slow_emas = ema_series(prices, slow);

    // Align the two series: the fast series starts `slow - fast` entries
    // earlier than the slow one.
    let offset = slow - fast;
    let mut line_values = Vec::with_capacity(slow_emas.len());
    for (i, &slow_val) in slow_emas.iter().enumerate() {
        let fast_idx = i + offset;
        if fast_idx < fast_emas.len() {
            line_values.push(fast_emas[fast_idx] - slow_val);
        }
    }

    let signal_values = {
        let mut out = Vec::with_capacity(line_values.len());
        out.push(sma(&line_values[..signal_period]));
        let multiplier = 2.0 / (signal_period as f64 + 1.0);
        for &value in &line_values[signal_period..] {
            let prev = out[out.len() - 1];
            out.push((value - prev) * multiplier + prev);
        }
        out
    };

    let line = *line_values.last().unwrap_or(&0.0);
    let signal = *signal_values.last().unwrap_or(&0.0);
    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

/// SMA-seeded EMA series: index 0 holds the seed over the first `period`
/// prices, then one entry per subsequent price.
fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len() - period + 1);
    out.push(sma(&prices[..period]));
    let multiplier = 2.0 / (period as f64 + 1.0);
    for &price in &prices[period..] {
        let prev = out[out.len() - 1];
        out.push((price - prev) * multiplier + prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn insufficient_history_returns_zeros() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = macd(&prices, 12, 26, 9);
        assert_eq!(result.line, 0.0);
        assert_eq!(result.signal, 0.0);
        assert_eq!(result.histogram, 0.0);
    }

    #[test]
    fn histogram_is_exactly_line_minus_signal() {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.31).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        let result = macd(&prices, 12, 26, 9);
        assert_eq!(result.histogram, result.line - result.signal);
    }

    #[test]
    fn rising_series_has_positive_line() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let result = macd(&prices, 12, 26, 9);
        assert!(result.line > 0.0, "line = {}", result.line);
    }

    #[test]
    fn falling_series_has_negative_line() {
        let prices: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let result = macd(&prices, 12, 26, 9);
        assert!(result.line < 0.0, "line = {}", result.line);
    }

    #[test]
    fn flat_series_is_zero() {
        let prices = vec![100.0; 60];
        let result = macd(&prices, 12, 26, 9);
        assert_approx(result.line, 0.0, 1e-9);
        assert_approx(result.signal, 0.0, 1e-9);
    }
}
