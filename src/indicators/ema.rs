//! Exponential moving average with the standard `2 / (period + 1)`
//! multiplier.

use super::sma;

/// EMA over a close-price series.
///
/// - With a `previous` value: one recursive step from the latest price.
/// - Without one but with at least `period` prices: seeds with the SMA of
///   the first `period` values.
/// - Without one and with insufficient history: the simple mean of
///   everything available.
pub fn ema(prices: &[f64], period: usize, previous: Option<f64>) -> f64 {
    if prices.is_empty() {
        return previous.unwrap_or(0.0);
    }

    match previous {
        Some(prev) => {
            let multiplier = 2.0 / (period as f64 + 1.0);
            let last = prices[prices.len() - 1];
            (last - prev) * multiplier + prev
        }
        None if prices.len() < period => sma(prices),
        None => sma(&prices[..period]),
    }
}
