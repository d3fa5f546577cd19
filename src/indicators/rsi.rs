//! Relative Strength Index.
//!
//! Classic average-gain / average-loss with Wilder smoothing
//! (`avg = (avg * (period - 1) + value) / period`) after a simple-average
//! seed over the first `period` changes.

/// RSI over a close-price series. Returns the neutral 50.0 when fewer than
/// `period + 1` prices exist, and 100.0 when the average loss is exactly
/// zero (division guard).
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if prices.len() < period + 1 {
        return 50.0;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed: simple averages over the first `period` changes. A zero change
    // counts toward gains, matching the seeded recursion below.
    let mut gains = 0.0;
    let mut losses = 0.0;
    for &change in &changes[..period] {
        if change >= 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }
    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;

    // Wilder smoothing for the remaining changes.
    let p = period as f64;
    for &change in &changes[period..] {
        if change >= 0.0 {
            avg_gain = (avg_gain * (p - 1.0) + change) / p;
            avg_loss = (avg_loss * (p - 1.0)) / p;
        } else {
            avg_gain = (avg_gain * (p - 1.0)) / p;
            avg_loss = (avg_loss * (p - 1.0) - change) / p;
        }
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
