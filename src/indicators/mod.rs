//! Pure indicator library.
//!
//! Stateless functions over ordered numeric sequences; deterministic given
//! identical input. Insufficient history never fails — every indicator has a
//! documented neutral default so the analytics layer can run from the very
//! first candle batch.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod ichimoku;
pub mod macd;
pub mod obv;
pub mod pivots;
pub mod rsi;
pub mod stoch_rsi;
pub mod volume_profile;
pub mod vwap;

pub use atr::atr;
pub use bollinger::{bollinger_bands, Bollinger};
pub use ema::ema;
pub use fibonacci::{fibonacci, FibLevels, Fibonacci, FibTrend};
pub use ichimoku::{ichimoku, Ichimoku};
pub use macd::{macd, Macd};
pub use obv::obv;
pub use pivots::{pivot_points, PivotPoints};
pub use rsi::rsi;
pub use stoch_rsi::{stoch_rsi, StochRsi};
pub use volume_profile::{volume_profile, VolumeProfile};
pub use vwap::vwap;

/// Simple moving average of a slice. Returns 0.0 for an empty slice.
pub(crate) fn sma(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Highest value in a slice (NaN-free input assumed).
pub(crate) fn highest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MIN, f64::max)
}

/// Lowest value in a slice.
pub(crate) fn lowest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MAX, f64::min)
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() < eps,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
pub(crate) fn make_candles(closes: &[f64]) -> Vec<crate::types::Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| crate::types::Candle {
            open_time: i as u64 * 60_000,
            open: c,
            high: c * 1.01,
            low: c * 0.99,
            close: c,
            volume: 100.0,
        })
        .collect()
}
