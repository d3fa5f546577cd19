//! Stochastic RSI.
//!
//! Builds an RSI series over the input, locates each RSI value inside its
//! rolling min/max window, then smooths twice with simple moving averages
//! (%K then %D).

use serde::{Deserialize, Serialize};

use super::rsi::rsi;
use super::sma;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochRsi {
    pub k: f64,
    pub d: f64,
}

impl Default for StochRsi {
    fn default() -> Self {
        StochRsi { k: 50.0, d: 50.0 }
    }
}

/// Stochastic RSI over a close-price series. Returns the neutral
/// `{k: 50, d: 50}` when fewer than `period` RSI values exist. A flat RSI
/// window (max == min) reads as 50 (division guard).
pub fn stoch_rsi(prices: &[f64], period: usize, k_period: usize, d_period: usize) -> StochRsi {
    // RSI over every prefix, same cadence the raw stream would produce.
    let rsi_values: Vec<f64> = (0..prices.len())
        .map(|i| rsi(&prices[..=i], period))
        .collect();

    if rsi_values.len() < period {
        return StochRsi::default();
    }

    // Raw stochastic of the RSI series.
    let mut raw = Vec::with_capacity(rsi_values.len() - period + 1);
    for i in (period - 1)..rsi_values.len() {
        let window = &rsi_values[i + 1 - period..=i];
        let highest = window.iter().copied().fold(f64::MIN, f64::max);
        let lowest = window.iter().copied().fold(f64::MAX, f64::min);
        let current = rsi_values[i];
        let k = if highest == lowest {
            50.0
        } else {
            (current - lowest) / (highest - lowest) * 100.0
        };
        raw.push(k);
    }

    // %K: SMA of the raw stochastic.
    let k_values: Vec<f64> = if raw.len() >= k_period {
        (k_period - 1..raw.len())
            .map(|i| sma(&raw[i + 1 - k_period..=i]))
            .collect()
    } else {
        Vec::new()
    };

    // %D: SMA of %K.
    let d_values: Vec<f64> = if k_values.len() >= d_period {
        (d_period - 1..k_values.len())
            .map(|i| sma(&k_values[i + 1 - d_period..=i]))
            .collect()
    } else {
        Vec::new()
    };

    StochRsi {
        k: k_values.last().copied().unwrap_or(50.0),
        d: d_values.last().copied().unwrap_or(50.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_returns_neutral() {
        let result = stoch_rsi(&[100.0, 101.0], 14, 3, 3);
        assert_eq!(result.k, 50.0);
        assert_eq!(result.d, 50.0);
    }

    #[test]
    fn flat_series_reads_neutral() {
        // Constant prices keep every prefix RSI at 50 (insufficient
        // history) or in a flat window; both paths resolve to 50.
        let prices = vec![100.0; 40];
        let result = stoch_rsi(&prices, 14, 3, 3);
        assert_eq!(result.k, 50.0);
        assert_eq!(result.d, 50.0);
    }

    #[test]
    fn strong_rally_pushes_k_high() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let result = stoch_rsi(&prices, 14, 3, 3);
        assert!(result.k > 50.0, "k = {}", result.k);
    }

    #[test]
    fn bounded() {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 5.0)
            .collect();
        let result = stoch_rsi(&prices, 14, 3, 3);
        assert!((0.0..=100.0).contains(&result.k));
        assert!((0.0..=100.0).contains(&result.d));
    }
}
