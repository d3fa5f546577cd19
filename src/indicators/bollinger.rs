//! Bollinger Bands with sample standard deviation (n - 1 divisor).

use serde::{Deserialize, Serialize};

use super::sma;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Normalized band width: (upper - lower) / middle.
    pub width: f64,
    /// Price location inside the bands: 0 at lower, 1 at upper. Unclamped.
    #[serde(rename = "percentB")]
    pub percent_b: f64,
}

/// Bollinger Bands over a close-price series. With fewer than `period`
/// prices the bands collapse to a fixed ±5% envelope around the last
/// price (width 0.1, %B 0.5).
pub fn bollinger_bands(prices: &[f64], period: usize, mult: f64) -> Bollinger {
    let Some(&last) = prices.last() else {
        return Bollinger::default();
    };

    if prices.len() < period {
        return Bollinger {
            upper: last * 1.05,
            middle: last,
            lower: last * 0.95,
            width: 0.1,
            percent_b: 0.5,
        };
    }

    let window = &prices[prices.len() - period..];
    let middle = sma(window);

    // Sample standard deviation.
    let variance = window
        .iter()
        .map(|p| (p - middle).powi(2))
        .sum::<f64>()
        / (period as f64 - 1.0);
    let std_dev = variance.sqrt();

    let upper = middle + mult * std_dev;
    let lower = middle - mult * std_dev;
    let width = if middle != 0.0 {
        (upper - lower) / middle
    } else {
        0.0
    };
    let percent_b = if upper != lower {
        (last - lower) / (upper - lower)
    } else {
        0.5
    };

    Bollinger {
        upper,
        middle,
        lower,
        width,
        percent_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn insufficient_history_fallback_shape() {
        let result = bollinger_bands(&[100.0, 101.0, 99.0], 20, 2.0);
        assert_approx(result.middle, 99.0, 1e-9);
        assert_approx(result.upper, 103.95, 1e-9);
        assert_approx(result.lower, 94.05, 1e-9);
        assert_approx(result.width, 0.1, 1e-12);
        assert_approx(result.percent_b, 0.5, 1e-12);
    }

    #[test]
    fn band_ordering_always_holds() {
        let prices: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.63).sin() * 7.0)
            .collect();
        let result = bollinger_bands(&prices, 20, 2.0);
        assert!(result.upper >= result.middle);
        assert!(result.middle >= result.lower);
    }

    #[test]
    fn flat_window_collapses_bands() {
        let prices = vec![100.0; 25];
        let result = bollinger_bands(&prices, 20, 2.0);
        assert_approx(result.upper, 100.0, 1e-9);
        assert_approx(result.lower, 100.0, 1e-9);
        assert_approx(result.width, 0.0, 1e-12);
        // Flat bands guard the %B division with the neutral midpoint.
        assert_approx(result.percent_b, 0.5, 1e-12);
    }

    #[test]
    fn percent_b_tracks_last_price() {
        // Window mean 100, last price at the very top of the range.
        let mut prices = vec![100.0; 19];
        prices.push(110.0);
        let result = bollinger_bands(&prices, 20, 2.0);
        assert!(result.percent_b > 0.5, "percentB = {}", result.percent_b);
    }

    #[test]
    fn uses_sample_std_dev() {
        // Two-point window: mean 10, sample variance (1+1)/(2-1) = 2.
        let result = bollinger_bands(&[9.0, 11.0], 2, 2.0);
        let expected_dev = 2.0f64.sqrt();
        assert_approx(result.upper, 10.0 + 2.0 * expected_dev, 1e-9);
        assert_approx(result.lower, 10.0 - 2.0 * expected_dev, 1e-9);
    }
}
