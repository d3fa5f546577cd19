//! Fibonacci retracement/extension levels from the window swing.

use serde::{Deserialize, Serialize};

use crate::types::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FibTrend {
    Up,
    Down,
}

impl Default for FibTrend {
    fn default() -> Self {
        FibTrend::Up
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FibLevels {
    #[serde(rename = "ext1618")]
    pub ext_1618: f64,
    #[serde(rename = "ext1")]
    pub ext_1: f64,
    #[serde(rename = "ret786")]
    pub ret_786: f64,
    #[serde(rename = "ret618")]
    pub ret_618: f64,
    #[serde(rename = "ret5")]
    pub ret_5: f64,
    #[serde(rename = "ret382")]
    pub ret_382: f64,
    #[serde(rename = "ret236")]
    pub ret_236: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fibonacci {
    pub trend: FibTrend,
    #[serde(rename = "swingHigh")]
    pub swing_high: f64,
    #[serde(rename = "swingLow")]
    pub swing_low: f64,
    pub levels: FibLevels,
}

/// Levels from the swing high/low of the window. Trend is up when the
/// last close sits above the swing midpoint. Retracements measure back
/// from the swing in the trend direction; extensions project past it.
pub fn fibonacci(candles: &[Candle]) -> Fibonacci {
    let Some(last) = candles.last() else {
        return Fibonacci::default();
    };

    let swing_high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let swing_low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let range = swing_high - swing_low;
    let midpoint = (swing_high + swing_low) / 2.0;

    let trend = if last.close >= midpoint {
        FibTrend::Up
    } else {
        FibTrend::Down
    };

    let levels = match trend {
        FibTrend::Up => FibLevels {
            ext_1618: swing_low + 1.618 * range,
            ext_1: swing_high,
            ret_786: swing_high - 0.786 * range,
            ret_618: swing_high - 0.618 * range,
            ret_5: swing_high - 0.5 * range,
            ret_382: swing_high - 0.382 * range,
            ret_236: swing_high - 0.236 * range,
        },
        FibTrend::Down => FibLevels {
            ext_1618: swing_high - 1.618 * range,
            ext_1: swing_low,
            ret_786: swing_low + 0.786 * range,
            ret_618: swing_low + 0.618 * range,
            ret_5: swing_low + 0.5 * range,
            ret_382: swing_low + 0.382 * range,
            ret_236: swing_low + 0.236 * range,
        },
    };

    Fibonacci {
        trend,
        swing_high,
        swing_low,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn empty_window_is_default() {
        assert_eq!(fibonacci(&[]), Fibonacci::default());
    }

    #[test]
    fn uptrend_levels_descend_from_swing_high() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = fibonacci(&make_candles(&closes));
        assert_eq!(result.trend, FibTrend::Up);
        let l = result.levels;
        assert!(l.ret_236 > l.ret_382);
        assert!(l.ret_382 > l.ret_5);
        assert!(l.ret_5 > l.ret_618);
        assert!(l.ret_618 > l.ret_786);
        assert!(l.ext_1618 > result.swing_high);
    }

    #[test]
    fn downtrend_levels_ascend_from_swing_low() {
        let closes: Vec<f64> = (0..30).map(|i| 130.0 - i as f64).collect();
        let result = fibonacci(&make_candles(&closes));
        assert_eq!(result.trend, FibTrend::Down);
        let l = result.levels;
        assert!(l.ret_236 < l.ret_382);
        assert!(l.ret_5 < l.ret_618);
        assert!(l.ext_1618 < result.swing_low);
    }

    #[test]
    fn midline_retracement_is_swing_midpoint() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = fibonacci(&make_candles(&closes));
        let mid = (result.swing_high + result.swing_low) / 2.0;
        assert!((result.levels.ret_5 - mid).abs() < 1e-9);
    }
}
