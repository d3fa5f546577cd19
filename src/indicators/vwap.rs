//! Volume Weighted Average Price over a candle window.

use crate::types::Candle;

/// Cumulative Σ(typical price · volume) / Σvolume. Returns the last close
/// when cumulative volume is zero (division guard) and 0.0 for an empty
/// window.
pub fn vwap(candles: &[Candle]) -> f64 {
    let Some(last) = candles.last() else {
        return 0.0;
    };

    let mut cumulative_tpv = 0.0;
    let mut cumulative_volume = 0.0;
    for candle in candles {
        cumulative_tpv += candle.typical_price() * candle.volume;
        cumulative_volume += candle.volume;
    }

    if cumulative_volume == 0.0 {
        last.close
    } else {
        cumulative_tpv / cumulative_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn empty_window_is_zero() {
        assert_eq!(vwap(&[]), 0.0);
    }

    #[test]
    fn zero_volume_falls_back_to_last_close() {
        let mut candles = make_candles(&[100.0, 102.0, 101.0]);
        for c in &mut candles {
            c.volume = 0.0;
        }
        assert_approx(vwap(&candles), 101.0, 1e-12);
    }

    #[test]
    fn equal_volume_averages_typical_prices() {
        let candles = make_candles(&[100.0, 200.0]);
        let expected =
            (candles[0].typical_price() + candles[1].typical_price()) / 2.0;
        assert_approx(vwap(&candles), expected, 1e-9);
    }

    #[test]
    fn weighted_toward_heavy_volume() {
        let mut candles = make_candles(&[100.0, 200.0]);
        candles[1].volume = 900.0;
        let value = vwap(&candles);
        assert!(value > 150.0, "vwap = {value}");
    }
}
