//! Average True Range with Wilder smoothing.

use crate::types::Candle;

/// ATR over a candle window. True range is
/// `max(high - low, |high - prev_close|, |low - prev_close|)`.
/// Fewer true ranges than `period` yield their simple mean; fewer than
/// two candles yield 0.0.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if candles.len() < 2 {
        return 0.0;
    }

    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    for pair in candles.windows(2) {
        let prev_close = pair[0].close;
        let current = &pair[1];
        let tr = (current.high - current.low)
            .max((current.high - prev_close).abs())
            .max((current.low - prev_close).abs());
        true_ranges.push(tr);
    }

    if true_ranges.len() < period {
        return true_ranges.iter().sum::<f64>() / true_ranges.len() as f64;
    }

    // Simple-mean seed, then Wilder smoothing.
    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    let p = period as f64;
    for &tr in &true_ranges[period..] {
        atr = (atr * (p - 1.0) + tr) / p;
    }
    atr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};
    use crate::types::Candle;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn too_few_candles_is_zero() {
        assert_eq!(atr(&[], 14), 0.0);
        assert_eq!(atr(&make_candles(&[100.0]), 14), 0.0);
    }

    #[test]
    fn short_history_uses_simple_mean() {
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.0),
            candle(100.0, 102.0, 100.0, 101.0), // TR = max(2, 2, 0) = 2
            candle(101.0, 104.0, 101.0, 103.0), // TR = max(3, 3, 0) = 3
        ];
        assert_approx(atr(&candles, 14), 2.5, 1e-12);
    }

    #[test]
    fn gap_uses_previous_close() {
        // Gap up: TR must span from the previous close, not the bar range.
        let candles = vec![
            candle(100.0, 100.5, 99.5, 100.0),
            candle(105.0, 105.5, 104.5, 105.0), // TR = |105.5 - 100| = 5.5
        ];
        assert_approx(atr(&candles, 14), 5.5, 1e-12);
    }

    #[test]
    fn wilder_smoothing_kicks_in_past_period() {
        let mut candles = Vec::new();
        for i in 0..10 {
            let base = 100.0 + i as f64;
            candles.push(candle(base, base + 1.0, base - 1.0, base));
        }
        let short = atr(&candles, 3);
        assert!(short > 0.0);
        // Constant 2-point-ish ranges: smoothing stays near the seed.
        assert!(short < 3.0, "atr = {short}");
    }
}
