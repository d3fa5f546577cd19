//! Ichimoku Cloud over a candle window.
//!
//! Standard 9/26/52 midpoint construction. Windows shrink to the
//! available history rather than failing; with no candles everything
//! reads 0.0.

use serde::{Deserialize, Serialize};

use crate::types::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ichimoku {
    /// Conversion line: 9-period high/low midpoint.
    #[serde(rename = "tenkanSen")]
    pub tenkan_sen: f64,
    /// Base line: 26-period high/low midpoint.
    #[serde(rename = "kijunSen")]
    pub kijun_sen: f64,
    /// Leading span A: midpoint of tenkan and kijun.
    #[serde(rename = "senkouSpanA")]
    pub senkou_span_a: f64,
    /// Leading span B: 52-period high/low midpoint.
    #[serde(rename = "senkouSpanB")]
    pub senkou_span_b: f64,
    /// Lagging span value: the current close (plotted 26 periods back).
    #[serde(rename = "chikouSpan")]
    pub chikou_span: f64,
    /// Close 26 periods ago — the price the chikou span is compared
    /// against. Chikou above this reference is the bullish reading.
    #[serde(rename = "chikouReference")]
    pub chikou_reference: f64,
}

/// High/low midpoint over the last `period` candles (or fewer).
fn midpoint(candles: &[Candle], period: usize) -> f64 {
    let start = candles.len().saturating_sub(period);
    let window = &candles[start..];
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    (high + low) / 2.0
}

pub fn ichimoku(candles: &[Candle]) -> Ichimoku {
    let Some(last) = candles.last() else {
        return Ichimoku::default();
    };

    let tenkan_sen = midpoint(candles, 9);
    let kijun_sen = midpoint(candles, 26);
    let senkou_span_a = (tenkan_sen + kijun_sen) / 2.0;
    let senkou_span_b = midpoint(candles, 52);

    let chikou_reference = if candles.len() > 26 {
        candles[candles.len() - 27].close
    } else {
        candles[0].close
    };

    Ichimoku {
        tenkan_sen,
        kijun_sen,
        senkou_span_a,
        senkou_span_b,
        chikou_span: last.close,
        chikou_reference,
    }
}
