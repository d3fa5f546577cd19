//! Confidence fusion.
//!
//! Weighted sum of the eleven sub-scores, rounded to a confidence
//! percentage, with two guard rails: extreme-condition setups are
//! floored at 45 even when the composite reads lower, and mixed-signal
//! setups are capped at 85 even when the composite reads higher.

use crate::analytics::{AnalyticsSnapshot, WhaleFlow};
use crate::config::ScoringConfig;
use crate::types::{Direction, Timeframe};

use super::subscores::{sub_scores, SubScores};

/// One direction's scored result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub direction: Direction,
    /// Raw weighted composite before rounding and guard rails.
    pub strength: f64,
    /// Final 0-100 confidence.
    pub confidence: f64,
    pub sub: SubScores,
}

pub fn score(snap: &AnalyticsSnapshot, direction: Direction, cfg: &ScoringConfig) -> Score {
    let sub = sub_scores(snap, direction, cfg);
    let strength = sub.timeframe * cfg.w_timeframe
        + sub.macd * cfg.w_macd
        + sub.bollinger * cfg.w_bollinger
        + sub.volume * cfg.w_volume
        + sub.orderbook * cfg.w_orderbook
        + sub.whale * cfg.w_whale
        + sub.volatility * cfg.w_volatility
        + sub.funding * cfg.w_funding
        + sub.context * cfg.w_context
        + sub.ichimoku * cfg.w_ichimoku
        + sub.obv * cfg.w_obv;

    let mut confidence = strength.round();
    if confidence < 45.0 && extreme_conditions(snap, direction) {
        confidence = 45.0;
    }
    if confidence > 85.0 && mixed_signals(snap, direction) {
        confidence = 85.0;
    }
    confidence = confidence.clamp(0.0, 100.0);

    Score {
        direction,
        strength,
        confidence,
        sub,
    }
}

/// Extreme-condition floor: any one of three strongly stretched setups
/// justifies at least moderate confidence.
fn extreme_conditions(snap: &AnalyticsSnapshot, direction: Direction) -> bool {
    let price = snap.last_price;
    let b = snap.bollinger.percent_b;
    let hist = snap.macd.histogram;
    let rsi_1h = *snap.rsi.get(Timeframe::H1);
    let rsi_4h = *snap.rsi.get(Timeframe::H4);

    match direction {
        Direction::Long => {
            (b < 0.1 && rsi_1h < 30.0)
                || (rsi_4h < 25.0 && hist > 0.0)
                || (snap.zone_4h.support > 0.0
                    && price < snap.zone_4h.support * 1.01
                    && rsi_1h < 35.0)
        }
        Direction::Short => {
            (b > 0.9 && rsi_1h > 70.0)
                || (rsi_4h > 75.0 && hist < 0.0)
                || (snap.zone_4h.resistance > 0.0
                    && price > snap.zone_4h.resistance * 0.99
                    && rsi_1h > 65.0)
        }
    }
}

/// Mixed-signal ceiling: a stretched composite against contradicting
/// momentum or flow caps out.
fn mixed_signals(snap: &AnalyticsSnapshot, direction: Direction) -> bool {
    let b = snap.bollinger.percent_b;
    let hist = snap.macd.histogram;
    let rsi_1h = *snap.rsi.get(Timeframe::H1);
    let rsi_4h = *snap.rsi.get(Timeframe::H4);
    let rsi_1d = *snap.rsi.get(Timeframe::D1);

    match direction {
        Direction::Long => {
            (b > 0.8 && rsi_1d > 65.0)
                || (hist < 0.0 && rsi_4h > 75.0)
                || (snap.whale_flow == WhaleFlow::Outflow && rsi_1h > 70.0)
        }
        Direction::Short => {
            (b < 0.2 && rsi_1d < 35.0)
                || (hist > 0.0 && rsi_4h < 25.0)
                || (snap.whale_flow == WhaleFlow::Inflow && rsi_1h < 30.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TfMap;
    use proptest::prelude::*;

    fn neutral_snapshot() -> AnalyticsSnapshot {
        let mut snap = AnalyticsSnapshot::new("BTCUSDT");
        snap.last_price = 100.0;
        snap
    }

    #[test]
    fn neutral_snapshot_scores_low() {
        let snap = neutral_snapshot();
        let cfg = ScoringConfig::default();
        let result = score(&snap, Direction::Long, &cfg);
        assert!(result.confidence < 45.0, "got {}", result.confidence);
    }

    #[test]
    fn stacked_bullish_inputs_outscore_neutral() {
        let mut snap = neutral_snapshot();
        snap.rsi = TfMap::filled(28.0);
        snap.bollinger.percent_b = 0.03;
        snap.bollinger.width = 0.02;
        snap.macd.line = 1.0;
        snap.macd.signal = 0.5;
        snap.macd.histogram = 0.5;
        snap.relative_volume = 1.6;
        snap.order_book_pressure = 1.8;
        snap.taker_aggression = 65.0;
        snap.whale_flow = WhaleFlow::Inflow;
        snap.atr = 2.0;
        let cfg = ScoringConfig::default();

        let long = score(&snap, Direction::Long, &cfg);
        let short = score(&snap, Direction::Short, &cfg);
        assert!(long.confidence > short.confidence + 20.0);
    }

    #[test]
    fn extreme_conditions_floor_applies() {
        let mut snap = neutral_snapshot();
        // Deep oversold but every other factor flat: raw composite is
        // low, the floor lifts it.
        snap.bollinger.percent_b = 0.05;
        let mut rsi = TfMap::filled(50.0);
        rsi.set(Timeframe::H1, 25.0);
        snap.rsi = rsi;
        let cfg = ScoringConfig::default();
        let result = score(&snap, Direction::Long, &cfg);
        assert!(result.confidence >= 45.0, "got {}", result.confidence);
    }

    #[test]
    fn floor_needs_the_conditions() {
        let snap = neutral_snapshot();
        let cfg = ScoringConfig::default();
        let result = score(&snap, Direction::Long, &cfg);
        assert!(result.confidence < 45.0);
    }

    #[test]
    fn mixed_signal_ceiling_detected() {
        let mut snap = neutral_snapshot();
        snap.bollinger.percent_b = 0.85;
        let mut rsi = TfMap::filled(50.0);
        rsi.set(Timeframe::D1, 70.0);
        snap.rsi = rsi;
        assert!(mixed_signals(&snap, Direction::Long));
        assert!(!mixed_signals(&snap, Direction::Short));
    }

    proptest! {
        #[test]
        fn confidence_always_in_range(
            rsi in 0.0f64..100.0,
            percent_b in -0.5f64..1.5,
            pressure in 0.01f64..10.0,
            rvol in 0.0f64..5.0,
            atr in 0.0f64..10.0,
            funding in -0.1f64..0.1,
        ) {
            let mut snap = neutral_snapshot();
            snap.rsi = TfMap::filled(rsi);
            snap.bollinger.percent_b = percent_b;
            snap.order_book_pressure = pressure;
            snap.taker_aggression = 50.0;
            snap.relative_volume = rvol;
            snap.atr = atr;
            snap.funding_rate = funding;
            let cfg = ScoringConfig::default();
            for direction in [Direction::Long, Direction::Short] {
                let result = score(&snap, direction, &cfg);
                prop_assert!((0.0..=100.0).contains(&result.confidence));
            }
        }
    }
}
