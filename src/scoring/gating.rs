//! Signal emission gating.
//!
//! A high confidence number alone never emits. Eight independent
//! confirmation checks are graded into a 0-10 score, and a candidate
//! must clear confidence, confirmation, a minimum confidence delta and
//! a dynamic cool-down before a signal goes out. The cool-down shortens
//! as confidence rises.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::AnalyticsSnapshot;
use crate::config::GatingConfig;
use crate::types::{Direction, Timeframe};

/// Coarse quality grade derived from the confirmation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalQuality {
    Low,
    Moderate,
    Good,
    Excellent,
}

impl SignalQuality {
    fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            SignalQuality::Excellent
        } else if score >= 5.0 {
            SignalQuality::Good
        } else if score >= 3.0 {
            SignalQuality::Moderate
        } else {
            SignalQuality::Low
        }
    }
}

/// The eight confirmation checks and their graded score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub timeframe_alignment: bool,
    pub volume: bool,
    pub price_action: bool,
    pub momentum: bool,
    pub order_flow: bool,
    pub risk_reward: bool,
    pub market_structure: bool,
    pub volatility: bool,
    /// Weighted sum of the checks, 0-10.
    pub score: f64,
    pub quality: SignalQuality,
}

/// Grade the confirmation checks for one direction.
pub fn confirmation(
    snap: &AnalyticsSnapshot,
    direction: Direction,
    cfg: &GatingConfig,
) -> Confirmation {
    let price = snap.last_price;
    let s = direction.sign();

    // Mid/long timeframes dominate; at least 0.6 weighted alignment
    // across at least three of the four counts as strong.
    let alignment_weights = [
        (Timeframe::M15, 0.15),
        (Timeframe::H1, 0.35),
        (Timeframe::H4, 0.35),
        (Timeframe::D1, 0.15),
    ];
    let mut alignment = 0.0;
    let mut aligned = 0usize;
    for (tf, weight) in alignment_weights {
        let up = *snap.trends.get(tf);
        if (direction == Direction::Long && up) || (direction == Direction::Short && !up) {
            alignment += weight;
            aligned += 1;
        }
    }
    let timeframe_alignment = alignment >= 0.6 && aligned >= 3;

    let volume = snap.relative_volume >= 1.15;

    let ema_1h = *snap.ema.get(Timeframe::H1);
    let ema_4h = *snap.ema.get(Timeframe::H4);
    let price_action = price > 0.0
        && ema_1h > 0.0
        && ema_4h > 0.0
        && s * (price - ema_1h) > 0.0
        && s * (price - ema_4h) > 0.0;

    let rsi_1h = *snap.rsi.get(Timeframe::H1);
    let momentum = match direction {
        Direction::Long => rsi_1h > 40.0 && rsi_1h < 70.0 && snap.macd.histogram > 0.0,
        Direction::Short => rsi_1h < 60.0 && rsi_1h > 30.0 && snap.macd.histogram < 0.0,
    };

    let order_flow = match direction {
        Direction::Long => snap.order_book_pressure > 1.1,
        Direction::Short => snap.order_book_pressure < 0.9,
    };

    let risk_reward = snap.trade.risk_reward.r1 >= cfg.min_risk_reward;

    let pp = snap.pivot_points;
    let market_structure = match direction {
        Direction::Long => pp.s1 > pp.s2,
        Direction::Short => pp.r1 < pp.r2,
    };

    let volatility = snap.atr_pct() < cfg.max_volatility_pct;

    let mut score = 0.0;
    if timeframe_alignment {
        score += 2.0;
    }
    if volume {
        score += 1.0;
    }
    if price_action {
        score += 1.5;
    }
    if momentum {
        score += 1.5;
    }
    if order_flow {
        score += 1.0;
    }
    if risk_reward {
        score += 1.0;
    }
    if market_structure {
        score += 1.0;
    }
    if volatility {
        score += 1.0;
    }

    Confirmation {
        timeframe_alignment,
        volume,
        price_action,
        momentum,
        order_flow,
        risk_reward,
        market_structure,
        volatility,
        score,
        quality: SignalQuality::from_score(score),
    }
}

/// Why a candidate did or did not emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Emit,
    LowConfidence,
    WeakConfirmation,
    MarginalDelta,
    CoolingDown,
}

/// Cool-down required before the next emission, shrinking as
/// confidence rises.
fn required_cooldown(confidence: f64, cfg: &GatingConfig) -> Duration {
    if confidence > cfg.very_high_confidence {
        cfg.cooldown_very_high
    } else if confidence > cfg.high_confidence {
        cfg.cooldown_high
    } else {
        cfg.cooldown
    }
}

/// Evaluate the four emission conditions in order. `previous` is the
/// confidence attached to the last scored snapshot, `last_signal` the
/// time of the last emission for this symbol.
pub fn should_emit(
    confidence: f64,
    previous: f64,
    confirmation_score: f64,
    last_signal: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &GatingConfig,
) -> GateDecision {
    if confidence < cfg.min_confidence {
        return GateDecision::LowConfidence;
    }
    if confirmation_score < cfg.min_confirmation {
        return GateDecision::WeakConfirmation;
    }
    if (confidence - previous).abs() < cfg.min_confidence_delta {
        return GateDecision::MarginalDelta;
    }
    if let Some(last) = last_signal {
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        if elapsed <= required_cooldown(confidence, cfg) {
            return GateDecision::CoolingDown;
        }
    }
    GateDecision::Emit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn cfg() -> GatingConfig {
        GatingConfig::default()
    }

    #[test]
    fn first_signal_has_no_cooldown() {
        let now = Utc::now();
        assert_eq!(
            should_emit(80.0, 60.0, 6.0, None, now, &cfg()),
            GateDecision::Emit
        );
    }

    #[test]
    fn low_confidence_never_emits() {
        let now = Utc::now();
        assert_eq!(
            should_emit(70.0, 0.0, 10.0, None, now, &cfg()),
            GateDecision::LowConfidence
        );
    }

    #[test]
    fn weak_confirmation_blocks_high_confidence() {
        let now = Utc::now();
        assert_eq!(
            should_emit(90.0, 0.0, 4.5, None, now, &cfg()),
            GateDecision::WeakConfirmation
        );
    }

    #[test]
    fn marginal_drift_is_suppressed() {
        // 78 after 80 is a 2-point drift: below the delta threshold.
        let now = Utc::now();
        assert_eq!(
            should_emit(78.0, 80.0, 6.0, None, now, &cfg()),
            GateDecision::MarginalDelta
        );
    }

    #[test]
    fn cooldown_scales_with_confidence() {
        let gating = cfg();
        assert_eq!(required_cooldown(80.0, &gating), Duration::from_secs(900));
        assert_eq!(required_cooldown(86.0, &gating), Duration::from_secs(600));
        assert_eq!(required_cooldown(91.0, &gating), Duration::from_secs(300));
    }

    #[test]
    fn recent_signal_blocks_then_expires() {
        let gating = cfg();
        let now = Utc::now();
        let recent = now - TimeDelta::minutes(5);
        assert_eq!(
            should_emit(80.0, 60.0, 6.0, Some(recent), now, &gating),
            GateDecision::CoolingDown
        );
        let stale = now - TimeDelta::minutes(16);
        assert_eq!(
            should_emit(80.0, 60.0, 6.0, Some(stale), now, &gating),
            GateDecision::Emit
        );
        // Very high confidence shortens the wait enough for the recent
        // signal to pass.
        let recent = now - TimeDelta::minutes(6);
        assert_eq!(
            should_emit(91.0, 60.0, 6.0, Some(recent), now, &gating),
            GateDecision::Emit
        );
    }

    #[test]
    fn confidence_steps_70_78_80_emit_once() {
        // Walking confidence through 70, 78, 80 with good confirmation:
        // 70 fails the floor, 78 emits, 80 is a marginal 2-point drift.
        let gating = cfg();
        let now = Utc::now();
        let mut previous = 0.0;
        let mut last_signal = None;
        let mut emitted = 0;
        for confidence in [70.0, 78.0, 80.0] {
            if should_emit(confidence, previous, 6.0, last_signal, now, &gating)
                == GateDecision::Emit
            {
                emitted += 1;
                last_signal = Some(now);
            }
            // The snapshot records the new confidence on every pass.
            previous = confidence;
        }
        assert_eq!(emitted, 1);
    }

    #[test]
    fn confirmation_grades_stacked_setup() {
        let mut snap = AnalyticsSnapshot::new("BTCUSDT");
        snap.last_price = 100.0;
        snap.trends = crate::types::TfMap::filled(true);
        snap.relative_volume = 1.3;
        snap.ema = crate::types::TfMap::filled(95.0);
        let mut rsi = crate::types::TfMap::filled(50.0);
        rsi.set(Timeframe::H1, 55.0);
        snap.rsi = rsi;
        snap.macd.histogram = 0.5;
        snap.order_book_pressure = 1.5;
        snap.trade.risk_reward.r1 = 2.0;
        snap.pivot_points.s1 = 95.0;
        snap.pivot_points.s2 = 90.0;
        snap.atr = 2.0;

        let result = confirmation(&snap, Direction::Long, &cfg());
        assert!(result.timeframe_alignment);
        assert!(result.volume);
        assert!(result.price_action);
        assert!(result.momentum);
        assert!(result.order_flow);
        assert!(result.risk_reward);
        assert!(result.market_structure);
        assert!(result.volatility);
        assert_eq!(result.score, 10.0);
        assert_eq!(result.quality, SignalQuality::Excellent);
    }

    #[test]
    fn neutral_snapshot_confirmation_is_weak() {
        let mut snap = AnalyticsSnapshot::new("BTCUSDT");
        snap.last_price = 100.0;
        let result = confirmation(&snap, Direction::Long, &cfg());
        // Only the volatility check passes (0% ATR is acceptable).
        assert!(result.score <= 3.0, "score = {}", result.score);
        assert!(matches!(
            result.quality,
            SignalQuality::Low | SignalQuality::Moderate
        ));
    }
}
