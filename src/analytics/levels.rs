//! Support/resistance resolution.
//!
//! Gathers candidate levels from the structural indicators (pivots,
//! volume profile, Bollinger bands, Fibonacci retracements, Ichimoku
//! base line), filters them to the correct side of price within a
//! horizon-specific distance window, and keeps the candidate nearest to
//! price. Every decision lands in the snapshot's calculation log.

use serde::{Deserialize, Serialize};

use crate::indicators::pivot_points;
use crate::types::{Candle, SymbolSpec};

use super::snapshot::AnalyticsSnapshot;

/// Minimum candles per window before structural levels are trusted.
const MIN_CANDLES: usize = 20;
/// Pivot refresh window (most recent candles).
const PIVOT_WINDOW: usize = 20;
/// Max candidate distance from price, medium (4h) horizon.
const MAX_DIST_4H: f64 = 0.10;
/// Max candidate distance from price, long (1d) horizon.
const MAX_DIST_1D: f64 = 0.20;
/// Fallback band half-width, medium horizon.
const FALLBACK_4H: f64 = 0.05;
/// Fallback band half-width, long horizon.
const FALLBACK_1D: f64 = 0.15;

/// A resolved support/resistance pair for one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Band {
    pub support: f64,
    pub resistance: f64,
}

/// Nearest candidate strictly below `price` within `max_dist` (as a
/// fraction of price). `None` when no candidate qualifies.
fn nearest_below(candidates: &[f64], price: f64, max_dist: f64) -> Option<f64> {
    candidates
        .iter()
        .copied()
        .filter(|&level| level < price && level > price * (1.0 - max_dist))
        .max_by(f64::total_cmp)
}

/// Nearest candidate strictly above `price` within `max_dist`.
fn nearest_above(candidates: &[f64], price: f64, max_dist: f64) -> Option<f64> {
    candidates
        .iter()
        .copied()
        .filter(|&level| level > price && level < price * (1.0 + max_dist))
        .min_by(f64::total_cmp)
}

/// High/low/close over the most recent `PIVOT_WINDOW` candles.
fn pivot_inputs(candles: &[Candle]) -> (f64, f64, f64) {
    let start = candles.len().saturating_sub(PIVOT_WINDOW);
    let window = &candles[start..];
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let close = window.last().map(|c| c.close).unwrap_or(0.0);
    (high, low, close)
}

/// Resolve both horizon bands on `snap` from the 4h and 1d windows.
///
/// With fewer than `MIN_CANDLES` in either window the structural levels
/// are unreliable, so both bands degrade to Bollinger-derived ranges
/// (the long horizon widened by a further 5%).
pub fn resolve_zones(
    snap: &mut AnalyticsSnapshot,
    candles_4h: &[Candle],
    candles_1d: &[Candle],
    spec: &SymbolSpec,
) {
    let price = if snap.last_price > 0.0 {
        snap.last_price
    } else {
        candles_4h.last().map(|c| c.close).unwrap_or(0.0)
    };
    if price <= 0.0 {
        return;
    }

    if candles_4h.len() < MIN_CANDLES || candles_1d.len() < MIN_CANDLES {
        let bb = snap.bollinger;
        snap.zone_4h = Band {
            support: spec.round(bb.lower),
            resistance: spec.round(bb.upper),
        };
        snap.zone_1d = Band {
            support: spec.round(bb.lower * 0.95),
            resistance: spec.round(bb.upper * 1.05),
        };
        snap.record(
            "levels",
            snap.zone_4h.support,
            "short history, bollinger fallback for both horizons",
        );
        return;
    }

    // Refresh pivots from the recent windows before harvesting levels.
    let (h4, l4, c4) = pivot_inputs(candles_4h);
    let pivots_4h = pivot_points(h4, l4, c4);
    let (h1d, l1d, c1d) = pivot_inputs(candles_1d);
    snap.pivot_points = pivot_points(h1d, l1d, c1d);

    let fib = snap.fibonacci.levels;
    let vp = snap.volume_profile;
    let bb = snap.bollinger;
    let kijun = snap.ichimoku.kijun_sen;

    let support_4h_candidates = [pivots_4h.s1, vp.poc, bb.lower, fib.ret_618, kijun];
    let resistance_4h_candidates = [pivots_4h.r1, vp.poc, bb.upper, fib.ret_618, kijun];
    let support_1d_candidates = [snap.pivot_points.s1, fib.ret_786, vp.value_area_low];
    let resistance_1d_candidates = [snap.pivot_points.r1, fib.ret_236, vp.value_area_high];

    let support_4h = nearest_below(&support_4h_candidates, price, MAX_DIST_4H)
        .unwrap_or(price * (1.0 - FALLBACK_4H));
    let resistance_4h = nearest_above(&resistance_4h_candidates, price, MAX_DIST_4H)
        .unwrap_or(price * (1.0 + FALLBACK_4H));
    let support_1d = nearest_below(&support_1d_candidates, price, MAX_DIST_1D)
        .unwrap_or(price * (1.0 - FALLBACK_1D));
    let resistance_1d = nearest_above(&resistance_1d_candidates, price, MAX_DIST_1D)
        .unwrap_or(price * (1.0 + FALLBACK_1D));

    snap.zone_4h = Band {
        support: spec.round(support_4h),
        resistance: spec.round(resistance_4h),
    };
    snap.zone_1d = Band {
        support: spec.round(support_1d),
        resistance: spec.round(resistance_1d),
    };

    snap.record("levels.4h.support", snap.zone_4h.support, "nearest below");
    snap.record(
        "levels.4h.resistance",
        snap.zone_4h.resistance,
        "nearest above",
    );
    snap.record("levels.1d.support", snap.zone_1d.support, "nearest below");
    snap.record(
        "levels.1d.resistance",
        snap.zone_1d.resistance,
        "nearest above",
    );
}
