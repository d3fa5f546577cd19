//! Per-factor sub-scores.
//!
//! Each factor is scored for a given direction on its own point scale
//! (the scales are uneven on purpose: the timeframe composite dominates,
//! volatility and OBV are small nudges). Fusion applies the configured
//! weights in `confidence`.

use crate::analytics::{AnalyticsSnapshot, WhaleFlow};
use crate::config::ScoringConfig;
use crate::types::{Direction, Timeframe};

/// The eleven factor scores feeding confidence fusion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubScores {
    pub timeframe: f64,
    pub macd: f64,
    pub bollinger: f64,
    pub volume: f64,
    pub orderbook: f64,
    pub whale: f64,
    pub volatility: f64,
    pub funding: f64,
    pub context: f64,
    pub ichimoku: f64,
    pub obv: f64,
}

pub fn sub_scores(
    snap: &AnalyticsSnapshot,
    direction: Direction,
    cfg: &ScoringConfig,
) -> SubScores {
    SubScores {
        timeframe: timeframe_score(snap, direction),
        macd: macd_score(snap, direction, cfg),
        bollinger: bollinger_score(snap, direction),
        volume: volume_score(snap, direction),
        orderbook: orderbook_score(snap, direction),
        whale: whale_score(snap, direction),
        volatility: volatility_score(snap, direction),
        funding: funding_score(snap, direction),
        context: context_score(snap, direction, cfg),
        ichimoku: ichimoku_score(snap, direction),
        obv: obv_score(snap, direction),
    }
}

/// RSI reading strength for one timeframe. Oversold favors longs,
/// overbought favors shorts; the opposite extreme contradicts.
fn rsi_strength(rsi: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Long => {
            if rsi < 30.0 {
                1.0
            } else if rsi < 40.0 {
                0.8
            } else if rsi < 45.0 {
                0.5
            } else if rsi > 70.0 {
                -0.5
            } else {
                0.0
            }
        }
        Direction::Short => {
            if rsi > 70.0 {
                1.0
            } else if rsi > 60.0 {
                0.8
            } else if rsi > 55.0 {
                0.5
            } else if rsi < 30.0 {
                -0.5
            } else {
                0.0
            }
        }
    }
}

/// Stochastic RSI strength: extremes plus %K/%D crossover posture.
fn stoch_strength(k: f64, d: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Long => {
            if k < 20.0 && d < 20.0 {
                1.0
            } else if k > d && k < 50.0 {
                0.5
            } else if k > 80.0 && k < d {
                -0.5
            } else {
                0.0
            }
        }
        Direction::Short => {
            if k > 80.0 && d > 80.0 {
                1.0
            } else if k < d && k > 50.0 {
                0.5
            } else if k < 20.0 && k > d {
                -0.5
            } else {
                0.0
            }
        }
    }
}

/// Weighted multi-timeframe composite: RSI + stochastic + EMA posture
/// per timeframe, normalized to ~0-35 with up to 10 bonus points for
/// trend consistency across timeframes.
fn timeframe_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let price = snap.last_price;
    let s = direction.sign();
    let mut score = 0.0;
    let mut consistency = 0.0;

    for tf in Timeframe::ALL {
        let weight = tf.weight();
        let rsi = rsi_strength(*snap.rsi.get(tf), direction);
        let stoch = snap.stoch_rsi.get(tf);
        let stoch = stoch_strength(stoch.k, stoch.d, direction);

        let ema = *snap.ema.get(tf);
        let mut trend = 0.0;
        if price > 0.0 && ema > 0.0 {
            let ema_diff = (ema - price).abs() / price;
            let confirms = s * (price - ema) > 0.0;
            trend = (ema_diff * 150.0).min(1.5) * if confirms { 1.0 } else { -0.5 };
            if confirms {
                consistency += weight;
            }
        }

        score += (weight * (rsi + stoch + trend)).max(0.0);
    }

    // Timeframe weights sum to 1, so no renormalization needed.
    score * 35.0 + consistency * 10.0
}

/// MACD momentum: histogram on the right side scores highest, a
/// histogram within the near-cross band of |line| still earns partial
/// credit for an impending crossover. Max 15.
fn macd_score(snap: &AnalyticsSnapshot, direction: Direction, cfg: &ScoringConfig) -> f64 {
    let s = direction.sign();
    let hist = s * snap.macd.histogram;
    let line_mag = snap.macd.line.abs();
    let mut score = 0.0;

    if hist > 0.0 {
        score += 8.0;
        if hist > cfg.macd_near_cross * line_mag {
            score += 4.0;
        }
        if s * (snap.macd.line - snap.macd.signal) > 0.0 {
            score += 3.0;
        }
    } else if hist > -cfg.macd_near_cross * line_mag {
        score += 5.0;
        if hist > -cfg.macd_very_near_cross * line_mag {
            score += 2.0;
        }
    }
    score
}

/// Bollinger %B positioning, clamped to 0..15. Band compression near
/// the relevant extreme adds breakout potential; the opposite extreme
/// penalizes.
fn bollinger_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let b = snap.bollinger.percent_b;
    let width = snap.bollinger.width;
    let mut score: f64 = 0.0;

    match direction {
        Direction::Long => {
            if b < 0.05 {
                score = 15.0;
            } else if b < 0.2 {
                score = 10.0;
            } else if b < 0.4 {
                score = 5.0;
            }
            if b < 0.3 && width < 0.03 {
                score += 5.0;
            }
            if b > 0.9 {
                score -= 5.0;
            }
        }
        Direction::Short => {
            if b > 0.95 {
                score = 15.0;
            } else if b > 0.8 {
                score = 10.0;
            } else if b > 0.6 {
                score = 5.0;
            }
            if b > 0.7 && width < 0.03 {
                score += 5.0;
            }
            if b < 0.1 {
                score -= 5.0;
            }
        }
    }
    score.clamp(0.0, 15.0)
}

/// Relative-volume tiers plus a bonus when heavy volume confirms the
/// 24h price direction. Max 12.
fn volume_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let rvol = snap.relative_volume;
    let mut score = if rvol > 2.0 {
        10.0
    } else if rvol > 1.5 {
        8.0
    } else if rvol > 1.2 {
        6.0
    } else if rvol > 1.0 {
        4.0
    } else if rvol > 0.8 {
        2.0
    } else {
        0.0
    };

    if rvol > 1.2 && direction.sign() * snap.price_change_pct > 0.0 {
        score += 2.0;
    }
    score
}

/// Order-book pressure tiers with a taker-aggression bonus, clamped to
/// 0..15. Pressure against the direction scores negative before the
/// clamp.
fn orderbook_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let pressure = snap.order_book_pressure;
    let aggression = snap.taker_aggression;
    let mut score: f64 = match direction {
        Direction::Long => {
            if pressure > 2.0 {
                15.0
            } else if pressure > 1.5 {
                12.0
            } else if pressure > 1.2 {
                8.0
            } else if pressure > 1.0 {
                4.0
            } else if pressure < 0.8 {
                -5.0
            } else {
                0.0
            }
        }
        Direction::Short => {
            if pressure < 0.5 {
                15.0
            } else if pressure < 0.7 {
                12.0
            } else if pressure < 0.8 {
                8.0
            } else if pressure < 1.0 {
                4.0
            } else if pressure > 1.2 {
                -5.0
            } else {
                0.0
            }
        }
    };

    match direction {
        Direction::Long if aggression > 60.0 => score += 3.0,
        Direction::Short if aggression < 40.0 => score += 3.0,
        _ => {}
    }
    score.clamp(0.0, 15.0)
}

/// Whale flow aligned with the direction scores 10; against it would
/// score negative and is floored at 0.
fn whale_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let score: f64 = match (direction, snap.whale_flow) {
        (Direction::Long, WhaleFlow::Inflow) | (Direction::Short, WhaleFlow::Outflow) => 10.0,
        (Direction::Long, WhaleFlow::Outflow) | (Direction::Short, WhaleFlow::Inflow) => -5.0,
        (_, WhaleFlow::Neutral) => 0.0,
    };
    score.max(0.0)
}

/// ATR% regime preference. Longs like moderate volatility; shorts like
/// elevated volatility. Max 5.
fn volatility_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let pct = snap.atr_pct();
    match direction {
        Direction::Long => {
            if pct > 1.0 && pct < 4.0 {
                5.0
            } else if pct > 4.0 {
                2.0
            } else if pct < 0.5 && pct > 0.0 {
                3.0
            } else {
                0.0
            }
        }
        Direction::Short => {
            if pct > 3.0 {
                5.0
            } else if pct > 1.5 {
                4.0
            } else if pct < 0.5 && pct > 0.0 {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Contrarian funding read: shorts paying longs favors longs and vice
/// versa, scaled by rate magnitude. Max 5.
fn funding_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let rate = snap.funding_rate;
    match direction {
        Direction::Long if rate < -0.01 => (rate.abs() * 300.0).min(5.0),
        Direction::Short if rate > 0.01 => (rate * 300.0).min(5.0),
        _ => 0.0,
    }
}

/// Market context composite: regime detection, weighted trend
/// alignment, price at the resolved 4h zone, pivot structure and
/// regime-appropriate setup bonuses. Clamped to 0..15.
fn context_score(snap: &AnalyticsSnapshot, direction: Direction, cfg: &ScoringConfig) -> f64 {
    let price = snap.last_price;
    let s = direction.sign();
    let mut score: f64 = 0.0;

    let is_ranging =
        (snap.bollinger.width - cfg.ranging_bb_width).abs() < cfg.ranging_bb_tolerance;
    let is_trending = snap.atr_pct() > cfg.trending_atr_pct;

    // Long-horizon timeframes dominate the alignment read.
    let alignment_weights = [
        (Timeframe::D1, 0.5),
        (Timeframe::H4, 0.3),
        (Timeframe::H1, 0.15),
        (Timeframe::M15, 0.05),
    ];
    let mut alignment: f64 = 0.0;
    for (tf, weight) in alignment_weights {
        let up = *snap.trends.get(tf);
        if (direction == Direction::Long && up) || (direction == Direction::Short && !up) {
            alignment += 10.0 * weight;
        }
    }
    score += alignment.round();

    // Price action at the resolved zone, stronger with volume behind it.
    let level = match direction {
        Direction::Long => snap.zone_4h.support,
        Direction::Short => snap.zone_4h.resistance,
    };
    if level > 0.0 && price >= level * 0.995 && price <= level * 1.005 {
        score += if snap.relative_volume > 1.1 { 7.0 } else { 4.0 };

        // Divergence bonus: 1h momentum turning ahead of 4h at the level.
        let rsi_1h = *snap.rsi.get(Timeframe::H1);
        let rsi_4h = *snap.rsi.get(Timeframe::H4);
        let diverging = match direction {
            Direction::Long => rsi_1h > rsi_4h && rsi_1h < 40.0,
            Direction::Short => rsi_1h < rsi_4h && rsi_1h > 60.0,
        };
        if diverging {
            score += 3.0;
        }
    }

    // Pivot structure: higher lows for longs, lower highs for shorts.
    let pp = snap.pivot_points;
    let structured = match direction {
        Direction::Long => pp.s1 > pp.s2 && pp.s2 > pp.s3,
        Direction::Short => pp.r1 < pp.r2 && pp.r2 < pp.r3,
    };
    if structured {
        score += 3.0;
    }

    if is_ranging {
        // Mean reversion from the band extreme.
        let b = snap.bollinger.percent_b;
        if (direction == Direction::Long && b < 0.2) || (direction == Direction::Short && b > 0.8)
        {
            score += 4.0;
        }
    } else if is_trending {
        // Continuation: histogram on the right side and beyond the
        // signal line.
        let hist = snap.macd.histogram;
        if s * hist > 0.0 && s * (hist - snap.macd.signal) > 0.0 {
            score += 4.0;
        }
    }

    score.clamp(0.0, 15.0)
}

/// Ichimoku posture: price versus cloud, tenkan/kijun crossover, future
/// cloud color and chikou confirmation. Max 12.
fn ichimoku_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let price = snap.last_price;
    if price <= 0.0 {
        return 0.0;
    }
    let ich = snap.ichimoku;
    if ich.senkou_span_a <= 0.0 || ich.senkou_span_b <= 0.0 {
        // Not computed yet.
        return 0.0;
    }
    let s = direction.sign();
    let mut score = 0.0;

    let above_a = s * (price - ich.senkou_span_a) > 0.0;
    let above_b = s * (price - ich.senkou_span_b) > 0.0;
    if above_a && above_b {
        score += 5.0;
    } else if above_a {
        score += 2.0;
    }
    if s * (ich.tenkan_sen - ich.kijun_sen) > 0.0 {
        score += 3.0;
    }
    if s * (ich.senkou_span_a - ich.senkou_span_b) > 0.0 {
        score += 2.0;
    }
    if s * (ich.chikou_span - ich.chikou_reference) > 0.0 {
        score += 2.0;
    }
    score
}

/// OBV confirmation: full credit when OBV sign and 24h price direction
/// both agree with the trade, partial credit on OBV alone. Max 5.
fn obv_score(snap: &AnalyticsSnapshot, direction: Direction) -> f64 {
    let s = direction.sign();
    let obv_aligned = s * snap.obv > 0.0;
    if obv_aligned && s * snap.price_change_pct > 0.0 {
        5.0
    } else if obv_aligned {
        3.0
    } else {
        0.0
    }
}
