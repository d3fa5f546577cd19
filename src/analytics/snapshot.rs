//! The per-symbol analytics snapshot.
//!
//! One immutable value per symbol holding every derived metric the
//! scorer, the trade calculator and the API read. Writers build a new
//! snapshot and swap it in atomically; readers always see a coherent
//! set of fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::{
    Bollinger, Fibonacci, Ichimoku, Macd, PivotPoints, StochRsi, VolumeProfile,
};
use crate::types::{Direction, TfMap};

use super::levels::Band;

/// Net large-participant flow, derived from OBV drift over the recent
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhaleFlow {
    Inflow,
    Outflow,
    Neutral,
}

impl Default for WhaleFlow {
    fn default() -> Self {
        WhaleFlow::Neutral
    }
}

/// Liquidation notional totals per side over the reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Liquidations {
    pub buy: f64,
    pub sell: f64,
}

/// Take-profit R multiples. Carried on the snapshot as an input to the
/// trade calculator (clamped there) and echoed back on the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub r1: f64,
    pub r2: f64,
}

impl Default for RiskReward {
    fn default() -> Self {
        Self { r1: 2.0, r2: 3.0 }
    }
}

/// Entry band, stop and targets for one direction at one price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeParameters {
    pub entry_range_low: f64,
    pub entry_range_high: f64,
    pub stop_loss: f64,
    pub take_profit_one: f64,
    pub take_profit_two: f64,
    pub risk_reward: RiskReward,
    /// True when the percentage fallback produced these values.
    pub fallback: bool,
}

/// One structured entry in the calculation log: which stage produced
/// which value, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRecord {
    pub stage: String,
    pub value: f64,
    pub note: String,
}

impl CalcRecord {
    pub fn new(stage: &str, value: f64, note: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            value,
            note: note.into(),
        }
    }
}

/// Everything the engine currently knows about one symbol.
///
/// Defaults are the neutral readings: RSI 50, stochastic 50/50,
/// order-book pressure 1.0, taker aggression 50, RVOL 1.0. A snapshot
/// that has seen no data scores as "no edge", not as an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub symbol: String,
    pub last_price: f64,
    pub updated_at: DateTime<Utc>,

    // Per-timeframe momentum.
    pub rsi: TfMap<f64>,
    pub stoch_rsi: TfMap<StochRsi>,
    pub ema: TfMap<f64>,
    /// Close above EMA per timeframe. Refreshed on every tick.
    pub trends: TfMap<bool>,

    // Single-timeframe studies (1h anchored unless noted).
    pub macd: Macd,
    pub bollinger: Bollinger,
    pub vwap: f64,
    pub atr: f64,
    pub obv: f64,
    /// 4h anchored.
    pub ichimoku: Ichimoku,
    /// 4h anchored.
    pub fibonacci: Fibonacci,
    /// 4h anchored.
    pub volume_profile: VolumeProfile,
    /// Daily pivots, refreshed by the level resolver.
    pub pivot_points: PivotPoints,

    // Resolved support/resistance.
    pub zone_4h: Band,
    pub zone_1d: Band,

    // Flow and positioning.
    pub order_book_pressure: f64,
    pub taker_aggression: f64,
    pub delta_volume: f64,
    pub whale_flow: WhaleFlow,
    pub funding_rate: f64,
    pub funding_trend: f64,
    pub open_interest_delta: f64,
    pub liquidations: Liquidations,

    // Market context.
    pub price_change_pct: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub relative_volume: f64,

    // Signal state.
    pub direction: Direction,
    pub confidence: f64,
    pub signal_strength: f64,
    pub risk_reward: RiskReward,
    pub trade: TradeParameters,
    pub last_signal_time: Option<DateTime<Utc>>,
    pub calc_log: Vec<CalcRecord>,
}

impl AnalyticsSnapshot {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            last_price: 0.0,
            updated_at: Utc::now(),
            rsi: TfMap::filled(50.0),
            stoch_rsi: TfMap::default(),
            ema: TfMap::filled(0.0),
            trends: TfMap::filled(false),
            macd: Macd::default(),
            // Mid-band, ordinary width: the scorer must not read an
            // empty snapshot as stretched.
            bollinger: Bollinger {
                percent_b: 0.5,
                width: 0.1,
                ..Bollinger::default()
            },
            vwap: 0.0,
            atr: 0.0,
            obv: 0.0,
            ichimoku: Ichimoku::default(),
            fibonacci: Fibonacci::default(),
            volume_profile: VolumeProfile::default(),
            pivot_points: PivotPoints::default(),
            zone_4h: Band::default(),
            zone_1d: Band::default(),
            order_book_pressure: 1.0,
            taker_aggression: 50.0,
            delta_volume: 0.0,
            whale_flow: WhaleFlow::default(),
            funding_rate: 0.0,
            funding_trend: 0.0,
            open_interest_delta: 0.0,
            liquidations: Liquidations::default(),
            price_change_pct: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            volume_24h: 0.0,
            relative_volume: 1.0,
            direction: Direction::Long,
            confidence: 0.0,
            signal_strength: 0.0,
            risk_reward: RiskReward::default(),
            trade: TradeParameters::default(),
            last_signal_time: None,
            calc_log: Vec::new(),
        }
    }

    /// ATR as a percentage of the last price. 0.0 before any tick.
    pub fn atr_pct(&self) -> f64 {
        if self.last_price <= 0.0 {
            return 0.0;
        }
        self.atr / self.last_price * 100.0
    }

    pub fn record(&mut self, stage: &str, value: f64, note: impl Into<String>) {
        self.calc_log.push(CalcRecord::new(stage, value, note));
    }
}
