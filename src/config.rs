//! Engine configuration.
//!
//! Every empirically-chosen constant in the scoring and gating paths lives
//! here as a named, overridable field rather than an inline literal. The
//! defaults reproduce the tuned values the engine ships with.

use std::time::Duration;

/// Top-level configuration bundle.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub gating: GatingConfig,
    pub trade: TradeConfig,
    pub feed: FeedConfig,
}

/// Weights and thresholds for confidence fusion.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Weight applied to the normalized multi-timeframe score.
    pub w_timeframe: f64,
    /// Weight applied to the MACD momentum score.
    pub w_macd: f64,
    /// Weight applied to the Bollinger %B score.
    pub w_bollinger: f64,
    /// Weight applied to the relative-volume score.
    pub w_volume: f64,
    /// Weight applied to the order-book pressure score.
    pub w_orderbook: f64,
    /// Weight applied to the whale net-flow score.
    pub w_whale: f64,
    /// Weight applied to the volatility-regime score.
    pub w_volatility: f64,
    /// Weight applied to the funding-rate bias score.
    pub w_funding: f64,
    /// Weight applied to the market-context score.
    pub w_context: f64,
    /// Weight applied to the Ichimoku score.
    pub w_ichimoku: f64,
    /// Weight applied to the OBV confirmation score.
    pub w_obv: f64,

    /// Histogram within this multiple of |MACD line| counts as "near
    /// crossover". Empirical, no stated derivation; preserved as-is.
    pub macd_near_cross: f64,
    /// Tighter multiple for "very close to crossing".
    pub macd_very_near_cross: f64,

    /// Bollinger width at the center of the "ranging" regime band.
    pub ranging_bb_width: f64,
    /// Half-width of the ranging band around `ranging_bb_width`.
    pub ranging_bb_tolerance: f64,
    /// ATR as a percentage of price above which the market counts as
    /// trending.
    pub trending_atr_pct: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            w_timeframe: 1.0,
            w_macd: 0.85,
            w_bollinger: 1.0,
            w_volume: 0.9,
            w_orderbook: 0.95,
            w_whale: 0.8,
            w_volatility: 0.6,
            w_funding: 0.8,
            w_context: 0.9,
            w_ichimoku: 0.85,
            w_obv: 0.8,
            macd_near_cross: 0.1,
            macd_very_near_cross: 0.05,
            ranging_bb_width: 0.03,
            ranging_bb_tolerance: 0.015,
            trending_atr_pct: 1.2,
        }
    }
}

/// Thresholds for the signal gating state machine.
#[derive(Debug, Clone)]
pub struct GatingConfig {
    /// Minimum confidence for a candidate emission.
    pub min_confidence: f64,
    /// Minimum confirmation score (out of 10).
    pub min_confirmation: f64,
    /// Minimum |confidence - previous confidence| to avoid flapping on
    /// marginal drift.
    pub min_confidence_delta: f64,
    /// Default cool-down between emissions.
    pub cooldown: Duration,
    /// Cool-down when confidence exceeds `high_confidence`.
    pub cooldown_high: Duration,
    /// Cool-down when confidence exceeds `very_high_confidence`.
    pub cooldown_very_high: Duration,
    pub high_confidence: f64,
    pub very_high_confidence: f64,
    /// ATR% above which volatility is unacceptable for new signals.
    pub max_volatility_pct: f64,
    /// Minimum first-target risk-reward for the R:R confirmation.
    pub min_risk_reward: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 75.0,
            min_confirmation: 5.0,
            min_confidence_delta: 8.0,
            cooldown: Duration::from_secs(15 * 60),
            cooldown_high: Duration::from_secs(10 * 60),
            cooldown_very_high: Duration::from_secs(5 * 60),
            high_confidence: 85.0,
            very_high_confidence: 90.0,
            max_volatility_pct: 5.0,
            min_risk_reward: 1.8,
        }
    }
}

/// Trade parameter derivation constants.
#[derive(Debug, Clone)]
pub struct TradeConfig {
    /// ATR multiple the entry band extends against the trade direction.
    pub entry_pull_atr: f64,
    /// ATR multiple the entry band extends with the trade direction.
    pub entry_push_atr: f64,
    /// ATR multiple for the ATR-based stop candidate.
    pub stop_atr_mult: f64,
    /// Maximum fractional risk for the percentage-based stop candidate.
    pub max_risk_pct: f64,
    /// Clamp range for the first take-profit R multiple.
    pub r1_range: (f64, f64),
    /// Clamp range for the second take-profit R multiple.
    pub r2_range: (f64, f64),
    /// Fallback entry band half-width as a fraction of price.
    pub fallback_entry_pct: f64,
    /// Fallback stop distance as a fraction of price.
    pub fallback_stop_pct: f64,
    /// Fallback TP1 distance as a fraction of price.
    pub fallback_tp1_pct: f64,
    /// Fallback TP2 distance as a fraction of price.
    pub fallback_tp2_pct: f64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            entry_pull_atr: 0.3,
            entry_push_atr: 0.1,
            stop_atr_mult: 1.5,
            max_risk_pct: 0.05,
            r1_range: (1.5, 2.0),
            r2_range: (2.5, 3.0),
            fallback_entry_pct: 0.005,
            fallback_stop_pct: 0.05,
            fallback_tp1_pct: 0.075,
            fallback_tp2_pct: 0.15,
        }
    }
}

/// Ingestion timing and reconnect policy.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full-history refresh interval while a live push feed is active.
    pub refresh_live: Duration,
    /// Refresh interval in fallback/poll-only mode.
    pub refresh_poll: Duration,
    /// Base delay for exponential reconnect backoff.
    pub backoff_base: Duration,
    /// Backoff ceiling.
    pub backoff_max: Duration,
    /// Initial-connection watchdog; forces the poll path on expiry.
    pub connect_timeout: Duration,
    /// Candles fetched per timeframe per refresh.
    pub candle_limit: usize,
    /// Order-book depth levels requested per side.
    pub depth_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_live: Duration::from_secs(60),
            refresh_poll: Duration::from_secs(15),
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            candle_limit: 100,
            depth_limit: 100,
        }
    }
}
