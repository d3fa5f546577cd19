//! Streaming market analytics and signal scoring.
//!
//! Ingests candles, ticks, order-book depth and funding data per
//! symbol, maintains derived technical state, and emits gated
//! LONG/SHORT signals with confidence scores and trade parameters.

pub mod analytics;
pub mod api;
pub mod config;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod scoring;
pub mod types;

pub use analytics::{AnalyticsSnapshot, AnalyticsStore};
pub use config::EngineConfig;
pub use engine::Engine;
pub use types::{Candle, Direction, FeedEvent, SignalEvent, SymbolSpec, Timeframe};
