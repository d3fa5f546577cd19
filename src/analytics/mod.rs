//! Per-symbol analytics: the rolling snapshot, its owning store, the
//! support/resistance resolver and the trade-parameter calculator.

pub mod levels;
pub mod snapshot;
pub mod store;
pub mod trade_params;

pub use levels::{resolve_zones, Band};
pub use snapshot::{
    AnalyticsSnapshot, CalcRecord, Liquidations, RiskReward, TradeParameters, WhaleFlow,
};
pub use store::AnalyticsStore;
pub use trade_params::compute_trade_parameters;
