//! Market data ingestion.
//!
//! A REST poller covers every input the engine needs; an optional push
//! feed lowers latency when one is available. The supervisor owns the
//! connection state machine: it reconnects the push feed with
//! exponential backoff and keeps polling (faster while disconnected)
//! so the analytics never starve.

pub mod binance;
pub mod supervisor;

pub use binance::BinanceRest;
pub use supervisor::{
    BackoffPolicy, ConnState, FeedSupervisor, NoPushFeed, PushConnection, PushFeed,
};

use thiserror::Error;

/// Ingestion failures. Transient by nature; the supervisor's answer to
/// every one of these is log, back off, retry.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("push feed disconnected")]
    Disconnected,

    #[error("push feed connect timed out")]
    ConnectTimeout,
}
