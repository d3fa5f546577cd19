//! Feed connection supervision.
//!
//! The supervisor runs two loops folded into one task: a REST poll
//! cycle that always runs (slower while a push feed is live, faster
//! while it is not), and a push-feed connection lifecycle with a
//! connect watchdog and exponential reconnect backoff. An activity
//! watch channel pauses all polling while nobody is consuming
//! snapshots.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::types::{FeedEvent, SymbolSpec};

use super::binance::BinanceRest;
use super::FeedError;

/// Push-feed connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting out a reconnect delay after `attempt` failures.
    Backoff { attempt: u32 },
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnState::Disconnected => write!(f, "disconnected"),
            ConnState::Connecting => write!(f, "connecting"),
            ConnState::Connected => write!(f, "connected"),
            ConnState::Backoff { attempt } => write!(f, "backoff(attempt {attempt})"),
        }
    }
}

/// Exponential backoff: `base * 2^attempt`, capped at `max`. A
/// successful connection resets the attempt counter.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(2u32.saturating_pow(attempt));
        exp.min(self.max)
    }
}

/// An established push connection: pumps events into `tx` until the
/// peer drops it, then resolves (Ok for an orderly close, Err
/// otherwise). Either way the supervisor reconnects.
pub trait PushConnection: Send {
    fn run(
        self,
        tx: mpsc::Sender<FeedEvent>,
    ) -> impl std::future::Future<Output = Result<(), FeedError>> + Send;
}

/// A low-latency event source the supervisor can try to keep alive.
/// The shipped build runs REST-only; a websocket implementation plugs
/// in here.
pub trait PushFeed: Send + Sync {
    type Conn: PushConnection;

    fn connect(&self) -> impl std::future::Future<Output = Result<Self::Conn, FeedError>> + Send;
}

/// Placeholder for builds without a push feed. Never constructed;
/// `Option<NoPushFeed>::None` fixes the supervisor's type parameter.
pub enum NoPushFeed {}

impl PushConnection for NoPushFeed {
    async fn run(self, _tx: mpsc::Sender<FeedEvent>) -> Result<(), FeedError> {
        match self {}
    }
}

impl PushFeed for NoPushFeed {
    type Conn = NoPushFeed;

    async fn connect(&self) -> Result<Self::Conn, FeedError> {
        Err(FeedError::Disconnected)
    }
}

pub struct FeedSupervisor<P: PushFeed> {
    rest: BinanceRest,
    push: Option<P>,
    symbols: Vec<SymbolSpec>,
    cfg: FeedConfig,
    tx: mpsc::Sender<FeedEvent>,
    active: watch::Receiver<bool>,
    state: ConnState,
    backoff: BackoffPolicy,
}

impl<P: PushFeed> FeedSupervisor<P> {
    pub fn new(
        rest: BinanceRest,
        push: Option<P>,
        symbols: Vec<SymbolSpec>,
        cfg: FeedConfig,
        tx: mpsc::Sender<FeedEvent>,
        active: watch::Receiver<bool>,
    ) -> Self {
        let backoff = BackoffPolicy::new(cfg.backoff_base, cfg.backoff_max);
        Self {
            rest,
            push,
            symbols,
            cfg,
            tx,
            active,
            state: ConnState::Disconnected,
            backoff,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Block until consumers are present. Returns Err when the activity
    /// channel is gone, which means shutdown.
    async fn wait_active(&mut self) -> Result<()> {
        self.active.wait_for(|active| *active).await?;
        Ok(())
    }

    async fn poll_all(&self) {
        for spec in &self.symbols {
            self.rest.poll_symbol(&spec.symbol, &self.tx).await;
        }
    }

    /// Main loop. Never returns except on shutdown.
    pub async fn run(mut self) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            self.wait_active().await?;

            let Some(push) = &self.push else {
                // REST-only build: steady fallback-rate polling.
                self.state = ConnState::Disconnected;
                self.poll_all().await;
                sleep(self.cfg.refresh_poll).await;
                continue;
            };

            self.state = ConnState::Connecting;
            debug!(state = %self.state, attempt, "push feed connect");
            match timeout(self.cfg.connect_timeout, push.connect()).await {
                Ok(Ok(conn)) => {
                    attempt = 0;
                    self.state = ConnState::Connected;
                    info!("push feed connected");

                    // Run the connection alongside the slow refresh loop
                    // until it drops.
                    let pump = conn.run(self.tx.clone());
                    tokio::pin!(pump);
                    loop {
                        tokio::select! {
                            result = &mut pump => {
                                match result {
                                    Ok(()) => info!("push feed closed"),
                                    Err(e) => warn!(error = %e, "push feed failed"),
                                }
                                break;
                            }
                            _ = sleep(self.cfg.refresh_live) => {
                                self.poll_all().await;
                            }
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, attempt, "push feed connect failed");
                }
                Err(_) => {
                    warn!(attempt, "push feed connect watchdog expired");
                }
            }

            // Disconnected or failed: one fallback-rate poll keeps data
            // fresh, then wait out the backoff before reconnecting.
            self.state = ConnState::Backoff { attempt };
            let delay = self.backoff.delay(attempt);
            attempt = attempt.saturating_add(1);
            debug!(state = %self.state, delay_secs = delay.as_secs(), "reconnect backoff");
            self.poll_all().await;
            sleep(delay.max(self.cfg.refresh_poll)).await;
        }
    }
}
