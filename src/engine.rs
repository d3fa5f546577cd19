//! The engine: feed fan-in, per-symbol recompute workers and signal
//! emission.
//!
//! Every feed event is applied to the store, then the symbol's worker
//! is nudged through a watch channel. Watch semantics give coalescing
//! for free: however many events land while a recompute is running,
//! the worker sees exactly one more wakeup. Recomputes for one symbol
//! are serialized by the worker; different symbols run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::{compute_trade_parameters, resolve_zones, AnalyticsStore};
use crate::config::EngineConfig;
use crate::scoring::{confirmation, score, should_emit, GateDecision};
use crate::types::{Direction, FeedEvent, SignalEvent, Timeframe};

const SIGNAL_CHANNEL_CAPACITY: usize = 64;

pub struct Engine {
    store: Arc<AnalyticsStore>,
    cfg: Arc<EngineConfig>,
    signals: broadcast::Sender<SignalEvent>,
}

impl Engine {
    pub fn new(store: Arc<AnalyticsStore>, cfg: Arc<EngineConfig>) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            store,
            cfg,
            signals,
        }
    }

    pub fn store(&self) -> Arc<AnalyticsStore> {
        self.store.clone()
    }

    /// Subscribe to emitted signals.
    pub fn subscribe(&self) -> broadcast::Receiver<SignalEvent> {
        self.signals.subscribe()
    }

    /// Sender half of the signal channel, for the API layer.
    pub fn signal_sender(&self) -> broadcast::Sender<SignalEvent> {
        self.signals.clone()
    }

    /// Consume feed events until the channel closes. Workers are
    /// spawned lazily per symbol and wound down when this returns.
    pub async fn run(&self, mut events: mpsc::Receiver<FeedEvent>) -> Result<()> {
        let mut workers: HashMap<String, watch::Sender<u64>> = HashMap::new();

        while let Some(event) = events.recv().await {
            let symbol = event.symbol().to_string();
            self.store.apply(event).await;

            let trigger = workers.entry(symbol.clone()).or_insert_with(|| {
                let (tx, rx) = watch::channel(0u64);
                let store = self.store.clone();
                let cfg = self.cfg.clone();
                let signals = self.signals.clone();
                let symbol = symbol.clone();
                tokio::spawn(async move {
                    recompute_worker(store, cfg, signals, symbol, rx).await;
                });
                tx
            });
            trigger.send_modify(|n| *n = n.wrapping_add(1));
        }

        // Dropping the triggers ends the workers.
        debug!("feed channel closed, stopping workers");
        Ok(())
    }
}

async fn recompute_worker(
    store: Arc<AnalyticsStore>,
    cfg: Arc<EngineConfig>,
    signals: broadcast::Sender<SignalEvent>,
    symbol: String,
    mut trigger: watch::Receiver<u64>,
) {
    while trigger.changed().await.is_ok() {
        recompute(&store, &cfg, &signals, &symbol).await;
    }
    debug!(symbol, "recompute worker stopped");
}

/// One full analysis pass for a symbol: resolve levels, score both
/// directions, derive trade parameters for the stronger one, grade the
/// confirmation checks and run the emission gate. The entire pass
/// happens under the slot's writer lock, so it observes and publishes
/// a consistent snapshot.
pub async fn recompute(
    store: &AnalyticsStore,
    cfg: &EngineConfig,
    signals: &broadcast::Sender<SignalEvent>,
    symbol: &str,
) {
    let Some(slot) = store.slot(symbol).await else {
        return;
    };
    // Windows are fetched before taking the writer lock below.
    let candles_4h = slot.candles(Timeframe::H4).await;
    let candles_1d = slot.candles(Timeframe::D1).await;
    let spec = slot.spec.clone();

    let mut emitted: Option<SignalEvent> = None;
    slot.update(|snap| {
        snap.calc_log.clear();
        resolve_zones(snap, &candles_4h, &candles_1d, &spec);

        let long = score(snap, Direction::Long, &cfg.scoring);
        let short = score(snap, Direction::Short, &cfg.scoring);
        let best = if long.confidence >= short.confidence {
            long
        } else {
            short
        };
        snap.record(
            "score",
            best.confidence,
            format!(
                "{} {:.0} vs {} {:.0}",
                Direction::Long,
                long.confidence,
                Direction::Short,
                short.confidence
            ),
        );

        let trade = compute_trade_parameters(
            best.direction,
            snap.last_price,
            snap.atr,
            snap.risk_reward,
            &cfg.trade,
            &spec,
            &mut snap.calc_log,
        );
        snap.trade = trade;
        snap.risk_reward = trade.risk_reward;

        let checks = confirmation(snap, best.direction, &cfg.gating);
        snap.record(
            "confirmation",
            checks.score,
            format!("{:?}", checks.quality),
        );

        let previous = snap.confidence;
        snap.direction = best.direction;
        snap.signal_strength = best.strength;
        snap.confidence = best.confidence;

        let now = Utc::now();
        match should_emit(
            best.confidence,
            previous,
            checks.score,
            snap.last_signal_time,
            now,
            &cfg.gating,
        ) {
            GateDecision::Emit => {
                snap.last_signal_time = Some(now);
                snap.record("gate", best.confidence, "emit");
                emitted = Some(SignalEvent {
                    id: Uuid::new_v4(),
                    symbol: spec.symbol.clone(),
                    direction: best.direction,
                    confidence: best.confidence,
                    timestamp: now,
                });
            }
            decision => {
                snap.record("gate", best.confidence, format!("hold: {decision:?}"));
            }
        }
    })
    .await;

    if let Some(event) = emitted {
        info!(
            symbol = %event.symbol,
            direction = %event.direction,
            confidence = event.confidence,
            "signal emitted"
        );
        // No subscribers is fine; the snapshot already records it.
        let _ = signals.send(event);
    }
}
