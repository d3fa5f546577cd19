//! Per-symbol analytics store.
//!
//! Each symbol owns a slot: bounded candle ring buffers per timeframe,
//! a writer lock serializing recomputation, and the published snapshot
//! behind an `RwLock<Arc<..>>`. Writers rebuild a fresh snapshot and
//! swap the `Arc`, so readers never block on a recompute and never see
//! a half-updated view.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::indicators::{
    atr, bollinger_bands, ema, fibonacci, ichimoku, macd, obv, rsi, stoch_rsi, volume_profile,
    vwap,
};
use crate::types::{Candle, FeedEvent, SymbolSpec, Timeframe};

use super::snapshot::{AnalyticsSnapshot, WhaleFlow};

/// Candles of OBV drift used to classify whale flow.
const WHALE_WINDOW: usize = 10;
/// OBV drift below this fraction of cumulative OBV reads as neutral.
const WHALE_DRIFT_FRACTION: f64 = 0.005;

/// Ring buffers guarded by the slot's writer lock.
struct SlotBuffers {
    candles: [VecDeque<Candle>; 5],
}

/// One symbol's analytics state.
pub struct SymbolSlot {
    pub spec: SymbolSpec,
    capacity: usize,
    /// Serializes all snapshot rebuilds for this symbol.
    write: Mutex<SlotBuffers>,
    snapshot: RwLock<Arc<AnalyticsSnapshot>>,
}

impl SymbolSlot {
    fn new(spec: SymbolSpec, capacity: usize) -> Self {
        let snapshot = Arc::new(AnalyticsSnapshot::new(&spec.symbol));
        Self {
            spec,
            capacity,
            write: Mutex::new(SlotBuffers {
                candles: Default::default(),
            }),
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Current published snapshot. Cheap: clones an `Arc`.
    pub async fn snapshot(&self) -> Arc<AnalyticsSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Copy of the candle window for one timeframe.
    pub async fn candles(&self, tf: Timeframe) -> Vec<Candle> {
        let buffers = self.write.lock().await;
        buffers.candles[tf.idx()].iter().copied().collect()
    }

    async fn publish(&self, snap: AnalyticsSnapshot) {
        *self.snapshot.write().await = Arc::new(snap);
    }

    /// Rebuild the snapshot under the writer lock with `mutate` applied.
    /// Used by the scoring pass to attach confidence, gating state and
    /// trade parameters.
    pub async fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut AnalyticsSnapshot),
    {
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        mutate(&mut snap);
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    /// Merge a candle batch and recompute everything anchored to `tf`.
    pub async fn apply_candles(&self, tf: Timeframe, batch: Vec<Candle>) {
        let mut buffers = self.write.lock().await;
        let ring = &mut buffers.candles[tf.idx()];
        for candle in batch {
            match ring.back_mut() {
                Some(last) if candle.open_time < last.open_time => continue,
                Some(last) if candle.open_time == last.open_time => {
                    // Still-open candle updated in place.
                    *last = candle;
                }
                _ => {
                    ring.push_back(candle);
                    if ring.len() > self.capacity {
                        ring.pop_front();
                    }
                }
            }
        }

        let closes: Vec<f64> = ring.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = ring.iter().map(|c| c.volume).collect();
        let window: Vec<Candle> = ring.iter().copied().collect();

        // The buffer guard doubles as the writer lock; it stays held
        // until the rebuilt snapshot is published.
        let mut snap = (*self.snapshot().await).clone();
        snap.rsi.set(tf, rsi(&closes, 14));
        snap.stoch_rsi.set(tf, stoch_rsi(&closes, 14, 3, 3));
        let ema_value = ema(&closes, 20, None);
        snap.ema.set(tf, ema_value);
        if let Some(last) = closes.last() {
            snap.trends.set(tf, *last > ema_value);
        }

        match tf {
            Timeframe::H1 => {
                snap.macd = macd(&closes, 12, 26, 9);
                snap.bollinger = bollinger_bands(&closes, 20, 2.0);
                snap.vwap = vwap(&window);
                snap.atr = atr(&window, 14);
                snap.obv = obv(&closes, &volumes);
                snap.relative_volume = relative_volume(&volumes);
                snap.whale_flow = whale_flow(&closes, &volumes);
            }
            Timeframe::H4 => {
                snap.ichimoku = ichimoku(&window);
                snap.fibonacci = fibonacci(&window);
                snap.volume_profile = volume_profile(&window);
            }
            _ => {}
        }

        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    /// Live trade: refresh price and the per-timeframe trend flags
    /// against the cached EMAs. Nothing window-derived is recomputed.
    pub async fn apply_tick(&self, price: f64, _timestamp: u64) {
        if price <= 0.0 {
            return;
        }
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        snap.last_price = price;
        for tf in Timeframe::ALL {
            let ema_value = *snap.ema.get(tf);
            if ema_value > 0.0 {
                snap.trends.set(tf, price > ema_value);
            }
        }
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    pub async fn apply_depth(&self, bid_volume: f64, ask_volume: f64) {
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        snap.order_book_pressure = book_pressure(bid_volume, ask_volume);
        snap.taker_aggression = taker_aggression(snap.order_book_pressure);
        snap.delta_volume = bid_volume - ask_volume;
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    pub async fn apply_ticker(
        &self,
        last_price: f64,
        price_change_pct: f64,
        high_24h: f64,
        low_24h: f64,
        volume_24h: f64,
    ) {
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        if last_price > 0.0 {
            snap.last_price = last_price;
        }
        snap.price_change_pct = price_change_pct;
        snap.high_24h = high_24h;
        snap.low_24h = low_24h;
        snap.volume_24h = volume_24h;
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    /// Funding-rate sample. The smoothed trend lags the raw rate and
    /// the open-interest delta tracks their spread.
    pub async fn apply_funding(&self, rate: f64) {
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        snap.funding_rate = rate;
        snap.funding_trend = rate * 0.85;
        snap.open_interest_delta = (rate - snap.funding_trend) * 10.0;
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }

    pub async fn apply_liquidations(&self, buy: f64, sell: f64) {
        let _guard = self.write.lock().await;
        let mut snap = (*self.snapshot().await).clone();
        snap.liquidations.buy = buy;
        snap.liquidations.sell = sell;
        snap.updated_at = Utc::now();
        self.publish(snap).await;
    }
}

/// Bid/ask notional ratio with divide-by-zero guards.
fn book_pressure(bid_volume: f64, ask_volume: f64) -> f64 {
    if ask_volume <= 0.0 {
        if bid_volume <= 0.0 {
            return 1.0;
        }
        return 99.0;
    }
    bid_volume / ask_volume
}

/// Map book pressure onto a 20..80 taker-aggression scale centered
/// at 50.
fn taker_aggression(pressure: f64) -> f64 {
    if pressure > 1.0 {
        50.0 + (pressure * 5.0).min(30.0)
    } else {
        50.0 - (5.0 / pressure).min(30.0)
    }
}

/// Last volume against the window mean.
fn relative_volume(volumes: &[f64]) -> f64 {
    let Some(&last) = volumes.last() else {
        return 1.0;
    };
    let mean = volumes.iter().sum::<f64>() / volumes.len() as f64;
    if mean <= 0.0 {
        return 1.0;
    }
    last / mean
}

/// Classify net large-participant flow from OBV drift across the last
/// `WHALE_WINDOW` candles.
fn whale_flow(closes: &[f64], volumes: &[f64]) -> WhaleFlow {
    if closes.len() <= WHALE_WINDOW {
        return WhaleFlow::Neutral;
    }
    let full = obv(closes, volumes);
    let cut = closes.len() - WHALE_WINDOW;
    let prior = obv(&closes[..cut], &volumes[..cut]);
    let drift = full - prior;
    let threshold = (full.abs() * WHALE_DRIFT_FRACTION).max(f64::EPSILON);
    if drift > threshold {
        WhaleFlow::Inflow
    } else if drift < -threshold {
        WhaleFlow::Outflow
    } else {
        WhaleFlow::Neutral
    }
}

/// All symbol slots. Slots for the configured pairs exist from startup;
/// unknown symbols get an inferred spec on first ingestion.
pub struct AnalyticsStore {
    capacity: usize,
    slots: RwLock<HashMap<String, Arc<SymbolSlot>>>,
}

impl AnalyticsStore {
    pub fn new(specs: Vec<SymbolSpec>, capacity: usize) -> Self {
        let slots = specs
            .into_iter()
            .map(|spec| {
                let symbol = spec.symbol.clone();
                (symbol, Arc::new(SymbolSlot::new(spec, capacity)))
            })
            .collect();
        Self {
            capacity,
            slots: RwLock::new(slots),
        }
    }

    pub async fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.slots.read().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub async fn slot(&self, symbol: &str) -> Option<Arc<SymbolSlot>> {
        self.slots.read().await.get(symbol).cloned()
    }

    async fn slot_or_create(&self, symbol: &str) -> Arc<SymbolSlot> {
        if let Some(slot) = self.slot(symbol).await {
            return slot;
        }
        let mut slots = self.slots.write().await;
        slots
            .entry(symbol.to_string())
            .or_insert_with(|| {
                debug!(symbol, "registering unconfigured symbol");
                Arc::new(SymbolSlot::new(SymbolSpec::infer(symbol), self.capacity))
            })
            .clone()
    }

    pub async fn snapshot(&self, symbol: &str) -> Option<Arc<AnalyticsSnapshot>> {
        match self.slot(symbol).await {
            Some(slot) => Some(slot.snapshot().await),
            None => None,
        }
    }

    /// Route one feed event to its slot. Returns the slot so the caller
    /// can chain a recompute trigger.
    pub async fn apply(&self, event: FeedEvent) -> Arc<SymbolSlot> {
        let slot = self.slot_or_create(event.symbol()).await;
        match event {
            FeedEvent::Candles {
                timeframe, candles, ..
            } => slot.apply_candles(timeframe, candles).await,
            FeedEvent::Tick {
                price, timestamp, ..
            } => slot.apply_tick(price, timestamp).await,
            FeedEvent::Depth {
                bid_volume,
                ask_volume,
                ..
            } => slot.apply_depth(bid_volume, ask_volume).await,
            FeedEvent::Ticker {
                last_price,
                price_change_pct,
                high_24h,
                low_24h,
                volume_24h,
                ..
            } => {
                slot.apply_ticker(last_price, price_change_pct, high_24h, low_24h, volume_24h)
                    .await
            }
            FeedEvent::Funding { rate, .. } => slot.apply_funding(rate).await,
            FeedEvent::Liquidations { buy, sell, .. } => slot.apply_liquidations(buy, sell).await,
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn store() -> AnalyticsStore {
        AnalyticsStore::new(SymbolSpec::default_set(), 100)
    }

    #[tokio::test]
    async fn candle_batch_updates_timeframe_metrics() {
        let store = store();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        store
            .apply(FeedEvent::Candles {
                symbol: "BTCUSDT".into(),
                timeframe: Timeframe::H1,
                candles: make_candles(&closes),
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert!(*snap.rsi.get(Timeframe::H1) > 50.0);
        assert!(*snap.ema.get(Timeframe::H1) > 0.0);
        assert!(*snap.trends.get(Timeframe::H1));
        assert!(snap.atr > 0.0);
        // Other timeframes untouched.
        assert_eq!(*snap.rsi.get(Timeframe::D1), 50.0);
    }

    #[tokio::test]
    async fn four_hour_batch_anchors_structural_indicators() {
        let store = store();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        store
            .apply(FeedEvent::Candles {
                symbol: "BTCUSDT".into(),
                timeframe: Timeframe::H4,
                candles: make_candles(&closes),
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert!(snap.ichimoku.kijun_sen > 0.0);
        assert!(snap.fibonacci.swing_high > snap.fibonacci.swing_low);
        assert!(snap.volume_profile.poc > 0.0);
        // 1h-anchored studies stay at defaults.
        assert_eq!(snap.atr, 0.0);
    }

    #[tokio::test]
    async fn ring_buffer_evicts_oldest() {
        let store = AnalyticsStore::new(SymbolSpec::default_set(), 5);
        let slot = store.slot("BTCUSDT").await.unwrap();
        slot.apply_candles(Timeframe::H1, make_candles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]))
            .await;
        let window = slot.candles(Timeframe::H1).await;
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].close, 3.0);
        assert_eq!(window[4].close, 7.0);
    }

    #[tokio::test]
    async fn open_candle_replaces_in_place() {
        let store = store();
        let slot = store.slot("BTCUSDT").await.unwrap();
        let mut batch = make_candles(&[100.0, 101.0]);
        slot.apply_candles(Timeframe::H1, batch.clone()).await;
        // Same open_time, newer close: the still-open candle ticked.
        batch[1].close = 105.0;
        slot.apply_candles(Timeframe::H1, vec![batch[1]]).await;
        let window = slot.candles(Timeframe::H1).await;
        assert_eq!(window.len(), 2);
        assert_eq!(window[1].close, 105.0);
    }

    #[tokio::test]
    async fn tick_updates_price_and_trends() {
        let store = store();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        store
            .apply(FeedEvent::Candles {
                symbol: "BTCUSDT".into(),
                timeframe: Timeframe::H1,
                candles: make_candles(&closes),
            })
            .await;
        store
            .apply(FeedEvent::Tick {
                symbol: "BTCUSDT".into(),
                price: 50.0,
                timestamp: 0,
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert_eq!(snap.last_price, 50.0);
        // Price dropped far below the 1h EMA.
        assert!(!*snap.trends.get(Timeframe::H1));
    }

    #[tokio::test]
    async fn zero_price_tick_is_ignored() {
        let store = store();
        store
            .apply(FeedEvent::Tick {
                symbol: "BTCUSDT".into(),
                price: 0.0,
                timestamp: 0,
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert_eq!(snap.last_price, 0.0);
    }

    #[tokio::test]
    async fn depth_maps_pressure_to_taker_aggression() {
        let store = store();
        store
            .apply(FeedEvent::Depth {
                symbol: "BTCUSDT".into(),
                bid_volume: 300.0,
                ask_volume: 100.0,
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert_eq!(snap.order_book_pressure, 3.0);
        assert_eq!(snap.taker_aggression, 65.0);
        assert_eq!(snap.delta_volume, 200.0);
    }

    #[tokio::test]
    async fn funding_derives_trend_and_oi_delta() {
        let store = store();
        store
            .apply(FeedEvent::Funding {
                symbol: "BTCUSDT".into(),
                rate: 0.02,
            })
            .await;
        let snap = store.snapshot("BTCUSDT").await.unwrap();
        assert!((snap.funding_trend - 0.017).abs() < 1e-12);
        assert!((snap.open_interest_delta - 0.03).abs() < 1e-12);
    }

    #[tokio::test]
    async fn unknown_symbol_gets_inferred_slot() {
        let store = store();
        store
            .apply(FeedEvent::Tick {
                symbol: "DOGEUSDT".into(),
                price: 0.1,
                timestamp: 0,
            })
            .await;
        let slot = store.slot("DOGEUSDT").await.unwrap();
        assert_eq!(slot.spec.decimals, 4);
    }

    #[test]
    fn taker_aggression_saturates() {
        // A balanced book sits on the sell side of the midpoint: only
        // pressure strictly above 1.0 takes the buy branch.
        assert_eq!(taker_aggression(1.0), 45.0);
        assert_eq!(taker_aggression(2.0), 60.0);
        assert_eq!(taker_aggression(100.0), 80.0);
        assert_eq!(taker_aggression(0.5), 40.0);
        assert_eq!(taker_aggression(0.01), 20.0);
    }

    #[test]
    fn book_pressure_guards_empty_sides() {
        assert_eq!(book_pressure(0.0, 0.0), 1.0);
        assert_eq!(book_pressure(10.0, 0.0), 99.0);
        assert_eq!(book_pressure(10.0, 20.0), 0.5);
    }

    #[test]
    fn whale_flow_tracks_obv_drift() {
        // Steady accumulation: every candle closes up on heavy volume.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![1000.0; 30];
        assert_eq!(whale_flow(&closes, &volumes), WhaleFlow::Inflow);

        let falling: Vec<f64> = (0..30).map(|i| 130.0 - i as f64).collect();
        assert_eq!(whale_flow(&falling, &volumes), WhaleFlow::Outflow);

        assert_eq!(whale_flow(&closes[..5], &volumes[..5]), WhaleFlow::Neutral);
    }
}
