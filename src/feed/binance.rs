//! Binance REST poller.
//!
//! Public spot endpoints for klines, 24h ticker and order-book depth,
//! plus the futures premium index for funding rates. One poll cycle
//! per symbol emits the full set of feed events; individual endpoint
//! failures are logged and skipped so one flaky endpoint never blanks
//! the rest of the snapshot.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::types::{Candle, FeedEvent, Timeframe};

use super::FeedError;

const SPOT_BASE: &str = "https://api.binance.com/api/v3";
const FUTURES_BASE: &str = "https://fapi.binance.com/fapi/v1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    price_change_percent: String,
    high_price: String,
    low_price: String,
    volume: String,
}

#[derive(Debug, Deserialize)]
struct Depth {
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    last_funding_rate: String,
}

pub struct BinanceRest {
    client: Client,
    spot_base: String,
    futures_base: String,
    candle_limit: usize,
    depth_limit: usize,
}

impl BinanceRest {
    pub fn new(cfg: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            spot_base: SPOT_BASE.to_string(),
            futures_base: FUTURES_BASE.to_string(),
            candle_limit: cfg.candle_limit,
            depth_limit: cfg.depth_limit,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch one timeframe's candle window, newest last.
    pub async fn klines(&self, symbol: &str, tf: Timeframe) -> Result<Vec<Candle>, FeedError> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.spot_base, symbol, tf, self.candle_limit
        );
        let raw = self.get_json(&url).await?;
        let rows = raw
            .as_array()
            .ok_or_else(|| FeedError::Malformed("klines payload is not an array".into()))?;
        rows.iter().map(parse_kline).collect()
    }

    pub async fn ticker(&self, symbol: &str) -> Result<FeedEvent, FeedError> {
        let url = format!("{}/ticker/24hr?symbol={}", self.spot_base, symbol);
        let raw = self.get_json(&url).await?;
        let ticker: Ticker24h = serde_json::from_value(raw)
            .map_err(|e| FeedError::Malformed(format!("ticker: {e}")))?;
        Ok(FeedEvent::Ticker {
            symbol: symbol.to_string(),
            last_price: parse_price(&ticker.last_price, "lastPrice")?,
            price_change_pct: parse_price(&ticker.price_change_percent, "priceChangePercent")?,
            high_24h: parse_price(&ticker.high_price, "highPrice")?,
            low_24h: parse_price(&ticker.low_price, "lowPrice")?,
            volume_24h: parse_price(&ticker.volume, "volume")?,
        })
    }

    /// Aggregate top-of-book depth into notional volume per side.
    pub async fn depth(&self, symbol: &str) -> Result<FeedEvent, FeedError> {
        let url = format!(
            "{}/depth?symbol={}&limit={}",
            self.spot_base, symbol, self.depth_limit
        );
        let raw = self.get_json(&url).await?;
        let depth: Depth = serde_json::from_value(raw)
            .map_err(|e| FeedError::Malformed(format!("depth: {e}")))?;
        Ok(FeedEvent::Depth {
            symbol: symbol.to_string(),
            bid_volume: notional(&depth.bids)?,
            ask_volume: notional(&depth.asks)?,
        })
    }

    pub async fn funding(&self, symbol: &str) -> Result<FeedEvent, FeedError> {
        let url = format!("{}/premiumIndex?symbol={}", self.futures_base, symbol);
        let raw = self.get_json(&url).await?;
        let index: PremiumIndex = serde_json::from_value(raw)
            .map_err(|e| FeedError::Malformed(format!("premiumIndex: {e}")))?;
        // Funding is quoted as a fraction; the engine works in percent.
        let rate = parse_price(&index.last_funding_rate, "lastFundingRate")? * 100.0;
        Ok(FeedEvent::Funding {
            symbol: symbol.to_string(),
            rate,
        })
    }

    /// One full poll cycle for a symbol. Endpoint failures are logged
    /// and skipped; the cycle always emits whatever it could fetch.
    pub async fn poll_symbol(&self, symbol: &str, tx: &mpsc::Sender<FeedEvent>) {
        for tf in Timeframe::ALL {
            match self.klines(symbol, tf).await {
                Ok(candles) => {
                    let _ = tx
                        .send(FeedEvent::Candles {
                            symbol: symbol.to_string(),
                            timeframe: tf,
                            candles,
                        })
                        .await;
                }
                Err(e) => warn!(symbol, %tf, error = %e, "kline fetch failed"),
            }
        }

        match self.ticker(symbol).await {
            Ok(event) => {
                let _ = tx.send(event).await;
            }
            Err(e) => warn!(symbol, error = %e, "ticker fetch failed"),
        }
        match self.depth(symbol).await {
            Ok(event) => {
                let _ = tx.send(event).await;
            }
            Err(e) => warn!(symbol, error = %e, "depth fetch failed"),
        }
        // Spot-only symbols have no premium index; that failure is
        // expected and only logged at debug.
        match self.funding(symbol).await {
            Ok(event) => {
                let _ = tx.send(event).await;
            }
            Err(e) => debug!(symbol, error = %e, "funding fetch failed"),
        }
    }
}

fn parse_price(value: &str, field: &str) -> Result<f64, FeedError> {
    value
        .parse::<f64>()
        .map_err(|_| FeedError::Malformed(format!("{field}: {value:?} is not a number")))
}

/// Binance klines are arrays: open time, then OHLCV as strings.
fn parse_kline(row: &Value) -> Result<Candle, FeedError> {
    let fields = row
        .as_array()
        .ok_or_else(|| FeedError::Malformed("kline row is not an array".into()))?;
    if fields.len() < 6 {
        return Err(FeedError::Malformed(format!(
            "kline row has {} fields",
            fields.len()
        )));
    }
    let open_time = fields[0]
        .as_u64()
        .ok_or_else(|| FeedError::Malformed("kline open time is not an integer".into()))?;
    let number = |idx: usize, name: &str| -> Result<f64, FeedError> {
        fields[idx]
            .as_str()
            .ok_or_else(|| FeedError::Malformed(format!("kline {name} is not a string")))
            .and_then(|s| parse_price(s, name))
    };
    Ok(Candle {
        open_time,
        open: number(1, "open")?,
        high: number(2, "high")?,
        low: number(3, "low")?,
        close: number(4, "close")?,
        volume: number(5, "volume")?,
    })
}

fn notional(levels: &[(String, String)]) -> Result<f64, FeedError> {
    let mut total = 0.0;
    for (price, qty) in levels {
        total += parse_price(price, "depth price")? * parse_price(qty, "depth qty")?;
    }
    Ok(total)
}
