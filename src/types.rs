use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candle timeframes the engine tracks, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Index into per-timeframe arrays.
    pub fn idx(self) -> usize {
        match self {
            Timeframe::M5 => 0,
            Timeframe::M15 => 1,
            Timeframe::H1 => 2,
            Timeframe::H4 => 3,
            Timeframe::D1 => 4,
        }
    }

    /// Weight used for multi-timeframe score fusion (longer timeframes
    /// carry more weight).
    pub fn weight(self) -> f64 {
        match self {
            Timeframe::M5 => 0.10,
            Timeframe::M15 => 0.15,
            Timeframe::H1 => 0.20,
            Timeframe::H4 => 0.25,
            Timeframe::D1 => 0.30,
        }
    }

    /// Upstream interval string (Binance kline notation).
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed-size map keyed by timeframe. Serializes as an object keyed by
/// the interval strings ("5m", "15m", ...).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TfMap<T>(pub [T; 5]);

impl<T> TfMap<T> {
    pub fn get(&self, tf: Timeframe) -> &T {
        &self.0[tf.idx()]
    }

    pub fn set(&mut self, tf: Timeframe, value: T) {
        self.0[tf.idx()] = value;
    }
}

impl<T: Copy> TfMap<T> {
    pub fn filled(value: T) -> Self {
        TfMap([value; 5])
    }
}

impl<T: Serialize> Serialize for TfMap<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(5))?;
        for tf in Timeframe::ALL {
            map.serialize_entry(tf.as_str(), &self.0[tf.idx()])?;
        }
        map.end()
    }
}

/// A single OHLCV candle. `open_time` is milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "openTime")]
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// (high + low + close) / 3, used by VWAP.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Trade direction being evaluated. Scoring is fully direction-aware:
/// every sub-score has a LONG and a mirrored SHORT reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. Lets price arithmetic share one
    /// signed code path instead of duplicated branches.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Immutable per-symbol reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    pub name: String,
    /// Fraction digits used when rounding derived prices.
    pub decimals: u32,
}

impl SymbolSpec {
    pub fn new(symbol: &str, name: &str, decimals: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
        }
    }

    /// Round a derived price to this symbol's precision.
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    /// The default supported pairs. BTC quotes with 2 decimals, the
    /// rest with 4.
    pub fn default_set() -> Vec<SymbolSpec> {
        vec![
            SymbolSpec::new("BTCUSDT", "Bitcoin", 2),
            SymbolSpec::new("THETAUSDT", "Theta", 4),
            SymbolSpec::new("SOLUSDT", "Solana", 4),
            SymbolSpec::new("ETHUSDT", "Ethereum", 4),
            SymbolSpec::new("BNBUSDT", "BNB", 4),
        ]
    }

    /// Infer a spec from a bare symbol string (CLI override path).
    pub fn infer(symbol: &str) -> SymbolSpec {
        let decimals = if symbol.starts_with("BTC") { 2 } else { 4 };
        SymbolSpec::new(symbol, symbol, decimals)
    }
}

/// Events delivered by the ingestion adapter. The engine is agnostic to
/// where they come from; a missing feed simply means fewer events.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Batch of candles for one timeframe (REST pull, newest last).
    Candles {
        symbol: String,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    },
    /// Live trade tick.
    Tick {
        symbol: String,
        price: f64,
        timestamp: u64,
    },
    /// Aggregated order-book notional volume per side.
    Depth {
        symbol: String,
        bid_volume: f64,
        ask_volume: f64,
    },
    /// 24h rolling ticker stats.
    Ticker {
        symbol: String,
        last_price: f64,
        price_change_pct: f64,
        high_24h: f64,
        low_24h: f64,
        volume_24h: f64,
    },
    /// Funding-rate sample, percent. Only derivatives symbols have one.
    Funding { symbol: String, rate: f64 },
    /// Liquidation notional totals per side.
    Liquidations { symbol: String, buy: f64, sell: f64 },
}

impl FeedEvent {
    pub fn symbol(&self) -> &str {
        match self {
            FeedEvent::Candles { symbol, .. }
            | FeedEvent::Tick { symbol, .. }
            | FeedEvent::Depth { symbol, .. }
            | FeedEvent::Ticker { symbol, .. }
            | FeedEvent::Funding { symbol, .. }
            | FeedEvent::Liquidations { symbol, .. } => symbol,
        }
    }
}

/// An actionable signal surfaced by the gating state machine. Consumed
/// by the notification collaborator; the engine only decides whether and
/// when to emit, never how to display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_weights_sum_to_one() {
        let total: f64 = Timeframe::ALL.iter().map(|tf| tf.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn direction_sign_mirrors() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Long.opposite(), Direction::Short);
    }

    #[test]
    fn symbol_rounding_uses_decimal_policy() {
        let btc = SymbolSpec::new("BTCUSDT", "Bitcoin", 2);
        let alt = SymbolSpec::new("THETAUSDT", "Theta", 4);
        assert_eq!(btc.round(63250.456), 63250.46);
        assert_eq!(alt.round(1.45678), 1.4568);
    }

    #[test]
    fn tfmap_get_set() {
        let mut map = TfMap::filled(0.0);
        map.set(Timeframe::H4, 42.0);
        assert_eq!(*map.get(Timeframe::H4), 42.0);
        assert_eq!(*map.get(Timeframe::M5), 0.0);
    }
}
