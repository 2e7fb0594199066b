//! Exchange client abstraction.
//!
//! Every adapter implements [`ExchangeApi`] and returns the same normalized
//! record types; wire-format parsing and request signing stay fully inside
//! the adapter. Adapters are selected through an [`ExchangeRegistry`] keyed
//! by [`ExchangeId`], never by string-matching at call sites.

pub mod kucoin;
pub mod mexc;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{AssetBalance, DateRange, Interval, Kline, SymbolPair};

pub use kucoin::KucoinClient;
pub use mexc::MexcClient;

/// Maximum candles per kline request; exchanges cap pages at this size.
pub const MAX_KLINES_PER_PAGE: i64 = 1500;

// ---------------------------------------------------------------------------
// ExchangeId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeId {
    Kucoin,
    Mexc,
}

impl ExchangeId {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeId::Kucoin => "kucoin",
            ExchangeId::Mexc => "mexc",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kucoin" => Ok(ExchangeId::Kucoin),
            "mexc" => Ok(ExchangeId::Mexc),
            other => Err(Error::NotFound(format!("unknown exchange: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// ExchangeApi
// ---------------------------------------------------------------------------

/// Capability interface over heterogeneous exchange wire APIs.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    fn id(&self) -> ExchangeId;

    /// Map a normalized interval to this exchange's wire token.
    ///
    /// Errors with `InvalidInterval` when the exchange has no token for the
    /// interval (e.g. KuCoin has no monthly candles).
    fn interval_token(&self, interval: Interval) -> Result<&'static str>;

    /// Inverse of [`interval_token`](Self::interval_token); the two form a
    /// bijection over the intervals the exchange supports.
    fn interval_from_token(&self, token: &str) -> Result<Interval>;

    /// Spell a normalized pair the way this exchange's endpoints expect it
    /// (`BTC-USDT` on KuCoin, `BTCUSDT` on MEXC).
    fn format_pair(&self, pair: &SymbolPair) -> String;

    /// All tradable pairs, normalized to (base, quote).
    async fn all_symbols(&self) -> Result<Vec<SymbolPair>>;

    /// Account balances, normalized. Prices are not included; use
    /// [`prices`](Self::prices) to fill them in.
    async fn account_summary(&self) -> Result<Vec<AssetBalance>>;

    /// Order history as returned by the wire API. Not wired up for KuCoin,
    /// which always yields an empty array.
    async fn all_orders(&self) -> Result<Value>;

    /// OHLCV candles for `symbol` over `range`, ascending by time.
    ///
    /// A non-2xx response yields an empty Vec, not an error. Paginates when
    /// the range spans more candles than one page allows.
    async fn klines(&self, symbol: &str, interval: Interval, range: DateRange)
        -> Result<Vec<Kline>>;

    /// USD(T) prices for the given base assets.
    async fn prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>>;
}

/// Number of candles a range is expected to produce at the given interval.
pub fn expected_klines(range: DateRange, interval: Interval) -> i64 {
    range.span() / interval.seconds()
}

/// Number of pages needed to fetch `range` at `interval`, given the page cap.
pub fn page_count(range: DateRange, interval: Interval) -> i64 {
    let expected = expected_klines(range, interval);
    if expected <= MAX_KLINES_PER_PAGE {
        1
    } else {
        (expected + MAX_KLINES_PER_PAGE - 1) / MAX_KLINES_PER_PAGE
    }
}

// ---------------------------------------------------------------------------
// ExchangeRegistry
// ---------------------------------------------------------------------------

/// Lookup table from [`ExchangeId`] to a live adapter.
#[derive(Clone, Default)]
pub struct ExchangeRegistry {
    clients: HashMap<ExchangeId, Arc<dyn ExchangeApi>>,
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: Arc<dyn ExchangeApi>) {
        self.clients.insert(client.id(), client);
    }

    pub fn get(&self, id: ExchangeId) -> Result<Arc<dyn ExchangeApi>> {
        self.clients
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no client registered for {id}")))
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ExchangeApi>> {
        self.clients.values()
    }
}
