//! Shared test fixtures: an in-memory file store and a scripted exchange.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use homeboard::error::{Error, Result};
use homeboard::exchange::{ExchangeApi, ExchangeId};
use homeboard::models::{AssetBalance, DateRange, Interval, Kline, SymbolPair};
use homeboard::store::FileStore;

/// One hourly candle per bucket, with a recognizable price.
pub fn hourly_klines(range: DateRange) -> Vec<Kline> {
    let mut klines = Vec::new();
    let mut time = range.start;
    while time <= range.end {
        klines.push(Kline {
            time,
            open: time as f64,
            high: time as f64 + 1.0,
            low: time as f64 - 1.0,
            close: time as f64 + 0.5,
            volume: 1.0,
            quote_volume: None,
        });
        time += 3600;
    }
    klines
}

/// [`FileStore`] over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.lock().unwrap().keys().cloned().collect())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    async fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.to_vec());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Exchange that synthesizes hourly candles and records every kline request.
/// While marked down it answers kline requests with an empty Vec, the same
/// degradation the real adapters apply to non-2xx responses.
#[derive(Default)]
pub struct MockExchange {
    pub kline_requests: Mutex<Vec<DateRange>>,
    down: Mutex<bool>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested_ranges(&self) -> Vec<DateRange> {
        self.kline_requests.lock().unwrap().clone()
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kucoin
    }

    fn interval_token(&self, interval: Interval) -> Result<&'static str> {
        match interval {
            Interval::OneHour => Ok("1hour"),
            Interval::OneDay => Ok("1day"),
            other => Err(Error::InvalidInterval(other.to_string())),
        }
    }

    fn interval_from_token(&self, token: &str) -> Result<Interval> {
        match token {
            "1hour" => Ok(Interval::OneHour),
            "1day" => Ok(Interval::OneDay),
            other => Err(Error::InvalidInterval(other.to_string())),
        }
    }

    fn format_pair(&self, pair: &SymbolPair) -> String {
        format!("{}-{}", pair.symbol, pair.quote_asset)
    }

    async fn all_symbols(&self) -> Result<Vec<SymbolPair>> {
        Ok(vec![SymbolPair::new("BTC", "USDT")])
    }

    async fn account_summary(&self) -> Result<Vec<AssetBalance>> {
        Ok(Vec::new())
    }

    async fn all_orders(&self) -> Result<Value> {
        Ok(Value::Array(Vec::new()))
    }

    async fn klines(
        &self,
        _symbol: &str,
        _interval: Interval,
        range: DateRange,
    ) -> Result<Vec<Kline>> {
        self.kline_requests.lock().unwrap().push(range);
        if *self.down.lock().unwrap() {
            return Ok(Vec::new());
        }
        Ok(hourly_klines(range))
    }

    async fn prices(&self, _symbols: &[String]) -> Result<HashMap<String, f64>> {
        Ok(HashMap::new())
    }
}
