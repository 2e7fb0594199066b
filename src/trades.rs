//! Exported trade-history parsing.
//!
//! Exchanges do not serve complete trade history over their APIs, so fills
//! come from manually exported CSV files dropped into a directory. Each
//! exchange exports a different column layout; both normalize to [`Trade`].
//!
//! File names select the parser: files starting with the exchange name
//! (`kucoin-*.csv`, `mexc-*.csv`) are parsed with that exchange's layout.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::warn;

use crate::error::Result;
use crate::exchange::ExchangeId;
use crate::models::{Trade, TradeSide};

pub struct TradeStore {
    dir: PathBuf,
}

impl TradeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All fills exported for one exchange. A missing directory means no
    /// exports yet; files that fail to parse are skipped with a warning.
    pub fn trades(&self, exchange: ExchangeId) -> Result<Vec<Trade>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{exchange}-");
        let mut trades = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".csv") {
                continue;
            }
            match read_trade_file(&path, exchange) {
                Ok(mut file_trades) => trades.append(&mut file_trades),
                Err(e) => warn!(file = name, error = %e, "skipping unreadable trade export"),
            }
        }
        Ok(trades)
    }
}

fn read_trade_file(path: &Path, exchange: ExchangeId) -> Result<Vec<Trade>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut trades = Vec::new();
    for row in reader.records() {
        let record = to_record(&headers, &row?);
        let trade = match exchange {
            ExchangeId::Kucoin => parse_kucoin_row(&record),
            ExchangeId::Mexc => parse_mexc_row(&record),
        };
        if let Some(trade) = trade {
            trades.push(trade);
        }
    }
    Ok(trades)
}

fn to_record(headers: &StringRecord, row: &StringRecord) -> HashMap<String, String> {
    headers
        .iter()
        .zip(row.iter())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// KuCoin export layout: `Symbol`, `Order Time(UTC+01:00)`, `Side`, `Fee`,
/// `Filled Amount`, `Avg. Filled Price`.
pub(crate) fn parse_kucoin_row(record: &HashMap<String, String>) -> Option<Trade> {
    Some(Trade {
        time: record.get("Order Time(UTC+01:00)")?.clone(),
        side: parse_side(record.get("Side")?)?,
        symbol: record.get("Symbol")?.clone(),
        filled_amount: record.get("Filled Amount")?.parse().ok()?,
        fee: record.get("Fee").and_then(|v| v.parse().ok()),
        avg_price: record.get("Avg. Filled Price").and_then(|v| v.parse().ok()),
    })
}

/// MEXC export layout: `Crypto` (ticker with quote suffix), `Transaction
/// Type`, `Creation Time(UTC+1)`, `Direction`, `Quantity`. Only spot trades
/// count; deposits and airdrops share the same export.
pub(crate) fn parse_mexc_row(record: &HashMap<String, String>) -> Option<Trade> {
    if record.get("Transaction Type")? != "Spot Trading" {
        return None;
    }
    let symbol = record
        .get("Crypto")?
        .strip_suffix("USDT")
        .unwrap_or(record.get("Crypto")?)
        .to_string();
    let side = match record.get("Direction")?.as_str() {
        "Inflow" => TradeSide::Buy,
        _ => TradeSide::Sell,
    };
    Some(Trade {
        time: record.get("Creation Time(UTC+1)")?.clone(),
        side,
        symbol,
        filled_amount: record.get("Quantity")?.parse().ok()?,
        fee: None,
        avg_price: None,
    })
}

fn parse_side(s: &str) -> Option<TradeSide> {
    match s.to_ascii_uppercase().as_str() {
        "BUY" => Some(TradeSide::Buy),
        "SELL" => Some(TradeSide::Sell),
        _ => None,
    }
}
