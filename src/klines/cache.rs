//! CSV-backed kline cache.
//!
//! One file per (exchange, symbol, interval) triple, named
//! `{exchange}-{symbol}_{token}_{start}_{end}.csv` with the covered range
//! spelled as `%Y-%m-%d` dates. When a request extends past the cached
//! range, only the gaps are fetched; the merged candles are rewritten under
//! the new range and the stale file is removed.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::exchange::{ExchangeApi, ExchangeId};
use crate::klines::range::{reconcile, FetchPlan};
use crate::models::{DateRange, Interval, Kline};
use crate::store::FileStore;

const DATE_FORMAT: &str = "%Y-%m-%d";
const SECONDS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// CacheEntry: one cache file's identity
// ---------------------------------------------------------------------------

/// Identity of one cache file: which candles it holds and over what range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub exchange: ExchangeId,
    pub symbol: String,
    /// Exchange wire token for the interval (`1hour`, `60m`, ...). Tokens
    /// never contain `_`, which keeps the file name parseable.
    pub token: String,
    pub range: DateRange,
}

impl CacheEntry {
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}_{}_{}_{}.csv",
            self.exchange,
            self.symbol,
            self.token,
            format_date(self.range.start),
            format_date(self.range.end),
        )
    }

    /// Parse a file name back into an entry; `None` for foreign files.
    pub fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".csv")?;
        let mut parts = stem.rsplitn(4, '_');
        let end = parse_date(parts.next()?)?;
        let start = parse_date(parts.next()?)?;
        let token = parts.next()?.to_string();
        let (exchange, symbol) = parts.next()?.split_once('-')?;
        Some(CacheEntry {
            exchange: exchange.parse().ok()?,
            symbol: symbol.to_string(),
            token,
            range: DateRange::new(start, end).ok()?,
        })
    }
}

fn format_date(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn parse_date(s: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

// ---------------------------------------------------------------------------
// CSV encoding
// ---------------------------------------------------------------------------

/// CSV row shape. Kept separate from [`Kline`] so every row has the same
/// column count regardless of whether `quote_volume` is present.
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    quote_volume: Option<f64>,
}

impl From<&Kline> for Row {
    fn from(k: &Kline) -> Self {
        Row {
            time: k.time,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
            quote_volume: k.quote_volume,
        }
    }
}

impl From<Row> for Kline {
    fn from(r: Row) -> Self {
        Kline {
            time: r.time,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
            quote_volume: r.quote_volume,
        }
    }
}

pub(crate) fn encode_csv(klines: &[Kline]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for kline in klines {
        writer.serialize(Row::from(kline))?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

pub(crate) fn decode_csv(bytes: &[u8]) -> Result<Vec<Kline>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut klines = Vec::new();
    for row in reader.deserialize::<Row>() {
        klines.push(row?.into());
    }
    Ok(klines)
}

// ---------------------------------------------------------------------------
// KlineCache
// ---------------------------------------------------------------------------

/// Range-aware cache over a [`FileStore`].
pub struct KlineCache<S> {
    store: S,
}

impl<S: FileStore> KlineCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Candles for `symbol` over `requested`, fetching only what the cache
    /// does not already hold.
    ///
    /// File names carry the covered range at day granularity, so `requested`
    /// must align to UTC midnight on both ends; unaligned ranges are
    /// `InvalidRange`. A fetch that comes back empty (the adapters' non-2xx
    /// behavior) never widens the recorded range: coverage is only recorded
    /// for candles actually obtained.
    pub async fn get(
        &self,
        client: &dyn ExchangeApi,
        symbol: &str,
        interval: Interval,
        requested: DateRange,
    ) -> Result<Vec<Kline>> {
        if requested.start % SECONDS_PER_DAY != 0 || requested.end % SECONDS_PER_DAY != 0 {
            return Err(Error::InvalidRange(format!(
                "cache ranges must align to UTC midnight, got {}..{}",
                requested.start, requested.end
            )));
        }

        let token = client.interval_token(interval)?.to_string();
        let existing = self.find_entry(client.id(), symbol, &token).await?;

        let Some(entry) = existing else {
            info!(exchange = %client.id(), symbol, %interval, "cache miss, fetching full range");
            let klines = client.klines(symbol, interval, requested).await?;
            if !klines.is_empty() {
                self.write_entry(client.id(), symbol, &token, requested, &klines)
                    .await?;
            }
            return Ok(klines);
        };

        let plan = reconcile(entry.range, requested);
        let mut klines = decode_csv(&self.store.read(&entry.file_name()).await?)?;

        // `covered` only grows past the old range when the gap fetch
        // actually produced candles.
        let mut covered = entry.range;
        let mut fetched_any = false;

        match plan {
            FetchPlan::NoFetch => {
                debug!(file = entry.file_name(), "cache hit");
            }
            FetchPlan::FetchAfter(gap) => {
                let gap_klines = client.klines(symbol, interval, gap).await?;
                if !gap_klines.is_empty() {
                    klines.extend(gap_klines);
                    covered.end = requested.end;
                    fetched_any = true;
                }
            }
            FetchPlan::FetchBefore(gap) => {
                let gap_klines = client.klines(symbol, interval, gap).await?;
                if !gap_klines.is_empty() {
                    klines.extend(gap_klines);
                    covered.start = requested.start;
                    fetched_any = true;
                }
            }
            FetchPlan::FetchBoth { before, after } => {
                let before_klines = client.klines(symbol, interval, before).await?;
                if !before_klines.is_empty() {
                    klines.extend(before_klines);
                    covered.start = requested.start;
                    fetched_any = true;
                }
                let after_klines = client.klines(symbol, interval, after).await?;
                if !after_klines.is_empty() {
                    klines.extend(after_klines);
                    covered.end = requested.end;
                    fetched_any = true;
                }
            }
            FetchPlan::FetchAll(gap) => {
                // Disjoint request: keeping the old candles would leave an
                // unfetched hole inside the recorded range, so the fresh
                // candles replace them entirely.
                let fresh = client.klines(symbol, interval, gap).await?;
                if !fresh.is_empty() {
                    klines = fresh;
                    covered = requested;
                    fetched_any = true;
                }
            }
        }

        klines.sort_by_key(|k| k.time);
        klines.dedup_by_key(|k| k.time);

        if fetched_any {
            self.write_entry(client.id(), symbol, &token, covered, &klines)
                .await?;
            let old_name = entry.file_name();
            let new_entry = CacheEntry {
                exchange: client.id(),
                symbol: symbol.to_string(),
                token: token.clone(),
                range: covered,
            };
            if new_entry.file_name() != old_name {
                self.store.delete(&old_name).await?;
            }
        }

        Ok(klines
            .into_iter()
            .filter(|k| requested.contains(k.time))
            .collect())
    }

    async fn find_entry(
        &self,
        exchange: ExchangeId,
        symbol: &str,
        token: &str,
    ) -> Result<Option<CacheEntry>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .filter_map(|name| CacheEntry::parse(name))
            .find(|e| e.exchange == exchange && e.symbol == symbol && e.token == token))
    }

    async fn write_entry(
        &self,
        exchange: ExchangeId,
        symbol: &str,
        token: &str,
        range: DateRange,
        klines: &[Kline],
    ) -> Result<()> {
        let entry = CacheEntry {
            exchange,
            symbol: symbol.to_string(),
            token: token.to_string(),
            range,
        };
        self.store
            .write(&entry.file_name(), &encode_csv(klines)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_round_trips() {
        let entry = CacheEntry {
            exchange: ExchangeId::Kucoin,
            symbol: "BTC-USDT".to_string(),
            token: "1hour".to_string(),
            range: DateRange::new(1_700_006_400, 1_700_092_800).unwrap(),
        };
        let name = entry.file_name();
        assert_eq!(name, "kucoin-BTC-USDT_1hour_2023-11-15_2023-11-16.csv");
        // Dates truncate to midnight, so the parsed range snaps to day edges.
        let parsed = CacheEntry::parse(&name).unwrap();
        assert_eq!(parsed.exchange, ExchangeId::Kucoin);
        assert_eq!(parsed.symbol, "BTC-USDT");
        assert_eq!(parsed.token, "1hour");
        assert_eq!(parsed.file_name(), name);
    }

    #[test]
    fn foreign_files_do_not_parse() {
        assert!(CacheEntry::parse("notes.txt").is_none());
        assert!(CacheEntry::parse("binance-BTCUSDT_1h_2023-01-01_2023-01-02.csv").is_none());
        assert!(CacheEntry::parse("kucoin-BTC-USDT_1hour_2023-01-01.csv").is_none());
    }

    #[test]
    fn csv_round_trips_with_and_without_quote_volume() {
        let klines = vec![
            Kline {
                time: 100,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10.0,
                quote_volume: Some(15.0),
            },
            Kline {
                time: 200,
                open: 1.5,
                high: 2.5,
                low: 1.0,
                close: 2.0,
                volume: 20.0,
                quote_volume: None,
            },
        ];
        let bytes = encode_csv(&klines).unwrap();
        assert_eq!(decode_csv(&bytes).unwrap(), klines);
    }

    #[test]
    fn empty_csv_decodes_to_no_klines() {
        let bytes = encode_csv(&[]).unwrap();
        assert!(decode_csv(&bytes).unwrap().is_empty());
    }
}
