//! MEXC adapter.
//!
//! Signs requests by HMAC-SHA256-ing the full query string (hex-encoded) and
//! appending the digest as a `signature` parameter, with the API key sent in
//! the `X-MEXC-APIKEY` header. Timestamps on the wire are milliseconds.
//!
//! MEXC reports tickers as combined strings (`BTCUSDT`); splitting them into
//! base and quote relies on a known-suffix list, and tickers with no known
//! quote suffix are skipped with a warning.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::{ExchangeCredentials, HTTP_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::exchange::{ExchangeApi, ExchangeId};
use crate::models::{AssetBalance, DateRange, Interval, Kline, SymbolPair};

type HmacSha256 = Hmac<Sha256>;

const INTERVAL_TOKENS: [(Interval, &str); 9] = [
    (Interval::OneMinute, "1m"),
    (Interval::FiveMinutes, "5m"),
    (Interval::FifteenMinutes, "15m"),
    (Interval::ThirtyMinutes, "30m"),
    (Interval::OneHour, "60m"),
    (Interval::FourHours, "4h"),
    (Interval::OneDay, "1d"),
    (Interval::OneWeek, "1W"),
    (Interval::OneMonth, "1M"),
];

/// Quote assets MEXC combines into its tickers, longest match wins.
const KNOWN_QUOTE_ASSETS: [&str; 9] = [
    "USDT", "USDC", "USDK", "BUSD", "TUSD", "DAI", "BNB", "BTC", "ETH",
];

pub struct MexcClient {
    creds: ExchangeCredentials,
    http: reqwest::Client,
}

impl MexcClient {
    pub fn new(creds: ExchangeCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { creds, http })
    }

    /// GET with `timestamp` and `signature` parameters appended.
    async fn get_signed(&self, path: &str, params: &[(String, String)]) -> Result<reqwest::Response> {
        let mut params: Vec<(String, String)> = params.to_vec();
        params.push((
            "timestamp".to_string(),
            chrono::Utc::now().timestamp_millis().to_string(),
        ));
        let query = encode_query(&params);
        let signature = sign_query(&self.creds.api_secret, &query);

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MEXC-APIKEY",
            HeaderValue::from_str(&self.creds.api_key)
                .map_err(|e| Error::InvalidArgument(format!("bad header value: {e}")))?,
        );
        // The URL must carry exactly the string that was signed.
        let url = format!(
            "{}{}?{}&signature={}",
            self.creds.base_url, path, query, signature
        );
        Ok(self.http.get(&url).headers(headers).send().await?)
    }

    async fn get_public(&self, path: &str, params: &[(String, String)]) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.creds.base_url, path);
        Ok(self.http.get(&url).query(params).send().await?)
    }
}

/// Hex HMAC-SHA256 of the raw query string, the wire signature format.
pub(crate) fn sign_query(secret: &str, query: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Split a combined ticker into (base, quote) against the known quote list.
/// When more than one quote asset suffixes the ticker, the longest wins.
pub(crate) fn split_ticker(ticker: &str) -> Option<SymbolPair> {
    KNOWN_QUOTE_ASSETS
        .iter()
        .filter(|quote| ticker.len() > quote.len() && ticker.ends_with(*quote))
        .max_by_key(|quote| quote.len())
        .map(|quote| SymbolPair::new(&ticker[..ticker.len() - quote.len()], *quote))
}

/// Parse one wire candle row:
/// `[open_time_ms, open, high, low, close, volume, close_time_ms, quote_volume]`,
/// prices as strings. Times are converted to unix seconds.
pub(crate) fn parse_kline_row(row: &Value) -> Option<Kline> {
    let cell = |i: usize| -> Option<f64> { row.get(i)?.as_str()?.parse().ok() };
    Some(Kline {
        time: row.get(0)?.as_i64()? / 1000,
        open: cell(1)?,
        high: cell(2)?,
        low: cell(3)?,
        close: cell(4)?,
        volume: cell(5)?,
        quote_volume: cell(7),
    })
}

pub(crate) fn parse_account_response(body: &Value) -> Result<Vec<AssetBalance>> {
    let rows = body
        .get("balances")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::UpstreamUnavailable("mexc account summary missing balances".into()))?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let as_f64 = |key: &str| row.get(key)?.as_str()?.parse::<f64>().ok();
            Some(AssetBalance {
                asset: row.get("asset")?.as_str()?.to_string(),
                free: as_f64("free")?,
                locked: as_f64("locked").unwrap_or(0.0),
                price: None,
            })
        })
        .collect())
}

#[async_trait]
impl ExchangeApi for MexcClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    fn interval_token(&self, interval: Interval) -> Result<&'static str> {
        INTERVAL_TOKENS
            .iter()
            .find(|(i, _)| *i == interval)
            .map(|(_, t)| *t)
            .ok_or_else(|| Error::InvalidInterval(format!("mexc has no {interval} candles")))
    }

    fn interval_from_token(&self, token: &str) -> Result<Interval> {
        INTERVAL_TOKENS
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(i, _)| *i)
            .ok_or_else(|| Error::InvalidInterval(token.to_string()))
    }

    fn format_pair(&self, pair: &SymbolPair) -> String {
        format!("{}{}", pair.symbol, pair.quote_asset)
    }

    async fn all_symbols(&self) -> Result<Vec<SymbolPair>> {
        let resp = self.get_public("/api/v3/defaultSymbols", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "mexc symbols returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let tickers = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::UpstreamUnavailable("mexc symbols missing data".into()))?;
        let mut pairs = Vec::with_capacity(tickers.len());
        for ticker in tickers.iter().filter_map(Value::as_str) {
            match split_ticker(ticker) {
                Some(pair) => pairs.push(pair),
                None => warn!(exchange = "mexc", ticker, "no known quote suffix, skipping"),
            }
        }
        Ok(pairs)
    }

    async fn account_summary(&self) -> Result<Vec<AssetBalance>> {
        let resp = self.get_signed("/api/v3/account", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "mexc account returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        parse_account_response(&body)
    }

    async fn all_orders(&self) -> Result<Value> {
        let resp = self.get_signed("/api/v3/allOrders", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "mexc orders returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> Result<Vec<Kline>> {
        let token = self.interval_token(interval)?;
        let params = vec![
            ("symbol".to_string(), symbol.to_string()),
            ("interval".to_string(), token.to_string()),
            ("startTime".to_string(), (range.start * 1000).to_string()),
            ("endTime".to_string(), (range.end * 1000).to_string()),
        ];
        let resp = self.get_public("/api/v3/klines", &params).await?;
        if !resp.status().is_success() {
            warn!(exchange = "mexc", %symbol, status = %resp.status(), "kline request failed");
            return Ok(Vec::new());
        }
        let body: Value = resp.json().await?;
        let rows = body.as_array().cloned().unwrap_or_default();
        let mut klines: Vec<Kline> = rows.iter().filter_map(parse_kline_row).collect();
        debug!(exchange = "mexc", %symbol, count = klines.len(), "fetched klines");
        klines.sort_by_key(|k| k.time);
        klines.dedup_by_key(|k| k.time);
        Ok(klines)
    }

    async fn prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>> {
        // The ticker endpoint has no multi-symbol filter; fetch everything
        // once and pick out the USDT pairs we were asked for.
        let resp = self.get_public("/api/v3/ticker/price", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "mexc ticker returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let rows = body
            .as_array()
            .ok_or_else(|| Error::UpstreamUnavailable("mexc ticker is not an array".into()))?;
        let mut prices = HashMap::new();
        for row in rows {
            let Some(ticker) = row.get("symbol").and_then(Value::as_str) else {
                continue;
            };
            let Some(price) = row.get("price").and_then(Value::as_str) else {
                continue;
            };
            for asset in symbols {
                if ticker == format!("{asset}USDT") {
                    if let Ok(price) = price.parse::<f64>() {
                        prices.insert(asset.clone(), price);
                    }
                }
            }
        }
        Ok(prices)
    }
}
