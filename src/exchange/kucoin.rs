//! KuCoin adapter.
//!
//! Signs requests with HMAC-SHA256 over `timestamp + method + path[?query]`,
//! base64-encoded, with an additionally HMAC'd and base64-encoded passphrase
//! (KC-API-KEY-VERSION 2 scheme). Kline pages are capped at 1500 candles, so
//! wide ranges paginate.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::{ExchangeCredentials, HTTP_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::exchange::{page_count, ExchangeApi, ExchangeId, MAX_KLINES_PER_PAGE};
use crate::models::{AssetBalance, DateRange, Interval, Kline, SymbolPair};

type HmacSha256 = Hmac<Sha256>;

const INTERVAL_TOKENS: [(Interval, &str); 8] = [
    (Interval::OneMinute, "1min"),
    (Interval::FiveMinutes, "5min"),
    (Interval::FifteenMinutes, "15min"),
    (Interval::ThirtyMinutes, "30min"),
    (Interval::OneHour, "1hour"),
    (Interval::FourHours, "4hour"),
    (Interval::OneDay, "1day"),
    (Interval::OneWeek, "1week"),
];

pub struct KucoinClient {
    creds: ExchangeCredentials,
    http: reqwest::Client,
}

impl KucoinClient {
    pub fn new(creds: ExchangeCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { creds, http })
    }

    /// Build the signed KC-API-* header set for a GET request.
    fn signed_headers(&self, path: &str, query: Option<&str>) -> Result<HeaderMap> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let payload = string_to_sign(now_ms, "GET", path, query);

        let mut mac = HmacSha256::new_from_slice(self.creds.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let passphrase = self
            .creds
            .passphrase
            .as_deref()
            .ok_or_else(|| Error::MissingConfig("KUCOIN_API_PASSPHRASE".into()))?;
        let mut mac = HmacSha256::new_from_slice(self.creds.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(passphrase.as_bytes());
        let signed_passphrase = BASE64.encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert("KC-API-SIGN", header_value(&signature)?);
        headers.insert("KC-API-TIMESTAMP", header_value(&now_ms.to_string())?);
        headers.insert("KC-API-KEY", header_value(&self.creds.api_key)?);
        headers.insert("KC-API-PASSPHRASE", header_value(&signed_passphrase)?);
        headers.insert("KC-API-KEY-VERSION", HeaderValue::from_static("2"));
        Ok(headers)
    }

    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<reqwest::Response> {
        let query_string = encode_query(query);
        let headers = self.signed_headers(path, query_string.as_deref())?;
        // The URL must carry exactly the string that was signed.
        let url = match query_string {
            Some(q) => format!("{}{}?{}", self.creds.base_url, path, q),
            None => format!("{}{}", self.creds.base_url, path),
        };
        Ok(self.http.get(&url).headers(headers).send().await?)
    }
}

/// The exact string KuCoin expects under the signature.
pub(crate) fn string_to_sign(now_ms: i64, method: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{now_ms}{method}{path}?{q}"),
        None => format!("{now_ms}{method}{path}"),
    }
}

fn encode_query(query: &[(String, String)]) -> Option<String> {
    if query.is_empty() {
        None
    } else {
        Some(
            query
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }
}

fn header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s).map_err(|e| Error::InvalidArgument(format!("bad header value: {e}")))
}

/// Parse one wire candle row: `[time, open, close, high, low, volume, turnover]`,
/// all strings, time in unix seconds.
pub(crate) fn parse_kline_row(row: &Value) -> Option<Kline> {
    let cell = |i: usize| -> Option<f64> { row.get(i)?.as_str()?.parse().ok() };
    Some(Kline {
        time: cell(0)? as i64,
        open: cell(1)?,
        close: cell(2)?,
        high: cell(3)?,
        low: cell(4)?,
        volume: cell(5)?,
        quote_volume: cell(6),
    })
}

/// Pull the `data` array out of a KuCoin envelope; an absent key means the
/// request failed upstream and is treated as empty.
pub(crate) fn parse_kline_response(body: &Value) -> Vec<Kline> {
    let Some(rows) = body.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut klines: Vec<Kline> = rows.iter().filter_map(parse_kline_row).collect();
    // KuCoin returns newest-first
    klines.sort_by_key(|k| k.time);
    klines
}

pub(crate) fn parse_account_response(body: &Value) -> Result<Vec<AssetBalance>> {
    let rows = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::UpstreamUnavailable("kucoin account summary missing data".into()))?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let as_f64 = |key: &str| row.get(key)?.as_str()?.parse::<f64>().ok();
            Some(AssetBalance {
                asset: row.get("currency")?.as_str()?.to_string(),
                free: as_f64("available")?,
                locked: as_f64("holds").unwrap_or(0.0),
                price: None,
            })
        })
        .collect())
}

#[async_trait]
impl ExchangeApi for KucoinClient {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kucoin
    }

    fn interval_token(&self, interval: Interval) -> Result<&'static str> {
        INTERVAL_TOKENS
            .iter()
            .find(|(i, _)| *i == interval)
            .map(|(_, t)| *t)
            .ok_or_else(|| Error::InvalidInterval(format!("kucoin has no {interval} candles")))
    }

    fn interval_from_token(&self, token: &str) -> Result<Interval> {
        INTERVAL_TOKENS
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(i, _)| *i)
            .ok_or_else(|| Error::InvalidInterval(token.to_string()))
    }

    fn format_pair(&self, pair: &SymbolPair) -> String {
        format!("{}-{}", pair.symbol, pair.quote_asset)
    }

    async fn all_symbols(&self) -> Result<Vec<SymbolPair>> {
        let resp = self.get_json("/api/v2/symbols", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "kucoin symbols returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let rows = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::UpstreamUnavailable("kucoin symbols missing data".into()))?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(SymbolPair::new(
                    row.get("baseCurrency")?.as_str()?,
                    row.get("quoteCurrency")?.as_str()?,
                ))
            })
            .collect())
    }

    async fn account_summary(&self) -> Result<Vec<AssetBalance>> {
        let resp = self.get_json("/api/v1/accounts", &[]).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "kucoin accounts returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        parse_account_response(&body)
    }

    async fn all_orders(&self) -> Result<Value> {
        // Order history is not wired up for this exchange.
        Ok(Value::Array(Vec::new()))
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        range: DateRange,
    ) -> Result<Vec<Kline>> {
        let token = self.interval_token(interval)?;
        let pages = page_count(range, interval);
        let mut klines = Vec::new();

        for page in 1..=pages {
            let query = vec![
                ("symbol".to_string(), symbol.to_string()),
                ("type".to_string(), token.to_string()),
                ("startAt".to_string(), range.start.to_string()),
                ("endAt".to_string(), range.end.to_string()),
                ("currentPage".to_string(), page.to_string()),
                ("pageSize".to_string(), MAX_KLINES_PER_PAGE.to_string()),
            ];
            let resp = self.get_json("/api/v1/market/candles", &query).await?;
            if !resp.status().is_success() {
                warn!(exchange = "kucoin", %symbol, status = %resp.status(), "kline request failed");
                return Ok(Vec::new());
            }
            let body: Value = resp.json().await?;
            let page_klines = parse_kline_response(&body);
            debug!(exchange = "kucoin", %symbol, page, count = page_klines.len(), "fetched klines");
            klines.extend(page_klines);
        }

        klines.sort_by_key(|k| k.time);
        klines.dedup_by_key(|k| k.time);
        Ok(klines)
    }

    async fn prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>> {
        let query = vec![
            ("base".to_string(), "USD".to_string()),
            ("currencies".to_string(), symbols.join(",")),
        ];
        let resp = self.get_json("/api/v1/prices", &query).await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "kucoin prices returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let data = body
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::UpstreamUnavailable("kucoin prices missing data".into()))?;
        Ok(data
            .iter()
            .filter_map(|(asset, price)| Some((asset.clone(), price.as_str()?.parse().ok()?)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_to_sign_includes_query_when_present() {
        assert_eq!(
            string_to_sign(1000, "GET", "/api/v1/accounts", None),
            "1000GET/api/v1/accounts"
        );
        assert_eq!(
            string_to_sign(1000, "GET", "/api/v1/prices", Some("base=USD")),
            "1000GET/api/v1/prices?base=USD"
        );
    }

    #[test]
    fn kline_rows_parse_and_sort_ascending() {
        let body = json!({
            "code": "200000",
            "data": [
                ["1700003600", "2.0", "2.1", "2.2", "1.9", "10.0", "21.0"],
                ["1700000000", "1.0", "1.1", "1.2", "0.9", "5.0", "5.5"]
            ]
        });
        let klines = parse_kline_response(&body);
        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].time, 1_700_000_000);
        assert_eq!(klines[0].open, 1.0);
        assert_eq!(klines[0].close, 1.1);
        assert_eq!(klines[0].high, 1.2);
        assert_eq!(klines[0].low, 0.9);
        assert_eq!(klines[1].quote_volume, Some(21.0));
    }

    #[test]
    fn missing_data_key_yields_empty_klines() {
        let body = json!({"code": "400100", "msg": "Invalid request"});
        assert!(parse_kline_response(&body).is_empty());
    }

    #[test]
    fn account_rows_normalize_to_balances() {
        let body = json!({
            "data": [
                {"currency": "BTC", "type": "trade", "balance": "1.5", "available": "1.2", "holds": "0.3"},
                {"currency": "ETH", "type": "main", "balance": "2.0", "available": "2.0", "holds": "0"}
            ]
        });
        let balances = parse_account_response(&body).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].asset, "BTC");
        assert_eq!(balances[0].free, 1.2);
        assert_eq!(balances[0].locked, 0.3);
        assert_eq!(balances[0].total(), 1.5);
    }
}
