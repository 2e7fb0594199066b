//! Price-ranking service client.
//!
//! Quotes USD prices for currencies identified by their ranking-service id,
//! which is also the key the cost-basis sheet uses.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};

pub struct RankClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl RankClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    /// USD prices for the given currency ids, keyed by id. Ids the service
    /// does not know are simply absent from the result.
    pub async fn prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let resp = self
            .http
            .get(format!("{}/currencies", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("ids", &ids.join(",")),
                ("state", "active"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "price request returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        Ok(parse_prices(&body))
    }
}

/// Pull `data[].values.USD.price` out of the listing, keyed by each entry's
/// id. Entries without a USD quote are dropped.
pub(crate) fn parse_prices(body: &Value) -> HashMap<String, f64> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        return HashMap::new();
    };
    data.iter()
        .filter_map(|entry| {
            let id = match entry.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let price = entry
                .get("values")?
                .get("USD")?
                .get("price")?
                .as_f64()?;
            Some((id, price))
        })
        .collect()
}
