//! Spreadsheet value client.
//!
//! Reads ranges from the hosted spreadsheet API. The first row of every
//! range is a header row; [`SheetsClient::records`] zips it against the data
//! rows, and the crypto entries sheet additionally parses into typed
//! [`HoldingEntry`] rows.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};
use crate::models::HoldingEntry;

pub struct SheetsClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl SheetsClient {
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

    /// Raw cell values for `range`, header row included.
    pub async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!("{}/{}/values/{}", self.base_url, spreadsheet_id, range);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "sheet {spreadsheet_id} range {range} returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        Ok(parse_values(&body))
    }

    /// Rows of `range` as header-keyed records.
    pub async fn records(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<HashMap<String, String>>> {
        Ok(rows_to_records(self.values(spreadsheet_id, range).await?))
    }

    /// The crypto cost-basis sheet, parsed. Rows with malformed numbers are
    /// skipped with a warning rather than failing the whole sheet.
    pub async fn holding_entries(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<HoldingEntry>> {
        let records = self.records(spreadsheet_id, range).await?;
        Ok(records
            .iter()
            .filter_map(|record| match parse_entry(record) {
                Some(entry) => Some(entry),
                None => {
                    warn!(?record, "skipping malformed cost-basis row");
                    None
                }
            })
            .collect())
    }
}

pub(crate) fn parse_values(body: &Value) -> Vec<Vec<String>> {
    body.get("values")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_array)
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.as_str().map(str::to_string).unwrap_or_else(|| cell.to_string()))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Zip the header row against each data row. Short rows pad trailing
/// columns with empty strings so every record has every header key.
pub(crate) fn rows_to_records(rows: Vec<Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    rows.map(|row| {
        header
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    })
    .collect()
}

fn parse_entry(record: &HashMap<String, String>) -> Option<HoldingEntry> {
    Some(HoldingEntry {
        rank_id: record.get("rank_id")?.clone(),
        name: record.get("name")?.clone(),
        invested_value: record.get("invested_value")?.parse().ok()?,
        token_count: record.get("token_count")?.parse().ok()?,
    })
}
