//! Crypto panel: holdings, balances, orders, klines and trade history.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::exchange::ExchangeId;
use crate::models::{AssetBalance, DateRange, Holding, Interval, Kline, SymbolPair, Trade};
use crate::portfolio;
use crate::server::error::ApiResult;
use crate::server::AppState;

/// Sheet range holding the cost-basis entries.
const ENTRIES_RANGE: &str = "entries";

/// Positions worth less than one unit after rounding are dust left over
/// from fills and conversions, not holdings worth showing.
pub(crate) fn is_dust(balance: &AssetBalance) -> bool {
    (balance.total() * 10.0).round() / 10.0 < 1.0
}

async fn holdings(state: &AppState) -> ApiResult<Vec<Holding>> {
    let entries = state
        .sheets
        .holding_entries(&state.settings.crypto_spreadsheet_id, ENTRIES_RANGE)
        .await?;
    let slugs: Vec<String> = entries.iter().map(|e| e.rank_id.clone()).collect();
    let prices = state.rank.prices(&slugs).await?;
    Ok(portfolio::build_holdings(&entries, &prices))
}

/// GET /crypto/all
pub async fn all_holdings(State(state): State<AppState>) -> ApiResult<Json<Vec<Holding>>> {
    Ok(Json(holdings(&state).await?))
}

/// GET /crypto/single/{rank_id}
pub async fn single_holding(
    State(state): State<AppState>,
    Path(rank_id): Path<String>,
) -> ApiResult<Json<Holding>> {
    holdings(&state)
        .await?
        .into_iter()
        .find(|h| h.rank_id == rank_id)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("no holding for {rank_id}")).into())
}

/// GET /crypto/all_symbols
pub async fn all_symbols(
    State(state): State<AppState>,
) -> ApiResult<Json<HashMap<String, Vec<SymbolPair>>>> {
    Ok(Json(state.symbols.grouped().await?))
}

/// GET /crypto/account/{exchange}
///
/// Balances above the dust threshold, with a USD(T) price joined in where
/// the exchange quotes one.
pub async fn account(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> ApiResult<Json<Vec<AssetBalance>>> {
    let client = state.exchanges.get(exchange.parse()?)?;
    let mut balances: Vec<AssetBalance> = client
        .account_summary()
        .await?
        .into_iter()
        .filter(|b| !is_dust(b))
        .collect();
    let assets: Vec<String> = balances.iter().map(|b| b.asset.clone()).collect();
    let prices = client.prices(&assets).await?;
    for balance in &mut balances {
        balance.price = prices.get(&balance.asset).copied();
    }
    Ok(Json(balances))
}

/// GET /crypto/orders/{exchange}
pub async fn orders(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> ApiResult<Json<Value>> {
    let client = state.exchanges.get(exchange.parse()?)?;
    Ok(Json(client.all_orders().await?))
}

#[derive(Debug, Deserialize)]
pub struct KlineQuery {
    pub interval: Interval,
    /// Inclusive range bounds as `%Y-%m-%d` dates.
    pub start: String,
    pub end: String,
}

/// GET /crypto/klines/{exchange}/{symbol}?interval=one_hour&start=...&end=...
pub async fn klines(
    State(state): State<AppState>,
    Path((exchange, symbol)): Path<(String, String)>,
    Query(query): Query<KlineQuery>,
) -> ApiResult<Json<Vec<Kline>>> {
    let client = state.exchanges.get(exchange.parse()?)?;
    let range = DateRange::new(parse_date(&query.start)?, parse_date(&query.end)?)?;
    Ok(Json(
        state
            .cache
            .get(client.as_ref(), &symbol, query.interval, range)
            .await?,
    ))
}

/// GET /crypto/trades/{exchange}
pub async fn trades(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> ApiResult<Json<Vec<Trade>>> {
    let exchange: ExchangeId = exchange.parse()?;
    Ok(Json(state.trades.trades(exchange)?))
}

fn parse_date(s: &str) -> Result<i64, Error> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::InvalidRange(format!("bad date: {s}")))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| Error::InvalidRange(format!("bad date: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(free: f64, locked: f64) -> AssetBalance {
        AssetBalance {
            asset: "X".to_string(),
            free,
            locked,
            price: None,
        }
    }

    #[test]
    fn dust_threshold_rounds_to_one_decimal() {
        assert!(is_dust(&balance(0.5, 0.0)));
        assert!(is_dust(&balance(0.4, 0.5)));
        // 0.95 rounds up to 1.0 and survives.
        assert!(!is_dust(&balance(0.95, 0.0)));
        assert!(!is_dust(&balance(0.5, 0.6)));
        assert!(!is_dust(&balance(100.0, 0.0)));
    }

    #[test]
    fn dates_parse_to_midnight_utc() {
        assert_eq!(parse_date("1970-01-02").unwrap(), 86_400);
        assert!(parse_date("02/01/1970").is_err());
        assert!(parse_date("not-a-date").is_err());
    }
}
