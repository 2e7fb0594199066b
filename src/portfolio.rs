//! Portfolio arithmetic.
//!
//! Pure functions from cost-basis entries and live prices to enriched
//! holdings. No I/O here; callers supply the price map.

use std::collections::HashMap;

use crate::models::{Holding, HoldingEntry};

/// Round to two decimal places for display-bound percentages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average price paid per token. Zero when no tokens were bought, since
/// there is no position to average over.
pub fn average_entry(invested_value: f64, token_count: f64) -> f64 {
    if token_count == 0.0 {
        0.0
    } else {
        invested_value / token_count
    }
}

/// Profit relative to the cost basis, in percent and rounded. `None` when
/// nothing was invested; a percentage against a zero basis is undefined.
pub fn profit_percent(invested_value: f64, profit: f64) -> Option<f64> {
    if invested_value == 0.0 {
        None
    } else {
        Some(round2(profit / invested_value * 100.0))
    }
}

/// Join one entry with its live price, if known.
pub fn enrich(entry: &HoldingEntry, price: Option<f64>) -> Holding {
    let current_value = price.map(|p| p * entry.token_count);
    let profit = current_value.map(|v| v - entry.invested_value);
    Holding {
        rank_id: entry.rank_id.clone(),
        name: entry.name.clone(),
        invested_value: entry.invested_value,
        token_count: entry.token_count,
        average_entry: average_entry(entry.invested_value, entry.token_count),
        price,
        current_value,
        profit,
        profit_percent: profit.and_then(|p| profit_percent(entry.invested_value, p)),
    }
}

/// Join every entry with the price map, keyed by the ranking service's
/// currency id. Entries with no quoted price keep their derived fields unset.
pub fn build_holdings(entries: &[HoldingEntry], prices: &HashMap<String, f64>) -> Vec<Holding> {
    entries
        .iter()
        .map(|entry| enrich(entry, prices.get(&entry.rank_id).copied()))
        .collect()
}
