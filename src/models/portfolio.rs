use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// HoldingEntry: one cost-basis row from the entries sheet
// ---------------------------------------------------------------------------

/// One row of the spreadsheet-sourced cost basis: how much was invested in a
/// token and how many tokens were bought, keyed by the price-ranking
/// service's currency id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub rank_id: String,
    pub name: String,
    pub invested_value: f64,
    pub token_count: f64,
}

// ---------------------------------------------------------------------------
// Holding: entry joined with a live price
// ---------------------------------------------------------------------------

/// A [`HoldingEntry`] enriched with a live price and derived metrics.
///
/// `profit_percent` is `None` when `invested_value` is zero; there is no
/// meaningful percentage against a zero cost basis. All other fields stay
/// unrounded; only `profit_percent` is rounded (2 decimal places) since it
/// is display-bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub rank_id: String,
    pub name: String,
    pub invested_value: f64,
    pub token_count: f64,
    pub average_entry: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_percent: Option<f64>,
}
