use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SymbolPair: one tradable pair, normalized
// ---------------------------------------------------------------------------

/// A tradable pair split into base and quote asset, regardless of how the
/// exchange spells the combined ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolPair {
    /// Base asset (the currency being priced, e.g. `BTC`).
    pub symbol: String,
    /// Quote asset (the currency the price is denominated in, e.g. `USDT`).
    pub quote_asset: String,
}

impl SymbolPair {
    pub fn new(symbol: impl Into<String>, quote_asset: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quote_asset: quote_asset.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AssetBalance: normalized account-summary record
// ---------------------------------------------------------------------------

/// One asset position from an exchange account summary.
///
/// Both adapters produce this shape; `price` is filled in by a follow-up
/// ticker lookup, not by the summary endpoint itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: f64,
    pub locked: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl AssetBalance {
    pub fn total(&self) -> f64 {
        self.free + self.locked
    }
}

// ---------------------------------------------------------------------------
// Trade: one fill from an exported trade-history CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub time: String,
    pub side: TradeSide,
    pub symbol: String,
    pub filled_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<f64>,
}
