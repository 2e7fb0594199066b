//! Sqlite-backed symbol store.
//!
//! Holds every tradable pair seen on each exchange. The poller reconciles
//! this table against the live symbol lists; `INSERT OR IGNORE` plus the
//! unique key makes reconciliation idempotent.

use std::collections::HashMap;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::info;

use crate::error::Result;
use crate::exchange::ExchangeId;
use crate::models::SymbolPair;

#[derive(Clone)]
pub struct SymbolStore {
    pool: SqlitePool,
}

impl SymbolStore {
    /// Open (creating if missing) the database and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS symbols (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 exchange TEXT NOT NULL,
                 symbol TEXT NOT NULL,
                 quote_asset TEXT NOT NULL,
                 UNIQUE (exchange, symbol, quote_asset)
             )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Insert any pairs not yet present. Returns how many were new.
    pub async fn reconcile(&self, exchange: ExchangeId, pairs: &[SymbolPair]) -> Result<u64> {
        let mut inserted = 0;
        for pair in pairs {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO symbols (exchange, symbol, quote_asset)
                 VALUES (?1, ?2, ?3)",
            )
            .bind(exchange.as_str())
            .bind(&pair.symbol)
            .bind(&pair.quote_asset)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        if inserted > 0 {
            info!(%exchange, inserted, "registered new symbols");
        }
        Ok(inserted)
    }

    /// All pairs known for one exchange.
    pub async fn list(&self, exchange: ExchangeId) -> Result<Vec<SymbolPair>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT symbol, quote_asset FROM symbols
             WHERE exchange = ?1 ORDER BY symbol, quote_asset",
        )
        .bind(exchange.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(symbol, quote)| SymbolPair::new(symbol, quote))
            .collect())
    }

    /// Every known pair, grouped by exchange name.
    pub async fn grouped(&self) -> Result<HashMap<String, Vec<SymbolPair>>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT exchange, symbol, quote_asset FROM symbols
             ORDER BY exchange, symbol, quote_asset",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut grouped: HashMap<String, Vec<SymbolPair>> = HashMap::new();
        for (exchange, symbol, quote) in rows {
            grouped
                .entry(exchange)
                .or_default()
                .push(SymbolPair::new(symbol, quote));
        }
        Ok(grouped)
    }
}
