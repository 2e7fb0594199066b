//! Background refresh tasks.
//!
//! Two loops run for the life of the process: a fast one keeping the symbol
//! table in step with the exchanges, and a slow one rebuilding the
//! repository summaries. Failures are logged and the loop pauses briefly;
//! there is no per-iteration retry, the next tick covers it.

use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

use crate::server::AppState;

const SYMBOL_REFRESH: Duration = Duration::from_secs(60);
const CODING_REFRESH: Duration = Duration::from_secs(3 * 60 * 60);
const FAILURE_PAUSE: Duration = Duration::from_secs(5);

/// Spawn both refresh loops.
pub fn spawn(state: AppState) {
    tokio::spawn(symbol_loop(state.clone()));
    tokio::spawn(coding_loop(state));
}

/// Reconcile the symbol table against every exchange's live listing.
async fn symbol_loop(state: AppState) {
    let mut ticker = time::interval(SYMBOL_REFRESH);
    loop {
        ticker.tick().await;
        for client in state.exchanges.all() {
            let outcome = async {
                let pairs = client.all_symbols().await?;
                state.symbols.reconcile(client.id(), &pairs).await
            }
            .await;
            match outcome {
                Ok(inserted) if inserted > 0 => {
                    info!(exchange = %client.id(), inserted, "symbol table updated");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(exchange = %client.id(), error = %e, "symbol refresh failed");
                    time::sleep(FAILURE_PAUSE).await;
                }
            }
        }
    }
}

/// Rebuild the repository summaries on a slow schedule.
async fn coding_loop(state: AppState) {
    let mut ticker = time::interval(CODING_REFRESH);
    loop {
        ticker.tick().await;
        match state.coding.refresh().await {
            Ok(summaries) => info!(repos = summaries.len(), "repository summaries refreshed"),
            Err(e) => {
                warn!(error = %e, "repository refresh failed");
                time::sleep(FAILURE_PAUSE).await;
            }
        }
    }
}
