//! Coding panel: repository summaries.
//!
//! Reads are served from memory; the poller (or a manual POST) refreshes
//! them from the live API, since counting commits walks every page.

use axum::extract::State;
use axum::Json;

use crate::server::error::ApiResult;
use crate::server::AppState;
use crate::services::coding::RepoSummary;

/// GET /coding/repos
pub async fn repos(State(state): State<AppState>) -> Json<Vec<RepoSummary>> {
    Json(state.coding.summaries().await)
}

/// POST /coding/repos/set
pub async fn set_repos(State(state): State<AppState>) -> ApiResult<Json<Vec<RepoSummary>>> {
    Ok(Json(state.coding.refresh().await?))
}
