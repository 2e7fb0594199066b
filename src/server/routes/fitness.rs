//! Fitness panel: activities from the watch-export directory.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;

use crate::server::error::ApiResult;
use crate::server::AppState;

/// GET /fitness/activities
pub async fn activities(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HashMap<String, String>>>> {
    Ok(Json(state.fitness.activities()?))
}
