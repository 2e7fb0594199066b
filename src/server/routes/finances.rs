//! Finances panel: monthly budget and recurring subscriptions, both read
//! straight from the finances spreadsheet.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;

use crate::server::error::ApiResult;
use crate::server::AppState;

const CURRENT_RANGE: &str = "current";
const SUBSCRIPTIONS_RANGE: &str = "subscriptions";

/// GET /finances/current
pub async fn current(State(state): State<AppState>) -> ApiResult<Json<Vec<HashMap<String, String>>>> {
    Ok(Json(
        state
            .sheets
            .records(&state.settings.finances_spreadsheet_id, CURRENT_RANGE)
            .await?,
    ))
}

/// GET /finances/subscriptions
pub async fn subscriptions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HashMap<String, String>>>> {
    Ok(Json(
        state
            .sheets
            .records(&state.settings.finances_spreadsheet_id, SUBSCRIPTIONS_RANGE)
            .await?,
    ))
}
