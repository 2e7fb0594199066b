//! Todos panel: OAuth flow and task listing.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::server::error::ApiResult;
use crate::server::AppState;

/// GET /todos/authorize
pub async fn authorize(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.todos.authorize_url())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

/// GET /todos/callback?code=...
///
/// Public by necessity: the provider redirects the browser here without our
/// bearer token. The code itself is single-use and exchanged immediately.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<Value>> {
    state.todos.exchange_code(&query.code).await?;
    Ok(Json(json!({ "status": "authorized" })))
}

/// GET /todos/tasks
pub async fn tasks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(state.todos.tasks().await?))
}
