//! Route handlers, grouped by dashboard panel.

pub mod coding;
pub mod crypto;
pub mod finances;
pub mod fitness;
pub mod todos;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Error;
use crate::server::error::ApiResult;
use crate::server::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Exchange a one-time code for a bearer token.
pub async fn login(State(state): State<AppState>, Path(code): Path<String>) -> ApiResult<Json<Value>> {
    if !state.auth.verify_code(&code)? {
        return Err(Error::AuthenticationFailed("wrong one-time code".into()).into());
    }
    let token = state.auth.issue_token()?;
    info!("login succeeded, token issued");
    Ok(Json(json!({ "access_token": token })))
}

/// Token check for the front end: reachable only with a valid bearer token.
pub async fn authenticated() -> Json<Value> {
    Json(json!({ "authenticated": true }))
}
