//! HTTP surface.
//!
//! One [`axum::Router`] over a shared [`AppContext`]. Everything except
//! `/health`, `/otp/{code}` and the OAuth callback sits behind the bearer
//! token middleware.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::auth::Authenticator;
use crate::config::Settings;
use crate::db::SymbolStore;
use crate::error::{Error, Result};
use crate::exchange::{ExchangeRegistry, KucoinClient, MexcClient};
use crate::klines::KlineCache;
use crate::services::{CodingClient, FitnessStore, RankClient, SheetsClient, TodosClient};
use crate::store::LocalDirStore;
use crate::trades::TradeStore;

use self::error::ApiError;

/// Everything the routes and the poller share: clients, stores and settings.
pub struct AppContext {
    pub settings: Settings,
    pub exchanges: ExchangeRegistry,
    pub cache: KlineCache<LocalDirStore>,
    pub symbols: SymbolStore,
    pub trades: TradeStore,
    pub sheets: SheetsClient,
    pub rank: RankClient,
    pub todos: TodosClient,
    pub coding: CodingClient,
    pub fitness: FitnessStore,
    pub auth: Authenticator,
}

impl AppContext {
    /// Wire up every client and store from loaded settings.
    pub async fn from_settings(settings: Settings) -> Result<Self> {
        let mut exchanges = ExchangeRegistry::new();
        exchanges.register(Arc::new(KucoinClient::new(settings.kucoin.clone())?));
        exchanges.register(Arc::new(MexcClient::new(settings.mexc.clone())?));

        Ok(Self {
            exchanges,
            cache: KlineCache::new(LocalDirStore::new(&settings.cache_dir)?),
            symbols: SymbolStore::open(&settings.database_path).await?,
            trades: TradeStore::new(&settings.trades_dir),
            sheets: SheetsClient::new(&settings.sheets_base_url, &settings.sheets_api_key)?,
            rank: RankClient::new(&settings.rank_base_url, &settings.rank_api_key)?,
            todos: TodosClient::new(
                &settings.todos_base_url,
                &settings.todos_auth_base_url,
                &settings.todos_client_id,
                &settings.todos_client_secret,
                &settings.todos_redirect_uri,
            )?,
            coding: CodingClient::new(&settings.coding_base_url, &settings.coding_token)?,
            fitness: FitnessStore::new(&settings.fitness_export_dir),
            auth: Authenticator::new(&settings.otp_secret, &settings.token_secret)?,
            settings,
        })
    }
}

pub type AppState = Arc<AppContext>;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/authenticated", get(routes::authenticated))
        .route("/crypto/all", get(routes::crypto::all_holdings))
        .route("/crypto/single/{rank_id}", get(routes::crypto::single_holding))
        .route("/crypto/all_symbols", get(routes::crypto::all_symbols))
        .route("/crypto/account/{exchange}", get(routes::crypto::account))
        .route("/crypto/orders/{exchange}", get(routes::crypto::orders))
        .route(
            "/crypto/klines/{exchange}/{symbol}",
            get(routes::crypto::klines),
        )
        .route("/crypto/trades/{exchange}", get(routes::crypto::trades))
        .route("/finances/current", get(routes::finances::current))
        .route("/finances/subscriptions", get(routes::finances::subscriptions))
        .route("/fitness/activities", get(routes::fitness::activities))
        .route("/coding/repos", get(routes::coding::repos))
        .route("/coding/repos/set", post(routes::coding::set_repos))
        .route("/todos/authorize", get(routes::todos::authorize))
        .route("/todos/tasks", get(routes::todos::tasks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_token,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/otp/{code}", get(routes::login))
        .route("/todos/callback", get(routes::todos::callback))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Reject requests without a valid bearer token.
async fn require_bearer_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    token_from_header(&state.auth, header)?;
    Ok(next.run(request).await)
}

/// Verify a bearer token taken from an `Authorization` header value.
pub fn token_from_header(auth: &Authenticator, header: Option<&str>) -> Result<()> {
    let token = header
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::AuthenticationFailed("missing bearer token".into()))?;
    auth.verify_token(token)?;
    Ok(())
}
