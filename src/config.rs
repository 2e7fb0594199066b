//! Environment-provided settings: API credentials, service endpoints and
//! local paths. Loaded once at startup; missing required variables abort
//! with a [`Error::MissingConfig`](crate::error::Error::MissingConfig).

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default lifetime of an issued bearer token, in minutes.
pub const TOKEN_LIFETIME_MINUTES: i64 = 35;

/// Uniform HTTP timeout for upstream calls, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Credentials and endpoint for a single exchange account.
///
/// Created once at startup from the environment; immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct ExchangeCredentials {
    pub api_key: String,
    pub api_secret: String,
    /// Only KuCoin-style APIs require a passphrase.
    pub passphrase: Option<String>,
    pub base_url: String,
}

/// All runtime settings for the dashboard backend.
#[derive(Debug, Clone)]
pub struct Settings {
    pub kucoin: ExchangeCredentials,
    pub mexc: ExchangeCredentials,

    pub rank_base_url: String,
    pub rank_api_key: String,

    pub sheets_base_url: String,
    pub sheets_api_key: String,
    pub crypto_spreadsheet_id: String,
    pub finances_spreadsheet_id: String,

    pub todos_base_url: String,
    pub todos_auth_base_url: String,
    pub todos_client_id: String,
    pub todos_client_secret: String,
    pub todos_redirect_uri: String,

    pub coding_base_url: String,
    pub coding_token: String,

    pub fitness_export_dir: PathBuf,
    pub trades_dir: PathBuf,

    pub otp_secret: String,
    pub token_secret: String,

    pub bind_addr: String,
    pub database_path: PathBuf,
    pub cache_dir: PathBuf,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Endpoints and paths have sensible defaults; credentials do not.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            kucoin: ExchangeCredentials {
                api_key: required("KUCOIN_API_KEY")?,
                api_secret: required("KUCOIN_API_SECRET")?,
                passphrase: Some(required("KUCOIN_API_PASSPHRASE")?),
                base_url: optional("KUCOIN_BASE_URL", "https://api.kucoin.com"),
            },
            mexc: ExchangeCredentials {
                api_key: required("MEXC_API_KEY")?,
                api_secret: required("MEXC_API_SECRET")?,
                passphrase: None,
                base_url: optional("MEXC_BASE_URL", "https://api.mexc.com"),
            },
            rank_base_url: optional("RANK_BASE_URL", "https://api.cryptorank.io/v1"),
            rank_api_key: required("RANK_API_KEY")?,
            sheets_base_url: optional(
                "SHEETS_BASE_URL",
                "https://sheets.googleapis.com/v4/spreadsheets",
            ),
            sheets_api_key: required("SHEETS_API_KEY")?,
            crypto_spreadsheet_id: required("CRYPTO_SPREADSHEET_ID")?,
            finances_spreadsheet_id: required("FINANCES_SPREADSHEET_ID")?,
            todos_base_url: optional("TODOS_BASE_URL", "https://api.ticktick.com"),
            todos_auth_base_url: optional("TODOS_AUTH_BASE_URL", "https://ticktick.com"),
            todos_client_id: required("TODOS_CLIENT_ID")?,
            todos_client_secret: required("TODOS_CLIENT_SECRET")?,
            todos_redirect_uri: optional(
                "TODOS_REDIRECT_URI",
                "http://localhost:9090/todos/callback",
            ),
            coding_base_url: optional("CODING_BASE_URL", "https://api.github.com"),
            coding_token: required("CODING_TOKEN")?,
            fitness_export_dir: PathBuf::from(optional("FITNESS_EXPORT_DIR", "fitness-export")),
            trades_dir: PathBuf::from(optional("TRADES_DIR", "trade-exports")),
            otp_secret: required("OTP_SECRET")?,
            token_secret: required("TOKEN_SECRET")?,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:9090"),
            database_path: PathBuf::from(optional("DATABASE_PATH", "homeboard.db")),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_cache_dir()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::MissingConfig(name.to_string()))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Platform-appropriate default directory for cached kline files.
pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("homeboard")
    } else {
        PathBuf::from(".homeboard-cache")
    }
}
