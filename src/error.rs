#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
