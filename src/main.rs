use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use homeboard::{poller, router, AppContext, Settings};

#[tokio::main]
async fn main() -> homeboard::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();
    let state = Arc::new(AppContext::from_settings(settings).await?);

    poller::spawn(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "dashboard backend listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
