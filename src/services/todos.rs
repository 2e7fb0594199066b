//! Task-list service client (OAuth authorization-code flow).
//!
//! The service requires a user-granted access token: `/todos/authorize`
//! redirects the browser to the consent page, the provider calls back with a
//! code, and the code is exchanged for a token kept in memory for the life
//! of the process.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};

pub struct TodosClient {
    base_url: String,
    auth_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
    access_token: RwLock<Option<String>>,
}

impl TodosClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            auth_base_url: auth_base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            http,
            access_token: RwLock::new(None),
        })
    }

    /// Consent-page URL to redirect the browser to.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&scope=tasks:read&response_type=code&redirect_uri={}",
            self.auth_base_url, self.client_id, self.redirect_uri
        )
    }

    /// Exchange the callback code for an access token and keep it.
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/oauth/token", self.auth_base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "token exchange returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UpstreamUnavailable("token exchange missing access_token".into()))?
            .to_string();
        *self.access_token.write().await = Some(token);
        info!("task-list access token stored");
        Ok(())
    }

    /// Current open tasks. Fails with `AuthenticationFailed` until the OAuth
    /// flow has been completed once.
    pub async fn tasks(&self) -> Result<Value> {
        let token = self
            .access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::AuthenticationFailed("task list not authorized yet".into()))?;
        let resp = self
            .http
            .get(format!("{}/open/v1/project/inbox/data", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "task request returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }
}
