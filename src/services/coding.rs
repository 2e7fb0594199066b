//! Code-hosting service client.
//!
//! Summarizes the authenticated user's own repositories with their commit
//! history. Commits come from walking the commit list pages (30 per page),
//! so the summary is refreshed on a slow schedule and served from memory in
//! between.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};

const COMMITS_PER_PAGE: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub author: String,
    pub date: String,
    pub message: String,
}

/// One repository with its commit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub commits: Vec<CommitInfo>,
}

pub struct CodingClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    summaries: RwLock<Vec<RepoSummary>>,
}

impl CodingClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
            summaries: RwLock::new(Vec::new()),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("User-Agent", "homeboard")
            .query(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "{path} returned {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    /// Repositories the user owns, with the fields the summary carries.
    async fn owned_repos(&self) -> Result<Vec<(String, String, RepoSummary)>> {
        let body = self
            .get_json("/user/repos", &[("affiliation", "owner".to_string())])
            .await?;
        let rows = body
            .as_array()
            .ok_or_else(|| Error::UpstreamUnavailable("repo list is not an array".into()))?;
        Ok(rows.iter().filter_map(parse_repo).collect())
    }

    /// All commits for a repository, 30 per page until a short page.
    async fn commits(&self, owner: &str, name: &str) -> Result<Vec<CommitInfo>> {
        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let body = self
                .get_json(
                    &format!("/repos/{owner}/{name}/commits"),
                    &[
                        ("per_page", COMMITS_PER_PAGE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let rows = body.as_array().cloned().unwrap_or_default();
            let page_len = rows.len();
            commits.extend(rows.iter().filter_map(parse_commit));
            if page_len < COMMITS_PER_PAGE {
                return Ok(commits);
            }
            page += 1;
        }
    }

    /// Rebuild the summary from the live API and store it.
    pub async fn refresh(&self) -> Result<Vec<RepoSummary>> {
        let mut summaries = Vec::new();
        for (owner, name, mut summary) in self.owned_repos().await? {
            summary.commits = self.commits(&owner, &name).await?;
            debug!(repo = name, commits = summary.commits.len(), "summarized repository");
            summaries.push(summary);
        }
        *self.summaries.write().await = summaries.clone();
        Ok(summaries)
    }

    /// Last stored summary; empty until the first refresh.
    pub async fn summaries(&self) -> Vec<RepoSummary> {
        self.summaries.read().await.clone()
    }
}

fn parse_repo(repo: &Value) -> Option<(String, String, RepoSummary)> {
    let owner = repo.get("owner")?.get("login")?.as_str()?.to_string();
    let name = repo.get("name")?.as_str()?.to_string();
    let summary = RepoSummary {
        name: name.clone(),
        created_at: repo.get("created_at")?.as_str()?.to_string(),
        description: repo
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        language: repo
            .get("language")
            .and_then(Value::as_str)
            .map(str::to_string),
        commits: Vec::new(),
    };
    Some((owner, name, summary))
}

fn parse_commit(commit: &Value) -> Option<CommitInfo> {
    let inner = commit.get("commit")?;
    let author = inner.get("author")?;
    Some(CommitInfo {
        author: author.get("name")?.as_str()?.to_string(),
        date: author.get("date")?.as_str()?.to_string(),
        message: inner.get("message")?.as_str()?.to_string(),
    })
}
