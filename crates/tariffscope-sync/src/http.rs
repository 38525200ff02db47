//! HTTP client for a remote tariff-data service.
//!
//! Two endpoints:
//! - `GET  {base}/api/schedule/leaves?prefix=8211` returns the leaf entries
//!   under a branch as a JSON array.
//! - `POST {base}/api/audit/analyses` records finished analyses (with their
//!   assumptions) for compliance review.

use async_trait::async_trait;
use serde::Deserialize;
use tariffscope_core::{AmbiguityAnalysis, LeafEntry, canonical_code};
use tariffscope_store::{CandidateSource, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for the schedule and audit endpoints.
pub struct ScheduleClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PushResponse {
    accepted: u64,
}

impl ScheduleClient {
    /// `base_url` like `http://localhost:4000`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (proxies, default headers, timeouts).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn leaves_url(&self, branch_prefix: &str) -> String {
        format!(
            "{}/api/schedule/leaves?prefix={}",
            self.base_url,
            canonical_code(branch_prefix)
        )
    }

    fn audit_url(&self) -> String {
        format!("{}/api/audit/analyses", self.base_url)
    }

    /// Fetch the leaf entries under `branch_prefix`.
    pub async fn fetch_leaves(&self, branch_prefix: &str) -> Result<Vec<LeafEntry>, SyncError> {
        let url = self.leaves_url(branch_prefix);
        info!(url = %url, "fetching leaves from schedule service");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let leaves = parse_leaves(&body)?;
        info!(count = leaves.len(), "fetched leaves");
        Ok(leaves)
    }

    /// Push finished analyses to the audit endpoint.
    ///
    /// Returns the number of analyses accepted by the server.
    pub async fn push_analyses(&self, analyses: &[AmbiguityAnalysis]) -> Result<u64, SyncError> {
        let url = self.audit_url();

        info!(url = %url, count = analyses.len(), "pushing analyses to audit log");
        let resp = self.client.post(&url).json(analyses).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let result: PushResponse = resp.json().await?;
        info!(accepted = result.accepted, "push complete");
        Ok(result.accepted)
    }
}

/// Decode a leaves response, canonicalising codes the service may send dotted.
fn parse_leaves(body: &str) -> Result<Vec<LeafEntry>, SyncError> {
    let mut leaves: Vec<LeafEntry> = serde_json::from_str(body)?;
    for leaf in &mut leaves {
        leaf.code = canonical_code(&leaf.code);
    }
    Ok(leaves)
}

#[async_trait]
impl CandidateSource for ScheduleClient {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        if canonical_code(branch_prefix).is_empty() {
            return Err(StoreError::InvalidBranch(branch_prefix.to_string()));
        }
        self.fetch_leaves(branch_prefix)
            .await
            .map_err(|e| StoreError::Upstream {
                branch: branch_prefix.to_string(),
                message: e.to_string(),
            })
    }
}
