//! Remote document-store client.
//!
//! Branch data lives in a realtime-database style document store exposed
//! over HTTPS: one JSON document per branch and collection, fetched as
//! `{base}/{branch}/order_history.json`. Snapshots arrive either as an
//! object keyed by push id or as a bare array; both shapes flatten to a
//! record list here. The client never looks inside a record; field
//! resolution belongs to the normalizer.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Default timeout for document fetches (30 seconds).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch failure, split by what the operator can do about it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot reach the document store at {url}")]
    Connect { url: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("document store returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("malformed document body from {url}: {reason}")]
    MalformedBody { url: String, reason: String },
    #[error("network error communicating with {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to create HTTP client: {reason}")]
    Client { reason: String },
}

fn transport_error(url: &str, err: &reqwest::Error) -> SourceError {
    if err.is_connect() {
        SourceError::Connect {
            url: url.to_string(),
        }
    } else if err.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else {
        SourceError::Transport {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the document-store base URL:
/// - strip trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_store_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one document store, reusable across branches.
pub struct StoreClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl StoreClient {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Client {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: normalize_store_url(base_url),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    /// Fetch the raw order-history snapshot for a branch.
    pub async fn fetch_orders(&self, branch: &str) -> Result<Vec<Value>, SourceError> {
        let document = self.fetch_document(branch, "order_history").await?;
        let records = record_list(document);
        info!(
            branch = %branch,
            records = records.len(),
            "Fetched order history snapshot"
        );
        Ok(records)
    }

    /// Fetch the menu configuration for a branch. A branch without a menu
    /// document yields `Null`; the category lookup treats that as empty.
    pub async fn fetch_menu(&self, branch: &str) -> Result<Value, SourceError> {
        let menu = self.fetch_document(branch, "menu").await?;
        debug!(branch = %branch, present = !menu.is_null(), "Fetched menu configuration");
        Ok(menu)
    }

    async fn fetch_document(&self, branch: &str, document: &str) -> Result<Value, SourceError> {
        let url = self.document_url(branch, document);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| transport_error(&url, &e))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| SourceError::MalformedBody {
            url,
            reason: e.to_string(),
        })
    }

    fn document_url(&self, branch: &str, document: &str) -> String {
        match &self.auth_token {
            Some(token) => format!("{}/{branch}/{document}.json?auth={token}", self.base_url),
            None => format!("{}/{branch}/{document}.json", self.base_url),
        }
    }
}

/// Flatten a fetched snapshot into a record list: push-id keyed objects
/// yield their values, arrays pass through, anything else is empty.
pub fn record_list(document: Value) -> Vec<Value> {
    match document {
        Value::Array(records) => records,
        Value::Object(map) => map.into_values().collect(),
        _ => Vec::new(),
    }
}
