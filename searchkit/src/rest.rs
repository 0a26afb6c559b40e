//! REST search backend for hosted search services.
//!
//! This module is only available when the `rest` feature is enabled.
//!
//! [`RestBackend`] speaks a small JSON protocol over the generic hosted
//! search interface: index management, batch document upload with
//! per-document statuses, query execution, and a document count used as the
//! visibility readiness signal. It does not reproduce any specific vendor's
//! wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::backend::SearchBackend;
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::results::RawResults;
use crate::schema::IndexSchema;

/// A [`SearchBackend`] over a hosted search service's REST API.
///
/// Authenticates with an `api-key` header. Creation policy:
/// **create-or-update** — the index definition is `PUT`, so an existing index
/// of the same name is updated in place; a `409 Conflict` from a service that
/// refuses replacement maps to [`SearchError::IndexAlreadyExists`].
///
/// The underlying `reqwest` client pools connections and is safe for
/// concurrent use; no client-side locking is involved.
pub struct RestBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestBackend {
    /// Create a new backend for the service at `endpoint`.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        if endpoint.is_empty() {
            return Err(SearchError::ConfigError("endpoint must not be empty".into()));
        }
        if api_key.is_empty() {
            return Err(SearchError::ConfigError("api_key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a new backend from the `SEARCH_ENDPOINT` and `SEARCH_API_KEY`
    /// environment variables.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SEARCH_ENDPOINT").map_err(|_| {
            SearchError::ConfigError("SEARCH_ENDPOINT environment variable not set".into())
        })?;
        let api_key = std::env::var("SEARCH_API_KEY").map_err(|_| {
            SearchError::ConfigError("SEARCH_API_KEY environment variable not set".into())
        })?;
        Self::new(endpoint, api_key)
    }

    /// Set a transport-level deadline on every request.
    ///
    /// On expiry the call fails with [`SearchError::Timeout`] rather than
    /// being retried.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            SearchError::ConfigError(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(self)
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/indexes/{index}", self.endpoint)
    }

    fn transport_err(operation: &str, e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout { operation: operation.to_string() }
        } else {
            SearchError::QueryFailed {
                backend: "rest".to_string(),
                message: format!("{operation} request failed: {e}"),
            }
        }
    }

    /// Map a non-success response to an error carrying the backend status.
    async fn status_err(operation: &str, response: reqwest::Response) -> SearchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(backend = "rest", operation, %status, "API error");
        SearchError::QueryFailed {
            backend: "rest".to_string(),
            message: format!("{operation} returned {status}: {body}"),
        }
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct UploadRequest<'a> {
    documents: &'a [Document],
}

#[derive(Deserialize)]
struct UploadResponse {
    statuses: Vec<DocumentStatus>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    keys: &'a [&'a str],
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[async_trait]
impl SearchBackend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        let response = self
            .client
            .put(self.index_url(&schema.name))
            .header("api-key", &self.api_key)
            .json(schema)
            .send()
            .await
            .map_err(|e| Self::transport_err("create_index", e))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(SearchError::IndexAlreadyExists(schema.name.clone()));
        }
        if !response.status().is_success() {
            return Err(Self::status_err("create_index", response).await);
        }

        debug!(index = %schema.name, "created index via REST");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.index_url(name))
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::transport_err("delete_index", e))?;

        // Deleting a missing index is a no-op.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND
        {
            return Err(Self::status_err("delete_index", response).await);
        }

        debug!(index = name, "deleted index via REST");
        Ok(())
    }

    async fn upload(&self, index: &str, documents: &[Document]) -> Result<Vec<DocumentStatus>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/docs/batch", self.index_url(index)))
            .header("api-key", &self.api_key)
            .json(&UploadRequest { documents })
            .send()
            .await
            .map_err(|e| Self::transport_err("upload", e))?;

        if !response.status().is_success() {
            return Err(Self::status_err("upload", response).await);
        }

        let upload: UploadResponse = response.json().await.map_err(|e| {
            SearchError::QueryFailed {
                backend: "rest".to_string(),
                message: format!("failed to parse upload response: {e}"),
            }
        })?;

        debug!(index, count = upload.statuses.len(), "uploaded batch via REST");
        Ok(upload.statuses)
    }

    async fn delete_documents(
        &self,
        index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/docs/delete", self.index_url(index)))
            .header("api-key", &self.api_key)
            .json(&DeleteRequest { keys })
            .send()
            .await
            .map_err(|e| Self::transport_err("delete_documents", e))?;

        if !response.status().is_success() {
            return Err(Self::status_err("delete_documents", response).await);
        }

        let deleted: UploadResponse = response.json().await.map_err(|e| {
            SearchError::QueryFailed {
                backend: "rest".to_string(),
                message: format!("failed to parse delete response: {e}"),
            }
        })?;

        debug!(index, count = deleted.statuses.len(), "deleted documents via REST");
        Ok(deleted.statuses)
    }

    async fn search(&self, index: &str, query: &Query) -> Result<RawResults> {
        let response = self
            .client
            .post(format!("{}/search", self.index_url(index)))
            .header("api-key", &self.api_key)
            .json(query)
            .send()
            .await
            .map_err(|e| Self::transport_err("search", e))?;

        if !response.status().is_success() {
            return Err(Self::status_err("search", response).await);
        }

        let raw: RawResults = response.json().await.map_err(|e| SearchError::QueryFailed {
            backend: "rest".to_string(),
            message: format!("failed to parse search response: {e}"),
        })?;

        debug!(index, records = raw.records.len(), "search completed via REST");
        Ok(raw)
    }

    async fn document_count(&self, index: &str) -> Result<u64> {
        let response = self
            .client
            .get(format!("{}/docs/count", self.index_url(index)))
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::transport_err("document_count", e))?;

        if !response.status().is_success() {
            return Err(Self::status_err("document_count", response).await);
        }

        let count: CountResponse =
            response.json().await.map_err(|e| SearchError::QueryFailed {
                backend: "rest".to_string(),
                message: format!("failed to parse count response: {e}"),
            })?;

        Ok(count.count)
    }
}
