//! The search client: orchestrates schema handoff, ingestion, and queries.
//!
//! [`SearchClient`] composes an [`EmbeddingProvider`], a [`SearchBackend`],
//! and an [`IndexSchema`] behind the reference flow: create index → ingest →
//! query. Construct one via [`SearchClient::builder()`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use searchkit::{ClientConfig, SearchClient};
//!
//! let client = SearchClient::builder()
//!     .schema(schema)
//!     .embedding_provider(Arc::new(embedder))
//!     .backend(Arc::new(backend))
//!     .build()?;
//!
//! client.create_index().await?;
//! client.ingest(documents, &options).await?;
//! client.wait_until_visible(5).await?;
//! let results = client.hybrid_search("descriptionVector", "quiet beach hotel", 3).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::backend::SearchBackend;
use crate::config::ClientConfig;
use crate::document::{Document, IngestOutcome};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, SearchError};
use crate::query::{Filter, Query, SemanticOptions};
use crate::results::{ResultSet, project};
use crate::schema::IndexSchema;

/// Where ingestion finds the text to embed and where the vector lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// The schema vector field to populate.
    pub vector_field: String,
    /// The document field whose text is embedded when the vector is missing.
    pub text_field: String,
}

impl IngestOptions {
    /// Embed `text_field` into `vector_field` for documents missing a vector.
    pub fn new(vector_field: impl Into<String>, text_field: impl Into<String>) -> Self {
        Self { vector_field: vector_field.into(), text_field: text_field.into() }
    }
}

/// The hybrid search orchestration client.
///
/// Every operation is a single awaited network round trip (plus embedding
/// calls during ingestion); there is no background processing and no shared
/// mutable state between operations, so concurrent use from multiple tasks is
/// safe. Failed calls are surfaced, never retried internally.
pub struct SearchClient {
    schema: IndexSchema,
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn SearchBackend>,
    config: ClientConfig,
}

impl SearchClient {
    /// Create a new [`SearchClientBuilder`].
    pub fn builder() -> SearchClientBuilder {
        SearchClientBuilder::default()
    }

    /// The schema this client was built with.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The search backend.
    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Run a network call under the configured deadline.
    async fn with_deadline<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.request_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    error!(operation, ?deadline, "network call exceeded deadline");
                    Err(SearchError::Timeout { operation: operation.to_string() })
                }
            },
            None => call.await,
        }
    }

    /// Hand the schema to the backend for index creation.
    ///
    /// Whether an existing index is replaced or the call fails with
    /// [`SearchError::IndexAlreadyExists`] is the backend's documented policy.
    pub async fn create_index(&self) -> Result<()> {
        self.with_deadline("create_index", self.backend.create_index(&self.schema)).await?;
        info!(index = %self.schema.name, backend = self.backend.name(), "created index");
        Ok(())
    }

    /// Delete the index this client targets.
    pub async fn delete_index(&self) -> Result<()> {
        self.with_deadline("delete_index", self.backend.delete_index(&self.schema.name)).await?;
        info!(index = %self.schema.name, "deleted index");
        Ok(())
    }

    /// Ingest a batch: embed missing vectors, then upload in input order.
    ///
    /// Documents already carrying `options.vector_field` are uploaded as-is;
    /// the rest have `options.text_field` embedded. The whole batch goes to
    /// the backend as one upload. Successful upload does not imply immediate
    /// query visibility — see [`wait_until_visible`](SearchClient::wait_until_visible).
    ///
    /// # Errors
    ///
    /// - [`SearchError::UnknownField`] — `options.vector_field` is not a
    ///   schema vector field
    /// - [`SearchError::InvalidInput`] — a document carries neither the
    ///   vector nor the source text field
    /// - [`SearchError::DimensionMismatch`] — the provider returned a vector
    ///   of the wrong length for the schema
    /// - [`SearchError::PartialFailure`] — the backend reported mixed
    ///   per-document outcomes; inspect the carried statuses rather than
    ///   assuming all-or-nothing
    pub async fn ingest(
        &self,
        documents: Vec<Document>,
        options: &IngestOptions,
    ) -> Result<IngestOutcome> {
        let dimensions = self
            .schema
            .vector_dimensions(&options.vector_field)
            .ok_or_else(|| SearchError::UnknownField(options.vector_field.clone()))?;

        let mut enriched = documents;
        for (position, document) in enriched.iter_mut().enumerate() {
            if document.vectors.contains_key(&options.vector_field) {
                continue;
            }
            let text = document.get_str(&options.text_field).ok_or_else(|| {
                SearchError::InvalidInput(format!(
                    "document at position {position} has neither vector field '{}' nor text field '{}'",
                    options.vector_field, options.text_field
                ))
            })?;
            let vector = self.with_deadline("embed", self.embedder.embed(text)).await?;
            if vector.len() != dimensions {
                return Err(SearchError::DimensionMismatch {
                    field: options.vector_field.clone(),
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            document.vectors.insert(options.vector_field.clone(), vector);
        }

        let statuses = self
            .with_deadline("upload", self.backend.upload(&self.schema.name, &enriched))
            .await?;

        let failed = statuses.iter().filter(|s| !s.succeeded).count();
        if failed > 0 {
            error!(index = %self.schema.name, failed, total = statuses.len(), "batch partially failed");
            return Err(SearchError::PartialFailure { statuses });
        }

        info!(index = %self.schema.name, count = statuses.len(), "ingested batch");
        Ok(IngestOutcome { statuses })
    }

    /// Delete documents by key, surfacing mixed outcomes as
    /// [`SearchError::PartialFailure`].
    pub async fn delete_documents(&self, keys: &[&str]) -> Result<IngestOutcome> {
        let statuses = self
            .with_deadline("delete", self.backend.delete_documents(&self.schema.name, keys))
            .await?;

        let failed = statuses.iter().filter(|s| !s.succeeded).count();
        if failed > 0 {
            error!(index = %self.schema.name, failed, total = statuses.len(), "delete partially failed");
            return Err(SearchError::PartialFailure { statuses });
        }

        info!(index = %self.schema.name, count = statuses.len(), "deleted documents");
        Ok(IngestOutcome { statuses })
    }

    /// Vectorize query text through the embedding provider.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.with_deadline("embed", self.embedder.embed(text)).await
    }

    /// Vector-only search: embed `text` and return its `k` nearest
    /// neighbours in `field`.
    pub async fn vector_search(&self, field: &str, text: &str, k: usize) -> Result<ResultSet> {
        let vector = self.embed_query(text).await?;
        self.execute(Query::vector(field, vector, k)).await
    }

    /// Vector search restricted by a boolean pre-filter. With N documents
    /// matching the filter, at most min(`k`, N) results come back.
    pub async fn filtered_vector_search(
        &self,
        field: &str,
        text: &str,
        k: usize,
        filter: Filter,
    ) -> Result<ResultSet> {
        let vector = self.embed_query(text).await?;
        self.execute(Query::vector(field, vector, k).filter(filter)).await
    }

    /// Hybrid search: `text` is matched lexically and embedded for the
    /// vector clause; the backend fuses both rankings into one list.
    pub async fn hybrid_search(&self, field: &str, text: &str, k: usize) -> Result<ResultSet> {
        let vector = self.embed_query(text).await?;
        self.execute(Query::hybrid(text, field, vector, k)).await
    }

    /// Hybrid search followed by the backend's semantic re-ranking pass.
    pub async fn semantic_hybrid_search(
        &self,
        field: &str,
        text: &str,
        k: usize,
        options: SemanticOptions,
    ) -> Result<ResultSet> {
        let vector = self.embed_query(text).await?;
        self.execute(Query::hybrid(text, field, vector, k).semantic(options)).await
    }

    /// Execute a query: validate client-side, search, project.
    ///
    /// The single convergence point for every query shape. Validation runs
    /// before any network call; backend failures surface as
    /// [`SearchError::QueryFailed`] without internal retry.
    pub async fn execute(&self, query: Query) -> Result<ResultSet> {
        query.validate(&self.schema)?;
        debug!(
            index = %self.schema.name,
            text = query.text.is_some(),
            vector = query.vector.is_some(),
            filtered = query.filter.is_some(),
            semantic = query.semantic.is_some(),
            "executing query"
        );
        let raw =
            self.with_deadline("search", self.backend.search(&self.schema.name, &query)).await?;
        Ok(project(raw, &self.schema))
    }

    /// Poll the backend until at least `expected` documents are visible.
    ///
    /// Index writes are eventually consistent; this replaces fixed sleeps
    /// with a bounded poll against the backend's document count, doubling
    /// the delay after every attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Timeout`] when the count has not been reached
    /// after the configured number of attempts.
    pub async fn wait_until_visible(&self, expected: u64) -> Result<()> {
        let mut interval = self.config.poll_interval;
        for attempt in 1..=self.config.poll_max_attempts {
            let count = self
                .with_deadline("document_count", self.backend.document_count(&self.schema.name))
                .await?;
            if count >= expected {
                debug!(attempt, count, "index caught up");
                return Ok(());
            }
            debug!(attempt, count, expected, "index not yet caught up, backing off");
            if attempt < self.config.poll_max_attempts {
                tokio::time::sleep(interval).await;
                interval *= 2;
            }
        }
        Err(SearchError::Timeout { operation: "index visibility poll".to_string() })
    }
}

/// Builder for constructing a [`SearchClient`].
///
/// `schema`, `embedding_provider`, and `backend` are required; `config`
/// defaults to [`ClientConfig::default()`].
#[derive(Default)]
pub struct SearchClientBuilder {
    schema: Option<IndexSchema>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    backend: Option<Arc<dyn SearchBackend>>,
    config: Option<ClientConfig>,
}

impl SearchClientBuilder {
    /// Set the index schema.
    pub fn schema(mut self, schema: IndexSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Set the search backend.
    pub fn backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`SearchClient`], validating that all required parts are set.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<SearchClient> {
        let schema = self
            .schema
            .ok_or_else(|| SearchError::ConfigError("schema is required".to_string()))?;
        let embedder = self.embedder.ok_or_else(|| {
            SearchError::ConfigError("embedding_provider is required".to_string())
        })?;
        let backend = self
            .backend
            .ok_or_else(|| SearchError::ConfigError("backend is required".to_string()))?;

        Ok(SearchClient {
            schema,
            embedder,
            backend,
            config: self.config.unwrap_or_default(),
        })
    }
}
