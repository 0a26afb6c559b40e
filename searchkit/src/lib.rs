//! Hybrid search orchestration for hosted search and embeddings backends.
//!
//! `searchkit` is a thin client that composes two external services — an
//! embeddings API and a vector-search service — into one ingest-and-query
//! workflow. It owns no index data structures and no ranking algorithm:
//! every non-trivial operation is delegated through two injected capability
//! handles, [`EmbeddingProvider`] and [`SearchBackend`]. The crate's own
//! logic is request assembly, client-side validation, a fixed call sequence,
//! and result projection.
//!
//! # Workflow
//!
//! 1. Build an [`IndexSchema`] (fields, vector profile, optional semantic
//!    configuration) and hand it to the backend via
//!    [`SearchClient::create_index`].
//! 2. [`Ingest`](SearchClient::ingest) documents; those without a vector get
//!    one from the embedding provider.
//! 3. [`Wait for visibility`](SearchClient::wait_until_visible) — writes are
//!    eventually consistent on hosted backends.
//! 4. Query in one of four shapes: vector-only, vector + filter, hybrid
//!    keyword + vector, or hybrid + semantic re-ranking. All converge on
//!    [`SearchClient::execute`], which validates before any network call and
//!    projects raw records into a typed [`ResultSet`].
//!
//! # Backends
//!
//! - [`InMemoryBackend`] — zero-dependency in-process backend for
//!   development, demos, and tests.
//! - `RestBackend` (feature `rest`) — a hosted search service over HTTP.
//! - `OpenAiEmbeddingProvider` (feature `openai`) — OpenAI embeddings API.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use searchkit::{
//!     DistanceMetric, FieldSpec, FieldType, IndexSchema, InMemoryBackend, IngestOptions,
//!     SearchClient, VectorAlgorithm, VectorSearchConfig,
//! };
//!
//! let schema = IndexSchema::builder("hotels")
//!     .field(FieldSpec::key("hotelId"))
//!     .field(FieldSpec::new("description", FieldType::String).searchable())
//!     .field(FieldSpec::vector("descriptionVector", 1536, "hnsw-cosine"))
//!     .vector_search(VectorSearchConfig::new(
//!         "hnsw-cosine",
//!         VectorAlgorithm::Hnsw,
//!         DistanceMetric::Cosine,
//!     ))
//!     .build()?;
//!
//! let client = SearchClient::builder()
//!     .schema(schema)
//!     .embedding_provider(Arc::new(embedder))
//!     .backend(Arc::new(InMemoryBackend::new()))
//!     .build()?;
//!
//! client.create_index().await?;
//! client.ingest(documents, &IngestOptions::new("descriptionVector", "description")).await?;
//! client.wait_until_visible(5).await?;
//! let results = client.hybrid_search("descriptionVector", "quiet beach hotel", 3).await?;
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod query;
pub mod results;
pub mod schema;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "rest")]
pub mod rest;

pub use backend::SearchBackend;
pub use client::{IngestOptions, SearchClient, SearchClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use document::{Document, DocumentStatus, IngestOutcome};
pub use embedding::EmbeddingProvider;
pub use error::{Result, SearchError};
pub use inmemory::InMemoryBackend;
pub use query::{Filter, Query, SemanticOptions, VectorClause};
pub use results::{Answer, Caption, RawRecord, RawResults, ResultSet, SearchHit, project};
pub use schema::{
    DistanceMetric, FieldSpec, FieldType, IndexSchema, SchemaBuilder, SemanticConfig,
    VectorAlgorithm, VectorSearchConfig,
};

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddingProvider;

#[cfg(feature = "rest")]
pub use rest::RestBackend;
