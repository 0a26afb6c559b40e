//! Error types for the `searchkit` crate.

use thiserror::Error;

use crate::document::DocumentStatus;

/// Errors that can occur in search client operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The caller supplied a malformed request (empty text, zero K, a document
    /// with neither a vector nor source text). Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A vector's length disagrees with the dimension declared in the schema.
    #[error("Dimension mismatch on field '{field}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The vector field whose declared dimension was violated.
        field: String,
        /// The dimension declared in the schema or provider configuration.
        expected: usize,
        /// The length actually supplied or returned.
        actual: usize,
    },

    /// The embedding provider could not be reached or refused the request.
    #[error("Embedding provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The schema failed validation before any backend call was made.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A request referenced a field that is not declared in the schema.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Semantic directives were issued against a schema with no matching
    /// semantic configuration.
    #[error("Semantic configuration not supported: {0}")]
    SemanticConfigNotSupported(String),

    /// The search backend rejected or failed a request.
    #[error("Query failed ({backend}): {message}")]
    QueryFailed {
        /// The backend that produced the error.
        backend: String,
        /// The backend-reported status or failure description.
        message: String,
    },

    /// A network call did not complete within the configured deadline.
    #[error("Timed out during {operation}")]
    Timeout {
        /// The operation that exceeded its deadline.
        operation: String,
    },

    /// The backend reported mixed per-document outcomes for an upload batch.
    ///
    /// Carries every per-document status so callers can retry just the
    /// failed subset.
    #[error("Partial ingestion failure: {} of {} documents failed",
        .statuses.iter().filter(|s| !s.succeeded).count(),
        .statuses.len())]
    PartialFailure {
        /// Per-document outcomes in upload order.
        statuses: Vec<DocumentStatus>,
    },

    /// Index creation conflicted with an existing index on a backend whose
    /// creation policy is erroring rather than replacing.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// A client or builder configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for search client operations.
pub type Result<T> = std::result::Result<T, SearchError>;
