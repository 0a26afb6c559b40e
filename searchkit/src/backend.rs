//! Search backend trait: the capability handle injected into the client.

use async_trait::async_trait;

use crate::document::{Document, DocumentStatus};
use crate::error::Result;
use crate::query::Query;
use crate::results::RawResults;
use crate::schema::IndexSchema;

/// A hosted (or in-process) search service behind a unified async interface.
///
/// Implementations are opaque capability handles: connection pooling,
/// retries at the transport layer, and index data structures all live behind
/// this trait. Handles must be safe for concurrent use; the client wraps them
/// in `Arc` and never locks around calls.
///
/// Contract notes for implementors:
///
/// - `create_index` is idempotent-or-erroring. Each implementation documents
///   whether an existing index of the same name is replaced or the call fails
///   with [`SearchError::IndexAlreadyExists`](crate::SearchError::IndexAlreadyExists).
/// - `upload` preserves the input order of the batch and returns one status
///   per document even when outcomes are mixed.
/// - `search` applies any filter as a **pre-filter**: the candidate set is
///   restricted before similarity scoring. Returned record order is
///   backend-owned and must be preserved by callers.
/// - Writes are eventually consistent: a successful `upload` does not
///   guarantee immediate visibility to `search`. `document_count` is the
///   readiness signal callers poll instead of sleeping.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// A short backend name used in error reporting and logs.
    fn name(&self) -> &str;

    /// Create the index described by `schema`.
    async fn create_index(&self, schema: &IndexSchema) -> Result<()>;

    /// Delete the named index and all its documents. Idempotent: deleting a
    /// missing index succeeds.
    async fn delete_index(&self, name: &str) -> Result<()>;

    /// Upload a batch of documents, returning per-document statuses in input
    /// order. Re-uploading an existing key upserts.
    async fn upload(&self, index: &str, documents: &[Document]) -> Result<Vec<DocumentStatus>>;

    /// Delete documents by key, returning per-document statuses in input
    /// order. Deleting a missing key succeeds.
    async fn delete_documents(
        &self,
        index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>>;

    /// Execute a query and return ranked raw records.
    async fn search(&self, index: &str, query: &Query) -> Result<RawResults>;

    /// The number of documents currently visible to queries.
    async fn document_count(&self, index: &str) -> Result<u64>;
}
