//! Data types for documents and per-document ingestion outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SearchError};
use crate::schema::IndexSchema;

/// A record to be indexed: scalar/text attributes plus zero or more
/// embedding vectors.
///
/// Documents are created client-side before upload and are immutable once
/// submitted; re-uploading with the same key supersedes the earlier version
/// (upsert semantics owned by the backend). Every vector must match the
/// dimension the schema declares for its field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Scalar and text attributes, keyed by schema field name.
    pub fields: BTreeMap<String, Value>,
    /// Embedding vectors, keyed by schema field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vectors: BTreeMap<String, Vec<f32>>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar or text attribute.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set an embedding vector.
    pub fn vector(mut self, name: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(name.into(), vector);
        self
    }

    /// Look up an attribute value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a text attribute by field name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Extract this document's key using the schema's key field.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidInput`] if the key field is missing from
    /// the document or is not a string, or [`SearchError::SchemaError`] if the
    /// schema has no key field.
    pub fn key<'a>(&'a self, schema: &IndexSchema) -> Result<&'a str> {
        let key_field = schema
            .key_field()
            .ok_or_else(|| SearchError::SchemaError("schema has no key field".into()))?;
        self.get_str(&key_field.name).ok_or_else(|| {
            SearchError::InvalidInput(format!(
                "document is missing string key field '{}'",
                key_field.name
            ))
        })
    }
}

/// The outcome the backend reported for one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentStatus {
    /// The document key this status refers to.
    pub key: String,
    /// Whether the backend accepted the document.
    pub succeeded: bool,
    /// Backend-provided failure detail, when not accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DocumentStatus {
    /// A success status for the given key.
    pub fn ok(key: impl Into<String>) -> Self {
        Self { key: key.into(), succeeded: true, message: None }
    }

    /// A failure status for the given key with a reason.
    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self { key: key.into(), succeeded: false, message: Some(message.into()) }
    }
}

/// Per-document statuses for a fully successful upload batch.
///
/// Mixed outcomes never produce this type; they surface as
/// [`SearchError::PartialFailure`] instead.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Per-document outcomes in upload order, all succeeded.
    pub statuses: Vec<DocumentStatus>,
}

impl IngestOutcome {
    /// The number of documents accepted by the backend.
    pub fn count(&self) -> usize {
        self.statuses.len()
    }
}
