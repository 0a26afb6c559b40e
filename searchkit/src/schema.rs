//! Declarative index schemas: field specs, vector profiles, and semantic
//! configuration.
//!
//! [`IndexSchema::builder`] performs pure data assembly with validation and
//! no I/O. The resulting schema is handed to a [`SearchBackend`](crate::SearchBackend)
//! for index creation; whether creation replaces an existing index or errors
//! with [`SearchError::IndexAlreadyExists`](crate::SearchError::IndexAlreadyExists)
//! is a policy each backend documents.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// The data type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Double,
    /// Boolean flag.
    Boolean,
    /// A collection of strings (tags, keywords).
    StringCollection,
    /// A fixed-length numeric embedding used for similarity search.
    Vector,
}

/// A single field declaration with its capabilities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// The field name documents and queries refer to.
    pub name: String,
    /// The field's data type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether this field is the unique document key. Exactly one field per
    /// schema must set this.
    pub key: bool,
    /// Whether the field can appear in filter expressions.
    pub filterable: bool,
    /// Whether results can be sorted by this field.
    pub sortable: bool,
    /// Whether the field can be faceted.
    pub facetable: bool,
    /// Whether the field participates in full-text (lexical) search.
    pub searchable: bool,
    /// Declared embedding length. Vector fields only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// Name of the vector-search profile this field uses. Vector fields only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_profile: Option<String>,
}

impl FieldSpec {
    /// Create a field of the given type with all capabilities disabled.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: false,
            filterable: false,
            sortable: false,
            facetable: false,
            searchable: false,
            dimensions: None,
            vector_profile: None,
        }
    }

    /// Create the key field: a string field marked as the unique document key.
    pub fn key(name: impl Into<String>) -> Self {
        let mut spec = Self::new(name, FieldType::String);
        spec.key = true;
        spec.filterable = true;
        spec
    }

    /// Create a vector field with a declared dimension and profile name.
    pub fn vector(
        name: impl Into<String>,
        dimensions: usize,
        profile: impl Into<String>,
    ) -> Self {
        let mut spec = Self::new(name, FieldType::Vector);
        spec.dimensions = Some(dimensions);
        spec.vector_profile = Some(profile.into());
        spec
    }

    /// Mark the field as usable in filter expressions.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Mark the field as sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Mark the field as facetable.
    pub fn facetable(mut self) -> Self {
        self.facetable = true;
        self
    }

    /// Mark the field as participating in full-text search.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

/// The nearest-neighbour algorithm a vector profile asks the backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VectorAlgorithm {
    /// Hierarchical navigable small-world graph (approximate).
    Hnsw,
    /// Exhaustive K-nearest-neighbour scan (exact).
    ExhaustiveKnn,
}

/// The distance metric used to score vector similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMetric {
    /// Cosine similarity. Higher is closer.
    Cosine,
    /// Dot product. Higher is closer; assumes comparable vector norms.
    DotProduct,
    /// Euclidean distance. Smaller is closer; backends report it negated so
    /// that scores always sort descending.
    Euclidean,
}

/// A named vector-search profile: algorithm plus distance metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorSearchConfig {
    /// The profile name vector fields reference.
    pub profile: String,
    /// The index algorithm the backend should use.
    pub algorithm: VectorAlgorithm,
    /// The similarity metric the backend should score with.
    pub metric: DistanceMetric,
}

impl VectorSearchConfig {
    /// Create a vector-search profile.
    pub fn new(
        profile: impl Into<String>,
        algorithm: VectorAlgorithm,
        metric: DistanceMetric,
    ) -> Self {
        Self { profile: profile.into(), algorithm, metric }
    }
}

/// Field mapping for the backend's semantic re-ranking pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticConfig {
    /// The configuration name queries reference.
    pub name: String,
    /// The field holding the document title.
    pub title_field: String,
    /// Fields holding prose content, in priority order.
    pub content_fields: Vec<String>,
    /// Fields holding keywords or tags.
    pub keyword_fields: Vec<String>,
}

impl SemanticConfig {
    /// Create a semantic configuration.
    pub fn new(
        name: impl Into<String>,
        title_field: impl Into<String>,
        content_fields: impl IntoIterator<Item = impl Into<String>>,
        keyword_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            title_field: title_field.into(),
            content_fields: content_fields.into_iter().map(Into::into).collect(),
            keyword_fields: keyword_fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// A validated, declarative index schema.
///
/// Effectively immutable for the lifetime of the index: build it once with
/// [`IndexSchema::builder`] before any document is ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSchema {
    /// The index name.
    pub name: String,
    /// All field declarations, exactly one of which is the key.
    pub fields: Vec<FieldSpec>,
    /// Vector-search profile, present when any vector field is declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<VectorSearchConfig>,
    /// Optional semantic re-ranking configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticConfig>,
}

impl IndexSchema {
    /// Start building a schema for the named index.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            vector_search: None,
            semantic: None,
        }
    }

    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The schema's key field.
    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key)
    }

    /// The declared dimension of a vector field, if `name` is one.
    pub fn vector_dimensions(&self, name: &str) -> Option<usize> {
        self.field(name)
            .filter(|f| f.field_type == FieldType::Vector)
            .and_then(|f| f.dimensions)
    }

    /// The distance metric vector queries against this schema are scored with.
    pub fn metric(&self) -> DistanceMetric {
        self.vector_search.as_ref().map(|v| v.metric).unwrap_or(DistanceMetric::Cosine)
    }
}

/// Builder for a validated [`IndexSchema`]. Pure data assembly, no network I/O.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    vector_search: Option<VectorSearchConfig>,
    semantic: Option<SemanticConfig>,
}

impl SchemaBuilder {
    /// Add a field declaration.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Add several field declarations.
    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    /// Set the vector-search profile.
    pub fn vector_search(mut self, config: VectorSearchConfig) -> Self {
        self.vector_search = Some(config);
        self
    }

    /// Set the semantic re-ranking configuration.
    pub fn semantic(mut self, config: SemanticConfig) -> Self {
        self.semantic = Some(config);
        self
    }

    /// Build the [`IndexSchema`], validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::SchemaError`] if:
    /// - the index name is empty, or a field name is empty or duplicated
    /// - zero or more than one field is marked as the key
    /// - the key field is not a string field
    /// - a vector field declares a dimension of zero or omits it
    /// - a vector field omits its profile, references an unknown profile, or
    ///   no vector-search configuration is set
    /// - a non-vector field declares a dimension or profile
    /// - the semantic configuration references a field absent from the schema
    pub fn build(self) -> Result<IndexSchema> {
        if self.name.is_empty() {
            return Err(SearchError::SchemaError("index name must not be empty".into()));
        }

        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SearchError::SchemaError("field name must not be empty".into()));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SearchError::SchemaError(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let key_count = self.fields.iter().filter(|f| f.key).count();
        if key_count != 1 {
            return Err(SearchError::SchemaError(format!(
                "exactly one key field is required, found {key_count}"
            )));
        }
        if let Some(key) = self.fields.iter().find(|f| f.key) {
            if key.field_type != FieldType::String {
                return Err(SearchError::SchemaError(format!(
                    "key field '{}' must be a string field",
                    key.name
                )));
            }
        }

        for field in &self.fields {
            match field.field_type {
                FieldType::Vector => {
                    match field.dimensions {
                        Some(d) if d > 0 => {}
                        _ => {
                            return Err(SearchError::SchemaError(format!(
                                "vector field '{}' must declare a dimension greater than zero",
                                field.name
                            )));
                        }
                    }
                    let profile = field.vector_profile.as_deref().ok_or_else(|| {
                        SearchError::SchemaError(format!(
                            "vector field '{}' must reference a vector-search profile",
                            field.name
                        ))
                    })?;
                    let config = self.vector_search.as_ref().ok_or_else(|| {
                        SearchError::SchemaError(
                            "schema declares vector fields but no vector-search configuration"
                                .into(),
                        )
                    })?;
                    if config.profile != profile {
                        return Err(SearchError::SchemaError(format!(
                            "vector field '{}' references unknown profile '{profile}'",
                            field.name
                        )));
                    }
                }
                _ => {
                    if field.dimensions.is_some() || field.vector_profile.is_some() {
                        return Err(SearchError::SchemaError(format!(
                            "non-vector field '{}' must not declare vector settings",
                            field.name
                        )));
                    }
                }
            }
        }

        if let Some(semantic) = &self.semantic {
            let mut referenced: Vec<&str> = vec![semantic.title_field.as_str()];
            referenced.extend(semantic.content_fields.iter().map(String::as_str));
            referenced.extend(semantic.keyword_fields.iter().map(String::as_str));
            for name in referenced {
                if !self.fields.iter().any(|f| f.name == name) {
                    return Err(SearchError::SchemaError(format!(
                        "semantic configuration '{}' references unknown field '{name}'",
                        semantic.name
                    )));
                }
            }
        }

        Ok(IndexSchema {
            name: self.name,
            fields: self.fields,
            vector_search: self.vector_search,
            semantic: self.semantic,
        })
    }
}
