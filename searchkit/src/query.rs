//! Query construction and validation: shapes, filters, semantic directives.
//!
//! A [`Query`] is transient: built, validated, executed, and discarded per
//! call. Four shapes are supported, all converging on
//! [`SearchClient::execute`](crate::SearchClient::execute):
//!
//! - vector-only: [`Query::vector`]
//! - vector + filter: [`Query::vector`] + [`Query::filter`]
//! - hybrid keyword + vector: [`Query::hybrid`]
//! - hybrid + semantic re-ranking: [`Query::hybrid`] + [`Query::semantic`]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SearchError};
use crate::schema::{FieldType, IndexSchema};

/// A K-nearest-neighbour clause targeting one schema vector field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorClause {
    /// The vector field to search.
    pub field: String,
    /// The query vector. Must match the field's declared dimension.
    pub vector: Vec<f32>,
    /// The number of nearest neighbours requested. Must be at least 1.
    pub k: usize,
}

/// A boolean predicate tree over filterable scalar fields.
///
/// Filters are pure data; evaluation belongs to the backend, which applies
/// them as a pre-filter: the candidate set is restricted *before* similarity
/// scoring, so a filter matching N documents caps a K-neighbour query at
/// min(K, N) results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Filter {
    /// Field equals value.
    Eq(String, Value),
    /// Field does not equal value.
    Ne(String, Value),
    /// Field is greater than value.
    Gt(String, Value),
    /// Field is greater than or equal to value.
    Ge(String, Value),
    /// Field is less than value.
    Lt(String, Value),
    /// Field is less than or equal to value.
    Le(String, Value),
    /// All sub-filters match.
    And(Vec<Filter>),
    /// Any sub-filter matches.
    Or(Vec<Filter>),
    /// The sub-filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Field equals value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Field does not equal value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// Field is greater than value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// Field is greater than or equal to value.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    /// Field is less than value.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// Field is less than or equal to value.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    /// All of the given filters match.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Any of the given filters matches.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// The given filter does not match.
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Collect every field name this filter references.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Eq(f, _)
            | Filter::Ne(f, _)
            | Filter::Gt(f, _)
            | Filter::Ge(f, _)
            | Filter::Lt(f, _)
            | Filter::Le(f, _) => out.push(f.as_str()),
            Filter::And(subs) | Filter::Or(subs) => {
                for sub in subs {
                    sub.collect_fields(out);
                }
            }
            Filter::Not(sub) => sub.collect_fields(out),
        }
    }
}

/// Semantic re-ranking directives for a query.
///
/// Only valid against a schema whose semantic configuration has the same
/// name; otherwise execution fails with
/// [`SearchError::SemanticConfigNotSupported`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticOptions {
    /// The semantic configuration to re-rank with.
    pub configuration: String,
    /// Whether to extract a caption per result.
    pub captions: bool,
    /// How many answer passages to extract for the result set, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<usize>,
}

impl SemanticOptions {
    /// Re-rank with the named configuration, without captions or answers.
    pub fn new(configuration: impl Into<String>) -> Self {
        Self { configuration: configuration.into(), captions: false, answers: None }
    }

    /// Request extractive captions on each result.
    pub fn with_captions(mut self) -> Self {
        self.captions = true;
        self
    }

    /// Request up to `top` extracted answer passages on the result set.
    pub fn with_answers(mut self, top: usize) -> Self {
        self.answers = Some(top);
        self
    }
}

/// A single search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// Free text for lexical matching. Present in hybrid shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Nearest-neighbour clause. Present in every supported shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorClause>,
    /// Boolean pre-filter over scalar fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Semantic re-ranking directives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticOptions>,
    /// Projection: the subset of fields to return. `None` returns all
    /// retrievable fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl Query {
    /// A vector-only query: up to `k` nearest neighbours of `vector` in `field`.
    pub fn vector(field: impl Into<String>, vector: Vec<f32>, k: usize) -> Self {
        Self {
            text: None,
            vector: Some(VectorClause { field: field.into(), vector, k }),
            filter: None,
            semantic: None,
            select: None,
        }
    }

    /// A hybrid query: lexical matching on `text` fused with a `k`-nearest
    /// neighbour search of `vector` in `field`. The fused score is backend-
    /// owned and opaque; only its order is meaningful.
    pub fn hybrid(
        text: impl Into<String>,
        field: impl Into<String>,
        vector: Vec<f32>,
        k: usize,
    ) -> Self {
        Self {
            text: Some(text.into()),
            vector: Some(VectorClause { field: field.into(), vector, k }),
            filter: None,
            semantic: None,
            select: None,
        }
    }

    /// Restrict candidates with a boolean pre-filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add semantic re-ranking directives.
    pub fn semantic(mut self, options: SemanticOptions) -> Self {
        self.semantic = Some(options);
        self
    }

    /// Project only the named fields into the results.
    pub fn select(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Validate this query against a schema.
    ///
    /// Runs entirely client-side, before any network call.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidInput`] — neither text nor vector present, or
    ///   `k` is zero
    /// - [`SearchError::UnknownField`] — the vector clause, filter, or
    ///   projection references a field absent from the schema, the vector
    ///   clause targets a non-vector field, or a filter field is not
    ///   filterable
    /// - [`SearchError::DimensionMismatch`] — the query vector's length
    ///   disagrees with the schema's declared dimension
    /// - [`SearchError::SemanticConfigNotSupported`] — semantic directives
    ///   against a schema without a matching semantic configuration
    pub fn validate(&self, schema: &IndexSchema) -> Result<()> {
        if self.text.is_none() && self.vector.is_none() {
            return Err(SearchError::InvalidInput(
                "query must carry free text, a vector clause, or both".into(),
            ));
        }

        if let Some(clause) = &self.vector {
            if clause.k == 0 {
                return Err(SearchError::InvalidInput(
                    "vector clause must request at least one neighbour".into(),
                ));
            }
            let field = schema
                .field(&clause.field)
                .ok_or_else(|| SearchError::UnknownField(clause.field.clone()))?;
            if field.field_type != FieldType::Vector {
                return Err(SearchError::UnknownField(format!(
                    "'{}' is not a vector field",
                    clause.field
                )));
            }
            let expected = field.dimensions.unwrap_or(0);
            if clause.vector.len() != expected {
                return Err(SearchError::DimensionMismatch {
                    field: clause.field.clone(),
                    expected,
                    actual: clause.vector.len(),
                });
            }
        }

        if let Some(filter) = &self.filter {
            for name in filter.referenced_fields() {
                let field = schema
                    .field(name)
                    .ok_or_else(|| SearchError::UnknownField(name.to_string()))?;
                if !field.filterable {
                    return Err(SearchError::UnknownField(format!(
                        "'{name}' is not filterable"
                    )));
                }
            }
        }

        if let Some(select) = &self.select {
            for name in select {
                if schema.field(name).is_none() {
                    return Err(SearchError::UnknownField(name.clone()));
                }
            }
        }

        if let Some(semantic) = &self.semantic {
            match &schema.semantic {
                Some(config) if config.name == semantic.configuration => {}
                Some(config) => {
                    return Err(SearchError::SemanticConfigNotSupported(format!(
                        "query names configuration '{}' but the schema defines '{}'",
                        semantic.configuration, config.name
                    )));
                }
                None => {
                    return Err(SearchError::SemanticConfigNotSupported(format!(
                        "schema '{}' has no semantic configuration",
                        schema.name
                    )));
                }
            }
        }

        Ok(())
    }
}
