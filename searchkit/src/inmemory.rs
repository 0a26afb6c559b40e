//! In-memory search backend.
//!
//! This module provides [`InMemoryBackend`], a zero-dependency
//! [`SearchBackend`] backed by a `HashMap` protected by a
//! `tokio::sync::RwLock`. It is suitable for development, demos, and tests:
//! a network-free stand-in for a hosted search service, not a search engine.
//! Writes are immediately visible, so `document_count` reflects every
//! accepted upload at once.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::SearchBackend;
use crate::document::{Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::query::{Filter, Query};
use crate::results::{Answer, Caption, RawRecord, RawResults};
use crate::schema::{DistanceMetric, FieldType, IndexSchema};

/// Reciprocal-rank-fusion constant for hybrid score fusion.
const RRF_K: f32 = 60.0;

/// Semantic re-ranker scores are reported on a 0..=4 scale.
const RERANKER_SCALE: f32 = 4.0;

/// An in-memory [`SearchBackend`].
///
/// Creation policy: **create-or-update** — creating an index whose name
/// already exists replaces the schema and drops its documents;
/// [`SearchError::IndexAlreadyExists`] is never returned.
///
/// Filters are applied as a pre-filter: candidates are restricted before any
/// similarity scoring. Hybrid queries fuse the lexical and vector rankings
/// with reciprocal-rank fusion; the fused score is opaque to callers.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    indexes: RwLock<HashMap<String, IndexState>>,
}

#[derive(Debug)]
struct IndexState {
    schema: IndexSchema,
    documents: BTreeMap<String, Document>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing_index(index: &str) -> SearchError {
        SearchError::QueryFailed {
            backend: "inmemory".to_string(),
            message: format!("index '{index}' does not exist"),
        }
    }
}

/// Compute similarity between two vectors under the given metric.
///
/// Euclidean distance is negated so that every metric sorts descending.
fn similarity(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => {
            let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
            let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                return 0.0;
            }
            dot / (norm_a * norm_b)
        }
        DistanceMetric::DotProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        DistanceMetric::Euclidean => {
            -a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
        }
    }
}

/// Lowercased alphanumeric terms of a text.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Compare two scalar JSON values, numerically when both are numbers.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().zip(y.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Equality with collection semantics: an array field matches when it
/// contains the value.
fn value_matches(field_value: &Value, wanted: &Value) -> bool {
    match field_value {
        Value::Array(items) => items.iter().any(|item| item == wanted),
        other => other == wanted,
    }
}

/// Evaluate a filter tree against a document. Missing fields never match.
fn matches(filter: &Filter, document: &Document) -> bool {
    match filter {
        Filter::Eq(field, value) => {
            document.get(field).is_some_and(|v| value_matches(v, value))
        }
        Filter::Ne(field, value) => {
            document.get(field).is_some_and(|v| !value_matches(v, value))
        }
        Filter::Gt(field, value) => document
            .get(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|ord| ord == Ordering::Greater),
        Filter::Ge(field, value) => document
            .get(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|ord| ord != Ordering::Less),
        Filter::Lt(field, value) => document
            .get(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|ord| ord == Ordering::Less),
        Filter::Le(field, value) => document
            .get(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|ord| ord != Ordering::Greater),
        Filter::And(subs) => subs.iter().all(|f| matches(f, document)),
        Filter::Or(subs) => subs.iter().any(|f| matches(f, document)),
        Filter::Not(sub) => !matches(sub, document),
    }
}

/// Concatenated text of a document's values for the given fields.
fn field_text(document: &Document, fields: &[&str]) -> String {
    let mut out = String::new();
    for name in fields {
        match document.get(name) {
            Some(Value::String(s)) => {
                out.push_str(s);
                out.push(' ');
            }
            Some(Value::Array(items)) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        out.push_str(s);
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Count how many of `terms` occur in the tokenized `text`, with multiplicity
/// on the text side.
fn term_hits(terms: &[String], text: &str) -> usize {
    let tokens = tokenize(text);
    tokens.iter().filter(|t| terms.contains(t)).count()
}

/// The fraction of distinct `terms` that occur in `text`.
fn term_coverage(terms: &[String], text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let tokens = tokenize(text);
    let matched = terms.iter().filter(|t| tokens.contains(t)).count();
    matched as f32 / terms.len() as f32
}

/// The sentence of `text` with the most query-term hits, if any hit at all.
fn best_sentence(terms: &[String], text: &str) -> Option<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| (term_hits(terms, s), s))
        .filter(|(hits, _)| *hits > 0)
        .max_by_key(|(hits, _)| *hits)
        .map(|(_, s)| s.to_string())
}

/// A ranked candidate during search: document key plus running score.
struct Ranked {
    key: String,
    score: f32,
    reranker_score: Option<f32>,
}

impl IndexState {
    /// Rank pre-filtered candidates by vector similarity, keeping the top K.
    fn vector_ranking(&self, candidates: &[&String], query: &Query) -> Result<Vec<Ranked>> {
        let Some(clause) = &query.vector else {
            return Ok(Vec::new());
        };
        let expected = self.schema.vector_dimensions(&clause.field).ok_or_else(|| {
            SearchError::UnknownField(clause.field.clone())
        })?;
        if clause.vector.len() != expected {
            return Err(SearchError::DimensionMismatch {
                field: clause.field.clone(),
                expected,
                actual: clause.vector.len(),
            });
        }

        let metric = self.schema.metric();
        let mut ranked: Vec<Ranked> = candidates
            .iter()
            .filter_map(|key| {
                let document = self.documents.get(*key)?;
                let vector = document.vectors.get(&clause.field)?;
                Some(Ranked {
                    key: (*key).clone(),
                    score: similarity(metric, vector, &clause.vector),
                    reranker_score: None,
                })
            })
            .collect();
        sort_ranked(&mut ranked);
        ranked.truncate(clause.k);
        Ok(ranked)
    }

    /// Rank pre-filtered candidates by lexical term hits over searchable fields.
    fn lexical_ranking(&self, candidates: &[&String], terms: &[String]) -> Vec<Ranked> {
        let searchable: Vec<&str> = self
            .schema
            .fields
            .iter()
            .filter(|f| f.searchable && f.field_type != FieldType::Vector)
            .map(|f| f.name.as_str())
            .collect();

        let mut ranked: Vec<Ranked> = candidates
            .iter()
            .filter_map(|key| {
                let document = self.documents.get(*key)?;
                let hits = term_hits(terms, &field_text(document, &searchable));
                (hits > 0).then(|| Ranked {
                    key: (*key).clone(),
                    score: hits as f32,
                    reranker_score: None,
                })
            })
            .collect();
        sort_ranked(&mut ranked);
        ranked
    }

    /// Best-effort semantic pass: re-rank by query-term coverage of the
    /// semantic title/content fields and extract captions and answers.
    fn semantic_pass(&self, query: &Query, ranked: &mut Vec<Ranked>) -> Vec<Answer> {
        let (Some(options), Some(config), Some(text)) =
            (&query.semantic, &self.schema.semantic, &query.text)
        else {
            return Vec::new();
        };
        let terms = tokenize(text);
        let mut content_fields: Vec<&str> = vec![config.title_field.as_str()];
        content_fields.extend(config.content_fields.iter().map(String::as_str));

        for entry in ranked.iter_mut() {
            let coverage = self
                .documents
                .get(&entry.key)
                .map(|d| term_coverage(&terms, &field_text(d, &content_fields)))
                .unwrap_or(0.0);
            entry.reranker_score = Some(RERANKER_SCALE * coverage);
        }
        // Stable: preserves the fused order between equally covered hits.
        ranked.sort_by(|a, b| {
            b.reranker_score
                .partial_cmp(&a.reranker_score)
                .unwrap_or(Ordering::Equal)
        });

        let mut answers = Vec::new();
        if let Some(top) = options.answers {
            for entry in ranked.iter().take(top) {
                let Some(document) = self.documents.get(&entry.key) else { continue };
                let Some(sentence) =
                    best_sentence(&terms, &field_text(document, &content_fields))
                else {
                    continue;
                };
                answers.push(Answer {
                    text: sentence,
                    score: entry.reranker_score.unwrap_or(0.0) / RERANKER_SCALE,
                });
            }
        }
        answers
    }

    /// Build the raw record for one ranked hit, applying the projection.
    fn to_record(&self, entry: &Ranked, query: &Query, terms: &[String]) -> Option<RawRecord> {
        let document = self.documents.get(&entry.key)?;

        let fields: BTreeMap<String, Value> = match &query.select {
            Some(select) => document
                .fields
                .iter()
                .filter(|(name, _)| {
                    select.iter().any(|s| s == *name)
                        || self.schema.key_field().is_some_and(|k| &k.name == *name)
                })
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => document.fields.clone(),
        };

        let captions = match (&query.semantic, &self.schema.semantic) {
            (Some(options), Some(config)) if options.captions => {
                let mut content_fields: Vec<&str> = vec![config.title_field.as_str()];
                content_fields.extend(config.content_fields.iter().map(String::as_str));
                best_sentence(terms, &field_text(document, &content_fields))
                    .map(|text| vec![Caption { text, highlights: None }])
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        };

        Some(RawRecord {
            fields,
            score: entry.score,
            reranker_score: entry.reranker_score,
            captions,
        })
    }
}

/// Sort descending by score, breaking ties by key for determinism.
fn sort_ranked(ranked: &mut [Ranked]) {
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Fuse two rankings with reciprocal-rank fusion.
fn fuse(vector: Vec<Ranked>, lexical: Vec<Ranked>) -> Vec<Ranked> {
    let mut fused: BTreeMap<String, f32> = BTreeMap::new();
    for ranking in [&vector, &lexical] {
        for (rank, entry) in ranking.iter().enumerate() {
            *fused.entry(entry.key.clone()).or_insert(0.0) +=
                1.0 / (RRF_K + (rank + 1) as f32);
        }
    }
    let mut ranked: Vec<Ranked> = fused
        .into_iter()
        .map(|(key, score)| Ranked { key, score, reranker_score: None })
        .collect();
    sort_ranked(&mut ranked);
    ranked
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "inmemory"
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        indexes.insert(
            schema.name.clone(),
            IndexState { schema: schema.clone(), documents: BTreeMap::new() },
        );
        debug!(index = %schema.name, "created in-memory index");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        indexes.remove(name);
        Ok(())
    }

    async fn upload(&self, index: &str, documents: &[Document]) -> Result<Vec<DocumentStatus>> {
        let mut indexes = self.indexes.write().await;
        let state = indexes.get_mut(index).ok_or_else(|| Self::missing_index(index))?;

        let mut statuses = Vec::with_capacity(documents.len());
        'documents: for (position, document) in documents.iter().enumerate() {
            let key = match document.key(&state.schema) {
                Ok(key) => key.to_string(),
                Err(e) => {
                    statuses.push(DocumentStatus::failed(format!("[{position}]"), e.to_string()));
                    continue;
                }
            };

            for (name, vector) in &document.vectors {
                match state.schema.vector_dimensions(name) {
                    Some(expected) if expected == vector.len() => {}
                    Some(expected) => {
                        statuses.push(DocumentStatus::failed(
                            key.clone(),
                            format!(
                                "vector field '{name}' expects dimension {expected}, got {}",
                                vector.len()
                            ),
                        ));
                        continue 'documents;
                    }
                    None => {
                        statuses.push(DocumentStatus::failed(
                            key.clone(),
                            format!("'{name}' is not a vector field in the schema"),
                        ));
                        continue 'documents;
                    }
                }
            }

            state.documents.insert(key.clone(), document.clone());
            statuses.push(DocumentStatus::ok(key));
        }

        debug!(index, count = documents.len(), "uploaded batch to in-memory index");
        Ok(statuses)
    }

    async fn delete_documents(
        &self,
        index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>> {
        let mut indexes = self.indexes.write().await;
        let state = indexes.get_mut(index).ok_or_else(|| Self::missing_index(index))?;

        let statuses = keys
            .iter()
            .map(|key| {
                state.documents.remove(*key);
                DocumentStatus::ok(*key)
            })
            .collect();

        debug!(index, count = keys.len(), "deleted documents from in-memory index");
        Ok(statuses)
    }

    async fn search(&self, index: &str, query: &Query) -> Result<RawResults> {
        let indexes = self.indexes.read().await;
        let state = indexes.get(index).ok_or_else(|| Self::missing_index(index))?;

        // Pre-filter: restrict candidates before any scoring.
        let candidates: Vec<&String> = state
            .documents
            .iter()
            .filter(|(_, document)| {
                query.filter.as_ref().map(|f| matches(f, document)).unwrap_or(true)
            })
            .map(|(key, _)| key)
            .collect();

        let terms = query.text.as_deref().map(tokenize).unwrap_or_default();

        let vector_ranked = state.vector_ranking(&candidates, query)?;
        let lexical_ranked = if terms.is_empty() {
            Vec::new()
        } else {
            state.lexical_ranking(&candidates, &terms)
        };

        let mut ranked = match (query.vector.is_some(), !terms.is_empty()) {
            (true, true) => fuse(vector_ranked, lexical_ranked),
            (true, false) => vector_ranked,
            (false, true) => lexical_ranked,
            (false, false) => Vec::new(),
        };

        let answers = state.semantic_pass(query, &mut ranked);

        let records =
            ranked.iter().filter_map(|entry| state.to_record(entry, query, &terms)).collect();

        Ok(RawResults { records, answers })
    }

    async fn document_count(&self, index: &str) -> Result<u64> {
        let indexes = self.indexes.read().await;
        let state = indexes.get(index).ok_or_else(|| Self::missing_index(index))?;
        Ok(state.documents.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn similarity_orders_by_metric() {
        let q = [1.0, 0.0];
        assert!(similarity(DistanceMetric::Cosine, &[1.0, 0.0], &q)
            > similarity(DistanceMetric::Cosine, &[0.7, 0.7], &q));
        assert!(similarity(DistanceMetric::DotProduct, &[2.0, 0.0], &q)
            > similarity(DistanceMetric::DotProduct, &[1.0, 0.0], &q));
        assert!(similarity(DistanceMetric::Euclidean, &[1.0, 0.0], &q)
            > similarity(DistanceMetric::Euclidean, &[0.0, 1.0], &q));
    }

    #[test]
    fn filter_matches_scalars_and_collections() {
        let doc = Document::new()
            .field("category", "Luxury")
            .field("rating", 4.5)
            .field("tags", json!(["pool", "spa"]));

        assert!(matches(&Filter::eq("category", "Luxury"), &doc));
        assert!(!matches(&Filter::eq("category", "Budget"), &doc));
        assert!(matches(&Filter::eq("tags", "spa"), &doc));
        assert!(matches(&Filter::gt("rating", 4), &doc));
        assert!(!matches(&Filter::gt("rating", 5), &doc));
        assert!(matches(
            &Filter::and([Filter::eq("category", "Luxury"), Filter::le("rating", 4.5)]),
            &doc
        ));
        assert!(matches(&Filter::not(Filter::eq("category", "Budget")), &doc));
        // Missing fields never match, even under Ne.
        assert!(!matches(&Filter::ne("missing", "x"), &doc));
    }

    #[test]
    fn rrf_prefers_documents_ranked_in_both_lists() {
        let vector = vec![
            Ranked { key: "a".into(), score: 0.9, reranker_score: None },
            Ranked { key: "b".into(), score: 0.8, reranker_score: None },
        ];
        let lexical = vec![
            Ranked { key: "b".into(), score: 3.0, reranker_score: None },
            Ranked { key: "c".into(), score: 1.0, reranker_score: None },
        ];
        let fused = fuse(vector, lexical);
        assert_eq!(fused[0].key, "b");
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn best_sentence_picks_highest_term_overlap() {
        let terms = tokenize("quiet beach");
        let text = "Downtown location. A quiet stay near the beach. Free parking.";
        assert_eq!(best_sentence(&terms, text).unwrap(), "A quiet stay near the beach.");
        assert!(best_sentence(&tokenize("zeppelin"), text).is_none());
    }
}
