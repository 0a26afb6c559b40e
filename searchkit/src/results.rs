//! Raw backend results and their projection into typed result sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::schema::IndexSchema;

/// A caption extracted from a result by the semantic pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Caption {
    /// The extracted caption text.
    pub text: String,
    /// Caption text with match highlighting, when the backend provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<String>,
}

/// An answer passage extracted at the result-set level by the semantic pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The extracted answer text.
    pub text: String,
    /// The backend's confidence score for this answer.
    pub score: f32,
}

/// One ranked record as returned by the backend, before projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// The record's attributes as the backend returned them.
    pub fields: BTreeMap<String, Value>,
    /// The backend-assigned relevance score. Opaque: only its order matters.
    pub score: f32,
    /// The semantic re-ranker's score, when a semantic pass ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reranker_score: Option<f32>,
    /// Captions extracted for this record. Best-effort; may be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<Caption>,
}

/// The backend's raw response to a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResults {
    /// Ranked records in backend order.
    pub records: Vec<RawRecord>,
    /// Answer passages extracted for the whole result set. Best-effort.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<Answer>,
}

/// A scored, projected document.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The projected document.
    pub document: Document,
    /// The backend-assigned relevance score.
    pub score: f32,
    /// The semantic re-ranker's score, when a semantic pass ran.
    pub reranker_score: Option<f32>,
    /// Captions extracted for this hit. Absence is not an error.
    pub captions: Vec<Caption>,
}

/// An ordered sequence of scored documents plus optional answers.
///
/// Produced fresh per query and never persisted. Rank order is the backend's.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Hits in backend rank order.
    pub hits: Vec<SearchHit>,
    /// Answer passages for the result set. Absence is not an error.
    pub answers: Vec<Answer>,
}

impl ResultSet {
    /// The number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the result set has no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate over hits in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit> {
        self.hits.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = SearchHit;
    type IntoIter = std::vec::IntoIter<SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchHit;
    type IntoIter = std::slice::Iter<'a, SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Map raw backend records into a typed [`ResultSet`].
///
/// Keeps only fields declared in the schema, preserves backend rank order
/// and scores verbatim, and attaches captions and answers when present.
pub fn project(raw: RawResults, schema: &IndexSchema) -> ResultSet {
    let hits = raw
        .records
        .into_iter()
        .map(|record| {
            let mut document = Document::new();
            for (name, value) in record.fields {
                if schema.field(&name).is_some() {
                    document.fields.insert(name, value);
                }
            }
            SearchHit {
                document,
                score: record.score,
                reranker_score: record.reranker_score,
                captions: record.captions,
            }
        })
        .collect();

    ResultSet { hits, answers: raw.answers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FieldType, IndexSchema};

    fn schema() -> IndexSchema {
        IndexSchema::builder("hotels")
            .field(FieldSpec::key("hotelId"))
            .field(FieldSpec::new("hotelName", FieldType::String).searchable())
            .build()
            .unwrap()
    }

    fn record(id: &str, score: f32) -> RawRecord {
        let mut fields = BTreeMap::new();
        fields.insert("hotelId".to_string(), Value::from(id));
        fields.insert("hotelName".to_string(), Value::from(format!("Hotel {id}")));
        fields.insert("internalDebug".to_string(), Value::from("dropped"));
        RawRecord { fields, score, reranker_score: None, captions: Vec::new() }
    }

    #[test]
    fn preserves_rank_order_and_scores() {
        let raw = RawResults {
            records: vec![record("1", 0.9), record("2", 0.5), record("3", 0.1)],
            answers: Vec::new(),
        };
        let results = project(raw, &schema());
        let ids: Vec<_> =
            results.iter().map(|h| h.document.get_str("hotelId").unwrap().to_string()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(results.hits[0].score, 0.9);
        assert_eq!(results.hits[2].score, 0.1);
    }

    #[test]
    fn drops_fields_absent_from_schema() {
        let raw = RawResults { records: vec![record("1", 1.0)], answers: Vec::new() };
        let results = project(raw, &schema());
        assert!(results.hits[0].document.get("internalDebug").is_none());
        assert!(results.hits[0].document.get("hotelName").is_some());
    }

    #[test]
    fn attaches_captions_and_answers() {
        let mut rec = record("1", 1.0);
        rec.reranker_score = Some(3.2);
        rec.captions.push(Caption { text: "A quiet stay.".into(), highlights: None });
        let raw = RawResults {
            records: vec![rec],
            answers: vec![Answer { text: "Near the beach.".into(), score: 0.8 }],
        };
        let results = project(raw, &schema());
        assert_eq!(results.hits[0].reranker_score, Some(3.2));
        assert_eq!(results.hits[0].captions.len(), 1);
        assert_eq!(results.answers.len(), 1);
    }

    #[test]
    fn empty_captions_and_answers_are_not_an_error() {
        let raw = RawResults { records: vec![record("1", 1.0)], answers: Vec::new() };
        let results = project(raw, &schema());
        assert!(results.hits[0].captions.is_empty());
        assert!(results.answers.is_empty());
    }
}
