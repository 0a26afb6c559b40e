//! Shared fixtures: a deterministic embedding provider and a hotel corpus.

use async_trait::async_trait;
use searchkit::{
    DistanceMetric, Document, EmbeddingProvider, FieldSpec, FieldType, IndexSchema, Result,
    SearchError, SemanticConfig, VectorAlgorithm, VectorSearchConfig,
};
use serde_json::json;

/// Deterministic hash-based embeddings: no network, stable across calls.
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(SearchError::InvalidInput("input text is empty".into()));
        }
        // Hash the text bytes, then generate a normalised vector whose
        // direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An embedding provider that always returns the wrong length.
pub struct ShortEmbeddingProvider {
    pub claimed: usize,
    pub actual: usize,
}

#[async_trait]
impl EmbeddingProvider for ShortEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.5; self.actual])
    }

    fn dimensions(&self) -> usize {
        self.claimed
    }
}

pub const DIM: usize = 4;

/// The hotel index schema used across the tests.
pub fn hotel_schema() -> IndexSchema {
    IndexSchema::builder("hotels")
        .field(FieldSpec::key("hotelId"))
        .field(FieldSpec::new("hotelName", FieldType::String).searchable().sortable())
        .field(FieldSpec::new("description", FieldType::String).searchable())
        .field(FieldSpec::new("category", FieldType::String).filterable().facetable())
        .field(FieldSpec::new("tags", FieldType::StringCollection).filterable().searchable())
        .field(FieldSpec::new("rating", FieldType::Double).filterable().sortable())
        .field(FieldSpec::vector("descriptionVector", DIM, "hnsw-cosine"))
        .vector_search(VectorSearchConfig::new(
            "hnsw-cosine",
            VectorAlgorithm::Hnsw,
            DistanceMetric::Cosine,
        ))
        .semantic(SemanticConfig::new(
            "hotels-semantic",
            "hotelName",
            ["description"],
            ["tags"],
        ))
        .build()
        .expect("hotel schema is valid")
}

/// A unit vector in the first two dimensions at the given angle from the
/// query axis, so cosine similarity to `query_vector()` is `cos(degrees)`.
pub fn angle_vector(degrees: f32) -> Vec<f32> {
    let radians = degrees.to_radians();
    let mut v = vec![0.0; DIM];
    v[0] = radians.cos();
    v[1] = radians.sin();
    v
}

/// The query axis: similarity to a document is the cosine of its angle.
pub fn query_vector() -> Vec<f32> {
    angle_vector(0.0)
}

/// Five hotels with vectors at known angles. Closest three to the query
/// axis, by construction: h1 (0°), h2 (15°), h3 (30°). Exactly two are
/// tagged "Luxury": h2 and h4.
pub fn hotel_corpus() -> Vec<Document> {
    vec![
        Document::new()
            .field("hotelId", "h1")
            .field("hotelName", "Harbour Rest")
            .field("description", "Simple rooms above the harbour. Breakfast included.")
            .field("category", "Budget")
            .field("tags", json!(["harbour", "breakfast"]))
            .field("rating", 3.6)
            .vector("descriptionVector", angle_vector(0.0)),
        Document::new()
            .field("hotelId", "h2")
            .field("hotelName", "Grand Meridian")
            .field("description", "A luxury hotel near the beach. Spa and rooftop pool.")
            .field("category", "Luxury")
            .field("tags", json!(["beach", "spa", "pool"]))
            .field("rating", 4.8)
            .vector("descriptionVector", angle_vector(15.0)),
        Document::new()
            .field("hotelId", "h3")
            .field("hotelName", "Old Town Boutique")
            .field("description", "Boutique stay in the old town. Quiet courtyard garden.")
            .field("category", "Boutique")
            .field("tags", json!(["quiet", "garden"]))
            .field("rating", 4.2)
            .vector("descriptionVector", angle_vector(30.0)),
        Document::new()
            .field("hotelId", "h4")
            .field("hotelName", "Palm Court Resort")
            .field("description", "Luxury beachfront resort with a private beach and pool.")
            .field("category", "Luxury")
            .field("tags", json!(["beach", "pool"]))
            .field("rating", 4.9)
            .vector("descriptionVector", angle_vector(60.0)),
        Document::new()
            .field("hotelId", "h5")
            .field("hotelName", "Transit Inn")
            .field("description", "Airport hotel with shuttle service. Good for layovers.")
            .field("category", "Budget")
            .field("tags", json!(["airport", "shuttle"]))
            .field("rating", 3.1)
            .vector("descriptionVector", angle_vector(85.0)),
    ]
}

/// Hit identifiers in rank order.
pub fn ids(results: &searchkit::ResultSet) -> Vec<String> {
    results
        .iter()
        .map(|hit| hit.document.get_str("hotelId").expect("hotelId present").to_string())
        .collect()
}
