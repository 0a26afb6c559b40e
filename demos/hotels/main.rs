//! # Hotels Demo
//!
//! Demonstrates the full hybrid search workflow against the in-memory
//! backend: build a schema, ingest a small hotel corpus, then run all four
//! query shapes (vector, vector + filter, hybrid, hybrid + semantic).
//!
//! Uses `InMemoryBackend` and a deterministic `MockEmbeddingProvider` so it
//! runs with **zero API keys**.
//!
//! Run: `cargo run --bin hotels`

use std::sync::Arc;

use searchkit::{
    ClientConfig, DistanceMetric, Document, EmbeddingProvider, FieldSpec, FieldType, Filter,
    IndexSchema, InMemoryBackend, IngestOptions, ResultSet, SearchClient, SemanticConfig,
    SemanticOptions, VectorAlgorithm, VectorSearchConfig,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider — deterministic hash-based embeddings for demos/tests
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> searchkit::Result<Vec<f32>> {
        if text.is_empty() {
            return Err(searchkit::SearchError::InvalidInput("input text is empty".into()));
        }
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        // L2-normalise so cosine similarity is just the dot product.
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

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

const VECTOR_FIELD: &str = "descriptionVector";
const DIMENSIONS: usize = 64;

fn hotel_schema() -> searchkit::Result<IndexSchema> {
    IndexSchema::builder("hotels")
        .field(FieldSpec::key("hotelId"))
        .field(FieldSpec::new("hotelName", FieldType::String).searchable().sortable())
        .field(FieldSpec::new("description", FieldType::String).searchable())
        .field(FieldSpec::new("category", FieldType::String).filterable().facetable())
        .field(FieldSpec::new("tags", FieldType::StringCollection).filterable().searchable())
        .field(FieldSpec::new("rating", FieldType::Double).filterable().sortable())
        .field(FieldSpec::vector(VECTOR_FIELD, DIMENSIONS, "hnsw-cosine"))
        .vector_search(VectorSearchConfig::new(
            "hnsw-cosine",
            VectorAlgorithm::Hnsw,
            DistanceMetric::Cosine,
        ))
        .semantic(SemanticConfig::new("hotels-semantic", "hotelName", ["description"], ["tags"]))
        .build()
}

fn hotel_corpus() -> Vec<Document> {
    vec![
        Document::new()
            .field("hotelId", "1")
            .field("hotelName", "Harbour Rest")
            .field("description", "Simple rooms above the harbour. Breakfast included.")
            .field("category", "Budget")
            .field("tags", json!(["harbour", "breakfast"]))
            .field("rating", 3.6),
        Document::new()
            .field("hotelId", "2")
            .field("hotelName", "Grand Meridian")
            .field("description", "A luxury hotel near the beach. Spa and rooftop pool.")
            .field("category", "Luxury")
            .field("tags", json!(["beach", "spa", "pool"]))
            .field("rating", 4.8),
        Document::new()
            .field("hotelId", "3")
            .field("hotelName", "Old Town Boutique")
            .field("description", "Boutique stay in the old town. Quiet courtyard garden.")
            .field("category", "Boutique")
            .field("tags", json!(["quiet", "garden"]))
            .field("rating", 4.2),
        Document::new()
            .field("hotelId", "4")
            .field("hotelName", "Palm Court Resort")
            .field("description", "Luxury beachfront resort with a private beach and pool.")
            .field("category", "Luxury")
            .field("tags", json!(["beach", "pool"]))
            .field("rating", 4.9),
        Document::new()
            .field("hotelId", "5")
            .field("hotelName", "Transit Inn")
            .field("description", "Airport hotel with shuttle service. Good for layovers.")
            .field("category", "Budget")
            .field("tags", json!(["airport", "shuttle"]))
            .field("rating", 3.1),
    ]
}

fn print_results(results: &ResultSet) {
    if results.is_empty() {
        println!("  (no results)");
        return;
    }
    for (i, hit) in results.iter().enumerate() {
        let name = hit.document.get_str("hotelName").unwrap_or("?");
        let category = hit.document.get_str("category").unwrap_or("?");
        print!("  {}. [score={:.4}", i + 1, hit.score);
        if let Some(reranker) = hit.reranker_score {
            print!(" reranker={reranker:.4}");
        }
        println!("] {name} ({category})");
        for caption in &hit.captions {
            println!("     caption: {}", caption.text);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Build the client ------------------------------------------------
    // MockEmbeddingProvider produces 64-dimensional vectors from text hashes.
    // InMemoryBackend stores everything in a HashMap — no external service.
    let client = SearchClient::builder()
        .schema(hotel_schema()?)
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIMENSIONS)))
        .backend(Arc::new(InMemoryBackend::new()))
        .config(ClientConfig::default())
        .build()?;

    // -- 2. Create the index and ingest the corpus --------------------------
    // No document carries a vector, so each description is embedded during
    // ingestion.
    client.create_index().await?;
    let corpus = hotel_corpus();
    let expected = corpus.len() as u64;
    let outcome =
        client.ingest(corpus, &IngestOptions::new(VECTOR_FIELD, "description")).await?;
    println!("Ingested {} documents.", outcome.count());

    // -- 3. Wait for visibility ---------------------------------------------
    // Immediate here, but hosted backends are eventually consistent; poll the
    // document count instead of sleeping.
    client.wait_until_visible(expected).await?;

    // -- 4. Vector-only search ----------------------------------------------
    println!("\nVector search: \"relaxing beach holiday\"");
    let results = client.vector_search(VECTOR_FIELD, "relaxing beach holiday", 3).await?;
    print_results(&results);

    // -- 5. Vector search with a pre-filter ---------------------------------
    println!("\nVector search filtered to Luxury:");
    let results = client
        .filtered_vector_search(
            VECTOR_FIELD,
            "relaxing beach holiday",
            3,
            Filter::eq("category", "Luxury"),
        )
        .await?;
    print_results(&results);

    // -- 6. Hybrid keyword + vector search ----------------------------------
    println!("\nHybrid search: \"luxury hotel near the beach\"");
    let results = client.hybrid_search(VECTOR_FIELD, "luxury hotel near the beach", 5).await?;
    print_results(&results);

    // -- 7. Hybrid search with semantic re-ranking --------------------------
    println!("\nSemantic hybrid search: \"quiet stay with a garden\"");
    let results = client
        .semantic_hybrid_search(
            VECTOR_FIELD,
            "quiet stay with a garden",
            5,
            SemanticOptions::new("hotels-semantic").with_captions().with_answers(2),
        )
        .await?;
    print_results(&results);
    for answer in &results.answers {
        println!("  answer [{:.2}]: {}", answer.score, answer.text);
    }

    println!("\nDone.");
    Ok(())
}
