//! # Hotels Live Demo
//!
//! The same workflow as the `hotels` demo, wired to hosted services:
//! OpenAI embeddings plus a REST search backend.
//!
//! Required environment:
//!
//! - `OPENAI_API_KEY` — OpenAI embeddings API key
//! - `SEARCH_ENDPOINT` — base URL of the search service
//! - `SEARCH_API_KEY` — search service API key
//!
//! Run: `cargo run --bin hotels_live`

use std::sync::Arc;
use std::time::Duration;

use searchkit::{
    ClientConfig, DistanceMetric, Document, FieldSpec, FieldType, Filter, IndexSchema,
    IngestOptions, OpenAiEmbeddingProvider, RestBackend, ResultSet, SearchClient, SemanticConfig,
    SemanticOptions, VectorAlgorithm, VectorSearchConfig,
};
use serde_json::json;

const VECTOR_FIELD: &str = "descriptionVector";
const DIMENSIONS: usize = 1536;

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
        println!("  {}. [score={:.4}] {name}", i + 1, hit.score);
        for caption in &hit.captions {
            println!("     caption: {}", caption.text);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Build the client from the environment ---------------------------
    let embedder = OpenAiEmbeddingProvider::from_env()?.with_dimensions(DIMENSIONS);
    let backend = RestBackend::from_env()?.with_timeout(Duration::from_secs(30))?;

    let client = SearchClient::builder()
        .schema(hotel_schema()?)
        .embedding_provider(Arc::new(embedder))
        .backend(Arc::new(backend))
        .config(
            ClientConfig::builder()
                .request_timeout(Duration::from_secs(30))
                .poll_interval(Duration::from_millis(500))
                .poll_max_attempts(10)
                .build()?,
        )
        .build()?;

    // -- 2. Create the index and ingest the corpus --------------------------
    client.create_index().await?;
    let corpus = hotel_corpus();
    let expected = corpus.len() as u64;
    let outcome =
        client.ingest(corpus, &IngestOptions::new(VECTOR_FIELD, "description")).await?;
    println!("Ingested {} documents.", outcome.count());

    // -- 3. Wait out the consistency window ---------------------------------
    // Hosted indexes are eventually consistent; poll the document count with
    // backoff rather than sleeping a fixed interval.
    client.wait_until_visible(expected).await?;

    // -- 4. Run the four query shapes ---------------------------------------
    println!("\nVector search: \"relaxing beach holiday\"");
    print_results(&client.vector_search(VECTOR_FIELD, "relaxing beach holiday", 3).await?);

    println!("\nVector search filtered to Luxury:");
    print_results(
        &client
            .filtered_vector_search(
                VECTOR_FIELD,
                "relaxing beach holiday",
                3,
                Filter::eq("category", "Luxury"),
            )
            .await?,
    );

    println!("\nHybrid search: \"luxury hotel near the beach\"");
    print_results(&client.hybrid_search(VECTOR_FIELD, "luxury hotel near the beach", 5).await?);

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
