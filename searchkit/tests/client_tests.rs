//! End-to-end tests for the search client over the in-memory backend.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{
    DIM, MockEmbeddingProvider, ShortEmbeddingProvider, hotel_corpus, hotel_schema, ids,
    query_vector,
};
use searchkit::{
    ClientConfig, Document, DocumentStatus, EmbeddingProvider, Filter, InMemoryBackend,
    IngestOptions, IngestOutcome, Query, RawResults, Result, SearchBackend, SearchClient,
    SearchError, SemanticOptions,
};

fn client_with(backend: Arc<dyn SearchBackend>) -> SearchClient {
    SearchClient::builder()
        .schema(hotel_schema())
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .backend(backend)
        .build()
        .unwrap()
}

/// A client over a freshly created in-memory index seeded with the corpus.
async fn seeded_client() -> SearchClient {
    let client = client_with(Arc::new(InMemoryBackend::new()));
    client.create_index().await.unwrap();
    let outcome = client
        .ingest(hotel_corpus(), &IngestOptions::new("descriptionVector", "description"))
        .await
        .unwrap();
    assert_eq!(outcome.count(), 5);
    client.wait_until_visible(5).await.unwrap();
    client
}

// ── Ingestion ──────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_embeds_missing_vectors_and_succeeds_for_every_document() {
    let client = client_with(Arc::new(InMemoryBackend::new()));
    client.create_index().await.unwrap();

    let mut documents = hotel_corpus();
    for document in &mut documents {
        document.vectors.clear();
    }

    let outcome: IngestOutcome = client
        .ingest(documents, &IngestOptions::new("descriptionVector", "description"))
        .await
        .unwrap();

    assert_eq!(outcome.count(), 5);
    assert!(outcome.statuses.iter().all(|s| s.succeeded));
    assert_eq!(client.backend().document_count("hotels").await.unwrap(), 5);
}

#[tokio::test]
async fn ingest_surfaces_partial_failure_with_per_document_statuses() {
    let client = client_with(Arc::new(InMemoryBackend::new()));
    client.create_index().await.unwrap();

    let mut documents = hotel_corpus();
    // One document carries a vector of the wrong length; the backend
    // rejects it per-document rather than failing the batch.
    documents[2].vectors.insert("descriptionVector".into(), vec![0.0; DIM - 1]);

    let err = client
        .ingest(documents, &IngestOptions::new("descriptionVector", "description"))
        .await
        .unwrap_err();

    match err {
        SearchError::PartialFailure { statuses } => {
            assert_eq!(statuses.len(), 5);
            let failed: Vec<_> = statuses.iter().filter(|s| !s.succeeded).collect();
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].key, "h3");
            assert!(failed[0].message.is_some());
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // The accepted subset is still queryable.
    assert_eq!(client.backend().document_count("hotels").await.unwrap(), 4);
}

#[tokio::test]
async fn ingest_rejects_provider_dimension_mismatch_before_upload() {
    let backend = Arc::new(InMemoryBackend::new());
    let client = SearchClient::builder()
        .schema(hotel_schema())
        .embedding_provider(Arc::new(ShortEmbeddingProvider { claimed: DIM, actual: DIM - 1 }))
        .backend(backend.clone())
        .build()
        .unwrap();
    client.create_index().await.unwrap();

    let mut documents = hotel_corpus();
    for document in &mut documents {
        document.vectors.clear();
    }

    let err = client
        .ingest(documents, &IngestOptions::new("descriptionVector", "description"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::DimensionMismatch { .. }));
    assert_eq!(backend.document_count("hotels").await.unwrap(), 0);
}

#[tokio::test]
async fn delete_removes_documents_and_tolerates_missing_keys() {
    let client = seeded_client().await;

    let outcome = client.delete_documents(&["h1", "h5", "h9"]).await.unwrap();
    assert_eq!(outcome.count(), 3);
    assert_eq!(client.backend().document_count("hotels").await.unwrap(), 3);

    let results =
        client.execute(Query::vector("descriptionVector", query_vector(), 5)).await.unwrap();
    assert_eq!(ids(&results), ["h2", "h3", "h4"]);
}

#[tokio::test]
async fn ingest_rejects_document_without_vector_or_text() {
    let client = client_with(Arc::new(InMemoryBackend::new()));
    client.create_index().await.unwrap();

    let documents = vec![Document::new().field("hotelId", "h9").field("category", "Budget")];
    let err = client
        .ingest(documents, &IngestOptions::new("descriptionVector", "description"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput(_)));
}

// ── Query shapes ───────────────────────────────────────────────────

#[tokio::test]
async fn vector_only_returns_the_three_closest_by_construction() {
    let client = seeded_client().await;

    let results =
        client.execute(Query::vector("descriptionVector", query_vector(), 3)).await.unwrap();

    assert_eq!(ids(&results), ["h1", "h2", "h3"]);
    for window in results.hits.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn pre_filter_caps_results_at_matching_documents() {
    let client = seeded_client().await;

    let results = client
        .execute(
            Query::vector("descriptionVector", query_vector(), 3)
                .filter(Filter::eq("category", "Luxury")),
        )
        .await
        .unwrap();

    // Corpus of 5 with 2 Luxury documents and K=3 yields exactly 2 hits.
    assert_eq!(ids(&results), ["h2", "h4"]);
}

#[tokio::test]
async fn hybrid_returns_the_full_corpus_with_fused_scores() {
    let client = seeded_client().await;

    let results =
        client.hybrid_search("descriptionVector", "luxury hotel near the beach", 5).await.unwrap();

    assert_eq!(results.len(), 5);
    for hit in &results {
        assert!(hit.score.is_finite());
        assert!(hit.score > 0.0);
    }
}

#[tokio::test]
async fn semantic_pass_reranks_and_annotates() {
    let client = seeded_client().await;

    let results = client
        .semantic_hybrid_search(
            "descriptionVector",
            "luxury beach pool",
            5,
            SemanticOptions::new("hotels-semantic").with_captions().with_answers(2),
        )
        .await
        .unwrap();

    assert!(!results.is_empty());
    for hit in &results {
        assert!(hit.reranker_score.is_some());
    }
    for window in results.hits.windows(2) {
        assert!(window[0].reranker_score >= window[1].reranker_score);
    }

    // The fully matching luxury hotels outrank the rest and carry captions.
    let top_ids = &ids(&results)[..2];
    assert!(top_ids.contains(&"h2".to_string()));
    assert!(top_ids.contains(&"h4".to_string()));
    assert!(!results.hits[0].captions.is_empty());

    assert!(!results.answers.is_empty());
    assert!(results.answers.len() <= 2);
}

#[tokio::test]
async fn semantic_directives_require_a_matching_configuration() {
    let client = seeded_client().await;

    let err = client
        .semantic_hybrid_search(
            "descriptionVector",
            "luxury",
            3,
            SemanticOptions::new("some-other-config"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::SemanticConfigNotSupported(_)));
}

#[tokio::test]
async fn projection_limits_returned_fields() {
    let client = seeded_client().await;

    let results = client
        .execute(
            Query::vector("descriptionVector", query_vector(), 3)
                .select(["hotelId", "hotelName"]),
        )
        .await
        .unwrap();

    let document = &results.hits[0].document;
    assert!(document.get("hotelName").is_some());
    assert!(document.get("description").is_none());
}

// ── Validation happens before any network call ─────────────────────

/// A backend that records whether it was ever called.
struct ProbeBackend {
    calls: AtomicUsize,
}

impl ProbeBackend {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SearchBackend for ProbeBackend {
    fn name(&self) -> &str {
        "probe"
    }

    async fn create_index(&self, _schema: &searchkit::IndexSchema) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_index(&self, _name: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload(
        &self,
        _index: &str,
        documents: &[Document],
    ) -> Result<Vec<DocumentStatus>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(documents.iter().map(|_| DocumentStatus::ok("probe")).collect())
    }

    async fn delete_documents(
        &self,
        _index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(keys.iter().map(|k| DocumentStatus::ok(*k)).collect())
    }

    async fn search(&self, _index: &str, _query: &Query) -> Result<RawResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawResults::default())
    }

    async fn document_count(&self, _index: &str) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

#[tokio::test]
async fn dimension_mismatch_is_raised_without_touching_the_backend() {
    let probe = Arc::new(ProbeBackend::new());
    let client = client_with(probe.clone());

    let err = client
        .execute(Query::vector("descriptionVector", vec![0.0; DIM + 3], 3))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::DimensionMismatch { .. }));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_k_is_rejected_without_touching_the_backend() {
    let probe = Arc::new(ProbeBackend::new());
    let client = client_with(probe.clone());

    let err =
        client.execute(Query::vector("descriptionVector", query_vector(), 0)).await.unwrap_err();

    assert!(matches!(err, SearchError::InvalidInput(_)));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
}

// ── Embedding contract ─────────────────────────────────────────────

#[tokio::test]
async fn embedding_the_same_text_twice_is_dimension_stable() {
    let provider = MockEmbeddingProvider::new(DIM);
    let first = provider.embed("a quiet stay near the beach").await.unwrap();
    let second = provider.embed("a quiet stay near the beach").await.unwrap();

    assert_eq!(first.len(), DIM);
    assert_eq!(second.len(), DIM);
    assert!(first.iter().all(|x| x.is_finite()));
    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_query_text_is_rejected_by_the_provider() {
    let client = client_with(Arc::new(InMemoryBackend::new()));
    let err = client.embed_query("").await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput(_)));
}

// ── Visibility polling and deadlines ───────────────────────────────

/// A backend whose document count only catches up after a few polls.
struct LaggingBackend {
    polls: AtomicU64,
    visible_after: u64,
    count: u64,
}

#[async_trait]
impl SearchBackend for LaggingBackend {
    fn name(&self) -> &str {
        "lagging"
    }

    async fn create_index(&self, _schema: &searchkit::IndexSchema) -> Result<()> {
        Ok(())
    }

    async fn delete_index(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn upload(
        &self,
        _index: &str,
        documents: &[Document],
    ) -> Result<Vec<DocumentStatus>> {
        Ok(documents.iter().map(|_| DocumentStatus::ok("lagging")).collect())
    }

    async fn delete_documents(
        &self,
        _index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>> {
        Ok(keys.iter().map(|k| DocumentStatus::ok(*k)).collect())
    }

    async fn search(&self, _index: &str, _query: &Query) -> Result<RawResults> {
        Ok(RawResults::default())
    }

    async fn document_count(&self, _index: &str) -> Result<u64> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if polls >= self.visible_after { Ok(self.count) } else { Ok(0) }
    }
}

#[tokio::test]
async fn visibility_poll_retries_until_the_count_is_reached() {
    let backend = Arc::new(LaggingBackend {
        polls: AtomicU64::new(0),
        visible_after: 3,
        count: 5,
    });
    let client = SearchClient::builder()
        .schema(hotel_schema())
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .backend(backend.clone())
        .config(
            ClientConfig::builder()
                .poll_interval(Duration::from_millis(5))
                .poll_max_attempts(6)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    client.wait_until_visible(5).await.unwrap();
    assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn visibility_poll_times_out_when_the_index_never_catches_up() {
    let backend = Arc::new(LaggingBackend {
        polls: AtomicU64::new(0),
        visible_after: u64::MAX,
        count: 0,
    });
    let client = SearchClient::builder()
        .schema(hotel_schema())
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .backend(backend)
        .config(
            ClientConfig::builder()
                .poll_interval(Duration::from_millis(2))
                .poll_max_attempts(3)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let err = client.wait_until_visible(5).await.unwrap_err();
    assert!(matches!(err, SearchError::Timeout { .. }));
}

/// A backend that never answers within a reasonable deadline.
struct SlowBackend;

#[async_trait]
impl SearchBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    async fn create_index(&self, _schema: &searchkit::IndexSchema) -> Result<()> {
        Ok(())
    }

    async fn delete_index(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn upload(
        &self,
        _index: &str,
        _documents: &[Document],
    ) -> Result<Vec<DocumentStatus>> {
        Ok(Vec::new())
    }

    async fn delete_documents(
        &self,
        _index: &str,
        keys: &[&str],
    ) -> Result<Vec<DocumentStatus>> {
        Ok(keys.iter().map(|k| DocumentStatus::ok(*k)).collect())
    }

    async fn search(&self, _index: &str, _query: &Query) -> Result<RawResults> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(RawResults::default())
    }

    async fn document_count(&self, _index: &str) -> Result<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn deadline_expiry_surfaces_as_timeout() {
    let client = SearchClient::builder()
        .schema(hotel_schema())
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .backend(Arc::new(SlowBackend))
        .config(
            ClientConfig::builder()
                .request_timeout(Duration::from_millis(10))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let err = client
        .execute(Query::vector("descriptionVector", query_vector(), 3))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Timeout { .. }));
}
