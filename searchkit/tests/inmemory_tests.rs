//! Property tests for in-memory backend search ordering.

use std::collections::HashMap;

use proptest::prelude::*;
use searchkit::{
    DistanceMetric, Document, FieldSpec, FieldType, IndexSchema, InMemoryBackend, Query,
    SearchBackend, VectorAlgorithm, VectorSearchConfig,
};

const DIM: usize = 16;

fn schema() -> IndexSchema {
    IndexSchema::builder("props")
        .field(FieldSpec::key("id"))
        .field(FieldSpec::new("body", FieldType::String).searchable())
        .field(FieldSpec::vector("embedding", DIM, "profile"))
        .vector_search(VectorSearchConfig::new(
            "profile",
            VectorAlgorithm::Hnsw,
            DistanceMetric::Cosine,
        ))
        .build()
        .unwrap()
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a document with a normalized embedding.
fn arb_document(dim: usize) -> impl Strategy<Value = Document> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, body, embedding)| {
            Document::new().field("id", id).field("body", body).vector("embedding", embedding)
        },
    )
}

mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For any stored corpus, a vector query returns results ordered by
        /// descending similarity score, bounded by K and the corpus size.
        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            documents in proptest::collection::vec(arb_document(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let backend = InMemoryBackend::new();
                backend.create_index(&schema()).await.unwrap();

                // Deduplicate by key to avoid upsert overwriting.
                let mut deduped: HashMap<String, Document> = HashMap::new();
                for document in &documents {
                    let id = document.get_str("id").unwrap().to_string();
                    deduped.entry(id).or_insert_with(|| document.clone());
                }
                let unique: Vec<Document> = deduped.into_values().collect();
                let count = unique.len();

                let statuses = backend.upload("props", &unique).await.unwrap();
                assert!(statuses.iter().all(|s| s.succeeded));

                let raw = backend
                    .search("props", &Query::vector("embedding", query, k))
                    .await
                    .unwrap();
                (raw, count)
            });

            // Result count is at most K and at most the number of stored documents.
            prop_assert!(results.records.len() <= k);
            prop_assert!(results.records.len() <= unique_count);

            // Results are ordered by descending score.
            for window in results.records.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

mod prop_prefilter {
    use super::*;
    use searchkit::Filter;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// A pre-filter matching N documents caps a K-neighbour query at
        /// min(K, N) results.
        #[test]
        fn filter_caps_results_at_matching_count(
            tags in proptest::collection::vec(proptest::bool::ANY, 1..16),
            query in arb_normalized_embedding(DIM),
            k in 1usize..20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (result_count, tagged) = rt.block_on(async {
                let schema = IndexSchema::builder("props")
                    .field(FieldSpec::key("id"))
                    .field(FieldSpec::new("category", FieldType::String).filterable())
                    .field(FieldSpec::vector("embedding", DIM, "profile"))
                    .vector_search(VectorSearchConfig::new(
                        "profile",
                        VectorAlgorithm::Hnsw,
                        DistanceMetric::Cosine,
                    ))
                    .build()
                    .unwrap();
                let backend = InMemoryBackend::new();
                backend.create_index(&schema).await.unwrap();

                let documents: Vec<Document> = tags
                    .iter()
                    .enumerate()
                    .map(|(i, lux)| {
                        let mut v = vec![0.0f32; DIM];
                        v[i % DIM] = 1.0;
                        Document::new()
                            .field("id", format!("d{i}"))
                            .field("category", if *lux { "Luxury" } else { "Budget" })
                            .vector("embedding", v)
                    })
                    .collect();
                backend.upload("props", &documents).await.unwrap();

                let raw = backend
                    .search(
                        "props",
                        &Query::vector("embedding", query, k)
                            .filter(Filter::eq("category", "Luxury")),
                    )
                    .await
                    .unwrap();
                (raw.records.len(), tags.iter().filter(|t| **t).count())
            });

            prop_assert_eq!(result_count, k.min(tagged));
        }
    }
}
