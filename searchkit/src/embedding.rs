//! Embedding provider trait for converting text into fixed-length vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap hosted embedding endpoints behind a unified async
/// interface. One outbound call per invocation, no caching: identical text is
/// re-embedded every time, and no retry is built in — callers needing either
/// must wrap the provider externally.
///
/// The contract every implementation upholds:
///
/// - empty input text fails with [`SearchError::InvalidInput`](crate::SearchError::InvalidInput)
///   before any network call
/// - a response whose length disagrees with [`dimensions`](EmbeddingProvider::dimensions)
///   fails with [`SearchError::DimensionMismatch`](crate::SearchError::DimensionMismatch)
/// - network or auth failures surface as
///   [`SearchError::ProviderUnavailable`](crate::SearchError::ProviderUnavailable)
///
/// # Example
///
/// ```rust,ignore
/// use searchkit::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the fixed dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
