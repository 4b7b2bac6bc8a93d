mod remote;

pub use remote::RemoteEmbedder;

use crate::error::EmbeddingError;

/// Trait for embedding generation
///
/// One text in, one vector out. There is no retry at this layer: a failed
/// call surfaces as an [`EmbeddingError`] and the caller decides whether the
/// item is dropped (indexing) or the whole request fails (retrieval).
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimensionality of the vectors this provider returns
    fn dimension(&self) -> usize;

    /// Model name used for embedding generation
    fn model_name(&self) -> &str;
}
