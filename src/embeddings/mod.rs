// Embeddings module
// Text normalization, chunking and the embedding provider boundary

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, TextChunks, chunk_text, normalize_text, prepare_chunks};
pub use ollama::OllamaClient;

use crate::{DocQaError, Result};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be deterministic (same text, same vector) and return
/// exactly one vector per input. Failures surface as
/// [`DocQaError::EmbeddingUnavailable`] with no partial results.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query
    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()])?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(DocQaError::EmbeddingUnavailable(
                "provider did not return exactly one vector for the query".to_string(),
            )),
        }
    }
}
