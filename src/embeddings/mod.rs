// Embeddings module
// Converts text into fixed-dimension vectors via a local Ollama instance

pub mod ollama;

pub use ollama::{EmbeddingClient, ModelInfo};

use anyhow::Result;

/// Pluggable text-to-vector capability consumed by the regulation index.
///
/// All vectors produced by one provider must share a dimension; the index
/// enforces this at build and query time.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
