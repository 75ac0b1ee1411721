use rag_core::error::AppError;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;

/// Deterministic embedding provider for tests and offline runs.
///
/// Vectors are derived from the SHA-256 digest of the input text, so the
/// same text always embeds to the same vector and distinct texts almost
/// always differ.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimension: 1536 }
    }
}

impl EmbeddingProvider for MockEmbedder {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let digest = Sha256::digest(text.as_bytes());
        let mut out = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            let byte = digest[(i / 8) % digest.len()];
            let bit = (byte >> (i % 8)) & 1;
            out.push(bit as f32 * 0.5 + 0.25);
        }
        Ok(out)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
