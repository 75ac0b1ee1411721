use rag_core::error::AppError;

/// Capability interface for embedding vectors. The pipeline depends only on
/// this trait, never on a concrete provider.
pub trait EmbeddingProvider: Send + Sync {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, AppError>;

    /// Order-preserving: output index i embeds input index i.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    fn dimension(&self) -> usize;
}

pub mod mock;
pub mod openai_embed;

pub use mock::MockEmbedder;
pub use openai_embed::OpenAiEmbedder;
