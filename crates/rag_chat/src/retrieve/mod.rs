use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::model::{RetrievalStatus, SourceChunk};

pub mod memory;
pub mod similarity;

pub use memory::MemoryIndex;

/// Ranked search result produced by a retrieval backend, not yet validated
/// against the similarity threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedCandidate {
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub document_filename: String,
    pub content: String,
    pub similarity_score: f32,
    pub chunk_index: u32,
}

impl From<RetrievedCandidate> for SourceChunk {
    fn from(c: RetrievedCandidate) -> Self {
        SourceChunk {
            chunk_id: c.chunk_id,
            document_id: c.document_id,
            document_filename: c.document_filename,
            document_title: c.document_title,
            content: c.content,
            similarity_score: c.similarity_score,
            chunk_index: c.chunk_index,
        }
    }
}

/// Similarity search collaborator. Results come back ranked by descending
/// similarity; ranking is the backend's responsibility alone.
pub trait RetrievalBackend: Send + Sync {
    fn search(
        &self,
        query_vector: &[f32],
        top_k: u32,
        document_filter: Option<&[String]>,
    ) -> Result<Vec<RetrievedCandidate>, AppError>;
}

/// Classified retrieval result. The variant makes the outcome explicit at
/// every call site instead of hiding it in a status string.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Failed { reason: String },
    Partial(Vec<SourceChunk>),
    Success(Vec<SourceChunk>),
}

impl RetrievalOutcome {
    pub fn status(&self) -> RetrievalStatus {
        match self {
            RetrievalOutcome::Failed { .. } => RetrievalStatus::Failed,
            RetrievalOutcome::Partial(_) => RetrievalStatus::Partial,
            RetrievalOutcome::Success(_) => RetrievalStatus::Success,
        }
    }

    pub fn surviving_count(&self) -> usize {
        match self {
            RetrievalOutcome::Failed { .. } => 0,
            RetrievalOutcome::Partial(chunks) | RetrievalOutcome::Success(chunks) => chunks.len(),
        }
    }
}

/// Drop every candidate below the threshold and classify what remains.
/// Candidates are never reordered: 0 survivors fail, 1-2 are partial,
/// 3 or more are a success.
pub fn classify(candidates: Vec<RetrievedCandidate>, similarity_threshold: f32) -> RetrievalOutcome {
    let kept: Vec<SourceChunk> = candidates
        .into_iter()
        .filter(|c| c.similarity_score >= similarity_threshold)
        .map(SourceChunk::from)
        .collect();

    match kept.len() {
        0 => RetrievalOutcome::Failed {
            reason: "No relevant documents found".to_string(),
        },
        1 | 2 => RetrievalOutcome::Partial(kept),
        _ => RetrievalOutcome::Success(kept),
    }
}
