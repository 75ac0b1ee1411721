use std::sync::RwLock;

use rag_core::error::AppError;

use super::similarity;
use super::{RetrievalBackend, RetrievedCandidate};
use crate::ingest::{DocumentRecord, DocumentSink, EmbeddedChunk};

#[derive(Debug, Clone)]
struct Entry {
    chunk_id: String,
    document_id: String,
    document_title: String,
    document_filename: String,
    content: String,
    chunk_index: u32,
    vector: Vec<f32>,
}

/// Brute-force cosine index held in memory.
///
/// Serves as the retrieval backend for small corpora and as the storage
/// collaborator in tests. Reads are lock-free between each other; ingestion
/// takes the write lock.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSink for MemoryIndex {
    fn store_document(
        &self,
        document: &DocumentRecord,
        chunks: &[EmbeddedChunk],
    ) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| {
            AppError::new("AI_INDEX_POISONED", "Memory index lock was poisoned")
        })?;
        for c in chunks {
            entries.push(Entry {
                chunk_id: c.chunk_id.clone(),
                document_id: document.document_id.clone(),
                document_title: document.title.clone(),
                document_filename: document.filename.clone(),
                content: c.chunk.content.clone(),
                chunk_index: c.chunk.index,
                vector: c.embedding.clone(),
            });
        }
        Ok(())
    }
}

impl RetrievalBackend for MemoryIndex {
    fn search(
        &self,
        query_vector: &[f32],
        top_k: u32,
        document_filter: Option<&[String]>,
    ) -> Result<Vec<RetrievedCandidate>, AppError> {
        let qnorm = similarity::l2_norm(query_vector);
        if qnorm == 0.0 {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }

        let entries = self.entries.read().map_err(|_| {
            AppError::new("AI_INDEX_POISONED", "Memory index lock was poisoned")
        })?;

        let mut scored: Vec<(f32, &Entry)> = Vec::new();
        for entry in entries.iter() {
            if entry.vector.len() != query_vector.len() {
                return Err(AppError::new(
                    "AI_RETRIEVAL_FAILED",
                    "Index vector dims do not match query dims",
                )
                .with_details(format!(
                    "chunk_id={}; index_dims={}; query_dims={}",
                    entry.chunk_id,
                    entry.vector.len(),
                    query_vector.len()
                )));
            }
            if let Some(filter) = document_filter {
                if !filter.iter().any(|d| d == &entry.document_id) {
                    continue;
                }
            }
            let vnorm = similarity::l2_norm(&entry.vector);
            if vnorm == 0.0 {
                continue;
            }
            let cos = similarity::cosine_similarity(query_vector, &entry.vector, qnorm, vnorm);
            // Scores on the wire live in [0, 1].
            scored.push((cos.clamp(0.0, 1.0), entry));
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.chunk_id.cmp(&b.1.chunk_id))
        });
        scored.truncate(top_k as usize);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| RetrievedCandidate {
                chunk_id: entry.chunk_id.clone(),
                document_id: entry.document_id.clone(),
                document_title: entry.document_title.clone(),
                document_filename: entry.document_filename.clone(),
                content: entry.content.clone(),
                similarity_score: score,
                chunk_index: entry.chunk_index,
            })
            .collect())
    }
}
