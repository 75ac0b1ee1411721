use std::sync::Arc;

use rag_core::chunking::{clean_text, TextSplitter};
use rag_core::config::Settings;
use rag_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::embeddings::EmbeddingProvider;

/// Bounded slice of a document's text, the unit of embedding and citation.
/// Produced only by the splitter during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub index: u32,
}

/// Chunk paired with its vector and content-addressed id, ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk_id: String,
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    pub document_id: String,
    pub title: String,
    pub filename: String,
    pub chunk_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: String,
    pub chunk_count: u32,
}

/// Storage collaborator that takes ownership of embedded chunks. The core
/// never persists anything itself.
pub trait DocumentSink: Send + Sync {
    fn store_document(
        &self,
        document: &DocumentRecord,
        chunks: &[EmbeddedChunk],
    ) -> Result<(), AppError>;
}

/// Ingestion-time pipeline: normalize, chunk, embed in batches, hand off to
/// the sink. Text extraction from file formats happens upstream; callers
/// supply already-extracted text.
pub struct IngestionService {
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    sink: Arc<dyn DocumentSink>,
}

impl IngestionService {
    pub fn new(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingProvider>,
        sink: Arc<dyn DocumentSink>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            splitter: TextSplitter::new(settings.chunk_size, settings.chunk_overlap)?,
            embedder,
            sink,
        })
    }

    pub fn ingest_text(
        &self,
        filename: &str,
        title: Option<&str>,
        text: &str,
    ) -> Result<IngestReport, AppError> {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Err(AppError::new(
                "INGEST_EMPTY_DOCUMENT",
                "File is empty or contains no readable text",
            )
            .with_details(format!("filename={filename}")));
        }

        let pieces = self.splitter.split(&cleaned);
        if pieces.is_empty() {
            return Err(AppError::new(
                "INGEST_NO_CHUNKS",
                "No text chunks could be extracted from file",
            )
            .with_details(format!("filename={filename}")));
        }

        let embeddings = self.embedder.embed_batch(&pieces)?;
        if embeddings.len() != pieces.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedding count does not match chunk count",
            )
            .with_details(format!(
                "chunks={}; embeddings={}",
                pieces.len(),
                embeddings.len()
            )));
        }

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| default_title(filename));
        let document_id = short_hash(&format!("{filename}\u{0}{cleaned}"));

        let chunks: Vec<EmbeddedChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (content, embedding))| {
                let index = idx as u32;
                EmbeddedChunk {
                    chunk_id: short_hash(&format!("{document_id}\u{0}{index}\u{0}{content}")),
                    chunk: Chunk { content, index },
                    embedding,
                }
            })
            .collect();

        let record = DocumentRecord {
            document_id: document_id.clone(),
            title,
            filename: filename.to_string(),
            chunk_count: chunks.len() as u32,
        };
        self.sink.store_document(&record, &chunks)?;

        Ok(IngestReport {
            document_id,
            chunk_count: record.chunk_count,
        })
    }
}

/// Filename without its final extension.
fn default_title(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..8])
}
