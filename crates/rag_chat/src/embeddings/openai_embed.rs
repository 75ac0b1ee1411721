use std::time::Duration;

use rag_core::config::Settings;
use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::openai::OpenAiClient;

const MODEL: &str = "text-embedding-3-small";
const DIMENSION: usize = 1536;

/// Embedding provider backed by the OpenAI embeddings endpoint. Large inputs
/// are sent in sub-batches with a pause in between to respect rate limits.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    batch_size: usize,
    batch_pause: Duration,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            batch_size: 10,
            batch_pause: Duration::from_millis(500),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            client: OpenAiClient::from_settings(settings)?,
            batch_size: settings.embed_batch_size.max(1),
            batch_pause: Duration::from_millis(settings.embed_batch_pause_ms),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    fn embed_sub_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let req = EmbeddingsRequest {
            model: MODEL,
            input: batch,
        };
        let resp = self
            .client
            .post("/embeddings", Duration::from_secs(30))
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to encode embeddings request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: EmbeddingsResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_EMBEDDINGS_FAILED", "Failed to decode embeddings response")
                        .with_details(e.to_string())
                })?;
                if v.data.len() != batch.len() {
                    return Err(AppError::new(
                        "AI_EMBEDDINGS_FAILED",
                        "Embeddings response count does not match input count",
                    )
                    .with_details(format!("sent={}; got={}", batch.len(), v.data.len())));
                }
                // The endpoint tags each vector with its input index; re-sort
                // so the batch stays order-preserving.
                let mut items = v.data;
                items.sort_by_key(|item| item.index);
                Ok(items.into_iter().map(|item| item.embedding).collect())
            }
            Ok(r) => Err(
                AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to call embeddings endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let out = self.embed_batch(&[text.to_string()])?;
        out.into_iter().next().ok_or_else(|| {
            AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings response was empty")
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut all = Vec::with_capacity(texts.len());
        let mut iter = texts.chunks(self.batch_size).peekable();
        while let Some(batch) = iter.next() {
            all.extend(self.embed_sub_batch(batch)?);
            if iter.peek().is_some() {
                std::thread::sleep(self.batch_pause);
            }
        }
        Ok(all)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}
