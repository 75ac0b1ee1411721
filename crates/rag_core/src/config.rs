use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Application configuration, constructed once and handed to each component
/// constructor. There is no process-global settings object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    // Chunking
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    // Retrieval
    pub top_k: u32,
    pub similarity_threshold: f32,

    // Draft generation
    pub chat_model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,

    // Adversarial verification
    pub verification_model: String,
    pub verification_temperature: f32,
    pub verification_max_tokens: u32,

    // OpenAI-compatible endpoint
    pub openai_base_url: String,
    pub openai_api_key: String,

    // Ingestion-time embedding batches
    pub embed_batch_size: usize,
    pub embed_batch_pause_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            similarity_threshold: 0.5,
            chat_model: "gpt-5.1".to_string(),
            chat_temperature: 0.3,
            chat_max_tokens: 1000,
            verification_model: "gpt-5.1".to_string(),
            verification_temperature: 0.2,
            verification_max_tokens: 1000,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: String::new(),
            embed_batch_size: 10,
            embed_batch_pause_ms: 500,
        }
    }
}

impl Settings {
    /// Defaults overridden by environment variables where present.
    pub fn from_env() -> Result<Self, AppError> {
        let mut s = Self::default();
        override_parsed("RAG_CHUNK_SIZE", &mut s.chunk_size)?;
        override_parsed("RAG_CHUNK_OVERLAP", &mut s.chunk_overlap)?;
        override_parsed("RAG_TOP_K", &mut s.top_k)?;
        override_parsed("RAG_SIMILARITY_THRESHOLD", &mut s.similarity_threshold)?;
        override_string("RAG_CHAT_MODEL", &mut s.chat_model);
        override_string("RAG_VERIFICATION_MODEL", &mut s.verification_model);
        override_string("RAG_OPENAI_BASE_URL", &mut s.openai_base_url);
        override_string("OPENAI_API_KEY", &mut s.openai_api_key);
        Ok(s)
    }
}

fn override_string(name: &str, slot: &mut String) {
    if let Ok(v) = std::env::var(name) {
        if !v.trim().is_empty() {
            *slot = v;
        }
    }
}

fn override_parsed<T>(name: &str, slot: &mut T) -> Result<(), AppError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Ok(v) = std::env::var(name) {
        *slot = v.trim().parse::<T>().map_err(|e| {
            AppError::config("Malformed numeric environment variable")
                .with_details(format!("var={name}; value={v}; err={e}"))
        })?;
    }
    Ok(())
}
