use serde::{Deserialize, Serialize};

/// Fixed fallback sentence returned whenever retrieval cannot supply any
/// usable evidence.
pub const SAFE_FALLBACK_TEXT: &str =
    "I don't know how to answer that question based on the available documents.";

/// Validated retrieval candidate that passed the similarity threshold; the
/// unit cited in final answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub document_filename: String,
    pub document_title: String,
    pub content: String,
    pub similarity_score: f32,
    pub chunk_index: u32,
}

/// Citation linking an answer statement to the chunks supporting it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub statement: String,
    pub source_chunks: Vec<SourceChunk>,
    pub supported: bool,
}

/// Model-generated answer conditioned only on retrieved chunks, not yet
/// audited by the verification pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftAnswer {
    pub answer_text: String,
    pub reasoning: String,
    pub source_chunks: Vec<SourceChunk>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Refusal,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Refusal => "refusal",
        }
    }
}

/// Terminal artifact of one request.
///
/// Invariants: a refusal carries a non-null `refusal_reason` and no
/// citations; every cited chunk originated from the same request's
/// retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifiedResponse {
    pub final_text: String,
    pub citations: Vec<Citation>,
    pub confidence_score: f32,
    pub confidence_level: ConfidenceLevel,
    pub refusal_reason: Option<String>,
    pub unsupported_claims: Vec<String>,
    pub corrections: Vec<String>,
}

/// Safe refusal, convertible into the terminal response shape.
#[derive(Debug, Clone)]
pub struct SafeResponse {
    pub refusal_reason: String,
}

impl SafeResponse {
    pub fn new(refusal_reason: impl Into<String>) -> Self {
        Self {
            refusal_reason: refusal_reason.into(),
        }
    }

    pub fn into_verified(self) -> VerifiedResponse {
        VerifiedResponse {
            final_text: SAFE_FALLBACK_TEXT.to_string(),
            citations: Vec::new(),
            confidence_score: 0.0,
            confidence_level: ConfidenceLevel::Refusal,
            refusal_reason: Some(self.refusal_reason),
            unsupported_claims: Vec::new(),
            corrections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStatus {
    Success,
    Partial,
    Failed,
}

impl RetrievalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStatus::Success => "success",
            RetrievalStatus::Partial => "partial",
            RetrievalStatus::Failed => "failed",
        }
    }
}

/// Wire envelope handed to the (external) API layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatOutcome {
    pub query: String,
    pub response: VerifiedResponse,
    pub trace_id: Option<String>,
    pub retrieval_status: RetrievalStatus,
}
