use std::sync::Arc;

use rag_core::config::Settings;
use rag_core::error::AppError;

use crate::embeddings::EmbeddingProvider;
use crate::llm::CompletionProvider;
use crate::model::{
    ChatOutcome, ConfidenceLevel, DraftAnswer, SafeResponse, SourceChunk, VerifiedResponse,
};
use crate::retrieve::{classify, RetrievalBackend, RetrievalOutcome, RetrievedCandidate};
use crate::trace::{NoopTrace, Trace};

pub mod confidence;
pub mod prompts;
pub mod verify;

use verify::{parse_verification, VerifyOutcome};

/// How much of each chunk the verification pass gets to see.
const VERIFICATION_CHUNK_CHARS: usize = 500;

/// Three-stage answer pipeline: Retrieve, Draft, Verify.
///
/// Holds no mutable state; a single instance serves concurrent requests.
/// Each stage is traced in its own span, and every failure is mapped to a
/// deterministic outcome: retrieval problems become safe refusals, draft
/// failures propagate as errors, verification problems degrade.
pub struct ChatService {
    settings: Settings,
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn RetrievalBackend>,
    llm: Arc<dyn CompletionProvider>,
    trace: Arc<dyn Trace>,
}

impl ChatService {
    pub fn new(
        settings: Settings,
        embedder: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn RetrievalBackend>,
        llm: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            settings,
            embedder,
            backend,
            llm,
            trace: Arc::new(NoopTrace),
        }
    }

    pub fn with_trace(mut self, trace: Arc<dyn Trace>) -> Self {
        self.trace = trace;
        self
    }

    /// Run the pipeline with the configured top_k and threshold.
    pub fn chat(&self, query: &str) -> Result<ChatOutcome, AppError> {
        self.chat_with(query, self.settings.top_k, self.settings.similarity_threshold)
    }

    /// Run the pipeline. The only error that crosses this boundary is a
    /// draft-generation failure; everything else returns a well-formed
    /// outcome.
    pub fn chat_with(
        &self,
        query: &str,
        top_k: u32,
        similarity_threshold: f32,
    ) -> Result<ChatOutcome, AppError> {
        let query = query.trim();
        let mut root = self
            .trace
            .open_span("chat_request", &[("query", query.to_string())]);
        let trace_id = root.trace_id();

        let outcome = self.retrieve_with_fallback(query, top_k, similarity_threshold);
        let outcome_status = outcome.status();
        let source_chunks = match outcome {
            RetrievalOutcome::Failed { reason } => {
                // Short-circuit: no draft or verification call without
                // evidence.
                root.set_attribute("retrieval_status", "failed");
                let response =
                    SafeResponse::new(format!("Retrieval failed: {reason}")).into_verified();
                root.finish_error(reason);
                return Ok(ChatOutcome {
                    query: query.to_string(),
                    response,
                    trace_id,
                    retrieval_status: outcome_status,
                });
            }
            RetrievalOutcome::Partial(chunks) | RetrievalOutcome::Success(chunks) => chunks,
        };

        let draft = match self.generate_draft(query, &source_chunks) {
            Ok(draft) => draft,
            Err(e) => {
                root.finish_error(e.to_string());
                return Err(e);
            }
        };

        let response = self.verify_answer(&draft, &source_chunks);

        root.set_attribute("retrieval_status", outcome_status.as_str());
        root.set_attribute("confidence_level", response.confidence_level.as_str());
        root.finish_ok();

        Ok(ChatOutcome {
            query: query.to_string(),
            response,
            trace_id,
            retrieval_status: outcome_status,
        })
    }

    /// Retrieval stage. Collaborator errors are absorbed into a failed
    /// outcome rather than propagated; the caller decides what a failure
    /// means.
    fn retrieve_with_fallback(
        &self,
        query: &str,
        top_k: u32,
        similarity_threshold: f32,
    ) -> RetrievalOutcome {
        let mut span = self.trace.open_span(
            "retrieval",
            &[
                ("query", query.to_string()),
                ("top_k", top_k.to_string()),
            ],
        );

        match self.run_retrieval(query, top_k) {
            Ok(candidates) => {
                let total = candidates.len();
                let outcome = classify(candidates, similarity_threshold);
                span.record_event(
                    "retrieval_complete",
                    &[
                        ("total_results", total.to_string()),
                        ("filtered_results", outcome.surviving_count().to_string()),
                        ("threshold", similarity_threshold.to_string()),
                    ],
                );
                span.set_attribute("result_count", outcome.surviving_count().to_string());
                match &outcome {
                    RetrievalOutcome::Failed { .. } => {
                        span.finish_error("No results above threshold");
                    }
                    _ => span.finish_ok(),
                }
                outcome
            }
            Err(e) => {
                span.record_event("retrieval_error", &[("error", e.to_string())]);
                span.finish_error(e.to_string());
                RetrievalOutcome::Failed {
                    reason: format!("Retrieval error: {e}"),
                }
            }
        }
    }

    fn run_retrieval(
        &self,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<RetrievedCandidate>, AppError> {
        if query.is_empty() {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query must not be empty",
            ));
        }
        let query_vector = self.embedder.embed_text(query)?;
        self.backend.search(&query_vector, top_k, None)
    }

    /// Draft stage. A completion failure here is fatal: there is no
    /// trustworthy partial artifact to fall back to.
    fn generate_draft(
        &self,
        query: &str,
        source_chunks: &[SourceChunk],
    ) -> Result<DraftAnswer, AppError> {
        let mut span = self
            .trace
            .open_span("draft_generation", &[("query", query.to_string())]);

        let context = format_context(source_chunks);
        let prompt = prompts::draft_prompt(&context, query);

        match self.llm.complete(
            prompts::DRAFT_SYSTEM_PROMPT,
            &prompt,
            self.settings.chat_temperature,
            self.settings.chat_max_tokens,
        ) {
            Ok(completion) => {
                span.record_event(
                    "generation_complete",
                    &[("token_usage", completion.total_tokens.to_string())],
                );
                span.finish_ok();
                Ok(DraftAnswer {
                    answer_text: completion.text.trim().to_string(),
                    reasoning: "Generated from retrieved context chunks".to_string(),
                    source_chunks: source_chunks.to_vec(),
                })
            }
            Err(e) => {
                span.record_event("generation_error", &[("error", e.to_string())]);
                span.finish_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Verification stage. Never fatal: a call failure degrades to a
    /// medium-confidence response carrying the unverified draft, and an
    /// unparseable completion degrades to a neutral signal.
    fn verify_answer(
        &self,
        draft: &DraftAnswer,
        source_chunks: &[SourceChunk],
    ) -> VerifiedResponse {
        let mut span = self.trace.open_span("verification_check", &[]);

        let chunks_summary = format_chunks_for_verification(source_chunks);
        let prompt = prompts::verification_prompt(&chunks_summary, &draft.answer_text);

        let outcome = match self.llm.complete(
            prompts::VERIFICATION_SYSTEM_PROMPT,
            &prompt,
            self.settings.verification_temperature,
            self.settings.verification_max_tokens,
        ) {
            Ok(completion) => VerifyOutcome::Verified(parse_verification(&completion.text)),
            Err(e) => VerifyOutcome::Degraded(e),
        };

        match outcome {
            VerifyOutcome::Verified(signal) => {
                span.record_event(
                    "verification_complete",
                    &[
                        (
                            "unsupported_count",
                            signal.unsupported_statements.len().to_string(),
                        ),
                        ("confidence_level", signal.confidence_level.clone()),
                    ],
                );
                let response = confidence::resolve(draft, source_chunks, &signal);
                span.set_attribute("confidence_level", response.confidence_level.as_str());
                span.finish_ok();
                response
            }
            VerifyOutcome::Degraded(e) => {
                span.record_event("verification_error", &[("error", e.to_string())]);
                span.finish_error(e.to_string());
                VerifiedResponse {
                    final_text: draft.answer_text.clone(),
                    citations: Vec::new(),
                    confidence_score: 0.4,
                    confidence_level: ConfidenceLevel::Medium,
                    refusal_reason: Some(format!("Verification error: {e}")),
                    unsupported_claims: Vec::new(),
                    corrections: Vec::new(),
                }
            }
        }
    }
}

/// Context block for drafting, one numbered section per chunk.
fn format_context(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Chunk {} from {}]\n{}\n",
                i + 1,
                chunk.document_filename,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncated chunk rendering for the verification prompt.
fn format_chunks_for_verification(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "Chunk {} (from {}):\n{}...",
                i + 1,
                chunk.document_filename,
                head_chars(&chunk.content, VERIFICATION_CHUNK_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, filename: &str, content: &str) -> SourceChunk {
        SourceChunk {
            chunk_id: id.to_string(),
            document_id: "doc".to_string(),
            document_filename: filename.to_string(),
            document_title: "doc".to_string(),
            content: content.to_string(),
            similarity_score: 0.9,
            chunk_index: 0,
        }
    }

    #[test]
    fn context_renders_numbered_chunks_with_filenames() {
        let chunks = vec![
            chunk("c1", "a.txt", "alpha"),
            chunk("c2", "b.txt", "beta"),
        ];
        let ctx = format_context(&chunks);
        assert_eq!(ctx, "[Chunk 1 from a.txt]\nalpha\n\n[Chunk 2 from b.txt]\nbeta\n");
    }

    #[test]
    fn verification_rendering_truncates_to_500_chars() {
        let long = "z".repeat(800);
        let rendered = format_chunks_for_verification(&[chunk("c1", "a.txt", &long)]);
        assert!(rendered.starts_with("Chunk 1 (from a.txt):\n"));
        assert!(rendered.ends_with("..."));
        let body = rendered
            .trim_start_matches("Chunk 1 (from a.txt):\n")
            .trim_end_matches("...");
        assert_eq!(body.chars().count(), 500);
    }
}
