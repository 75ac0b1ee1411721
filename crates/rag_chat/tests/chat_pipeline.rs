use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rag_chat::chat::ChatService;
use rag_chat::embeddings::MockEmbedder;
use rag_chat::llm::{Completion, CompletionProvider};
use rag_chat::model::{ConfidenceLevel, RetrievalStatus, SAFE_FALLBACK_TEXT};
use rag_chat::retrieve::{RetrievalBackend, RetrievedCandidate};
use rag_chat::trace::LogTrace;
use rag_core::config::Settings;
use rag_core::error::AppError;

/// Completion provider that plays back a scripted sequence of outcomes, one
/// per call (draft first, then verification).
struct ScriptedLlm {
    outputs: Mutex<VecDeque<Result<String, AppError>>>,
}

impl ScriptedLlm {
    fn new(outputs: Vec<Result<String, AppError>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter().collect()),
        }
    }
}

impl CompletionProvider for ScriptedLlm {
    fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<Completion, AppError> {
        let next = self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected completion call");
        next.map(|text| Completion {
            text,
            total_tokens: 42,
        })
    }
}

struct FixedBackend {
    candidates: Vec<RetrievedCandidate>,
}

impl RetrievalBackend for FixedBackend {
    fn search(
        &self,
        _query_vector: &[f32],
        top_k: u32,
        _document_filter: Option<&[String]>,
    ) -> Result<Vec<RetrievedCandidate>, AppError> {
        let mut out = self.candidates.clone();
        out.truncate(top_k as usize);
        Ok(out)
    }
}

struct FailingBackend;

impl RetrievalBackend for FailingBackend {
    fn search(
        &self,
        _query_vector: &[f32],
        _top_k: u32,
        _document_filter: Option<&[String]>,
    ) -> Result<Vec<RetrievedCandidate>, AppError> {
        Err(AppError::new("AI_RETRIEVAL_FAILED", "search backend exploded"))
    }
}

fn candidate(id: &str, score: f32) -> RetrievedCandidate {
    RetrievedCandidate {
        chunk_id: id.to_string(),
        document_id: "doc-1".to_string(),
        document_title: "Handbook".to_string(),
        document_filename: "handbook.txt".to_string(),
        content: format!("Relevant evidence held by {id}."),
        similarity_score: score,
        chunk_index: 0,
    }
}

fn service(
    candidates: Vec<RetrievedCandidate>,
    outputs: Vec<Result<String, AppError>>,
) -> ChatService {
    ChatService::new(
        Settings::default(),
        Arc::new(MockEmbedder::new(8)),
        Arc::new(FixedBackend { candidates }),
        Arc::new(ScriptedLlm::new(outputs)),
    )
}

fn verification_json(level: &str, unsupported: &[&str], contradicted: &[&str]) -> String {
    serde_json::json!({
        "supported_statements": ["the draft's main claim"],
        "unsupported_statements": unsupported,
        "contradicted_statements": contradicted,
        "confidence_level": level,
        "corrections": [],
        "explanation": "audited against the chunks",
    })
    .to_string()
}

#[test]
fn below_threshold_retrieval_yields_a_safe_refusal() {
    // All candidates at 0.3 against a 0.9 threshold: the draft and
    // verification calls must never happen.
    let svc = service(
        vec![candidate("c1", 0.3), candidate("c2", 0.3), candidate("c3", 0.3)],
        vec![],
    );
    let outcome = svc.chat_with("what does the handbook say?", 5, 0.9).expect("chat");

    assert_eq!(outcome.retrieval_status, RetrievalStatus::Failed);
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Refusal);
    assert_eq!(outcome.response.confidence_score, 0.0);
    assert_eq!(outcome.response.final_text, SAFE_FALLBACK_TEXT);
    assert!(outcome.response.citations.is_empty());
    let reason = outcome.response.refusal_reason.expect("reason");
    assert!(reason.contains("No relevant documents found"));
}

#[test]
fn retrieval_backend_error_also_yields_a_safe_refusal() {
    let svc = ChatService::new(
        Settings::default(),
        Arc::new(MockEmbedder::new(8)),
        Arc::new(FailingBackend),
        Arc::new(ScriptedLlm::new(vec![])),
    );
    let outcome = svc.chat("anything").expect("chat");

    assert_eq!(outcome.retrieval_status, RetrievalStatus::Failed);
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Refusal);
    let reason = outcome.response.refusal_reason.expect("reason");
    assert!(reason.contains("Retrieval error"));
    assert!(reason.contains("search backend exploded"));
}

#[test]
fn blank_query_refuses_instead_of_erroring() {
    let svc = service(vec![candidate("c1", 0.9)], vec![]);
    let outcome = svc.chat("   ").expect("chat");
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Refusal);
    assert!(outcome
        .response
        .refusal_reason
        .expect("reason")
        .contains("Query must not be empty"));
}

#[test]
fn verified_answer_flows_through_all_three_stages() {
    let draft = "The handbook allows remote work on Fridays.";
    let svc = service(
        vec![candidate("c1", 0.95), candidate("c2", 0.88), candidate("c3", 0.81)],
        vec![
            Ok(draft.to_string()),
            Ok(verification_json("HIGH", &[], &[])),
        ],
    );
    let outcome = svc.chat("when is remote work allowed?").expect("chat");

    assert_eq!(outcome.retrieval_status, RetrievalStatus::Success);
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::High);
    assert_eq!(outcome.response.confidence_score, 0.9);
    assert_eq!(outcome.response.final_text, draft);
    assert_eq!(outcome.response.refusal_reason, None);
    assert_eq!(outcome.response.citations.len(), 1);
    let citation = &outcome.response.citations[0];
    assert!(citation.supported);
    assert_eq!(citation.source_chunks.len(), 3);
    assert_eq!(citation.source_chunks[0].chunk_id, "c1");
}

#[test]
fn two_surviving_chunks_report_partial_status() {
    let svc = service(
        vec![candidate("c1", 0.9), candidate("c2", 0.8)],
        vec![
            Ok("An answer.".to_string()),
            Ok(verification_json("MEDIUM", &[], &[])),
        ],
    );
    let outcome = svc.chat("question").expect("chat");
    assert_eq!(outcome.retrieval_status, RetrievalStatus::Partial);
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(outcome.response.confidence_score, 0.6);
}

#[test]
fn contradiction_forces_low_confidence_despite_reported_high() {
    let svc = service(
        vec![candidate("c1", 0.9), candidate("c2", 0.9), candidate("c3", 0.9)],
        vec![
            Ok("A contradicted answer.".to_string()),
            Ok(verification_json("HIGH", &[], &["X"])),
        ],
    );
    let outcome = svc.chat("question").expect("chat");
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Low);
    assert_eq!(outcome.response.confidence_score, 0.2);
    assert!(!outcome.response.citations[0].supported);
}

#[test]
fn draft_failure_is_fatal() {
    let svc = service(
        vec![candidate("c1", 0.9), candidate("c2", 0.9), candidate("c3", 0.9)],
        vec![Err(AppError::new("AI_COMPLETION_FAILED", "model unavailable"))],
    );
    let err = svc.chat("question").expect_err("should propagate");
    assert_eq!(err.code, "AI_COMPLETION_FAILED");
}

#[test]
fn verification_call_failure_degrades_to_medium_with_the_draft() {
    let draft = "Unverified but drafted answer.";
    let svc = service(
        vec![candidate("c1", 0.9), candidate("c2", 0.9), candidate("c3", 0.9)],
        vec![
            Ok(draft.to_string()),
            Err(AppError::new("AI_COMPLETION_FAILED", "verifier timed out")),
        ],
    );
    let outcome = svc.chat("question").expect("chat");

    assert_eq!(outcome.retrieval_status, RetrievalStatus::Success);
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(outcome.response.confidence_score, 0.4);
    assert_eq!(outcome.response.final_text, draft);
    assert!(outcome.response.citations.is_empty());
    let reason = outcome.response.refusal_reason.expect("reason");
    assert!(reason.contains("Verification error"));
    assert!(reason.contains("verifier timed out"));
}

#[test]
fn unparseable_verification_output_degrades_to_neutral_medium() {
    let svc = service(
        vec![candidate("c1", 0.9), candidate("c2", 0.9), candidate("c3", 0.9)],
        vec![
            Ok("An answer.".to_string()),
            Ok("I will not be emitting JSON.".to_string()),
        ],
    );
    let outcome = svc.chat("question").expect("chat");
    assert_eq!(outcome.response.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(outcome.response.confidence_score, 0.6);
    assert_eq!(outcome.response.citations.len(), 1);
    assert!(outcome.response.citations[0].supported);
}

#[test]
fn refusal_wire_shape_uses_lowercase_enums() {
    let svc = service(vec![candidate("c1", 0.1)], vec![]);
    let outcome = svc.chat_with("q", 5, 0.9).expect("chat");
    let json = serde_json::to_value(&outcome).expect("json");

    assert_eq!(json["retrieval_status"], "failed");
    assert_eq!(json["response"]["confidence_level"], "refusal");
    assert_eq!(json["response"]["confidence_score"], 0.0);
    assert_eq!(json["query"], "q");
    assert!(json["response"]["refusal_reason"].is_string());
}

#[test]
fn trace_id_comes_from_the_tracer() {
    let noop = service(vec![candidate("c1", 0.1)], vec![]);
    assert_eq!(noop.chat_with("q", 5, 0.9).expect("chat").trace_id, None);

    let traced = service(vec![candidate("c1", 0.1)], vec![])
        .with_trace(Arc::new(LogTrace::new()));
    assert!(traced.chat_with("q", 5, 0.9).expect("chat").trace_id.is_some());
}
