use crate::model::{Citation, ConfidenceLevel, DraftAnswer, SourceChunk, VerifiedResponse};

use super::verify::{ReportedLevel, VerificationSignal};

/// How many characters of the draft stand in as the cited statement.
const CITED_STATEMENT_CHARS: usize = 100;

/// How many source chunks back the citation.
const CITED_CHUNKS: usize = 3;

/// Deterministic mapping from a verification signal to the final response.
///
/// Level/score table: HIGH 0.9, MEDIUM 0.6, LOW 0.3; any contradicted
/// statement overrides to LOW 0.2 regardless of the reported level.
///
/// Citation construction is deliberately coarse: one citation per response,
/// the draft's leading characters as the statement, the first three chunks
/// as evidence. The schema supports per-sentence attribution if this is ever
/// refined.
pub fn resolve(
    draft: &DraftAnswer,
    source_chunks: &[SourceChunk],
    signal: &VerificationSignal,
) -> VerifiedResponse {
    let (mut level, mut score) = match signal.reported_level() {
        ReportedLevel::High => (ConfidenceLevel::High, 0.9),
        ReportedLevel::Medium => (ConfidenceLevel::Medium, 0.6),
        ReportedLevel::Low => (ConfidenceLevel::Low, 0.3),
    };

    if !signal.contradicted_statements.is_empty() {
        level = ConfidenceLevel::Low;
        score = 0.2;
    }

    let supported = signal.unsupported_statements.is_empty()
        && signal.contradicted_statements.is_empty();
    let citations = vec![Citation {
        statement: head_chars(&draft.answer_text, CITED_STATEMENT_CHARS),
        source_chunks: source_chunks.iter().take(CITED_CHUNKS).cloned().collect(),
        supported,
    }];

    VerifiedResponse {
        final_text: draft.answer_text.clone(),
        citations,
        confidence_score: score,
        confidence_level: level,
        refusal_reason: None,
        unsupported_claims: signal.unsupported_statements.clone(),
        corrections: signal.corrections.clone(),
    }
}

/// First `n` characters of `s`; the whole string when it is shorter.
fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
