use rag_core::error::AppError;
use serde::Deserialize;

/// Self-reported confidence from the verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedLevel {
    High,
    Medium,
    Low,
}

/// Parsed output of the adversarial verification call. Transient; a
/// default/empty value stands in when the model's output is unparseable.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VerificationSignal {
    #[serde(default)]
    pub supported_statements: Vec<String>,
    #[serde(default)]
    pub unsupported_statements: Vec<String>,
    #[serde(default)]
    pub contradicted_statements: Vec<String>,
    #[serde(default = "default_level_string")]
    pub confidence_level: String,
    #[serde(default)]
    pub corrections: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

fn default_level_string() -> String {
    "MEDIUM".to_string()
}

impl VerificationSignal {
    /// Neutral signal substituted when parsing fails entirely.
    pub fn unparsed() -> Self {
        Self {
            supported_statements: Vec::new(),
            unsupported_statements: Vec::new(),
            contradicted_statements: Vec::new(),
            confidence_level: "MEDIUM".to_string(),
            corrections: Vec::new(),
            explanation: "Verification response could not be parsed".to_string(),
        }
    }

    /// Reported level, case-insensitive, defaulting to MEDIUM for anything
    /// unrecognized.
    pub fn reported_level(&self) -> ReportedLevel {
        match self.confidence_level.trim().to_ascii_uppercase().as_str() {
            "HIGH" => ReportedLevel::High,
            "LOW" => ReportedLevel::Low,
            _ => ReportedLevel::Medium,
        }
    }
}

/// Outcome of the verification stage, explicit at the call site: either a
/// (possibly defaulted) signal, or a degraded state carrying the call error.
#[derive(Debug)]
pub enum VerifyOutcome {
    Verified(VerificationSignal),
    Degraded(AppError),
}

/// Parse the verification completion. Direct JSON first, then a best-effort
/// scan for an embedded JSON object, then the neutral default. Never fails.
pub fn parse_verification(raw: &str) -> VerificationSignal {
    let trimmed = raw.trim();
    if let Ok(signal) = serde_json::from_str::<VerificationSignal>(trimmed) {
        return signal;
    }
    if let Some(embedded) = extract_json_object(trimmed) {
        if let Ok(signal) = serde_json::from_str::<VerificationSignal>(embedded) {
            return signal;
        }
    }
    VerificationSignal::unparsed()
}

/// Widest brace-delimited substring, for completions that wrap their JSON in
/// prose or code fences.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_direct_json() {
        let raw = r#"{"supported_statements": ["a"], "unsupported_statements": [], "contradicted_statements": ["x"], "confidence_level": "HIGH", "corrections": [], "explanation": "ok"}"#;
        let signal = parse_verification(raw);
        assert_eq!(signal.supported_statements, vec!["a".to_string()]);
        assert_eq!(signal.contradicted_statements, vec!["x".to_string()]);
        assert_eq!(signal.reported_level(), ReportedLevel::High);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = "Here is my audit:\n```json\n{\"confidence_level\": \"LOW\", \"unsupported_statements\": [\"claim\"]}\n```\nDone.";
        let signal = parse_verification(raw);
        assert_eq!(signal.reported_level(), ReportedLevel::Low);
        assert_eq!(signal.unsupported_statements, vec!["claim".to_string()]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let signal = parse_verification("{}");
        assert_eq!(signal.reported_level(), ReportedLevel::Medium);
        assert!(signal.supported_statements.is_empty());
        assert!(signal.contradicted_statements.is_empty());
    }

    #[test]
    fn garbage_degrades_to_neutral_default() {
        let signal = parse_verification("I refuse to emit JSON today.");
        assert_eq!(signal, VerificationSignal::unparsed());
        assert_eq!(signal.reported_level(), ReportedLevel::Medium);
    }

    #[test]
    fn unknown_level_maps_to_medium() {
        let signal = parse_verification(r#"{"confidence_level": "BANANAS"}"#);
        assert_eq!(signal.reported_level(), ReportedLevel::Medium);
    }

    #[test]
    fn level_parse_is_case_insensitive() {
        let signal = parse_verification(r#"{"confidence_level": "high"}"#);
        assert_eq!(signal.reported_level(), ReportedLevel::High);
    }
}
