use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by every crate in the workspace.
///
/// Codes are stable SCREAMING_SNAKE strings namespaced by area
/// (`CONFIG_*`, `CHUNKING_*`, `INGEST_*`, `AI_*`) so callers can match on
/// them without string-scraping the message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Shorthand for configuration problems caught at construction time.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new("CONFIG_INVALID", message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
