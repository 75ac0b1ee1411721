use std::time::Duration;

use rag_core::config::Settings;
use rag_core::error::AppError;

/// Shared client for an OpenAI-compatible HTTP endpoint. Holds no
/// connection state, so clones are cheap and concurrent use is safe.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::new(
                "AI_CONFIG_INVALID",
                "OpenAI base URL must be an http(s) URL",
            )
            .with_details(format!("base_url={base_url}")));
        }
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Self::new(&settings.openai_base_url, &settings.openai_api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST request builder with auth header and timeout applied.
    pub(crate) fn post(&self, path: &str, timeout: Duration) -> ureq::Request {
        ureq::post(&format!("{}{}", self.base_url, path))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(OpenAiClient::new("https://api.openai.com/v1", "k").is_ok());
        assert!(OpenAiClient::new("http://127.0.0.1:8080/v1", "k").is_ok());
        assert!(OpenAiClient::new("ftp://api.openai.com", "k").is_err());
        assert!(OpenAiClient::new("", "k").is_err());
    }

    #[test]
    fn trims_trailing_slash() {
        let c = OpenAiClient::new("https://api.openai.com/v1/", "k").unwrap();
        assert_eq!(c.base_url(), "https://api.openai.com/v1");
    }
}
