use std::time::Duration;

use rag_core::config::Settings;
use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionProvider};
use crate::openai::OpenAiClient;

/// Completion provider backed by an OpenAI-compatible chat-completions
/// endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompletions {
    client: OpenAiClient,
    model: String,
}

impl OpenAiCompletions {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self::new(
            OpenAiClient::from_settings(settings)?,
            settings.chat_model.clone(),
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl CompletionProvider for OpenAiCompletions {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, AppError> {
        let req = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let resp = self
            .client
            .post("/chat/completions", Duration::from_secs(60))
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("AI_COMPLETION_FAILED", "Failed to encode completion request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: ChatCompletionsResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_COMPLETION_FAILED", "Failed to decode completion response")
                        .with_details(e.to_string())
                })?;
                let text = v
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(AppError::new(
                        "AI_COMPLETION_FAILED",
                        "Completion response was empty",
                    ));
                }
                Ok(Completion {
                    text,
                    total_tokens: v.usage.map(|u| u.total_tokens).unwrap_or(0),
                })
            }
            Ok(r) => Err(
                AppError::new("AI_COMPLETION_FAILED", "Completion request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(
                AppError::new("AI_COMPLETION_FAILED", "Failed to call completions endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
