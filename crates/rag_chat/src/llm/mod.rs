use rag_core::error::AppError;

/// Output of one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u32,
}

/// Capability interface for language-model completions, used identically for
/// drafting and verification with different prompts and temperatures.
pub trait CompletionProvider: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, AppError>;
}

pub mod openai_chat;

pub use openai_chat::OpenAiCompletions;
