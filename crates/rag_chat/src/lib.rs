pub mod chat;
pub mod embeddings;
pub mod ingest;
pub mod llm;
pub mod model;
pub mod openai;
pub mod retrieve;
pub mod trace;

pub use chat::ChatService;
pub use model::{ChatOutcome, ConfidenceLevel, RetrievalStatus, VerifiedResponse};
