pub mod chunking;
pub mod config;
pub mod error;
