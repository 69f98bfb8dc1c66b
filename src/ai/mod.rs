//! All AI/LLM functionality

pub mod client;
pub mod prompt;
pub mod provider;

// Re-export main types for convenience
pub use client::LlmClient;
pub use provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderConfig, ProviderKind,
};
