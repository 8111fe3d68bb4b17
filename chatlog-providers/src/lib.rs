//! Chat completion provider integrations for chatlog
//!
//! This crate defines the provider abstraction the conversation engine talks
//! to, plus a client for OpenAI-compatible `/chat/completions` endpoints.

pub mod base;
pub mod openai;

pub use base::{
    ChatOptions, LLMProvider, LLMResponse, Message, ProviderError, ProviderResult, Role,
};
pub use openai::OpenAIClient;
