//! Conversation engine: one request/response cycle against the provider

use chatlog_core::config::Config;
use chatlog_core::utils::truncate;
use chatlog_core::TokenUsage;
use chatlog_providers::{ChatOptions, LLMProvider, Message, ProviderError, ProviderResult};
use std::sync::Arc;
use tracing::debug;

use crate::context::SessionContext;

/// Text and usage returned for one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub output: String,
    pub usage: Option<TokenUsage>,
}

/// Sends the session context plus a new input to the completion provider
pub struct ConversationEngine {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    max_context_messages: Option<usize>,
}

impl ConversationEngine {
    /// Create an engine; `model` falls back to the provider default
    pub fn new(provider: Arc<dyn LLMProvider>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| provider.get_default_model());
        Self {
            provider,
            model,
            max_tokens: None,
            temperature: None,
            max_context_messages: None,
        }
    }

    /// Create an engine with the request settings from `config`
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &Config) -> Self {
        Self::new(provider, Some(config.provider.model.clone()))
            .with_max_tokens(config.provider.max_tokens)
            .with_temperature(config.provider.temperature)
            .with_context_limit(config.context.max_messages)
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of prior messages sent per request
    pub fn with_context_limit(mut self, max_messages: Option<usize>) -> Self {
        self.max_context_messages = max_messages;
        self
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the provider to answer `input` in light of `context`.
    ///
    /// The request is built from a copy of the context; `context` itself is
    /// never modified. Recording the exchange is the caller's job.
    pub async fn respond(&self, context: &SessionContext, input: &str) -> ProviderResult<Reply> {
        let mut messages = context.window(self.max_context_messages).to_vec();
        messages.push(Message::user(input));

        debug!(
            "Requesting completion for '{}' with {} messages",
            truncate(input, 60),
            messages.len()
        );

        let options = ChatOptions {
            model: Some(self.model.clone()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.chat(messages, options).await?;

        let output = response.content.ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "reply has no text content (finish reason: {})",
                response.finish_reason
            ))
        })?;

        Ok(Reply {
            output,
            usage: response.usage,
        })
    }
}
