//! OpenAI-compatible HTTP client implementation

use async_trait::async_trait;
use chatlog_core::config::ProviderConfig;
use chatlog_core::TokenUsage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::base::{ChatOptions, LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};

/// Chat completion request format
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Chat completion response format
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    /// Kept whole, including `*_tokens_details` and vendor fields
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible chat completion endpoints
pub struct OpenAIClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    default_model: String,
    extra_headers: HashMap<String, String>,
}

impl OpenAIClient {
    /// Create a new client
    pub fn new(
        api_key: Option<String>,
        api_base: Option<String>,
        default_model: String,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Self {
        let api_base = api_base
            .filter(|base| !base.trim().is_empty())
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Self {
            client: Client::new(),
            api_base,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            default_model,
            extra_headers: extra_headers.unwrap_or_default(),
        }
    }

    /// Create a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            Some(config.api_key.clone()),
            Some(config.api_base.clone()),
            config.model.clone(),
            Some(config.extra_headers.clone()),
        )
    }

    /// Parse the API response into our standard format
    fn parse_response(&self, response: ChatCompletionResponse) -> ProviderResult<LLMResponse> {
        let ChatCompletionResponse { choices, usage } = response;
        let choice = choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        Ok(LLMResponse {
            content: choice.message.content,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }

    fn apply_headers(
        &self,
        mut req_builder: reqwest::RequestBuilder,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));

        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }

        req_builder
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        options: ChatOptions,
    ) -> ProviderResult<LLMResponse> {
        // The credential is only required once a request is actually made.
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::ConfigError(
                "no API key configured; set OPENAI_API_KEY or provider.api_key".to_string(),
            )
        })?;

        let model = options.model.unwrap_or_else(|| self.default_model.clone());
        let request = ChatCompletionRequest {
            model: &model,
            messages: &messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            model,
            messages.len()
        );

        let url = format!("{}/chat/completions", self.api_base);
        let req_builder = self.apply_headers(self.client.post(&url).json(&request), api_key);

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let response_data: ChatCompletionResponse = serde_json::from_str(&body)?;
        self.parse_response(response_data)
    }

    fn get_default_model(&self) -> String {
        self.default_model.clone()
    }
}
