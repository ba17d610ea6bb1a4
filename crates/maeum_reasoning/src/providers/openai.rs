use crate::api_types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::{send_with_retry, RetryPolicy};
use anyhow::{Context, Result};
use maeum_core::config::LlmConfig;
use reqwest::Client;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Build from config; the key comes from `OPENAI_API_KEY`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set for the openai provider")?;
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Self::new(api_key, base_url, &config.model)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], params: CompletionParams) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url);

        let response = send_with_retry(&self.retry, "OpenAI", || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&payload)
        })
        .await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;
        let text = body
            .first_text()
            .filter(|t| !t.is_empty())
            .context("OpenAI returned no content")?;
        tracing::debug!("{} replied with {} chars", self.model, text.chars().count());
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
