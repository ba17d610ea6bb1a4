use crate::api_types::ChatMessage;
use anyhow::Result;
use async_trait::async_trait;
use maeum_core::config::LlmConfig;

/// Parameters for one completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 400,
            temperature: 0.7,
        }
    }
}

impl CompletionParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature.clamp(0.0, 2.0),
        }
    }

    /// Settings for single-token forced-choice calls.
    pub fn forced_choice() -> Self {
        Self {
            max_tokens: 1,
            temperature: 0.0,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the messages as-is and return the reply text.
    async fn complete(&self, messages: &[ChatMessage], params: CompletionParams) -> Result<String>;

    fn model_name(&self) -> &str;
}

// Providers available in crate::providers
