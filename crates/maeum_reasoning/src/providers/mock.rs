//! Mock LLM provider: deterministic responses for running without API keys.

use crate::api_types::{ChatMessage, Role};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    reply: Option<String>,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            reply: None,
        }
    }

    /// Always answer with `reply`.
    pub fn with_reply(model: &str, reply: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            reply: Some(reply.into()),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(&self, messages: &[ChatMessage], _params: CompletionParams) -> Result<String> {
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!(
            "(Mock {} Response) {}",
            self.model,
            last_user.lines().last().unwrap_or_default()
        ))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
