//! Emotion classification through a remote inference endpoint.

use crate::retry::{send_with_retry, RetryPolicy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use maeum_core::{ClassificationResult, EmotionClassifier, EmotionLabel};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Inference servers answer either a flat list or a batch of one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoresPayload {
    Flat(Vec<LabelScore>),
    Batched(Vec<Vec<LabelScore>>),
}

impl ScoresPayload {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Flat(scores) => scores,
            Self::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
        }
    }
}

/// POSTs `{"inputs": text}` and normalizes the returned `(label, score)` list.
#[derive(Debug, Clone)]
pub struct HttpEmotionClassifier {
    client: Client,
    endpoint: String,
    threshold: f32,
    retry: RetryPolicy,
}

impl HttpEmotionClassifier {
    pub fn new(endpoint: impl Into<String>, threshold: f32) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            endpoint: endpoint.into(),
            threshold,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Servers without an `id2label` table answer `LABEL_<n>`, where `n` is the
/// model's output index.
fn resolve_label(raw: &str) -> &str {
    raw.strip_prefix("LABEL_")
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(EmotionLabel::from_index)
        .map_or(raw, |label| label.as_str())
}

fn normalize(payload: ScoresPayload, threshold: f32) -> ClassificationResult {
    let scores = payload.into_scores();
    ClassificationResult::from_scores(
        scores.iter().map(|s| (resolve_label(&s.label), s.score)),
        threshold,
    )
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let payload = json!({ "inputs": text });
        let response = send_with_retry(&self.retry, "Emotion classifier", || {
            self.client.post(&self.endpoint).json(&payload)
        })
        .await?;

        let scores: ScoresPayload = response
            .json()
            .await
            .context("Failed to parse emotion classifier response")?;
        Ok(normalize(scores, self.threshold))
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}
