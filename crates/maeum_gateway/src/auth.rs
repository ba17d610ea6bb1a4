//! Bearer-token identity verification.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maeum_core::IdentityVerifier;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Fixed token -> user table, for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn single(token: &str, user_id: &str) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.to_string(), user_id.to_string());
        Self { tokens }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String> {
        self.tokens
            .get(token)
            .cloned()
            .context("Unknown access token")
    }
}

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    aud: Option<String>,
}

/// Google ID tokens checked against the tokeninfo endpoint. The user id is
/// the token's email, or its subject when no email is granted.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: Client,
    endpoint: String,
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            endpoint: TOKENINFO_URL.to_string(),
            client_id,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn user_from_info(info: TokenInfo, client_id: Option<&str>) -> Result<String> {
    if let Some(expected) = client_id {
        if info.aud.as_deref() != Some(expected) {
            anyhow::bail!("Token was issued for a different client");
        }
    }
    Ok(info.email.filter(|e| !e.is_empty()).unwrap_or(info.sub))
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .context("Failed to reach Google tokeninfo")?;
        if !response.status().is_success() {
            anyhow::bail!("Google rejected the token ({})", response.status());
        }
        let info: TokenInfo = response
            .json()
            .await
            .context("Failed to parse tokeninfo response")?;
        user_from_info(info, self.client_id.as_deref())
    }
}
