use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaeumConfig {
    pub llm: LlmConfig,
    pub classifier: ClassifierConfig,
    pub voice: VoiceConfig,
    pub storage: StorageConfig,
    pub recommend: RecommendConfig,
    pub conversation: ConversationConfig,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
}

impl MaeumConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: MaeumConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("CLASSIFIER_ENDPOINT") {
            self.classifier.provider = ClassifierProvider::Http;
            self.classifier.endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("MAEUM_DB_PATH") {
            self.storage.db_path = v;
        }
        if let Ok(v) = std::env::var("MAEUM_AUDIO_DIR") {
            self.voice.audio_dir = v;
        }
        if let Ok(v) = std::env::var("MAEUM_MODE_STRATEGY") {
            match v.as_str() {
                "keyword" => self.conversation.mode_strategy = ModeStrategyKind::Keyword,
                "classifier" => self.conversation.mode_strategy = ModeStrategyKind::Classifier,
                "chained" => self.conversation.mode_strategy = ModeStrategyKind::Chained,
                other => tracing::warn!("Ignoring unknown MAEUM_MODE_STRATEGY '{}'", other),
            }
        }
        if let Ok(v) = std::env::var("GOOGLE_CLIENT_ID") {
            self.auth.google_client_id = Some(v);
        }
        if let Ok(v) = std::env::var("GATEWAY_HOST") {
            self.gateway.host = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" (any OpenAI-compatible endpoint) or "mock".
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 400,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierProvider {
    /// Offline keyword lexicon.
    #[default]
    Lexicon,
    /// Remote inference endpoint.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub provider: ClassifierProvider,
    pub endpoint: Option<String>,
    pub threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::Lexicon,
            endpoint: None,
            threshold: crate::emotion::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceProvider {
    Google,
    #[default]
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub provider: VoiceProvider,
    pub language: String,
    pub audio_dir: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            provider: VoiceProvider::None,
            language: "ko-KR".to_string(),
            audio_dir: "generated_audio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "maeum.db".to_string(),
        }
    }
}

/// Ordering of targeted catalog matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// Most recently inserted first.
    #[default]
    Recent,
    Random,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub default_limit: u32,
    pub order: MatchOrder,
    /// Sample randomly when a targeted query finds nothing.
    pub fallback_on_empty: bool,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            order: MatchOrder::Recent,
            fallback_on_empty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeStrategyKind {
    /// Trigger phrases, then the prior mode.
    #[default]
    Keyword,
    /// Forced-choice model call, defaulting to F.
    Classifier,
    /// Trigger phrases, then the model call, then the prior mode.
    Chained,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub mode_strategy: ModeStrategyKind,
    /// Prior turns replayed into each prompt.
    pub history_window: usize,
    /// Prefix the current utterance with an explicit style marker.
    pub tag_style: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            mode_strategy: ModeStrategyKind::Keyword,
            history_window: 10,
            tag_style: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Tokens listed in `auth.tokens`.
    #[default]
    Static,
    /// Google ID tokens verified via the tokeninfo endpoint.
    Google,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub provider: AuthProvider,
    /// token -> user id
    pub tokens: HashMap<String, String>,
    /// Expected `aud` of Google ID tokens; unchecked when absent.
    pub google_client_id: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
