//! Wiring: turn a loaded config into live services.

use anyhow::{Context, Result};
use maeum_core::config::{
    AuthConfig, AuthProvider, ClassifierConfig, ClassifierProvider, LlmConfig, MaeumConfig,
    VoiceProvider,
};
use maeum_core::{EmotionClassifier, IdentityVerifier, LexiconClassifier};
use maeum_gateway::{AppState, GoogleTokenVerifier, StaticTokenVerifier};
use maeum_memory::{CatalogMatcher, SqliteStore};
use maeum_reasoning::llm::{CompletionParams, LlmClient};
use maeum_reasoning::providers::{MockProvider, OpenAiClient};
use maeum_reasoning::{
    ConversationSession, DiaryJournal, HttpEmotionClassifier, ModeDetector, PromptAssembler,
};
use maeum_voice::{AudioStore, GoogleCloudVoice};
use std::sync::Arc;

pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::from_config(config)?)),
        "mock" => Ok(Arc::new(MockProvider::new(&config.model))),
        other => anyhow::bail!("Unknown LLM provider '{}' (expected openai or mock)", other),
    }
}

pub fn build_classifier(config: &ClassifierConfig) -> Result<Arc<dyn EmotionClassifier>> {
    match config.provider {
        ClassifierProvider::Lexicon => Ok(Arc::new(LexiconClassifier::new(config.threshold))),
        ClassifierProvider::Http => {
            let endpoint = config
                .endpoint
                .as_deref()
                .context("classifier.endpoint is required for the http classifier")?;
            Ok(Arc::new(HttpEmotionClassifier::new(endpoint, config.threshold)?))
        }
    }
}

pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn IdentityVerifier>> {
    match config.provider {
        AuthProvider::Static => {
            if config.tokens.is_empty() {
                tracing::warn!("No auth.tokens configured; every diary request will be refused");
            }
            Ok(Arc::new(StaticTokenVerifier::new(config.tokens.clone())))
        }
        AuthProvider::Google => Ok(Arc::new(GoogleTokenVerifier::new(
            config.google_client_id.clone(),
        )?)),
    }
}

/// Everything the subcommands share.
pub struct Services {
    pub store: Arc<SqliteStore>,
    pub journal: DiaryJournal,
    pub session: Arc<ConversationSession>,
    pub audio: Option<AudioStore>,
}

impl Services {
    /// Storage and catalog only; no model clients are constructed.
    pub async fn open_store(config: &MaeumConfig) -> Result<Arc<SqliteStore>> {
        tracing::info!("Opening database at {}", config.storage.db_path);
        Ok(Arc::new(SqliteStore::new(&config.storage.db_path).await?))
    }

    pub fn matcher(store: &Arc<SqliteStore>, config: &MaeumConfig) -> CatalogMatcher {
        CatalogMatcher::new(store.clone(), config.recommend.clone())
    }

    pub async fn build(config: &MaeumConfig) -> Result<Self> {
        let store = Self::open_store(config).await?;
        let classifier = build_classifier(&config.classifier)?;
        let journal = DiaryJournal::new(store.clone(), classifier, Self::matcher(&store, config));

        let llm = build_llm(&config.llm)?;
        tracing::info!(
            "Conversation model {} with {:?} mode detection",
            llm.model_name(),
            config.conversation.mode_strategy
        );
        let detector = ModeDetector::from_kind(config.conversation.mode_strategy, llm.clone());
        let assembler = PromptAssembler::new(
            config.conversation.history_window,
            config.conversation.tag_style,
        );
        let mut session = ConversationSession::new(
            llm,
            CompletionParams::from_config(&config.llm),
            detector,
            assembler,
        )
        .with_store(store.clone());

        let mut audio = None;
        match config.voice.provider {
            VoiceProvider::Google => {
                let voice = Arc::new(GoogleCloudVoice::from_env(config.voice.language.clone())?);
                let store = AudioStore::open(&config.voice.audio_dir).await?;
                tracing::info!("Synthesized replies are stored in {}", store.dir().display());
                session = session
                    .with_speech_to_text(voice.clone())
                    .with_text_to_speech(voice, store.clone());
                audio = Some(store);
            }
            VoiceProvider::None => tracing::info!("Voice disabled; audio chat is unavailable"),
        }

        Ok(Self {
            store,
            journal,
            session: Arc::new(session),
            audio,
        })
    }

    pub fn into_app_state(self, verifier: Arc<dyn IdentityVerifier>) -> AppState {
        AppState {
            journal: self.journal,
            session: self.session,
            verifier,
            audio: self.audio,
        }
    }
}
