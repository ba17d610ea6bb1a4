//! T/F response-style detection.
//!
//! A [`ModeDetector`] asks an ordered list of strategies in turn; the first
//! one with an opinion wins. When none has one, the terminal default applies:
//! either the prior turn's mode or a fixed mode. Detection never fails.

use crate::api_types::ChatMessage;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts::MODE_CLASSIFIER_PROMPT;
use async_trait::async_trait;
use maeum_core::config::ModeStrategyKind;
use maeum_core::{ConversationHistory, Mode};
use std::sync::Arc;

// ============================================================================
// ModeStrategy trait
// ============================================================================

#[async_trait]
pub trait ModeStrategy: Send + Sync {
    /// Return a mode, or `None` to pass to the next strategy.
    async fn detect(&self, utterance: &str, history: &ConversationHistory) -> Option<Mode>;

    /// Name for logging.
    fn name(&self) -> &'static str;
}

// ============================================================================
// Keyword strategy
// ============================================================================

pub const RATIONAL_TRIGGERS: &[&str] = &[
    "이성적으로",
    "논리적으로",
    "냉정하게",
    "rationally",
    "logically",
    "coldly",
];

pub const EMPATHY_TRIGGERS: &[&str] = &[
    "공감",
    "감성적으로",
    "위로",
    "empathize",
    "emotionally",
    "comfort me",
];

/// Trigger-phrase matching on the lower-cased utterance. Rational triggers
/// are checked first.
#[derive(Debug, Clone)]
pub struct KeywordStrategy {
    rational: Vec<String>,
    empathetic: Vec<String>,
}

impl Default for KeywordStrategy {
    fn default() -> Self {
        Self::new(RATIONAL_TRIGGERS, EMPATHY_TRIGGERS)
    }
}

impl KeywordStrategy {
    pub fn new(rational: &[&str], empathetic: &[&str]) -> Self {
        Self {
            rational: rational.iter().map(|t| t.to_lowercase()).collect(),
            empathetic: empathetic.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn classify(&self, utterance: &str) -> Option<Mode> {
        let lowered = utterance.to_lowercase();
        if self.rational.iter().any(|t| lowered.contains(t.as_str())) {
            Some(Mode::T)
        } else if self.empathetic.iter().any(|t| lowered.contains(t.as_str())) {
            Some(Mode::F)
        } else {
            None
        }
    }
}

#[async_trait]
impl ModeStrategy for KeywordStrategy {
    async fn detect(&self, utterance: &str, _history: &ConversationHistory) -> Option<Mode> {
        self.classify(utterance)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

// ============================================================================
// Classifier strategy
// ============================================================================

/// One forced-choice completion restricted to `T` or `F`.
///
/// Any other reply reads as `F`. A failed call has no opinion, so the
/// detector's terminal default decides.
pub struct ClassifierStrategy {
    llm: Arc<dyn LlmClient>,
}

impl ClassifierStrategy {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ModeStrategy for ClassifierStrategy {
    async fn detect(&self, utterance: &str, _history: &ConversationHistory) -> Option<Mode> {
        let messages = [
            ChatMessage::system(MODE_CLASSIFIER_PROMPT),
            ChatMessage::user(utterance),
        ];
        match self
            .llm
            .complete(&messages, CompletionParams::forced_choice())
            .await
        {
            Ok(reply) => Some(Mode::from_reply(&reply).unwrap_or_else(|| {
                tracing::debug!("Mode classifier replied {:?}; defaulting to F", reply);
                Mode::F
            })),
            Err(e) => {
                tracing::warn!("Mode classifier call failed: {:#}", e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "classifier"
    }
}

// ============================================================================
// ModeDetector
// ============================================================================

/// What applies when no strategy has an opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalDefault {
    /// Keep the previous turn's mode.
    PriorMode,
    Fixed(Mode),
}

pub struct ModeDetector {
    strategies: Vec<Box<dyn ModeStrategy>>,
    terminal: TerminalDefault,
}

impl ModeDetector {
    pub fn new(terminal: TerminalDefault) -> Self {
        Self {
            strategies: Vec::new(),
            terminal,
        }
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn ModeStrategy>) {
        self.strategies.push(strategy);
    }

    /// Keyword triggers, else the prior mode.
    pub fn keyword() -> Self {
        let mut detector = Self::new(TerminalDefault::PriorMode);
        detector.add_strategy(Box::new(KeywordStrategy::default()));
        detector
    }

    /// The model call alone; prior mode is ignored and the default is `F`.
    pub fn classifier(llm: Arc<dyn LlmClient>) -> Self {
        let mut detector = Self::new(TerminalDefault::Fixed(Mode::F));
        detector.add_strategy(Box::new(ClassifierStrategy::new(llm)));
        detector
    }

    /// Keyword triggers, then the model call, then the prior mode.
    pub fn chained(llm: Arc<dyn LlmClient>) -> Self {
        let mut detector = Self::new(TerminalDefault::PriorMode);
        detector.add_strategy(Box::new(KeywordStrategy::default()));
        detector.add_strategy(Box::new(ClassifierStrategy::new(llm)));
        detector
    }

    pub fn from_kind(kind: ModeStrategyKind, llm: Arc<dyn LlmClient>) -> Self {
        match kind {
            ModeStrategyKind::Keyword => Self::keyword(),
            ModeStrategyKind::Classifier => Self::classifier(llm),
            ModeStrategyKind::Chained => Self::chained(llm),
        }
    }

    /// Mode for the current turn.
    pub async fn detect(&self, utterance: &str, prior: Mode, history: &ConversationHistory) -> Mode {
        for strategy in &self.strategies {
            if let Some(mode) = strategy.detect(utterance, history).await {
                tracing::debug!("Mode strategy '{}' chose {}", strategy.name(), mode);
                return mode;
            }
        }
        let mode = match self.terminal {
            TerminalDefault::PriorMode => prior,
            TerminalDefault::Fixed(mode) => mode,
        };
        tracing::debug!("No mode strategy matched; keeping {}", mode);
        mode
    }
}

// ============================================================================
// Tests
// ============================================================================
