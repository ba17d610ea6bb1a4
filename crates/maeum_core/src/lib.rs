pub mod config;
pub mod content;
pub mod conversation;
pub mod emotion;
pub mod error;
pub mod grouping;
pub mod lexicon;
pub mod mode;
pub mod tags;

pub use content::{
    AllRecommendations, Category, ContentItem, GroupedRecommendations, NewContentItem,
    Recommendation,
};
pub use conversation::{ConversationHistory, ConversationTurn};
pub use emotion::{Classification, ClassificationResult, EmotionLabel, UNKNOWN_LABEL};
pub use error::CoreError;
pub use grouping::CoarseBucket;
pub use lexicon::LexiconClassifier;
pub use mode::Mode;
pub use tags::EmotionTags;

use async_trait::async_trait;

/// Maps free text onto the emotion vocabulary.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<ClassificationResult>;

    fn provider_name(&self) -> &'static str;
}

/// Resolves a bearer token to a stable user id (an email address in practice).
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<String>;
}
