//! Diary writing: classify, persist, recommend.

use anyhow::Result;
use maeum_core::{AllRecommendations, ClassificationResult, CoreError, EmotionClassifier};
use maeum_memory::{CatalogMatcher, Diary, SqliteStore};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error(transparent)]
    Rejected(#[from] CoreError),
    #[error("emotion classification failed: {0:#}")]
    Classification(#[source] anyhow::Error),
    #[error("failed to save diary: {0:#}")]
    Storage(#[source] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub diary: Diary,
    pub classification: ClassificationResult,
}

#[derive(Clone)]
pub struct DiaryJournal {
    store: Arc<SqliteStore>,
    classifier: Arc<dyn EmotionClassifier>,
    matcher: CatalogMatcher,
}

impl DiaryJournal {
    pub fn new(
        store: Arc<SqliteStore>,
        classifier: Arc<dyn EmotionClassifier>,
        matcher: CatalogMatcher,
    ) -> Self {
        Self {
            store,
            classifier,
            matcher,
        }
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn matcher(&self) -> &CatalogMatcher {
        &self.matcher
    }

    /// Classify without persisting. Empty text is rejected with
    /// [`CoreError::EmptyInput`].
    pub async fn analyze(&self, text: &str) -> Result<ClassificationResult, JournalError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyInput("text").into());
        }
        self.classifier
            .classify(text)
            .await
            .map_err(JournalError::Classification)
    }

    /// Classify and save a diary entry.
    pub async fn write(&self, user_id: &str, text: &str) -> Result<JournalEntry, JournalError> {
        let classification = self.analyze(text).await?;
        let diary = self
            .store
            .create_diary(user_id, text.trim(), &classification)
            .await
            .map_err(JournalError::Storage)?;
        tracing::info!(
            "Diary {} written via {} classifier: {}",
            diary.id,
            self.classifier.provider_name(),
            diary.emotion
        );
        Ok(JournalEntry {
            diary,
            classification,
        })
    }

    /// Recommendations for every category using the diary's label. `None` if
    /// the diary is not the user's.
    pub async fn recommend_for_diary(
        &self,
        user_id: &str,
        diary_id: i64,
    ) -> Result<Option<AllRecommendations>> {
        let Some(diary) = self.store.get_diary(user_id, diary_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.matcher.recommend_all(Some(&diary.emotion)).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maeum_core::config::RecommendConfig;
    use async_trait::async_trait;
    use maeum_core::{EmotionLabel, LexiconClassifier};

    struct DownClassifier;

    #[async_trait]
    impl EmotionClassifier for DownClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
            anyhow::bail!("connection refused")
        }

        fn provider_name(&self) -> &'static str {
            "down"
        }
    }

    async fn journal_with(classifier: Arc<dyn EmotionClassifier>) -> DiaryJournal {
        let store = Arc::new(SqliteStore::new(":memory:").await.unwrap());
        store.seed_sample_catalog().await.unwrap();
        let matcher = CatalogMatcher::new(store.clone(), RecommendConfig::default());
        DiaryJournal::new(store, classifier, matcher)
    }

    async fn journal() -> DiaryJournal {
        journal_with(Arc::new(LexiconClassifier::default())).await
    }

    #[tokio::test]
    async fn test_write_rejects_blank_text() {
        let journal = journal().await;
        let err = journal.write("alice", "   ").await.unwrap_err();
        assert!(matches!(
            err,
            JournalError::Rejected(CoreError::EmptyInput("text"))
        ));
        assert!(journal.store().list_diaries("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classifier_outage_is_not_a_storage_error() {
        let journal = journal_with(Arc::new(DownClassifier)).await;
        let err = journal.write("alice", "오늘은 괜찮았어").await.unwrap_err();
        assert!(matches!(err, JournalError::Classification(_)));
        assert!(err.to_string().contains("connection refused"));
        assert!(journal.store().list_diaries("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_persists_top_label() {
        let journal = journal().await;
        let entry = journal
            .write("alice", "요즘 너무 우울하고 무기력해")
            .await
            .unwrap();
        assert_eq!(entry.diary.emotion_label(), Some(EmotionLabel::Gloom));
        assert_eq!(entry.classification.top_label(), Some(EmotionLabel::Gloom));
        assert_eq!(journal.store().list_diaries("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recommend_for_diary() {
        let journal = journal().await;
        let entry = journal.write("alice", "우울한 하루였다").await.unwrap();

        let recs = journal
            .recommend_for_diary("alice", entry.diary.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recs.emotion, "우울");
        assert!(recs
            .movies
            .iter()
            .all(|m| m.emotion_tags.contains(EmotionLabel::Gloom)));

        assert!(journal
            .recommend_for_diary("bob", entry.diary.id)
            .await
            .unwrap()
            .is_none());
    }
}
