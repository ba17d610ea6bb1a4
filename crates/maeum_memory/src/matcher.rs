//! Emotion-conditioned recommendation over the catalog.
//!
//! Policy, applied the same way on every entry point:
//! - a known label selects rows whose tag string contains it, ordered by the
//!   configured [`MatchOrder`] and capped at the limit;
//! - no label, an out-of-vocabulary label, or (when `fallback_on_empty` is
//!   set) zero matches falls back to a random sample of the category;
//! - unknown categories yield an empty list.

use crate::sqlite::SqliteStore;
use anyhow::Result;
use maeum_core::config::RecommendConfig;
use maeum_core::{
    AllRecommendations, Category, CoarseBucket, ContentItem, CoreError, EmotionLabel,
    GroupedRecommendations, Recommendation,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct CatalogMatcher {
    store: Arc<SqliteStore>,
    config: RecommendConfig,
}

impl CatalogMatcher {
    pub fn new(store: Arc<SqliteStore>, config: RecommendConfig) -> Self {
        Self { store, config }
    }

    pub fn default_limit(&self) -> u32 {
        self.config.default_limit
    }

    /// Up to `limit` items for `emotion`, falling back to random sampling.
    pub async fn recommend(
        &self,
        category: Category,
        emotion: Option<EmotionLabel>,
        limit: u32,
    ) -> Result<Vec<ContentItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(label) = emotion {
            let items = self
                .store
                .fetch_tagged(category, label, limit, self.config.order)
                .await?;
            if !items.is_empty() || !self.config.fallback_on_empty {
                tracing::debug!("{} matched {} item(s) for {}", category, items.len(), label);
                return Ok(items);
            }
            tracing::debug!("No {} tagged {}; sampling randomly", category, label);
        }

        self.store.fetch_random(category, limit).await
    }

    /// String-typed entry point used by the API surface.
    ///
    /// Unknown categories give an empty list and unknown emotions degrade to
    /// unconditioned sampling; neither is an error.
    pub async fn recommend_raw(
        &self,
        category: &str,
        emotion: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Recommendation>> {
        let Some(category) = Category::parse(category) else {
            tracing::debug!("Unknown category '{}'; nothing to recommend", category);
            return Ok(Vec::new());
        };
        self.recommend_shaped(category, emotion, limit).await
    }

    /// Recommendations for a known category from a raw emotion string,
    /// shaped for clients. `limit` defaults to the configured one.
    pub async fn recommend_shaped(
        &self,
        category: Category,
        emotion: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Recommendation>> {
        let label = normalize_emotion(emotion);
        let items = self
            .recommend(category, label, limit.unwrap_or(self.config.default_limit))
            .await?;
        Ok(shape(category, &items))
    }

    /// Recommendations for all four categories. A category whose query fails
    /// comes back empty rather than failing the whole response.
    pub async fn recommend_all(&self, emotion: Option<&str>) -> AllRecommendations {
        let label = normalize_emotion(emotion);
        let mut all = AllRecommendations {
            emotion: label
                .map(|l| l.as_str().to_string())
                .unwrap_or_else(|| "default".to_string()),
            ..Default::default()
        };

        for category in Category::ALL {
            match self
                .recommend(category, label, self.config.default_limit)
                .await
            {
                Ok(items) => *all.slot_mut(category) = shape(category, &items),
                Err(e) => tracing::warn!("Recommendation for {} failed: {:#}", category, e),
            }
        }
        all
    }

    /// One item per category drawn from the bucket's expanded tag group.
    ///
    /// An unrecognized bucket is reported; categories without a match are `None`.
    pub async fn recommend_grouped(&self, bucket: &str) -> Result<GroupedRecommendations, CoreError> {
        let bucket = CoarseBucket::parse(bucket)?;
        Ok(self.recommend_grouped_bucket(bucket).await)
    }

    pub async fn recommend_grouped_bucket(&self, bucket: CoarseBucket) -> GroupedRecommendations {
        let tags = bucket.expansion();
        let mut grouped = GroupedRecommendations::empty(bucket);

        for category in Category::ALL {
            match self.store.fetch_one_matching_any(category, tags).await {
                Ok(item) => {
                    *grouped.slot_mut(category) =
                        item.map(|i| i.to_recommendation(category));
                }
                Err(e) => tracing::warn!("Grouped recommendation for {} failed: {:#}", category, e),
            }
        }
        grouped
    }
}

/// Map an optional raw emotion string onto the vocabulary; blanks and
/// out-of-vocabulary strings read as "no emotion".
fn normalize_emotion(emotion: Option<&str>) -> Option<EmotionLabel> {
    let raw = emotion.map(str::trim).filter(|s| !s.is_empty())?;
    let label = EmotionLabel::parse(raw);
    if label.is_none() {
        tracing::debug!("Emotion '{}' is outside the vocabulary; sampling unconditioned", raw);
    }
    label
}

fn shape(category: Category, items: &[ContentItem]) -> Vec<Recommendation> {
    items.iter().map(|i| i.to_recommendation(category)).collect()
}
