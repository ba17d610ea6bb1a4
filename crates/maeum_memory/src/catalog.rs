//! Catalog table access. Read-mostly; rows arrive through ingestion only.

use crate::sqlite::SqliteStore;
use anyhow::{Context, Result};
use maeum_core::config::MatchOrder;
use maeum_core::{Category, ContentItem, EmotionLabel, EmotionTags, NewContentItem};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// SELECT list shared by every catalog query; the image column is aliased so
/// rows map uniformly whatever the category.
fn select_columns(category: Category) -> String {
    let image = category.image_column().unwrap_or("NULL");
    format!("id, title, url, emotion_tags, {} AS image_url", image)
}

fn row_to_item(row: &SqliteRow) -> ContentItem {
    let tags: String = row.get("emotion_tags");
    ContentItem {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        emotion_tags: EmotionTags::parse(&tags),
        image_url: row.get("image_url"),
    }
}

impl SqliteStore {
    /// Insert a catalog row unless one with the same title already exists.
    ///
    /// Returns the new row id, or `None` for a duplicate title. Titles are
    /// `UNIQUE` per table, so concurrent ingestion cannot double-insert.
    pub async fn insert_item(&self, category: Category, item: &NewContentItem) -> Result<Option<i64>> {
        let table = category.table();
        let tags = item.emotion_tags.to_db_string();
        let result = match category.image_column() {
            Some(col) => {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {} (title, url, emotion_tags, {}) VALUES (?, ?, ?, ?)",
                    table, col
                ))
                .bind(&item.title)
                .bind(&item.url)
                .bind(&tags)
                .bind(&item.image_url)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {} (title, url, emotion_tags) VALUES (?, ?, ?)",
                    table
                ))
                .bind(&item.title)
                .bind(&item.url)
                .bind(&tags)
                .execute(&self.pool)
                .await
            }
        }
        .with_context(|| format!("Failed to insert into {}", table))?;

        if result.rows_affected() == 0 {
            tracing::debug!("Skipping existing {} entry: {}", table, item.title);
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Rows whose tag string contains `label`, capped at `limit`.
    ///
    /// Substring matching over the joined tag string is deliberately loose:
    /// one field may carry several emotions.
    pub async fn fetch_tagged(
        &self,
        category: Category,
        label: EmotionLabel,
        limit: u32,
        order: MatchOrder,
    ) -> Result<Vec<ContentItem>> {
        let order_by = match order {
            MatchOrder::Recent => "id DESC",
            MatchOrder::Random => "RANDOM()",
        };
        let query = format!(
            "SELECT {} FROM {} WHERE emotion_tags LIKE ? ORDER BY {} LIMIT ?",
            select_columns(category),
            category.table(),
            order_by
        );
        let rows = sqlx::query(&query)
            .bind(format!("%{}%", label.as_str()))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query {} by tag", category.table()))?;
        Ok(rows.iter().map(row_to_item).collect())
    }

    /// Unconditioned random sample of up to `limit` rows.
    pub async fn fetch_random(&self, category: Category, limit: u32) -> Result<Vec<ContentItem>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY RANDOM() LIMIT ?",
            select_columns(category),
            category.table()
        );
        let rows = sqlx::query(&query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to sample {}", category.table()))?;
        Ok(rows.iter().map(row_to_item).collect())
    }

    /// One random row tagged with any of `labels` (a single disjunctive predicate).
    pub async fn fetch_one_matching_any(
        &self,
        category: Category,
        labels: &[EmotionLabel],
    ) -> Result<Option<ContentItem>> {
        if labels.is_empty() {
            return Ok(None);
        }
        let predicate = labels
            .iter()
            .map(|_| "emotion_tags LIKE ?")
            .collect::<Vec<_>>()
            .join(" OR ");
        let query = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY RANDOM() LIMIT 1",
            select_columns(category),
            category.table(),
            predicate
        );

        let mut q = sqlx::query(&query);
        for label in labels {
            q = q.bind(format!("%{}%", label.as_str()));
        }
        let row = q
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to query {} by tag group", category.table()))?;
        Ok(row.as_ref().map(row_to_item))
    }

    pub async fn count_items(&self, category: Category) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", category.table()))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", category.table()))?;
        Ok(row.get("n"))
    }

    /// Every row of a category, oldest first.
    pub async fn list_items(&self, category: Category) -> Result<Vec<ContentItem>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY id",
            select_columns(category),
            category.table()
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {}", category.table()))?;
        Ok(rows.iter().map(row_to_item).collect())
    }
}
