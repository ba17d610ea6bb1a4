use crate::sqlite::{now_millis, SqliteStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use maeum_core::{ClassificationResult, EmotionLabel};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A saved diary entry with its top classified emotion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diary {
    pub id: i64,
    pub user_id: String,
    pub content: String,
    /// Vocabulary token, or the unknown sentinel.
    pub emotion: String,
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
}

impl Diary {
    pub fn emotion_label(&self) -> Option<EmotionLabel> {
        EmotionLabel::parse(&self.emotion)
    }
}

fn row_to_diary(row: &SqliteRow) -> Diary {
    let created_at: i64 = row.get("created_at");
    let confidence: f64 = row.get("confidence");
    Diary {
        id: row.get("id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        emotion: row.get("emotion"),
        confidence: confidence as f32,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
    }
}

impl SqliteStore {
    /// Persist a diary with the top label of its classification.
    pub async fn create_diary(
        &self,
        user_id: &str,
        content: &str,
        classification: &ClassificationResult,
    ) -> Result<Diary> {
        let top = classification.top();
        let created_at = now_millis();

        let result = sqlx::query(
            "INSERT INTO diaries (user_id, content, emotion, confidence, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(content)
        .bind(top.label_str())
        .bind(f64::from(top.confidence))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert diary")?;

        let id = result.last_insert_rowid();
        tracing::debug!("Diary {} saved for {} ({})", id, user_id, top.label_str());
        Ok(Diary {
            id,
            user_id: user_id.to_string(),
            content: content.to_string(),
            emotion: top.label_str().to_string(),
            confidence: top.confidence,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
        })
    }

    /// A user's diaries, newest first.
    pub async fn list_diaries(&self, user_id: &str) -> Result<Vec<Diary>> {
        let rows = sqlx::query(
            "SELECT id, user_id, content, emotion, confidence, created_at \
             FROM diaries WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list diaries")?;
        Ok(rows.iter().map(row_to_diary).collect())
    }

    /// Fetch one diary; `None` if it does not exist or belongs to someone else.
    pub async fn get_diary(&self, user_id: &str, id: i64) -> Result<Option<Diary>> {
        let row = sqlx::query(
            "SELECT id, user_id, content, emotion, confidence, created_at \
             FROM diaries WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch diary")?;
        Ok(row.as_ref().map(row_to_diary))
    }

    /// Delete a diary and, through the foreign key, its conversation log.
    /// Returns false if nothing matched.
    pub async fn delete_diary(&self, user_id: &str, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM diaries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete diary")?;
        Ok(result.rows_affected() > 0)
    }
}
