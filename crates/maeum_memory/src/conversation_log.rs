//! Append-only conversation log, replayed in creation order.

use crate::sqlite::{now_millis, SqliteStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use maeum_core::{ConversationHistory, ConversationTurn, Mode};
use serde::Serialize;
use sqlx::Row;

/// A persisted turn with its storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedTurn {
    pub id: i64,
    pub diary_id: i64,
    #[serde(flatten)]
    pub turn: ConversationTurn,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SqliteStore {
    pub async fn append_turn(
        &self,
        diary_id: i64,
        turn: &ConversationTurn,
        audio_url: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO conversation_logs (diary_id, user_input, response, mode, audio_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(diary_id)
        .bind(&turn.user_input)
        .bind(&turn.response)
        .bind(turn.mode.as_str())
        .bind(audio_url)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to append turn to diary {}", diary_id))?;
        Ok(result.last_insert_rowid())
    }

    /// The most recent `window` turns of a diary's log, oldest first.
    pub async fn load_log(&self, diary_id: i64, window: usize) -> Result<Vec<LoggedTurn>> {
        let limit = i64::try_from(window).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT id, diary_id, user_input, response, mode, audio_url, created_at \
             FROM conversation_logs WHERE diary_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(diary_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load conversation log for diary {}", diary_id))?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in rows {
            let mode: String = row.get("mode");
            let created_at: i64 = row.get("created_at");
            turns.push(LoggedTurn {
                id: row.get("id"),
                diary_id: row.get("diary_id"),
                turn: ConversationTurn {
                    user_input: row.get("user_input"),
                    response: row.get("response"),
                    mode: mode.parse().unwrap_or(Mode::F),
                },
                audio_url: row.get("audio_url"),
                created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
            });
        }
        // Reverse so oldest is first (chronological order)
        turns.reverse();
        Ok(turns)
    }

    /// The log as a history ready for mode detection and prompt assembly.
    pub async fn load_history(&self, diary_id: i64, window: usize) -> Result<ConversationHistory> {
        let turns = self.load_log(diary_id, window).await?;
        Ok(ConversationHistory::from_turns(
            turns.into_iter().map(|t| t.turn).collect(),
        ))
    }
}
