//! Conversation turns and the append-only history they form.

use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub response: String,
    #[serde(default)]
    pub mode: Mode,
}

impl ConversationTurn {
    pub fn new(user_input: impl Into<String>, response: impl Into<String>, mode: Mode) -> Self {
        Self {
            user_input: user_input.into(),
            response: response.into(),
            mode,
        }
    }
}

/// Turns in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<ConversationTurn>);

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Self(turns)
    }

    /// Build a history from client-supplied JSON.
    ///
    /// Entries without a string `user_input` and `response` are dropped. A
    /// missing or invalid `mode` reads as `F`. Anything that is not an array
    /// yields an empty history.
    pub fn from_json_lenient(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            if !value.is_null() {
                tracing::debug!("History payload is not an array; ignoring it");
            }
            return Self::new();
        };

        let mut turns = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let user_input = item.get("user_input").and_then(Value::as_str);
            let response = item.get("response").and_then(Value::as_str);
            let (Some(user_input), Some(response)) = (user_input, response) else {
                tracing::debug!("Dropping malformed history entry #{}", i);
                continue;
            };
            let mode = item
                .get("mode")
                .and_then(Value::as_str)
                .and_then(|m| m.parse().ok())
                .unwrap_or_default();
            turns.push(ConversationTurn::new(user_input, response, mode));
        }
        Self(turns)
    }

    /// Lenient parse from a JSON string; unparsable input gives an empty history.
    pub fn from_json_str_lenient(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_json_lenient(&value),
            Err(e) => {
                tracing::debug!("History is not valid JSON ({}); starting fresh", e);
                Self::new()
            }
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.0.push(turn);
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.0.last()
    }

    /// Mode carried into the next turn: the latest turn's mode, or `F`.
    pub fn prior_mode(&self) -> Mode {
        self.last().map(|t| t.mode).unwrap_or_default()
    }

    /// The most recent `window` turns, oldest first.
    pub fn recent(&self, window: usize) -> &[ConversationTurn] {
        let start = self.0.len().saturating_sub(window);
        &self.0[start..]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ConversationHistory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json_lenient(&value))
    }
}
