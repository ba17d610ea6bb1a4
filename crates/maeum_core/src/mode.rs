use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversational style: `T` answers with rational advice, `F` with empathy.
///
/// A conversation starts in `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    T,
    #[default]
    F,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T => "T",
            Self::F => "F",
        }
    }

    /// Read a forced-choice model reply. Returns `None` unless the reply is
    /// exactly `T` or `F` once whitespace, quotes and a trailing period are
    /// stripped.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let token = reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .trim();
        match token {
            "T" | "t" => Some(Self::T),
            "F" | "f" => Some(Self::F),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "T" | "t" => Ok(Self::T),
            "F" | "f" => Ok(Self::F),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}
