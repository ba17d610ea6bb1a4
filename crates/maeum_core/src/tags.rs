//! Set-valued emotion tags with a single normalization boundary.
//!
//! Catalog rows persist tags as a comma-joined string. Conversion happens only
//! here: tokens are trimmed, validated against the vocabulary and deduplicated
//! while keeping first-seen order.

use crate::emotion::EmotionLabel;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmotionTags(Vec<EmotionLabel>);

impl EmotionTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize raw tokens, returning the accepted tags and the rejected tokens.
    pub fn normalize<I, S>(tokens: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = Self::new();
        let mut rejected = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            match EmotionLabel::parse(token) {
                Some(label) => tags.insert(label),
                None => rejected.push(token.to_string()),
            }
        }
        (tags, rejected)
    }

    /// Parse the persisted comma-joined representation, dropping unknown tokens.
    pub fn parse(raw: &str) -> Self {
        let (tags, rejected) = Self::normalize(raw.split(','));
        if !rejected.is_empty() {
            tracing::debug!("Ignoring unknown emotion tags: {:?}", rejected);
        }
        tags
    }

    pub fn from_labels<I: IntoIterator<Item = EmotionLabel>>(labels: I) -> Self {
        let mut tags = Self::new();
        for label in labels {
            tags.insert(label);
        }
        tags
    }

    pub fn insert(&mut self, label: EmotionLabel) {
        if !self.0.contains(&label) {
            self.0.push(label);
        }
    }

    pub fn contains(&self, label: EmotionLabel) -> bool {
        self.0.contains(&label)
    }

    /// The persisted comma-joined form.
    pub fn to_db_string(&self) -> String {
        self.0
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionLabel> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Accepts either a JSON list of tokens or a comma-joined string.
impl<'de> Deserialize<'de> for EmotionTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::List(items) => Self::normalize(items).0,
            Raw::Joined(s) => Self::parse(&s),
        })
    }
}
