//! Coarse emotion buckets and the grouping table used to broaden recall.
//!
//! Each bucket expands to fine-grained tags that count as acceptable
//! substitutes when searching the catalog. The table leans towards uplifting
//! content: a sad user is offered hope and comfort, not more sadness.

use crate::emotion::EmotionLabel;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseBucket {
    Joy,
    Calm,
    Sadness,
    Anger,
    Anxiety,
    Neutral,
}

impl CoarseBucket {
    pub const ALL: [CoarseBucket; 6] = [
        Self::Joy,
        Self::Calm,
        Self::Sadness,
        Self::Anger,
        Self::Anxiety,
        Self::Neutral,
    ];

    pub fn korean(&self) -> &'static str {
        match self {
            Self::Joy => "기쁨",
            Self::Calm => "평온",
            Self::Sadness => "슬픔",
            Self::Anger => "분노",
            Self::Anxiety => "불안",
            Self::Neutral => "중립",
        }
    }

    pub fn english(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Calm => "calm",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Anxiety => "anxiety",
            Self::Neutral => "neutral",
        }
    }

    /// Fine-grained tags accepted for this bucket, in preference order.
    pub fn expansion(&self) -> &'static [EmotionLabel] {
        use EmotionLabel::*;
        match self {
            Self::Joy => &[Joy, Excitement, Flutter, Elation, Love, Gratitude],
            Self::Calm => &[Comfort, Relief, Gratitude, Hope, Empathy],
            Self::Sadness => &[Hope, Empathy, Gratitude, Love, Comfort, Relief],
            Self::Anger => &[Comfort, Relief, Empathy, Hope],
            Self::Anxiety => &[Comfort, Hope, Empathy, Gratitude, Relief],
            Self::Neutral => &[Interest, Anticipation, Flutter, Joy, Hope],
        }
    }

    /// Parse a bucket name in Korean or English.
    ///
    /// Unlike fine labels, an unrecognized bucket is a caller error.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let needle = raw.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.korean() == needle || b.english() == needle)
            .ok_or_else(|| CoreError::UnknownBucket(raw.to_string()))
    }
}

impl fmt::Display for CoarseBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean())
    }
}

impl FromStr for CoarseBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
