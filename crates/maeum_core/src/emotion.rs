//! The closed emotion vocabulary and classifier output.
//!
//! The classifier emits one of 44 Korean emotion names. Anything outside this
//! set is treated as unknown and never reaches the catalog matcher as a label.

use crate::grouping::CoarseBucket;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Label reported when no emotion clears the acceptance threshold.
pub const UNKNOWN_LABEL: &str = "감정을 알 수 없음";

/// Default acceptance threshold for classifier confidences.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// One token of the fixed emotion vocabulary.
///
/// Declaration order matches the classifier's label indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmotionLabel {
    Craving,
    Gratitude,
    Worry,
    Empathy,
    Fear,
    Distress,
    Longing,
    Joy,
    Surprise,
    Embarrassment,
    Frustration,
    Bewilderment,
    Dread,
    Anger,
    Anxiety,
    Misery,
    Love,
    Hurt,
    Loss,
    Slighted,
    Flutter,
    Sadness,
    Stress,
    Disappointment,
    Excitement,
    Wronged,
    Loneliness,
    Gloom,
    Suspicion,
    SelfReproach,
    Guilt,
    Shame,
    Shock,
    Pleasure,
    Comfort,
    Relief,
    Hope,
    Elation,
    Disgust,
    Confusion,
    Anticipation,
    Scared,
    Defeat,
    Interest,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 44] = [
        Self::Craving,
        Self::Gratitude,
        Self::Worry,
        Self::Empathy,
        Self::Fear,
        Self::Distress,
        Self::Longing,
        Self::Joy,
        Self::Surprise,
        Self::Embarrassment,
        Self::Frustration,
        Self::Bewilderment,
        Self::Dread,
        Self::Anger,
        Self::Anxiety,
        Self::Misery,
        Self::Love,
        Self::Hurt,
        Self::Loss,
        Self::Slighted,
        Self::Flutter,
        Self::Sadness,
        Self::Stress,
        Self::Disappointment,
        Self::Excitement,
        Self::Wronged,
        Self::Loneliness,
        Self::Gloom,
        Self::Suspicion,
        Self::SelfReproach,
        Self::Guilt,
        Self::Shame,
        Self::Shock,
        Self::Pleasure,
        Self::Comfort,
        Self::Relief,
        Self::Hope,
        Self::Elation,
        Self::Disgust,
        Self::Confusion,
        Self::Anticipation,
        Self::Scared,
        Self::Defeat,
        Self::Interest,
    ];

    /// The Korean token stored in catalog tags and diary rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Craving => "갈망",
            Self::Gratitude => "감사",
            Self::Worry => "걱정",
            Self::Empathy => "공감",
            Self::Fear => "공포",
            Self::Distress => "괴로움",
            Self::Longing => "그리움",
            Self::Joy => "기쁨",
            Self::Surprise => "놀람",
            Self::Embarrassment => "당황",
            Self::Frustration => "답답",
            Self::Bewilderment => "당혹",
            Self::Dread => "두려움",
            Self::Anger => "분노",
            Self::Anxiety => "불안",
            Self::Misery => "비참",
            Self::Love => "사랑",
            Self::Hurt => "상처",
            Self::Loss => "상실",
            Self::Slighted => "서운",
            Self::Flutter => "설렘",
            Self::Sadness => "슬픔",
            Self::Stress => "스트레스",
            Self::Disappointment => "실망",
            Self::Excitement => "신남",
            Self::Wronged => "억울",
            Self::Loneliness => "외로움",
            Self::Gloom => "우울",
            Self::Suspicion => "의심",
            Self::SelfReproach => "자괴감",
            Self::Guilt => "죄책감",
            Self::Shame => "창피",
            Self::Shock => "충격",
            Self::Pleasure => "쾌감",
            Self::Comfort => "편안",
            Self::Relief => "후련함",
            Self::Hope => "희망",
            Self::Elation => "희열",
            Self::Disgust => "혐오",
            Self::Confusion => "혼란",
            Self::Anticipation => "기대",
            Self::Scared => "무서움",
            Self::Defeat => "좌절",
            Self::Interest => "흥미",
        }
    }

    /// Label at the classifier's output index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a token, ignoring surrounding whitespace.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL.iter().copied().find(|l| l.as_str() == token)
    }

    /// The response-affect category this label belongs to.
    pub fn bucket(&self) -> CoarseBucket {
        use EmotionLabel::*;
        match self {
            Joy | Excitement | Flutter | Elation | Pleasure | Love | Gratitude | Anticipation
            | Interest | Hope => CoarseBucket::Joy,
            Comfort | Relief | Empathy => CoarseBucket::Calm,
            Sadness | Gloom | Loneliness | Longing | Loss | Hurt | Slighted | Disappointment
            | Misery | Defeat | Distress | Craving => CoarseBucket::Sadness,
            Anger | Wronged | Disgust | Frustration | Stress => CoarseBucket::Anger,
            Anxiety | Worry | Fear | Dread | Scared | Embarrassment | Bewilderment | Confusion
            | Suspicion | Shock | Guilt | SelfReproach | Shame => CoarseBucket::Anxiety,
            Surprise => CoarseBucket::Neutral,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::CoreError::UnknownEmotion(s.to_string()))
    }
}

impl Serialize for EmotionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EmotionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Classification result
// ============================================================================

/// One scored label. `label` is `None` for the unknown sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(with = "label_or_unknown")]
    pub label: Option<EmotionLabel>,
    pub confidence: f32,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            label: None,
            confidence: 0.0,
        }
    }

    pub fn label_str(&self) -> &'static str {
        self.label.map(|l| l.as_str()).unwrap_or(UNKNOWN_LABEL)
    }
}

mod label_or_unknown {
    use super::{EmotionLabel, UNKNOWN_LABEL};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        label: &Option<EmotionLabel>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(label.map(|l| l.as_str()).unwrap_or(UNKNOWN_LABEL))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EmotionLabel>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EmotionLabel::parse(&raw))
    }
}

/// Labels sorted by descending confidence. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationResult(Vec<Classification>);

impl ClassificationResult {
    /// Normalize raw classifier scores.
    ///
    /// Out-of-vocabulary labels are dropped, scores below `threshold` are
    /// discarded and confidences are rounded to four decimals. Duplicate labels
    /// keep their highest score. If nothing survives, the result holds the
    /// single unknown sentinel.
    pub fn from_scores<I, S>(scores: I, threshold: f32) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        let mut kept: Vec<Classification> = Vec::new();
        for (raw, confidence) in scores {
            let Some(label) = EmotionLabel::parse(raw.as_ref()) else {
                tracing::debug!("Dropping out-of-vocabulary label '{}'", raw.as_ref());
                continue;
            };
            if !confidence.is_finite() || confidence < threshold {
                continue;
            }
            let confidence = (confidence.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0;
            match kept.iter_mut().find(|c| c.label == Some(label)) {
                Some(existing) => existing.confidence = existing.confidence.max(confidence),
                None => kept.push(Classification {
                    label: Some(label),
                    confidence,
                }),
            }
        }

        if kept.is_empty() {
            return Self::unknown();
        }

        kept.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self(kept)
    }

    pub fn unknown() -> Self {
        Self(vec![Classification::unknown()])
    }

    pub fn top(&self) -> &Classification {
        // Constructors guarantee at least one entry.
        &self.0[0]
    }

    /// Top label, or `None` when the text was not classifiable.
    pub fn top_label(&self) -> Option<EmotionLabel> {
        self.top().label
    }

    pub fn is_unknown(&self) -> bool {
        self.top_label().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
