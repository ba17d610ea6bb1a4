//! Keyword-lexicon emotion classifier for Korean diary text.
//!
//! Deterministic and offline, so development and tests run without a model
//! server. Deployments point the classifier config at an inference endpoint.

use crate::emotion::{ClassificationResult, EmotionLabel, DEFAULT_THRESHOLD};
use crate::EmotionClassifier;
use anyhow::Result;
use async_trait::async_trait;

const CUES: &[(EmotionLabel, &[&str])] = &[
    (EmotionLabel::Craving, &["갈망", "간절"]),
    (EmotionLabel::Gratitude, &["감사", "고마", "고맙"]),
    (EmotionLabel::Worry, &["걱정", "염려"]),
    (EmotionLabel::Empathy, &["공감", "마음이 통"]),
    (EmotionLabel::Fear, &["공포", "소름"]),
    (EmotionLabel::Distress, &["괴로", "고통"]),
    (EmotionLabel::Longing, &["그리워", "그립", "보고 싶"]),
    (EmotionLabel::Joy, &["기쁘", "기뻐", "기쁨", "행복", "즐거"]),
    (EmotionLabel::Surprise, &["놀랐", "놀라", "깜짝"]),
    (EmotionLabel::Embarrassment, &["당황"]),
    (EmotionLabel::Frustration, &["답답"]),
    (EmotionLabel::Bewilderment, &["당혹", "어이없"]),
    (EmotionLabel::Dread, &["두려", "두렵"]),
    (EmotionLabel::Anger, &["화가", "화나", "분노", "짜증"]),
    (EmotionLabel::Anxiety, &["불안", "초조"]),
    (EmotionLabel::Misery, &["비참", "처참"]),
    (EmotionLabel::Love, &["사랑"]),
    (EmotionLabel::Hurt, &["상처"]),
    (EmotionLabel::Loss, &["상실", "잃었", "떠나보"]),
    (EmotionLabel::Slighted, &["서운", "속상"]),
    (EmotionLabel::Flutter, &["설레", "설렘", "두근"]),
    (EmotionLabel::Sadness, &["슬프", "슬퍼", "슬픔", "눈물", "울었"]),
    (EmotionLabel::Stress, &["스트레스", "지쳤", "피곤"]),
    (EmotionLabel::Disappointment, &["실망"]),
    (EmotionLabel::Excitement, &["신나", "신남", "신났"]),
    (EmotionLabel::Wronged, &["억울"]),
    (EmotionLabel::Loneliness, &["외로", "외롭"]),
    (EmotionLabel::Gloom, &["우울", "무기력"]),
    (EmotionLabel::Suspicion, &["의심", "수상"]),
    (EmotionLabel::SelfReproach, &["자괴감", "한심"]),
    (EmotionLabel::Guilt, &["죄책감", "미안"]),
    (EmotionLabel::Shame, &["창피", "부끄"]),
    (EmotionLabel::Shock, &["충격"]),
    (EmotionLabel::Pleasure, &["쾌감", "짜릿"]),
    (EmotionLabel::Comfort, &["편안", "편하", "포근"]),
    (EmotionLabel::Relief, &["후련", "홀가분"]),
    (EmotionLabel::Hope, &["희망", "잘 될"]),
    (EmotionLabel::Elation, &["희열", "벅차"]),
    (EmotionLabel::Disgust, &["혐오", "역겨"]),
    (EmotionLabel::Confusion, &["혼란", "헷갈"]),
    (EmotionLabel::Anticipation, &["기대"]),
    (EmotionLabel::Scared, &["무서", "무섭"]),
    (EmotionLabel::Defeat, &["좌절", "포기"]),
    (EmotionLabel::Interest, &["흥미", "재미있", "재밌"]),
];

#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    threshold: f32,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl LexiconClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Raw scores: each label's share of all cue hits in `text`.
    pub fn scores(&self, text: &str) -> Vec<(EmotionLabel, f32)> {
        let hits: Vec<(EmotionLabel, usize)> = CUES
            .iter()
            .map(|(label, cues)| (*label, cues.iter().filter(|c| text.contains(*c)).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        let total: usize = hits.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return Vec::new();
        }
        hits.into_iter()
            .map(|(label, n)| (label, n as f32 / total as f32))
            .collect()
    }

    pub fn classify_sync(&self, text: &str) -> ClassificationResult {
        let scores = self.scores(text);
        ClassificationResult::from_scores(
            scores.into_iter().map(|(l, c)| (l.as_str(), c)),
            self.threshold,
        )
    }
}

#[async_trait]
impl EmotionClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        Ok(self.classify_sync(text))
    }

    fn provider_name(&self) -> &'static str {
        "lexicon"
    }
}
