//! Text-to-Speech (TTS) trait definition

use anyhow::Result;
use async_trait::async_trait;
use maeum_core::Mode;

/// Prosody applied to a synthesized reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceStyle {
    /// 1.0 is the provider's normal speed
    pub speaking_rate: f32,
    /// Semitones relative to the default voice
    pub pitch: f32,
}

impl Default for VoiceStyle {
    fn default() -> Self {
        Self {
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

impl VoiceStyle {
    /// Rational replies keep the neutral voice; empathetic ones slow down
    /// and warm up slightly.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::T => Self::default(),
            Mode::F => Self {
                speaking_rate: 0.92,
                pitch: 1.5,
            },
        }
    }
}

/// Text-to-Speech trait for synthesizing audio from text
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize text to MP3 audio bytes.
    async fn synthesize(&self, text: &str, style: VoiceStyle) -> Result<Vec<u8>>;

    /// Get the name of this TTS provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_for_mode() {
        assert_eq!(VoiceStyle::for_mode(Mode::T), VoiceStyle::default());
        let warm = VoiceStyle::for_mode(Mode::F);
        assert!(warm.speaking_rate < 1.0);
        assert!(warm.pitch > 0.0);
    }
}
