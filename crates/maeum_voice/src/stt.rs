//! Speech-to-Text (STT) trait definition

use anyhow::Result;
use async_trait::async_trait;

/// Supported audio formats for STT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// AAC in an MP4 container (phone voice memos)
    M4a,
    Flac,
    Wav,
    Mp3,
    /// OGG Opus (common for voice messages)
    OggOpus,
    /// Raw 16-bit PCM
    Linear16 { sample_rate: u32 },
}

impl AudioFormat {
    /// Get the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::M4a => "audio/mp4",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::OggOpus => "audio/ogg",
            Self::Linear16 { .. } => "audio/l16",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some(Self::M4a),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/ogg" | "audio/opus" => Some(Self::OggOpus),
            "audio/l16" | "audio/pcm" => Some(Self::Linear16 { sample_rate: 16_000 }),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "m4a" | "aac" | "mp4" => Some(Self::M4a),
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "ogg" | "opus" => Some(Self::OggOpus),
            "pcm" | "raw" => Some(Self::Linear16 { sample_rate: 16_000 }),
            _ => None,
        }
    }

    /// Best guess for an upload. The declared content type wins over the
    /// file extension; voice memos are the default.
    pub fn detect(content_type: Option<&str>, filename: Option<&str>) -> Self {
        content_type
            .and_then(Self::from_content_type)
            .or_else(|| filename.and_then(Self::from_filename))
            .unwrap_or(Self::M4a)
    }
}

/// Speech-to-Text trait for transcribing audio to text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe audio data to text. An empty string means no speech was
    /// recognized.
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String>;

    /// Get the name of this STT provider
    fn provider_name(&self) -> &'static str;
}
