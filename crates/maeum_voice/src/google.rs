//! Google Cloud Speech-to-Text and Text-to-Speech over the REST API.

use crate::stt::{AudioFormat, SpeechToText};
use crate::transcode::decode_linear16;
use crate::tts::{TextToSpeech, VoiceStyle};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const STT_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// One API key serves both directions.
#[derive(Debug, Clone)]
pub struct GoogleCloudVoice {
    client: Client,
    api_key: String,
    language: String,
    stt_url: String,
    tts_url: String,
}

impl GoogleCloudVoice {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            api_key: api_key.into(),
            language: language.into(),
            stt_url: STT_URL.to_string(),
            tts_url: TTS_URL.to_string(),
        })
    }

    /// Read `GOOGLE_API_KEY` once at construction.
    pub fn from_env(language: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .context("GOOGLE_API_KEY must be set for the google voice provider")?;
        Self::new(api_key, language)
    }

    /// Point both endpoints elsewhere (proxies, local emulators).
    pub fn with_endpoints(mut self, stt_url: impl Into<String>, tts_url: impl Into<String>) -> Self {
        self.stt_url = stt_url.into();
        self.tts_url = tts_url.into();
        self
    }
}

/// `RecognitionConfig` encoding and sample rate. `None` for containers the
/// v1 recognizer cannot read; those are decoded locally first. FLAC and WAV
/// carry their own rate in the header.
fn recognition_encoding(format: AudioFormat) -> Option<(&'static str, Option<u32>)> {
    match format {
        AudioFormat::Flac => Some(("FLAC", None)),
        AudioFormat::Wav => Some(("LINEAR16", None)),
        AudioFormat::Linear16 { sample_rate } => Some(("LINEAR16", Some(sample_rate))),
        AudioFormat::OggOpus => Some(("OGG_OPUS", Some(48_000))),
        AudioFormat::M4a | AudioFormat::Mp3 => None,
    }
}

/// Audio ready for `speech:recognize`.
#[derive(Debug, Clone, PartialEq)]
struct RecognitionAudio {
    content: String,
    encoding: &'static str,
    sample_rate: Option<u32>,
}

async fn prepare_audio(audio: &[u8], format: AudioFormat) -> Result<RecognitionAudio> {
    if let Some((encoding, sample_rate)) = recognition_encoding(format) {
        return Ok(RecognitionAudio {
            content: BASE64.encode(audio),
            encoding,
            sample_rate,
        });
    }

    let owned = audio.to_vec();
    let pcm = tokio::task::spawn_blocking(move || decode_linear16(&owned, format))
        .await
        .context("Audio decoder task failed")??;
    Ok(RecognitionAudio {
        content: BASE64.encode(pcm.to_le_bytes()),
        encoding: "LINEAR16",
        sample_rate: Some(pcm.sample_rate),
    })
}

fn recognize_body(audio: RecognitionAudio, language: &str) -> serde_json::Value {
    let mut config = json!({
        "encoding": audio.encoding,
        "languageCode": language,
    });
    if let Some(rate) = audio.sample_rate {
        config["sampleRateHertz"] = json!(rate);
    }
    json!({
        "config": config,
        "audio": { "content": audio.content },
    })
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Join the best alternative of every result segment.
fn join_transcript(response: RecognizeResponse) -> String {
    response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl SpeechToText for GoogleCloudVoice {
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String> {
        let prepared = prepare_audio(audio, format).await?;
        let payload = recognize_body(prepared, &self.language);

        let response = self
            .client
            .post(&self.stt_url)
            .query(&[("key", &self.api_key)])
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Google STT")?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google STT API Error ({}): {}", status, error_text);
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .context("Failed to parse Google STT response")?;
        let transcript = join_transcript(body);
        tracing::debug!("Transcribed {} bytes into {} chars", audio.len(), transcript.chars().count());
        Ok(transcript)
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}

#[async_trait]
impl TextToSpeech for GoogleCloudVoice {
    async fn synthesize(&self, text: &str, style: VoiceStyle) -> Result<Vec<u8>> {
        let payload = json!({
            "input": { "text": text },
            "voice": { "languageCode": self.language, "ssmlGender": "NEUTRAL" },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": style.speaking_rate,
                "pitch": style.pitch,
            },
        });

        let response = self
            .client
            .post(&self.tts_url)
            .query(&[("key", &self.api_key)])
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Google TTS")?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google TTS API Error ({}): {}", status, error_text);
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .context("Failed to parse Google TTS response")?;
        BASE64
            .decode(body.audio_content)
            .context("Google TTS returned invalid base64 audio")
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}
