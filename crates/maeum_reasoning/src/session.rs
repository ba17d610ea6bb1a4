//! One conversational exchange, stage by stage.
//!
//! Order within a turn: transcription, mode detection, prompt assembly,
//! completion, synthesis, log persistence. Transcription and completion
//! failures abort the turn. Synthesis and persistence failures are reported
//! as warnings alongside the reply, which is never discarded once generated.

use crate::llm::{CompletionParams, LlmClient};
use crate::mode::ModeDetector;
use crate::prompts::PromptAssembler;
use maeum_core::{ConversationHistory, ConversationTurn, CoreError, Mode};
use maeum_memory::SqliteStore;
use maeum_voice::{AudioFormat, AudioStore, SpeechToText, TextToSpeech, VoiceStyle};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcription,
    Completion,
    Synthesis,
    Persistence,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Completion => "completion",
            Self::Synthesis => "synthesis",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The request itself was unusable.
    #[error(transparent)]
    Rejected(#[from] CoreError),
    #[error("{stage} stage failed: {source:#}")]
    Failed {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl TurnError {
    fn failed(stage: Stage, source: anyhow::Error) -> Self {
        Self::Failed { stage, source }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Rejected(_) => None,
            Self::Failed { stage, .. } => Some(*stage),
        }
    }
}

/// A degraded stage that did not cost the user the reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub input: String,
    pub response: String,
    pub mode: Mode,
    pub audio_url: Option<String>,
    /// Whether the turn was appended to a diary's log.
    pub persisted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<StageWarning>,
}

/// Where a turn's history comes from and where it goes.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Replay and append to this diary's log. Takes precedence over `history`.
    pub diary_id: Option<i64>,
    /// Client-held history for diary-less conversations.
    pub history: ConversationHistory,
    /// Synthesize the reply as speech.
    pub speak: bool,
}

impl TurnContext {
    pub fn for_diary(diary_id: i64) -> Self {
        Self {
            diary_id: Some(diary_id),
            ..Self::default()
        }
    }

    pub fn inline(history: ConversationHistory) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn speaking(mut self) -> Self {
        self.speak = true;
        self
    }
}

pub struct ConversationSession {
    llm: Arc<dyn LlmClient>,
    params: CompletionParams,
    detector: ModeDetector,
    assembler: PromptAssembler,
    store: Option<Arc<SqliteStore>>,
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<(Arc<dyn TextToSpeech>, AudioStore)>,
}

impl ConversationSession {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        params: CompletionParams,
        detector: ModeDetector,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            llm,
            params,
            detector,
            assembler,
            store: None,
            stt: None,
            tts: None,
        }
    }

    pub fn with_store(mut self, store: Arc<SqliteStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_speech_to_text(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_text_to_speech(mut self, tts: Arc<dyn TextToSpeech>, audio: AudioStore) -> Self {
        self.tts = Some((tts, audio));
        self
    }

    pub fn can_transcribe(&self) -> bool {
        self.stt.is_some()
    }

    /// Run one turn from recorded speech.
    pub async fn turn_audio(
        &self,
        audio: &[u8],
        format: AudioFormat,
        ctx: TurnContext,
    ) -> Result<TurnOutcome, TurnError> {
        if audio.is_empty() {
            return Err(CoreError::EmptyInput("audio").into());
        }
        let Some(stt) = &self.stt else {
            return Err(TurnError::failed(
                Stage::Transcription,
                anyhow::anyhow!("No speech-to-text provider configured"),
            ));
        };

        let transcript = stt
            .transcribe(audio, format)
            .await
            .map_err(|e| TurnError::failed(Stage::Transcription, e))?;
        if transcript.trim().is_empty() {
            return Err(TurnError::failed(
                Stage::Transcription,
                anyhow::anyhow!("No speech recognized"),
            ));
        }
        tracing::debug!("Transcribed via {}: {}", stt.provider_name(), transcript);

        self.turn_text(&transcript, ctx).await
    }

    /// Run one turn from typed text.
    pub async fn turn_text(&self, input: &str, ctx: TurnContext) -> Result<TurnOutcome, TurnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CoreError::EmptyInput("text").into());
        }

        let history = self.resolve_history(&ctx).await?;
        let mode = self
            .detector
            .detect(input, history.prior_mode(), &history)
            .await;

        let messages = self.assembler.build_messages(&history, input, mode);
        let response = self
            .llm
            .complete(&messages, self.params)
            .await
            .map_err(|e| TurnError::failed(Stage::Completion, e))?;

        let mut warnings = Vec::new();

        let audio_url = if ctx.speak {
            match self.synthesize(&response, mode).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Synthesis failed; returning text only: {:#}", e);
                    warnings.push(StageWarning {
                        stage: Stage::Synthesis,
                        message: format!("{:#}", e),
                    });
                    None
                }
            }
        } else {
            None
        };

        let turn = ConversationTurn::new(input, response, mode);
        let mut persisted = false;
        if let (Some(diary_id), Some(store)) = (ctx.diary_id, &self.store) {
            match store.append_turn(diary_id, &turn, audio_url.as_deref()).await {
                Ok(_) => persisted = true,
                Err(e) => {
                    // Next turn may replay a stale prior mode
                    tracing::warn!("Failed to log turn for diary {}: {:#}", diary_id, e);
                    warnings.push(StageWarning {
                        stage: Stage::Persistence,
                        message: format!("{:#}", e),
                    });
                }
            }
        }

        tracing::info!(
            "Turn complete: mode={} audio={} persisted={}",
            mode,
            audio_url.is_some(),
            persisted
        );
        Ok(TurnOutcome {
            input: turn.user_input,
            response: turn.response,
            mode,
            audio_url,
            persisted,
            warnings,
        })
    }

    async fn resolve_history(&self, ctx: &TurnContext) -> Result<ConversationHistory, TurnError> {
        match (ctx.diary_id, &self.store) {
            (Some(diary_id), Some(store)) => store
                .load_history(diary_id, self.assembler.window)
                .await
                .map_err(|e| TurnError::failed(Stage::Persistence, e)),
            (Some(diary_id), None) => {
                tracing::warn!("No store configured; diary {} history unavailable", diary_id);
                Ok(ctx.history.clone())
            }
            (None, _) => Ok(ctx.history.clone()),
        }
    }

    /// `Ok(None)` when no synthesizer is configured.
    async fn synthesize(&self, text: &str, mode: Mode) -> anyhow::Result<Option<String>> {
        let Some((tts, audio)) = &self.tts else {
            return Ok(None);
        };
        let bytes = tts.synthesize(text, VoiceStyle::for_mode(mode)).await?;
        let filename = audio.save_mp3(&bytes).await?;
        tracing::debug!("Synthesized {} bytes via {} into {}", bytes.len(), tts.provider_name(), filename);
        Ok(Some(format!("/audio/{}", filename)))
    }
}
