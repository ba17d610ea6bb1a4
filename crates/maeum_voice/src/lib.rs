//! Voice module for Maeum
//!
//! Provides Speech-to-Text (STT) and Text-to-Speech (TTS) abstractions, the
//! Google Cloud REST implementations, local decoding of voice memos and storage for synthesized replies.

mod audio_store;
mod google;
mod stt;
mod transcode;
mod tts;

pub use audio_store::AudioStore;
pub use google::GoogleCloudVoice;
pub use stt::{AudioFormat, SpeechToText};
pub use transcode::{decode_linear16, Linear16};
pub use tts::{TextToSpeech, VoiceStyle};
