//! Local decoding for containers the recognizer cannot read.
//!
//! Phone voice memos arrive as AAC in MP4; they are decoded here into mono
//! 16-bit PCM and sent as `LINEAR16`.

use crate::stt::AudioFormat;
use anyhow::{Context, Result};
use std::io::{Cursor, ErrorKind};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Mono little-endian 16-bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear16 {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Linear16 {
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

fn extension_hint(format: AudioFormat) -> Option<&'static str> {
    match format {
        AudioFormat::M4a => Some("m4a"),
        AudioFormat::Mp3 => Some("mp3"),
        AudioFormat::Flac => Some("flac"),
        AudioFormat::Wav => Some("wav"),
        AudioFormat::OggOpus => Some("ogg"),
        AudioFormat::Linear16 { .. } => None,
    }
}

/// Decode the first audio track, down-mixing every channel into one.
/// The container is sniffed from the bytes; `format` is only a hint.
pub fn decode_linear16(audio: &[u8], format: AudioFormat) -> Result<Linear16> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(audio.to_vec())), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension_hint(format) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Cannot decode {} upload", format.mime_type()))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No decodable audio track in upload")?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported audio codec")?;

    let mut samples = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::debug!("Skipping corrupt audio packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e).context("Failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend(buf.samples().chunks(channels).map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        }));
    }

    let sample_rate = sample_rate.context("Audio track has no sample rate")?;
    if samples.is_empty() {
        anyhow::bail!("Upload contained no audio samples");
    }
    tracing::debug!(
        "Decoded {} bytes of {} into {} samples at {} Hz",
        audio.len(),
        format.mime_type(),
        samples.len(),
        sample_rate
    );
    Ok(Linear16 {
        samples,
        sample_rate,
    })
}
