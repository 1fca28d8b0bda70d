//! Raw PCM decoding into playable sample buffers

use crate::audio::encoding::decode_base64;
use crate::{Result, ZeitgeistError};
use std::time::Duration;
use tracing::debug;

/// Layout of headerless 16-bit little-endian PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    /// Format of the speech backend's audio: 24 kHz mono
    pub const SPEECH: PcmFormat = PcmFormat {
        sample_rate: 24000,
        channels: 1,
    };

    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ZeitgeistError::InvalidAudioFormat(
                "Sample rate must be greater than 0".into(),
            ));
        }
        if self.channels == 0 {
            return Err(ZeitgeistError::InvalidAudioFormat(
                "Number of channels must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::SPEECH
    }
}

/// Decoded audio: interleaved normalized samples tagged with their format.
///
/// Immutable once built. Messages own it through an `Arc` and the playback
/// controller only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Build a buffer from interleaved samples.
    ///
    /// Any incomplete trailing frame is dropped.
    pub fn new(mut samples: Vec<f32>, format: PcmFormat) -> Result<Self> {
        format.validate()?;
        let channels = format.channels as usize;
        samples.truncate(samples.len() - samples.len() % channels);
        Ok(Self {
            samples,
            sample_rate: format.sample_rate,
            channels: format.channels,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels)
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn duration_seconds(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

/// Interpret `bytes` as interleaved signed 16-bit little-endian samples.
///
/// Each sample maps to `s / 32768.0`, so the result lies in `[-1.0, 1.0)`.
/// Bytes past the last whole frame are discarded without error.
pub fn decode_pcm16(bytes: &[u8], format: PcmFormat) -> Result<AudioBuffer> {
    format.validate()?;

    let frame_bytes = 2 * format.channels as usize;
    let usable = bytes.len() - bytes.len() % frame_bytes;
    if usable != bytes.len() {
        debug!(
            "Discarding {} trailing PCM bytes",
            bytes.len() - usable
        );
    }

    let samples = bytes[..usable]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioBuffer {
        samples,
        sample_rate: format.sample_rate,
        channels: format.channels,
    })
}

/// Decode a base64 speech payload straight into an [`AudioBuffer`]
pub fn decode_speech_payload(payload: &str, format: PcmFormat) -> Result<AudioBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, format)
}
