//! Speech audio pipeline
//!
//! base64 payload -> raw PCM bytes -> [`AudioBuffer`] -> [`PlaybackController`].

pub mod device;
pub mod encoding;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod pcm;
pub mod playback;
pub mod resampler;
pub mod wav;

pub use device::{CompletionHook, DeviceState, OutputDevice, PlaybackStream, SilentOutputDevice};
pub use encoding::{decode_base64, encode_base64};
#[cfg(feature = "audio-io")]
pub use output::CpalOutputDevice;
pub use pcm::{decode_pcm16, decode_speech_payload, AudioBuffer, PcmFormat};
pub use playback::{
    ActivationPolicy, PlaybackController, PlaybackEvent, PlaybackState, SessionId,
};
pub use resampler::{resample_audio, AudioResampler};
pub use wav::write_wav;
