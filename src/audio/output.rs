use crate::audio::device::{CompletionHook, DeviceState, OutputDevice, PlaybackStream};
use crate::audio::pcm::AudioBuffer;
use crate::audio::resampler::resample_audio;
use crate::{Result, ZeitgeistError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Speakers of the default cpal host
///
/// The hardware is only opened on the first [`OutputDevice::resume`].
pub struct CpalOutputDevice {
    device: Option<Device>,
    state: DeviceState,
}

impl CpalOutputDevice {
    pub fn new() -> Self {
        Self {
            device: None,
            state: DeviceState::Suspended,
        }
    }

    /// Name of the opened output device, if any
    pub fn device_name(&self) -> Option<String> {
        self.device.as_ref().and_then(|d| d.name().ok())
    }
}

impl Default for CpalOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// A running cpal output stream
pub struct CpalStream {
    stream: Option<Stream>,
}

impl PlaybackStream for CpalStream {
    fn stop(&mut self) -> Result<()> {
        let stream = self.stream.take().ok_or_else(|| {
            ZeitgeistError::PlaybackUnavailable("Stream already stopped".into())
        })?;
        stream.pause().map_err(|e| {
            ZeitgeistError::PlaybackUnavailable(format!("Failed to pause output stream: {}", e))
        })?;
        debug!("Stopped output stream");
        Ok(())
    }
}

impl OutputDevice for CpalOutputDevice {
    type Stream = CpalStream;

    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<DeviceState> {
        if self.device.is_none() {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or_else(|| {
                ZeitgeistError::PlaybackUnavailable("No output device available".into())
            })?;

            info!(
                "Using output device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );
            self.device = Some(device);
        }

        self.state = DeviceState::Active;
        Ok(self.state)
    }

    fn suspend(&mut self) -> Result<()> {
        self.state = DeviceState::Suspended;
        Ok(())
    }

    fn start(
        &mut self,
        buffer: Arc<AudioBuffer>,
        on_complete: CompletionHook,
    ) -> Result<Self::Stream> {
        let device = match (&self.device, self.state) {
            (Some(device), DeviceState::Active) => device,
            _ => {
                return Err(ZeitgeistError::PlaybackUnavailable(
                    "Output device is not active".into(),
                ))
            }
        };

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| {
                ZeitgeistError::PlaybackUnavailable(format!("Failed to get output config: {}", e))
            })?
            .into();

        let device_rate = config.sample_rate.0;
        let out_channels = config.channels as usize;

        let source = if buffer.sample_rate() != device_rate {
            Arc::new(resample_audio(&buffer, device_rate)?)
        } else {
            buffer
        };
        let src_channels = source.channels() as usize;
        let total_frames = source.frames();

        let mut position = 0usize;
        let mut on_complete = Some(on_complete);

        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let samples = source.samples();
                    for frame in data.chunks_mut(out_channels) {
                        if position < total_frames {
                            let base = position * src_channels;
                            // Mono fans out to every device channel
                            for (c, out) in frame.iter_mut().enumerate() {
                                *out = samples[base + c.min(src_channels - 1)];
                            }
                            position += 1;
                        } else {
                            frame.fill(0.0);
                        }
                    }

                    if position >= total_frames {
                        if let Some(hook) = on_complete.take() {
                            hook();
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                ZeitgeistError::PlaybackUnavailable(format!("Failed to build output stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            ZeitgeistError::PlaybackUnavailable(format!("Failed to start output stream: {}", e))
        })?;

        info!(
            "Started audio playback: {} frames at {} Hz on {} channels",
            total_frames, device_rate, out_channels
        );

        Ok(CpalStream {
            stream: Some(stream),
        })
    }
}
