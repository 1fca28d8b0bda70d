use crate::audio::pcm::{AudioBuffer, PcmFormat};
use crate::{Result, ZeitgeistError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Converts speech audio to the rate the output hardware runs at
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    ratio: f64,
    channels: usize,
}

fn processing_error(e: impl std::fmt::Display) -> ZeitgeistError {
    ZeitgeistError::AudioProcessingError(format!("Resampling failed: {}", e))
}

fn append(planar: &mut [Vec<f32>], chunk: Vec<Vec<f32>>) {
    for (channel, samples) in planar.iter_mut().zip(chunk) {
        channel.extend(samples);
    }
}

impl AudioResampler {
    /// Create a resampler for `channels` interleaved channels
    pub fn new(input_rate: u32, output_rate: u32, channels: u16) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(ZeitgeistError::InvalidAudioFormat(
                "Sample rates must be greater than 0".into(),
            ));
        }

        if channels == 0 {
            return Err(ZeitgeistError::InvalidAudioFormat(
                "Number of channels must be greater than 0".into(),
            ));
        }

        let ratio = output_rate as f64 / input_rate as f64;

        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };

        // Frames per channel handed to the filter at a time
        let chunk_size = 1024;

        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, chunk_size, channels as usize)
            .map_err(|e| {
                ZeitgeistError::AudioProcessingError(format!("Failed to create resampler: {}", e))
            })?;

        debug!(
            "Created resampler: {} Hz -> {} Hz, {} channels",
            input_rate, output_rate, channels
        );

        Ok(Self {
            resampler,
            ratio,
            channels: channels as usize,
        })
    }

    /// Resample a complete clip of interleaved audio.
    ///
    /// The output holds `ceil(frames * ratio)` frames aligned with the input:
    /// the filter delay is skipped at the start and flushed out at the end.
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let channels = self.channels;
        let total_frames = input.len() / channels;
        let expected = (total_frames as f64 * self.ratio).ceil() as usize;
        let delay = self.resampler.output_delay();

        let planar: Vec<Vec<f32>> = (0..channels)
            .map(|ch| input.iter().skip(ch).step_by(channels).copied().collect())
            .collect();
        let mut resampled = vec![Vec::with_capacity(expected + delay); channels];

        let mut offset = 0;
        while offset < total_frames {
            let wanted = self.resampler.input_frames_next();
            let end = (offset + wanted).min(total_frames);
            let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[offset..end]).collect();

            let out = if end - offset == wanted {
                self.resampler.process(chunk.as_slice(), None)
            } else {
                self.resampler.process_partial(Some(chunk.as_slice()), None)
            }
            .map_err(processing_error)?;
            append(&mut resampled, out);
            offset = end;
        }

        // Frames still inside the filter come out as silence is pushed in
        while resampled[0].len() < delay + expected {
            let out = self
                .resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(processing_error)?;
            if out[0].is_empty() {
                break;
            }
            append(&mut resampled, out);
        }
        self.resampler.reset();

        let available = resampled[0].len().saturating_sub(delay).min(expected);
        let mut output = Vec::with_capacity(available * channels);
        for frame in delay..delay + available {
            for channel in &resampled {
                output.push(channel[frame]);
            }
        }

        debug!("Resampled {} frames -> {} frames", total_frames, available);
        Ok(output)
    }
}

/// Resample a whole buffer to `output_rate`, or clone it when the rates match
pub fn resample_audio(buffer: &AudioBuffer, output_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate() == output_rate || buffer.is_empty() {
        return AudioBuffer::new(
            buffer.samples().to_vec(),
            PcmFormat::new(output_rate, buffer.channels()),
        );
    }

    let mut resampler = AudioResampler::new(buffer.sample_rate(), output_rate, buffer.channels())?;
    let samples = resampler.resample(buffer.samples())?;
    AudioBuffer::new(samples, PcmFormat::new(output_rate, buffer.channels()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize, rate: u32) -> AudioBuffer {
        let samples = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / rate as f32).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, PcmFormat::new(rate, 1)).unwrap()
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(AudioResampler::new(0, 48000, 1).is_err());
        assert!(AudioResampler::new(24000, 0, 1).is_err());
        assert!(AudioResampler::new(24000, 48000, 0).is_err());
    }

    #[test]
    fn test_upsample_speech_rate() {
        let input = sine(2400, 24000);
        let output = resample_audio(&input, 48000).unwrap();
        assert_eq!(output.sample_rate(), 48000);
        assert!(output.frames() >= 4700 && output.frames() <= 4900);
    }

    #[test]
    fn test_output_is_aligned_and_complete() {
        let input = sine(1000, 24000);
        let output = resample_audio(&input, 48000).unwrap();
        assert_eq!(output.frames(), 2000);

        // Every other output frame lands on an input frame
        for i in 100..900 {
            let diff = (output.samples()[2 * i] - input.samples()[i]).abs();
            assert!(diff < 0.05, "frame {} off by {}", i, diff);
        }
    }

    #[test]
    fn test_tail_is_not_truncated() {
        let input = AudioBuffer::new(vec![0.5; 1000], PcmFormat::new(24000, 1)).unwrap();
        let output = resample_audio(&input, 48000).unwrap();
        assert_eq!(output.frames(), 2000);
        assert!((output.samples()[1800] - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_stereo_stays_interleaved() {
        let samples = (0..960).flat_map(|_| [0.25f32, -0.25]).collect();
        let input = AudioBuffer::new(samples, PcmFormat::new(24000, 2)).unwrap();
        let output = resample_audio(&input, 48000).unwrap();
        assert_eq!(output.frames(), 1920);
        assert!((output.samples()[960 * 2] - 0.25).abs() < 0.05);
        assert!((output.samples()[960 * 2 + 1] + 0.25).abs() < 0.05);
    }

    #[test]
    fn test_matching_rate_is_a_copy() {
        let input = sine(100, 24000);
        let output = resample_audio(&input, 24000).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_empty_input() {
        let mut resampler = AudioResampler::new(24000, 44100, 1).unwrap();
        assert!(resampler.resample(&[]).unwrap().is_empty());
    }
}
