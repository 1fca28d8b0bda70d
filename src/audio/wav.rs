use crate::audio::pcm::AudioBuffer;
use crate::{Result, ZeitgeistError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::info;

/// Write a decoded buffer to a 16-bit PCM WAV file
///
/// Uses the inverse of the decoder's `s / 32768.0` mapping, so speech
/// received from the backend is written back bit-exact.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| ZeitgeistError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in buffer.samples() {
        let sample_i16 = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| ZeitgeistError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ZeitgeistError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    info!(
        "Wrote {} samples to WAV file: {:?}",
        buffer.samples().len(),
        path.as_ref()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::{decode_pcm16, PcmFormat};
    use hound::WavReader;

    #[test]
    fn test_write_wav_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.wav");

        let raw: Vec<i16> = vec![i16::MIN, -1234, 0, 1, 4321, i16::MAX];
        let bytes: Vec<u8> = raw.iter().flat_map(|s| s.to_le_bytes()).collect();
        let buffer = decode_pcm16(&bytes, PcmFormat::SPEECH).unwrap();

        write_wav(&path, &buffer).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, raw);
    }
}
