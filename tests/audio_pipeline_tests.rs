//! Integration tests for the speech audio pipeline
//!
//! base64 payload -> PCM decoding -> playback sessions.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use zeitgeist::audio::{
    decode_base64, decode_pcm16, decode_speech_payload, encode_base64, AudioBuffer,
    CompletionHook, DeviceState, OutputDevice, PcmFormat, PlaybackController, PlaybackEvent,
    PlaybackState, PlaybackStream, SilentOutputDevice,
};
use zeitgeist::ZeitgeistError;

/// What the recording device saw, in order
#[derive(Default)]
struct Recording {
    log: Vec<String>,
    hooks: Vec<Option<CompletionHook>>,
}

#[derive(Clone, Default)]
struct RecordingDevice {
    recording: Arc<Mutex<Recording>>,
    active: bool,
}

struct RecordingStream {
    index: usize,
    recording: Arc<Mutex<Recording>>,
}

impl PlaybackStream for RecordingStream {
    fn stop(&mut self) -> zeitgeist::Result<()> {
        self.recording.lock().log.push(format!("stop:{}", self.index));
        Ok(())
    }
}

impl OutputDevice for RecordingDevice {
    type Stream = RecordingStream;

    fn state(&self) -> DeviceState {
        if self.active {
            DeviceState::Active
        } else {
            DeviceState::Suspended
        }
    }

    fn resume(&mut self) -> zeitgeist::Result<DeviceState> {
        self.recording.lock().log.push("resume".to_string());
        self.active = true;
        Ok(DeviceState::Active)
    }

    fn suspend(&mut self) -> zeitgeist::Result<()> {
        self.active = false;
        Ok(())
    }

    fn start(
        &mut self,
        buffer: Arc<AudioBuffer>,
        on_complete: CompletionHook,
    ) -> zeitgeist::Result<Self::Stream> {
        let mut recording = self.recording.lock();
        let index = recording.hooks.len();
        recording
            .log
            .push(format!("start:{}:{:?}", index, buffer.samples().first()));
        recording.hooks.push(Some(on_complete));
        Ok(RecordingStream {
            index,
            recording: Arc::clone(&self.recording),
        })
    }
}

fn finish(recording: &Arc<Mutex<Recording>>, index: usize) {
    let hook = recording.lock().hooks[index].take();
    if let Some(hook) = hook {
        hook();
    }
}

fn tone(first: f32, frames: usize) -> Arc<AudioBuffer> {
    Arc::new(AudioBuffer::new(vec![first; frames], PcmFormat::SPEECH).unwrap())
}

/// Sample count is half the decoded byte count, for payloads of every length
#[test]
fn test_sample_count_matches_byte_count() {
    for len in 0..64usize {
        let bytes: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
        let payload = encode_base64(&bytes);

        let decoded = decode_base64(&payload).unwrap();
        assert_eq!(decoded, bytes, "round trip failed for {} bytes", len);

        let buffer = decode_speech_payload(&payload, PcmFormat::SPEECH).unwrap();
        assert_eq!(buffer.samples().len(), len / 2);
        assert_eq!(buffer.sample_rate(), 24000);
    }
}

/// The extreme sample values decode to the ends of the normalized range
#[test]
fn test_extreme_samples() {
    let buffer = decode_pcm16(&[0x00, 0x80, 0xFF, 0x7F], PcmFormat::SPEECH).unwrap();
    assert_eq!(buffer.samples()[0], -1.0);
    assert!((buffer.samples()[1] - 0.99997).abs() < 1e-4);
}

/// Malformed payloads are rejected before any decoding happens
#[test]
fn test_malformed_payload() {
    assert!(matches!(
        decode_speech_payload("abc", PcmFormat::SPEECH),
        Err(ZeitgeistError::MalformedEncoding(_))
    ));
    assert!(matches!(
        decode_speech_payload("AA*A", PcmFormat::SPEECH),
        Err(ZeitgeistError::MalformedEncoding(_))
    ));
}

/// An empty payload yields an empty buffer that plays as a no-op
#[tokio::test]
async fn test_empty_payload_plays_as_noop() {
    let buffer = decode_speech_payload("", PcmFormat::SPEECH).unwrap();
    assert!(buffer.is_empty());

    let device = RecordingDevice::default();
    let recording = Arc::clone(&device.recording);
    let mut controller = PlaybackController::new(device);

    let session = controller.play(Arc::new(buffer)).await.unwrap();
    assert!(session.is_none());
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(recording.lock().log.is_empty());
}

/// Starting a second buffer ends the first session before the new one starts
#[tokio::test]
async fn test_second_play_silences_first() {
    let device = RecordingDevice::default();
    let recording = Arc::clone(&device.recording);
    let mut controller = PlaybackController::new(device);

    let a = controller.play(tone(0.25, 240)).await.unwrap().unwrap();
    let b = controller.play(tone(-0.25, 240)).await.unwrap().unwrap();
    assert_ne!(a, b);

    assert_eq!(
        recording.lock().log,
        vec![
            "resume".to_string(),
            "start:0:Some(0.25)".to_string(),
            "stop:0".to_string(),
            "start:1:Some(-0.25)".to_string(),
        ]
    );

    // A late completion from the replaced stream changes nothing
    finish(&recording, 0);
    assert_eq!(controller.current_session(), Some(b));

    finish(&recording, 1);
    assert_eq!(controller.state(), PlaybackState::Idle);

    let events = controller.poll_events();
    assert_eq!(
        events,
        vec![
            PlaybackEvent::Started { session: a },
            PlaybackEvent::Stopped { session: a },
            PlaybackEvent::Started { session: b },
            PlaybackEvent::Finished { session: b },
        ]
    );
}

/// Stopping twice is the same as stopping once
#[tokio::test]
async fn test_stop_twice() {
    let device = RecordingDevice::default();
    let recording = Arc::clone(&device.recording);
    let mut controller = PlaybackController::new(device);

    controller.play(tone(0.1, 24)).await.unwrap();
    controller.stop();
    controller.stop();

    let stops = recording
        .lock()
        .log
        .iter()
        .filter(|entry| entry.starts_with("stop"))
        .count();
    assert_eq!(stops, 1);
    assert_eq!(controller.state(), PlaybackState::Idle);
}

/// The silent device reports natural completion after the buffer's duration
#[tokio::test]
async fn test_silent_device_completes() {
    let mut controller = PlaybackController::new(SilentOutputDevice::new());
    let session = controller.play(tone(0.0, 240)).await.unwrap().unwrap();
    assert!(controller.is_playing());

    let mut finished = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if controller
            .poll_events()
            .contains(&PlaybackEvent::Finished { session })
        {
            finished = true;
            break;
        }
    }

    assert!(finished, "silent stream never finished");
    assert_eq!(controller.state(), PlaybackState::Idle);
}
