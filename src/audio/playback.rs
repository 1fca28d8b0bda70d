//! Playback controller
//!
//! Owns the output device and at most one active playback session. Starting
//! a new session always stops the previous one first.

use crate::audio::device::{CompletionHook, DeviceState, OutputDevice, PlaybackStream};
use crate::audio::pcm::AudioBuffer;
use crate::{Result, ZeitgeistError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifies one playback session; increases with every `play`
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Notifications for observers of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started { session: SessionId },
    /// Every sample was emitted
    Finished { session: SessionId },
    /// Halted by `stop` or replaced by a newer session
    Stopped { session: SessionId },
}

/// How hard to try waking a suspended device before giving up
#[derive(Debug, Clone)]
pub struct ActivationPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(50),
        }
    }
}

struct ActiveSession<S> {
    id: SessionId,
    stream: S,
}

pub struct PlaybackController<D: OutputDevice> {
    device: D,
    policy: ActivationPolicy,
    current: Option<ActiveSession<D::Stream>>,
    /// Session still emitting sound; cleared from the device thread on
    /// natural completion.
    playing: Arc<Mutex<Option<SessionId>>>,
    last_session: SessionId,
    event_tx: Sender<PlaybackEvent>,
    event_rx: Receiver<PlaybackEvent>,
}

impl<D: OutputDevice> PlaybackController<D> {
    pub fn new(device: D) -> Self {
        Self::with_policy(device, ActivationPolicy::default())
    }

    pub fn with_policy(device: D, policy: ActivationPolicy) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            device,
            policy,
            current: None,
            playing: Arc::new(Mutex::new(None)),
            last_session: 0,
            event_tx,
            event_rx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.playing.lock().is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Session currently emitting sound
    pub fn current_session(&self) -> Option<SessionId> {
        *self.playing.lock()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Start playing `buffer` from its first sample.
    ///
    /// Returns `None` for an empty buffer, which leaves everything untouched.
    pub async fn play(&mut self, buffer: Arc<AudioBuffer>) -> Result<Option<SessionId>> {
        if buffer.is_empty() {
            debug!("Ignoring play request for empty buffer");
            return Ok(None);
        }

        self.end_session();
        self.activate().await?;

        self.last_session += 1;
        let id = self.last_session;

        let playing = Arc::clone(&self.playing);
        let event_tx = self.event_tx.clone();
        let on_complete: CompletionHook = Box::new(move || {
            let mut current = playing.lock();
            // A replaced session must not flip its successor to idle
            if *current == Some(id) {
                *current = None;
                drop(current);
                let _ = event_tx.send(PlaybackEvent::Finished { session: id });
            }
        });

        // Set before starting so a completion firing immediately is not lost
        *self.playing.lock() = Some(id);

        let duration = buffer.duration_seconds();
        match self.device.start(buffer, on_complete) {
            Ok(stream) => {
                self.current = Some(ActiveSession { id, stream });
                let _ = self.event_tx.send(PlaybackEvent::Started { session: id });
                info!("Playback session {} started ({:.2}s)", id, duration);
                Ok(Some(id))
            }
            Err(e) => {
                let mut playing = self.playing.lock();
                if *playing == Some(id) {
                    *playing = None;
                }
                Err(e)
            }
        }
    }

    /// Halt the active session, if any. Idempotent.
    pub fn stop(&mut self) {
        self.end_session();
    }

    /// Make sure the device can emit sound, resuming it when suspended
    pub async fn activate(&mut self) -> Result<()> {
        let mut attempts = 0;
        loop {
            let state = self.device.state();
            if state == DeviceState::Active {
                return Ok(());
            }

            if attempts >= self.policy.max_attempts {
                return Err(ZeitgeistError::PlaybackUnavailable(format!(
                    "Output device still {:?} after {} activation attempts",
                    state, attempts
                )));
            }
            attempts += 1;

            match self.device.resume() {
                Ok(DeviceState::Active) => {
                    debug!("Output device active after {} attempt(s)", attempts);
                    return Ok(());
                }
                Ok(state) => {
                    debug!("Output device {:?} after activation attempt {}", state, attempts);
                }
                Err(e) => {
                    warn!("Output device activation failed: {}", e);
                    return Err(e);
                }
            }

            tokio::time::sleep(self.policy.retry_delay).await;
        }
    }

    /// Stop playback and put the device to sleep
    pub fn suspend(&mut self) -> Result<()> {
        self.end_session();
        self.device.suspend()
    }

    /// Drain pending notifications, releasing streams that ended on their own
    pub fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        let events: Vec<PlaybackEvent> = self.event_rx.try_iter().collect();

        for event in &events {
            if let PlaybackEvent::Finished { session } = event {
                if self.current.as_ref().map(|s| s.id) == Some(*session) {
                    // Stream already ran dry; release it without a stop event
                    if let Some(mut finished) = self.current.take() {
                        let _ = finished.stream.stop();
                    }
                    debug!("Playback session {} finished", session);
                }
            }
        }

        events
    }

    fn end_session(&mut self) {
        let Some(mut session) = self.current.take() else {
            return;
        };

        if let Err(e) = session.stream.stop() {
            debug!("Ignoring stop failure for session {}: {}", session.id, e);
        }

        let was_playing = {
            let mut playing = self.playing.lock();
            let was_playing = *playing == Some(session.id);
            if was_playing {
                *playing = None;
            }
            was_playing
        };

        if was_playing {
            let _ = self
                .event_tx
                .send(PlaybackEvent::Stopped { session: session.id });
            info!("Playback session {} stopped", session.id);
        }
    }
}
