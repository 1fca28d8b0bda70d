//! Output device abstraction
//!
//! A device is constructed explicitly and handed to the
//! [`PlaybackController`](crate::audio::PlaybackController). It starts out
//! suspended and has to be resumed before it can emit sound.

use crate::audio::pcm::AudioBuffer;
use crate::Result;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Activation state of an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Not yet activated, or explicitly suspended
    Suspended,
    /// Activation was requested but the platform has not granted it yet
    Pending,
    /// Ready to emit samples
    Active,
}

/// Called once, from whichever thread drives the device, when every sample
/// of a stream has been emitted.
pub type CompletionHook = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one sound-emitting stream
pub trait PlaybackStream {
    /// Halt emission immediately. Stopping an already finished stream may
    /// return an error; callers are free to ignore it.
    fn stop(&mut self) -> Result<()>;
}

/// A sound output the playback controller drives
pub trait OutputDevice {
    type Stream: PlaybackStream;

    fn state(&self) -> DeviceState;

    /// Request activation; returns the state reached.
    fn resume(&mut self) -> Result<DeviceState>;

    fn suspend(&mut self) -> Result<()>;

    /// Begin emitting `buffer` from its first sample. `on_complete` fires on
    /// natural end only, never after [`PlaybackStream::stop`].
    fn start(&mut self, buffer: Arc<AudioBuffer>, on_complete: CompletionHook)
        -> Result<Self::Stream>;
}

/// Output device that produces no sound.
///
/// Each stream waits out the buffer's duration on a timer thread and then
/// reports completion, so the rest of the application behaves exactly as it
/// would with speakers attached.
pub struct SilentOutputDevice {
    state: DeviceState,
}

impl SilentOutputDevice {
    pub fn new() -> Self {
        Self {
            state: DeviceState::Suspended,
        }
    }
}

impl Default for SilentOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SilentStream {
    cancel_tx: Option<Sender<()>>,
}

impl PlaybackStream for SilentStream {
    fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.cancel_tx.take() {
            // The timer thread may already have exited
            let _ = tx.send(());
        }
        Ok(())
    }
}

impl Drop for SilentStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl OutputDevice for SilentOutputDevice {
    type Stream = SilentStream;

    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<DeviceState> {
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
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let duration = buffer.duration();

        thread::spawn(move || match cancel_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => on_complete(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("Silent stream cancelled");
            }
        });

        Ok(SilentStream {
            cancel_tx: Some(cancel_tx),
        })
    }
}
