//! Per-turn conversation pipeline
//!
//! Text -> reply -> speech synthesis -> decoded audio, run on tokio tasks.
//! Results come back to the UI as [`ChatEvent`]s tagged with the
//! conversation they belong to.

use crate::audio::{decode_speech_payload, AudioBuffer, PcmFormat};
use crate::backend::GenerativeBackend;
use crate::messages::Message;
use crate::persona::{Persona, SpeakerVoice};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reply used when the backend answers with no text
pub const EMPTY_REPLY_FALLBACK: &str = "I'm having trouble speaking right now.";

/// Reply used when the text request fails
pub const ERROR_REPLY_FALLBACK: &str = "The connection to the past is staticy. Please try again.";

/// Identifies one conversation with one persona
pub type ConversationId = Uuid;

/// Receiving side of the orchestrator's events
pub type ChatEvents = UnboundedReceiver<ChatEvent>;

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The persona's text reply is ready; its speech is still loading
    ReplyReady {
        conversation: ConversationId,
        message: Message,
    },

    /// Speech for a model message finished, successfully or not
    SpeechReady {
        conversation: ConversationId,
        message_id: Uuid,
        audio: Option<Arc<AudioBuffer>>,
    },
}

/// Runs chat turns against a [`GenerativeBackend`]
#[derive(Clone)]
pub struct TurnOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    format: PcmFormat,
    event_tx: UnboundedSender<ChatEvent>,
}

impl TurnOrchestrator {
    /// Create an orchestrator and the receiver its events arrive on
    pub fn new(backend: Arc<dyn GenerativeBackend>, format: PcmFormat) -> (Self, ChatEvents) {
        let (event_tx, event_rx) = unbounded_channel();
        (
            Self {
                backend,
                format,
                event_tx,
            },
            event_rx,
        )
    }

    /// Run one turn in the background.
    ///
    /// `history` must already end with the user's message. The text reply
    /// resolves (or falls back) before speech is requested for it.
    pub fn submit_turn(
        &self,
        conversation: ConversationId,
        persona: Persona,
        history: Vec<Message>,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let text = reply_text(this.backend.as_ref(), &persona, &history).await;
            let message = Message::model_pending_audio(Uuid::new_v4(), text.clone());
            let message_id = message.id;

            // The UI may be gone during shutdown
            let _ = this.event_tx.send(ChatEvent::ReplyReady {
                conversation,
                message,
            });

            this.speak(conversation, message_id, &text, persona.voice)
                .await;
        })
    }

    /// Synthesize speech for an existing model message in the background
    pub fn request_speech(
        &self,
        conversation: ConversationId,
        message_id: Uuid,
        text: String,
        voice: SpeakerVoice,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            this.speak(conversation, message_id, &text, voice).await;
        })
    }

    async fn speak(
        &self,
        conversation: ConversationId,
        message_id: Uuid,
        text: &str,
        voice: SpeakerVoice,
    ) {
        let audio = speech_audio(self.backend.as_ref(), text, voice, self.format).await;
        let _ = self.event_tx.send(ChatEvent::SpeechReady {
            conversation,
            message_id,
            audio,
        });
    }
}

/// Ask the backend for the persona's reply, substituting the fallback lines
pub async fn reply_text(
    backend: &dyn GenerativeBackend,
    persona: &Persona,
    history: &[Message],
) -> String {
    match backend.generate_text(persona, history).await {
        Ok(Some(text)) if !text.is_empty() => text,
        Ok(_) => {
            warn!("{} returned an empty reply", persona.id);
            EMPTY_REPLY_FALLBACK.to_string()
        }
        Err(e) => {
            warn!("Text generation failed for {}: {}", persona.id, e);
            ERROR_REPLY_FALLBACK.to_string()
        }
    }
}

/// Synthesize and decode speech; any failure yields `None`
pub async fn speech_audio(
    backend: &dyn GenerativeBackend,
    text: &str,
    voice: SpeakerVoice,
    format: PcmFormat,
) -> Option<Arc<AudioBuffer>> {
    let payload = match backend.synthesize_speech(text, voice).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!("No speech payload for voice {}", voice);
            return None;
        }
        Err(e) => {
            warn!("Speech synthesis failed: {}", e);
            return None;
        }
    };

    match decode_speech_payload(&payload, format) {
        Ok(buffer) => {
            info!(
                "Decoded {:.2}s of speech ({} frames)",
                buffer.duration_seconds(),
                buffer.frames()
            );
            Some(Arc::new(buffer))
        }
        Err(e) => {
            warn!("Discarding undecodable speech payload: {}", e);
            None
        }
    }
}
