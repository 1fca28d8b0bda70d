//! Chat session state
//!
//! Owns the persona selection, the transcript and the playback controller,
//! and applies [`ChatEvent`]s from the orchestrator.

use crate::audio::{OutputDevice, PlaybackController, PlaybackEvent, SessionId};
use crate::integration::orchestrator::{ChatEvent, ConversationId, TurnOrchestrator};
use crate::messages::{ImageAttachment, Message, MessageStorage};
use crate::persona::{self, Persona, SUGGESTED_QUESTIONS};
use crate::{Result, ZeitgeistError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Suggested questions are offered while the transcript is shorter than this
const SUGGESTION_WINDOW: usize = 3;

/// Why a message was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// No persona has been selected
    NoPersona,
    /// Blank text and no image attached
    Empty,
    /// A reply is still being generated
    Typing,
}

pub struct ChatState<D: OutputDevice> {
    /// Personas available for selection
    roster: Vec<Persona>,

    /// Persona of the current conversation
    persona: Option<Persona>,

    /// Id of the current conversation; events for other ids are stale
    conversation: Option<ConversationId>,

    /// Transcript of the current conversation
    messages: MessageStorage,

    /// Whether a text reply is pending
    is_typing: bool,

    /// Image to attach to the next message
    pending_image: Option<ImageAttachment>,

    /// Play speech as soon as it arrives
    auto_play: bool,

    orchestrator: TurnOrchestrator,
    playback: PlaybackController<D>,

    /// Message the active playback session belongs to
    now_playing: Option<(SessionId, Uuid)>,
}

impl<D: OutputDevice> ChatState<D> {
    pub fn new(
        roster: Vec<Persona>,
        orchestrator: TurnOrchestrator,
        playback: PlaybackController<D>,
    ) -> Self {
        Self {
            roster,
            persona: None,
            conversation: None,
            messages: MessageStorage::new(),
            is_typing: false,
            pending_image: None,
            auto_play: true,
            orchestrator,
            playback,
            now_playing: None,
        }
    }

    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn roster(&self) -> &[Persona] {
        &self.roster
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_ref()
    }

    pub fn conversation(&self) -> Option<ConversationId> {
        self.conversation
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.get_all()
    }

    pub fn message(&self, id: Uuid) -> Option<Message> {
        self.messages.get(id)
    }

    /// Message at a 1-based transcript position
    pub fn message_at(&self, position: usize) -> Option<Message> {
        self.messages.nth(position)
    }

    /// 1-based transcript position of a message
    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.messages
            .get_all()
            .iter()
            .position(|m| m.id == id)
            .map(|index| index + 1)
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn pending_image(&self) -> Option<&ImageAttachment> {
        self.pending_image.as_ref()
    }

    pub fn playback(&self) -> &PlaybackController<D> {
        &self.playback
    }

    /// Suggested questions, when the conversation is young enough for them
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.persona.is_some() && !self.is_typing && self.messages.len() < SUGGESTION_WINDOW {
            &SUGGESTED_QUESTIONS
        } else {
            &[]
        }
    }

    /// Start a fresh conversation with the persona `id`.
    ///
    /// The persona greets the user and speech for the greeting is requested
    /// right away.
    pub fn select_persona(&mut self, id: &str) -> Result<()> {
        let persona = persona::find(&self.roster, id)
            .cloned()
            .ok_or_else(|| ZeitgeistError::ConfigError(format!("Unknown persona: {}", id)))?;

        self.leave_conversation();

        let conversation = Uuid::new_v4();
        let greeting = Message::model_pending_audio(Uuid::new_v4(), persona.greeting());
        let greeting_id = greeting.id;
        let greeting_text = greeting.text.clone();
        self.messages.add(greeting);

        info!("Started conversation {} with {}", conversation, persona.name);
        self.orchestrator
            .request_speech(conversation, greeting_id, greeting_text, persona.voice);

        self.conversation = Some(conversation);
        self.persona = Some(persona);
        Ok(())
    }

    /// Return to persona selection. In-flight requests become stale.
    pub fn leave_conversation(&mut self) {
        self.stop_playback();
        if let Some(conversation) = self.conversation.take() {
            debug!("Left conversation {}", conversation);
        }
        self.persona = None;
        self.messages.clear();
        self.is_typing = false;
        self.pending_image = None;
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.pending_image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.pending_image = None;
    }

    /// Send a user message and start the persona's reply
    pub fn send_message(&mut self, text: &str) -> std::result::Result<Uuid, SendRejection> {
        let (Some(persona), Some(conversation)) = (self.persona.clone(), self.conversation) else {
            return Err(SendRejection::NoPersona);
        };
        if self.is_typing {
            return Err(SendRejection::Typing);
        }
        if text.trim().is_empty() && self.pending_image.is_none() {
            return Err(SendRejection::Empty);
        }

        let message = Message::user(text, self.pending_image.take());
        let id = message.id;
        self.messages.add(message);
        self.is_typing = true;

        self.orchestrator
            .submit_turn(conversation, persona, self.messages.get_all());
        Ok(id)
    }

    /// Apply an orchestrator event to the transcript.
    ///
    /// Events for a conversation other than the current one are dropped.
    pub async fn apply_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::ReplyReady {
                conversation,
                message,
            } => {
                if !self.is_current(conversation) {
                    debug!("Dropping stale reply for {}", conversation);
                    return;
                }
                self.messages.add(message);
                self.is_typing = false;
            }
            ChatEvent::SpeechReady {
                conversation,
                message_id,
                audio,
            } => {
                if !self.is_current(conversation) {
                    debug!("Dropping stale speech for {}", conversation);
                    return;
                }

                let has_audio = audio.as_ref().is_some_and(|a| !a.is_empty());
                let updated = self.messages.update(message_id, |m| {
                    m.audio = audio;
                    m.is_audio_loading = false;
                });
                if !updated {
                    warn!("Speech arrived for unknown message {}", message_id);
                    return;
                }

                if has_audio && self.auto_play {
                    if let Err(e) = self.play_message(message_id).await {
                        warn!("Auto-play failed: {}", e);
                    }
                }
            }
        }
    }

    fn is_current(&self, conversation: ConversationId) -> bool {
        self.conversation == Some(conversation)
    }

    /// Play a message's audio, replacing whatever is playing.
    ///
    /// Returns false when the message has no audio or the audio has no
    /// frames; whatever is playing keeps playing then.
    pub async fn play_message(&mut self, message_id: Uuid) -> Result<bool> {
        let Some(audio) = self.messages.get(message_id).and_then(|m| m.audio) else {
            return Ok(false);
        };
        if audio.is_empty() {
            debug!("Message {} has no frames to play", message_id);
            return Ok(false);
        }

        match self.playback.play(audio).await {
            Ok(Some(session)) => {
                self.now_playing = Some((session, message_id));
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                // The previous session was ended before the start failed
                self.now_playing = None;
                Err(e)
            }
        }
    }

    /// Play the message, or stop it if it is the one playing
    pub async fn toggle_playback(&mut self, message_id: Uuid) -> Result<bool> {
        if self.is_playing(message_id) {
            self.stop_playback();
            Ok(false)
        } else {
            self.play_message(message_id).await
        }
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
        self.now_playing = None;
    }

    /// Whether `message_id` is the message currently audible
    pub fn is_playing(&self, message_id: Uuid) -> bool {
        match self.now_playing {
            Some((session, id)) => {
                id == message_id && self.playback.current_session() == Some(session)
            }
            None => false,
        }
    }

    /// Drain playback notifications, forgetting sessions that ended
    pub fn poll_playback(&mut self) -> Vec<PlaybackEvent> {
        let events = self.playback.poll_events();
        for event in &events {
            if let PlaybackEvent::Finished { session } | PlaybackEvent::Stopped { session } = event
            {
                if matches!(self.now_playing, Some((current, _)) if current == *session) {
                    self.now_playing = None;
                }
            }
        }
        events
    }
}
