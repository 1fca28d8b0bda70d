//! Generative AI backend seam

pub mod gemini;

pub use gemini::GeminiClient;

use crate::messages::Message;
use crate::persona::{Persona, SpeakerVoice};
use crate::Result;
use async_trait::async_trait;

/// Text generation and speech synthesis service
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate the persona's next reply to `history`.
    ///
    /// `history` is the whole conversation, oldest first, ending with the
    /// user's latest message. `Ok(None)` means the service answered with no
    /// text.
    async fn generate_text(&self, persona: &Persona, history: &[Message])
        -> Result<Option<String>>;

    /// Synthesize `text` and return the base64 PCM payload, if any
    async fn synthesize_speech(&self, text: &str, voice: SpeakerVoice) -> Result<Option<String>>;
}
