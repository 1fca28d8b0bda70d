use crate::audio::AudioBuffer;
use crate::audio::encoding::encode_base64;
use crate::{Result, ZeitgeistError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Who produced a message, named the way the generation API expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// Inline image extracted from a data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// An image the user attached, kept as a `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageAttachment(String);

impl ImageAttachment {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime_type, encode_base64(bytes)))
    }

    /// Read an image file, guessing its MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime_type = mime_type_for(path).ok_or_else(|| {
            ZeitgeistError::ConfigError(format!("Unsupported image type: {}", path.display()))
        })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(mime_type, &bytes))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    /// Split into MIME type and payload.
    ///
    /// Mirrors `^data:(.+);base64,(.+)$`: both captures must be non-empty,
    /// the greedy MIME capture runs to the last `;base64,` marker, and
    /// newlines are not matched. Anything else yields `None`.
    pub fn inline_data(&self) -> Option<InlineImage> {
        let rest = self.0.strip_prefix("data:")?;
        if rest.contains('\n') {
            return None;
        }
        let (mime_type, data) = rest.rsplit_once(";base64,")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(InlineImage {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// One entry of the chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub image: Option<ImageAttachment>,
    /// Synthesized speech for model messages; `None` while loading or when
    /// synthesis failed.
    #[serde(skip)]
    pub audio: Option<Arc<AudioBuffer>>,
    pub is_audio_loading: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), role, text)
    }

    pub fn with_id(id: Uuid, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            image: None,
            audio: None,
            is_audio_loading: false,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>, image: Option<ImageAttachment>) -> Self {
        let mut message = Self::new(Role::User, text);
        message.image = image;
        message
    }

    /// A model reply whose speech is still being synthesized
    pub fn model_pending_audio(id: Uuid, text: impl Into<String>) -> Self {
        let mut message = Self::with_id(id, Role::Model, text);
        message.is_audio_loading = true;
        message
    }

    /// Whether the message carries audio with at least one frame
    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().is_some_and(|audio| !audio.is_empty())
    }
}
