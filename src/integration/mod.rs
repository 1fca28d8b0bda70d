//! Wiring between the backend, the audio pipeline and the UI

pub mod config;
pub mod orchestrator;

pub use config::{AppConfig, AudioConfig, BackendConfig};
pub use orchestrator::{
    ChatEvent, ChatEvents, ConversationId, TurnOrchestrator, EMPTY_REPLY_FALLBACK,
    ERROR_REPLY_FALLBACK,
};
