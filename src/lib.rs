pub mod audio;
pub mod backend;
pub mod integration;
pub mod messages;
pub mod persona;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ZeitgeistError {
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Playback unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ZeitgeistError {
    fn from(e: std::io::Error) -> Self {
        ZeitgeistError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for ZeitgeistError {
    fn from(e: reqwest::Error) -> Self {
        ZeitgeistError::BackendUnavailable(e.to_string())
    }
}

impl ZeitgeistError {
    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ZeitgeistError::MalformedEncoding(_) | ZeitgeistError::InvalidAudioFormat(_) => {
                "Received audio could not be decoded.".to_string()
            }
            ZeitgeistError::BackendUnavailable(_) => {
                "The AI service could not be reached. Please try again.".to_string()
            }
            ZeitgeistError::PlaybackUnavailable(_) => {
                "Audio output is unavailable. Please check your speakers.".to_string()
            }
            ZeitgeistError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            ZeitgeistError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ZeitgeistError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZeitgeistError>;
