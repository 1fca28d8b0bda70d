//! Application configuration
//!
//! Loaded from TOML, with the API key overridable from the environment.

use crate::audio::{ActivationPolicy, PcmFormat};
use crate::persona::{builtin_personas, Persona};
use crate::{Result, ZeitgeistError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variables checked for the API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Generative backend settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API key sent with every request
    pub api_key: String,

    /// Base URL of the generative language REST API
    pub base_url: String,

    /// Model used for chat replies
    pub text_model: String,

    /// Model used for speech synthesis
    pub speech_model: String,

    /// Sampling temperature for chat replies
    pub temperature: f32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            temperature: 0.7,
            request_timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Audio output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Whether to open the sound card at all
    pub enable_output: bool,

    /// Play replies as soon as their speech arrives
    pub auto_play: bool,

    /// Sample rate of synthesized speech
    pub sample_rate: u32,

    /// Channel count of synthesized speech
    pub channels: u16,

    /// Resume attempts before playback is reported unavailable
    pub activation_attempts: u32,

    /// Delay between resume attempts
    pub activation_retry_delay_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enable_output: true,
            auto_play: true,
            sample_rate: PcmFormat::SPEECH.sample_rate,
            channels: PcmFormat::SPEECH.channels,
            activation_attempts: 5,
            activation_retry_delay_ms: 50,
        }
    }
}

impl AudioConfig {
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels)
    }

    pub fn activation_policy(&self) -> ActivationPolicy {
        ActivationPolicy {
            max_attempts: self.activation_attempts,
            retry_delay: Duration::from_millis(self.activation_retry_delay_ms),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub audio: AudioConfig,

    /// Extra personas appended to the built-in roster
    pub personas: Vec<Persona>,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| ZeitgeistError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZeitgeistError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Default config file location, `<config dir>/zeitgeist/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zeitgeist").join("config.toml"))
    }

    /// Resolve the configuration the binary runs with.
    ///
    /// An explicit path must exist. Otherwise the default location is used
    /// when present, else built-in defaults. The API key is then taken from
    /// the environment when set there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Take the API key from the first non-empty variable returned by `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.backend.api_key = key;
        }
    }

    /// Built-in personas followed by configured extras
    pub fn roster(&self) -> Vec<Persona> {
        let mut roster = builtin_personas();
        roster.extend(self.personas.iter().cloned());
        roster
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.backend.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// Disable the sound card (text-only mode)
    pub fn without_audio_output(mut self) -> Self {
        self.audio.enable_output = false;
        self
    }

    pub fn without_auto_play(mut self) -> Self {
        self.audio.auto_play = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.api_key.trim().is_empty() {
            return Err(ZeitgeistError::ConfigError(format!(
                "No API key configured. Set {} or add api_key to the [backend] section",
                API_KEY_VARS[0]
            )));
        }

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(ZeitgeistError::ConfigError(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.backend.temperature
            )));
        }

        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(ZeitgeistError::ConfigError(
                "Audio sample_rate and channels must be non-zero".to_string(),
            ));
        }

        if self.audio.activation_attempts == 0 {
            return Err(ZeitgeistError::ConfigError(
                "activation_attempts must be at least 1".to_string(),
            ));
        }

        let roster = self.roster();
        for (index, persona) in roster.iter().enumerate() {
            if persona.id.trim().is_empty() {
                return Err(ZeitgeistError::ConfigError(
                    "Persona id must not be empty".to_string(),
                ));
            }
            if roster[..index].iter().any(|p| p.id == persona.id) {
                return Err(ZeitgeistError::ConfigError(format!(
                    "Duplicate persona id: {}",
                    persona.id
                )));
            }
        }

        Ok(())
    }
}
