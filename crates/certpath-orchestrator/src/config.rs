//! Configuration types for the CertPath service.
//!
//! Settings are read from `certpath.json`. Every field has a default, so an
//! absent file or an empty object yields a working configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CertPathError, Result};
use crate::events::DEFAULT_EVENT_BUFFER;

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "certpath.json";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_api_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

const fn default_timeout_seconds() -> u64 {
    60
}

const fn default_lesson_temperature() -> f32 {
    0.7
}

const fn default_lesson_max_tokens() -> u32 {
    1000
}

const fn default_quiz_temperature() -> f32 {
    0.4
}

const fn default_quiz_max_tokens() -> u32 {
    800
}

const fn default_question_count() -> u32 {
    5
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-subscriber buffer for progress events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Content generation settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_buffer_size: default_event_buffer_size(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Loads `certpath.json` from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CertPathError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `certpath.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CertPathError::ConfigParseError` for unreadable files or
    /// invalid JSON, and `CertPathError::ConfigValidationError` for values
    /// out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CertPathError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CertPathError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `CertPathError::ConfigValidationError` naming the first bad
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CertPathError::config_validation(
                "host must not be empty",
                "Set host to an address such as 127.0.0.1 in your certpath.json",
            ));
        }

        if self.port == 0 {
            return Err(CertPathError::config_validation(
                "port must be greater than 0",
                "Set port to a free TCP port such as 8000 in your certpath.json",
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(CertPathError::config_validation(
                "eventBufferSize must be greater than 0",
                "Set eventBufferSize to at least 1 in your certpath.json",
            ));
        }

        self.gemini.validate()
    }
}

/// Settings for the Gemini content generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    /// Base URL of the Generative Language API.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Model used for both lessons and quizzes.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout for each generation call.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Sampling settings for lessons.
    #[serde(default)]
    pub lesson: GenerationSettings,

    /// Sampling settings for quizzes.
    #[serde(default)]
    pub quiz: QuizSettings,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            lesson: GenerationSettings::default(),
            quiz: QuizSettings::default(),
        }
    }
}

impl GeminiConfig {
    fn validate(&self) -> Result<()> {
        if self.api_endpoint.trim().is_empty() {
            return Err(CertPathError::config_validation(
                "gemini.apiEndpoint must not be empty",
                "Remove gemini.apiEndpoint from your certpath.json to use the public endpoint",
            ));
        }

        if self.model.trim().is_empty() {
            return Err(CertPathError::config_validation(
                "gemini.model must not be empty",
                "Set gemini.model to a model name such as gemini-2.0-flash",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(CertPathError::config_validation(
                "gemini.timeoutSeconds must be greater than 0",
                "Set gemini.timeoutSeconds to at least 1 second in your certpath.json",
            ));
        }

        self.lesson.validate("gemini.lesson")?;
        self.quiz.generation().validate("gemini.quiz")?;

        if self.quiz.question_count == 0 {
            return Err(CertPathError::config_validation(
                "gemini.quiz.questionCount must be greater than 0",
                "Set gemini.quiz.questionCount to at least 1 in your certpath.json",
            ));
        }

        Ok(())
    }
}

/// Sampling settings for one kind of generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Sampling temperature, between 0 and 2.
    #[serde(default = "default_lesson_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens.
    #[serde(default = "default_lesson_max_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: default_lesson_temperature(),
            max_output_tokens: default_lesson_max_tokens(),
        }
    }
}

impl GenerationSettings {
    fn validate(&self, field: &str) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CertPathError::config_validation(
                format!("{field}.temperature must be between 0 and 2"),
                format!("Set {field}.temperature to a value such as 0.7 in your certpath.json"),
            ));
        }

        if self.max_output_tokens == 0 {
            return Err(CertPathError::config_validation(
                format!("{field}.maxOutputTokens must be greater than 0"),
                format!("Set {field}.maxOutputTokens to at least 1 in your certpath.json"),
            ));
        }

        Ok(())
    }
}

/// Sampling settings for quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    /// Sampling temperature, between 0 and 2.
    #[serde(default = "default_quiz_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens.
    #[serde(default = "default_quiz_max_tokens")]
    pub max_output_tokens: u32,

    /// Number of questions requested per quiz.
    #[serde(default = "default_question_count")]
    pub question_count: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            temperature: default_quiz_temperature(),
            max_output_tokens: default_quiz_max_tokens(),
            question_count: default_question_count(),
        }
    }
}

impl QuizSettings {
    /// The sampling part of these settings.
    #[must_use]
    pub const fn generation(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}
