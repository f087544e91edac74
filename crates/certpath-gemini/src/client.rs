//! The Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use certpath_orchestrator::{
    ContentError, GeminiConfig, GenerationSettings, LessonGenerator, QuizGenerator,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::prompt::{lesson_prompt, quiz_prompt};
use crate::GeminiError;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Generates lessons and quizzes with a Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client. A missing or blank key is accepted here and
    /// reported on each call instead.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Request` if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    /// Creates a client with the key read from `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Request` if the HTTP client cannot be built.
    pub fn from_env(config: GeminiConfig) -> Result<Self, GeminiError> {
        Self::new(config, std::env::var(API_KEY_ENV).ok())
    }

    /// Returns `true` if an API key is configured.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generates text for `prompt` and returns the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns a `GeminiError` if the key is missing, the request fails or
    /// times out, or the response carries no candidate text.
    pub async fn generate(
        &self,
        prompt: &str,
        settings: GenerationSettings,
        response_mime_type: Option<&'static str>,
    ) -> Result<String, GeminiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GeminiError::NotConfigured(API_KEY_ENV))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_endpoint.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                max_output_tokens: settings.max_output_tokens,
                response_mime_type,
            },
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Gemini request rejected");
            return Err(GeminiError::HttpStatus { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        parsed.first_text().ok_or(GeminiError::EmptyCandidates)
    }

    fn classify(&self, err: reqwest::Error) -> GeminiError {
        if err.is_timeout() {
            GeminiError::Timeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            GeminiError::Request(err)
        }
    }
}

#[async_trait]
impl LessonGenerator for GeminiClient {
    async fn generate_lesson(&self, topic: &str) -> Result<String, ContentError> {
        let prompt = lesson_prompt(topic);
        Ok(self.generate(&prompt, self.config.lesson, None).await?)
    }
}

#[async_trait]
impl QuizGenerator for GeminiClient {
    async fn generate_quiz(&self, topic: &str) -> Result<String, ContentError> {
        let quiz = self.config.quiz;
        let prompt = quiz_prompt(topic, quiz.question_count);
        Ok(self
            .generate(&prompt, quiz.generation(), Some("application/json"))
            .await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
