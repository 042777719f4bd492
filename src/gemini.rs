use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Returned in place of model output once every retry has failed. Callers
/// treat it as ordinary text; the extractor degrades it to a synthetic quiz.
pub const FAILURE_SENTINEL: &str =
    "❌ AI service is unavailable right now. Please try again later.";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Anything that can turn a prompt into text. The production implementation
/// is [`GeminiClient`]; tests substitute scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Total by contract: transport and API failures are absorbed here and
    /// surface only as [`FAILURE_SENTINEL`].
    async fn generate(&self, prompt: &str) -> String;
}

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    retries: u32,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            api_key: config.google_ai_key.clone(),
            model: config.gemini_model.clone(),
            retries: config.generation_retries,
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::MalformedResponse(e.to_string()))?;

        let text = body
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.trim().to_string())
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> String {
        for attempt in 1..=self.retries + 1 {
            match self.ask(prompt).await {
                Ok(text) => {
                    if text.is_empty() {
                        log::warn!("Gemini returned empty text");
                    }
                    return text;
                }
                Err(e) => {
                    log::warn!("Gemini attempt {} failed: {}", attempt, e);
                    if attempt <= self.retries {
                        tokio::time::sleep(Duration::from_secs(1 + attempt as u64)).await;
                    }
                }
            }
        }

        log::error!("All Gemini attempts failed");
        FAILURE_SENTINEL.to_string()
    }
}
