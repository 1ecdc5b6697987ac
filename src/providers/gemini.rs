//! Gemini `generateContent` client for scene ideas.
//!
//! One REST call, JSON pinned at the request level via
//! `generationConfig.responseMimeType` so the model answers with a parseable
//! object instead of prose. The client hands back the raw candidate text;
//! fence stripping and parsing live in [`crate::pipeline::ideas`].

use crate::error::ServiceError;
use crate::providers::IdeaModel;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// REST client for Google's `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client with its own request timeout.
    pub fn new(model: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        })
    }
}

// Response shape: candidates[0].content.parts[*].text
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl IdeaModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!(
            "{GEMINI_API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ServiceError::BadResponse(
                "no candidate text in response".into(),
            ));
        }

        debug!("Idea model returned {} chars", text.len());
        Ok(text)
    }
}
