//! Generation dispatch: one non-streaming, JSON-object-mode completion per stage.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::credential;

/// Groq's OpenAI-compatible chat completions endpoint.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Analyze,
    Redesign,
    Roadmap,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Redesign => "redesign",
            Stage::Roadmap => "roadmap",
        }
    }

    pub fn settings(self) -> StageSettings {
        match self {
            Stage::Analyze => StageSettings::new("llama-3.3-70b-versatile", 0.5),
            Stage::Redesign => StageSettings::new("llama-3.1-8b-instant", 0.7),
            Stage::Roadmap => StageSettings::new("llama-3.1-8b-instant", 0.5),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl StageSettings {
    fn new(model: &str, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub stage: Stage,
    pub prompt: String,
    pub settings: StageSettings,
}

impl CompletionRequest {
    pub fn for_stage(stage: Stage, prompt: String) -> Self {
        Self {
            stage,
            prompt,
            settings: stage.settings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid API Key")]
    AuthFailed(String),
    #[error("Rate limit exceeded")]
    RateLimited(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// A model provider returning the raw text of one completion.
///
/// No retries happen at this layer.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &str,
    ) -> Result<String, DispatchError>;
}

/// Map a provider HTTP status onto the dispatch taxonomy.
pub fn parse_http_error(status: u16, body: &str) -> DispatchError {
    match status {
        401 | 403 => DispatchError::AuthFailed(body.to_string()),
        429 => DispatchError::RateLimited(body.to_string()),
        _ => DispatchError::GenerationFailed(format!("HTTP {}: {}", status, body)),
    }
}

// ── Groq (OpenAI-compatible) provider ────────────────────────────────────────

pub struct GroqProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GroqProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.settings.model,
            "temperature": request.settings.temperature,
            "max_tokens": request.settings.max_tokens,
            "stream": false,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
        })
    }
}

impl Default for GroqProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_URL)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &str,
    ) -> Result<String, DispatchError> {
        tracing::debug!(
            stage = %request.stage,
            model = %request.settings.model,
            "dispatching completion ({})",
            credential::preview(credential)
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&Self::build_request_body(&request))
            .send()
            .await
            .map_err(|e| DispatchError::GenerationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(stage = %request.stage, status = status.as_u16(), "provider rejected completion");
            return Err(parse_http_error(status.as_u16(), &body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| DispatchError::GenerationFailed(format!("bad provider response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| DispatchError::GenerationFailed("No content from AI".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_error() {
        assert!(matches!(parse_http_error(401, "unauthorized"), DispatchError::AuthFailed(_)));
        assert!(matches!(parse_http_error(429, "slow down"), DispatchError::RateLimited(_)));
        assert!(matches!(parse_http_error(500, "boom"), DispatchError::GenerationFailed(_)));
        assert!(matches!(parse_http_error(400, "bad"), DispatchError::GenerationFailed(_)));
    }

    #[test]
    fn test_request_body_asks_for_json_object() {
        let request = CompletionRequest::for_stage(Stage::Redesign, "hi".to_string());
        let body = GroqProvider::build_request_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_stage_settings() {
        assert_eq!(Stage::Analyze.settings().model, "llama-3.3-70b-versatile");
        assert_eq!(Stage::Redesign.settings().temperature, 0.7);
        assert_eq!(Stage::Roadmap.to_string(), "roadmap");
    }
}
