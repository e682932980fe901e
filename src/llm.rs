use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;

/// Something that turns a prompt into generated text.
///
/// `Ok(None)` means the model answered but produced no text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<Option<String>> {
        if self.candidates.is_empty() {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                anyhow::bail!("Prompt was blocked: {}", reason);
            }
            return Ok(None);
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

/// Client for the Gemini `generateContent` endpoint, bound to one model.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = self.endpoint();
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini: {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&error_body) {
                Ok(parsed) => anyhow::bail!("{}", parsed.error.message),
                Err(_) => anyhow::bail!("Gemini API error ({}): {}", status, error_body),
            }
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        body.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-pro".to_string(),
            base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-pro:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "What is 2+2?" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4\n"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server)
            .generate_content("What is 2+2?")
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("4\n"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_joins_multiple_parts() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#)
            .create_async()
            .await;

        let text = client_for(&server).generate_content("hi").await.unwrap();
        assert_eq!(text.as_deref(), Some("Hello, world"));
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .with_status(429)
            .with_body(
                r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
            )
            .create_async()
            .await;

        let err = client_for(&server).generate_content("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = client_for(&server).generate_content("hi").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Gemini API error (502"), "got: {msg}");
        assert!(msg.ends_with("bad gateway"), "got: {msg}");
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate_content("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Prompt was blocked: SAFETY");
    }

    #[tokio::test]
    async fn test_candidate_without_text_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#)
            .create_async()
            .await;

        let text = client_for(&server).generate_content("hi").await.unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "https://example.test/v1beta/".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
    }
}
