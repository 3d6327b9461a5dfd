//! Text generation collaborator.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::RemoteError;

/// A structured prompt for the text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRequest {
    /// System message fixing the role and the output contract.
    pub system: String,
    /// The brief, usually a JSON document.
    pub prompt: String,
}

impl TextRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// Generates text from a structured prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the raw completion text.
    async fn generate(&self, request: &TextRequest) -> Result<String, RemoteError>;
}

/// Removes Markdown code fence lines around a completion.
#[must_use]
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parses a completion as JSON after removing code fences.
pub fn parse_completion<T: DeserializeOwned>(content: &str) -> Result<T, RemoteError> {
    serde_json::from_str(&strip_code_fences(content))
        .map_err(|e| RemoteError::malformed(format!("completion is not the expected JSON: {e}")))
}

#[cfg(feature = "http")]
pub use client::OpenRouterClient;

#[cfg(feature = "http")]
mod client {
    use super::{TextGenerator, TextRequest};
    use crate::collaborators::http::{parse_json, read_body};
    use crate::config::TextToolConfig;
    use crate::errors::RemoteError;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    /// OpenRouter-compatible chat completions client.
    #[derive(Debug, Clone)]
    pub struct OpenRouterClient {
        api_key: String,
        config: TextToolConfig,
        client: reqwest::Client,
    }

    impl OpenRouterClient {
        /// Creates a client.
        pub fn new(api_key: impl Into<String>, config: TextToolConfig, timeout: Duration) -> Result<Self, RemoteError> {
            Ok(Self {
                api_key: api_key.into(),
                config,
                client: crate::collaborators::http::client(timeout)?,
            })
        }
    }

    #[derive(Debug, Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: [ChatMessage<'a>; 2],
        temperature: f32,
        max_tokens: u32,
    }

    #[derive(Debug, Serialize)]
    struct ChatMessage<'a> {
        role: &'static str,
        content: &'a str,
    }

    #[derive(Debug, Deserialize)]
    struct ChatResponse {
        #[serde(default)]
        choices: Vec<ChatChoice>,
    }

    #[derive(Debug, Deserialize)]
    struct ChatChoice {
        message: ChatReply,
    }

    #[derive(Debug, Deserialize)]
    struct ChatReply {
        #[serde(default)]
        content: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for OpenRouterClient {
        async fn generate(&self, request: &TextRequest) -> Result<String, RemoteError> {
            let body = ChatRequest {
                model: &self.config.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: &request.system,
                    },
                    ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    },
                ],
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;
            let raw = read_body(response).await?;
            let parsed: ChatResponse = parse_json(&raw)?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| RemoteError::malformed("no completion content in response"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ad {
        headline: String,
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_completion() {
        let ad: Ad = parse_completion("```\n{\"headline\": \"Warm nights\"}\n```").unwrap();
        assert_eq!(ad.headline, "Warm nights");

        let err = parse_completion::<Ad>("Sure! Here is your ad.").unwrap_err();
        assert_eq!(err.failure_kind(), crate::errors::FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_mock_generator() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|req| Ok(format!("echo: {}", req.prompt)));

        let out = mock.generate(&TextRequest::new("sys", "hi")).await.unwrap();
        assert_eq!(out, "echo: hi");
    }
}
