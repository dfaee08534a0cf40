// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider for the yotei pipeline.
//!
//! Implements [`CompletionProvider`] on top of the Chat Completions API.
//! API key resolution order: config -> `OPENAI_API_KEY` env var -> error.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use yotei_config::model::OpenAiConfig;
use yotei_core::{CompletionProvider, YoteiError};

pub use client::OpenAiClient;

use crate::types::{ChatMessage, ChatRequest};

/// OpenAI chat provider implementing [`CompletionProvider`].
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// Creates a new provider from the given configuration.
    pub fn new(config: &OpenAiConfig) -> Result<Self, YoteiError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(model = config.model, "OpenAI provider initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: OpenAiClient, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, YoteiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_text.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        let response = self.client.chat(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| YoteiError::provider("completion returned no choices"))?;
        Ok(choice.message.content)
    }
}

/// Resolve the API key from config or the `OPENAI_API_KEY` environment variable.
fn resolve_api_key(configured: &Option<String>) -> Result<String, YoteiError> {
    if let Some(key) = configured
        && !key.is_empty()
    {
        return Ok(key.clone());
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(YoteiError::Config(
            "no OpenAI API key: set openai.api_key or the OPENAI_API_KEY environment variable"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn api_key_prefers_config_over_env() {
        let resolved = resolve_api_key(&Some("sk-from-config".to_string())).unwrap();
        assert_eq!(resolved, "sk-from-config");
    }

    #[test]
    fn empty_config_key_is_rejected_without_env() {
        // Empty configured keys fall through to the env var lookup; the
        // error message must point at both sources.
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return; // environment already provides a key; nothing to assert
        }
        let err = resolve_api_key(&Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "extract"},
                    {"role": "user", "content": "明日14時に会議"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "{\"タイトル\":\"会議\"}"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", std::time::Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let provider = OpenAiProvider::with_client(client, "gpt-4".to_string(), 0.3);

        let raw = provider.complete("extract", "明日14時に会議").await.unwrap();
        assert_eq!(raw, "{\"タイトル\":\"会議\"}");
        server.verify().await;
    }

    #[tokio::test]
    async fn complete_with_no_choices_is_a_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-2",
                "object": "chat.completion",
                "choices": [],
                "usage": {"prompt_tokens": 5, "completion_tokens": 0, "total_tokens": 5}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", std::time::Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let provider = OpenAiProvider::with_client(client, "gpt-4".to_string(), 0.3);

        let err = provider.complete("extract", "text").await.unwrap_err();
        assert!(err.to_string().contains("no choices"), "got: {err}");
    }
}
