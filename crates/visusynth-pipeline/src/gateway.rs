// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client for an OpenAI-compatible chat-completions gateway.
//
// One request per call: no retries and no client-side timeout. Callers map
// `GatewayError` into their own stage error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use visusynth_core::config::GatewayConfig;

/// Why a completion could not be obtained.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI API key is not configured (set {0})")]
    MissingApiKey(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Payment required. Please add credits to your AI workspace.")]
    PaymentRequired,

    #[error("AI API error: {0}")]
    Status(u16),

    #[error("AI gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI gateway returned no content")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
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
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions client shared by the correction and summarization stages.
#[derive(Debug, Clone)]
pub struct AiGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl AiGateway {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            api_key_env: String::from("the API key"),
        }
    }

    /// Build from configuration, reading the key from the configured
    /// environment variable.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            api_key_env: config.api_key_env.clone(),
            ..Self::new(&config.endpoint, &config.model, config.api_key())
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a system prompt and a user message; return the first choice's
    /// content.
    #[instrument(skip(self, system_prompt, user_text), fields(model = %self.model, chars = user_text.chars().count()))]
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::MissingApiKey(self.api_key_env.clone()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "AI gateway error");
            return Err(match status.as_u16() {
                429 => GatewayError::RateLimited,
                402 => GatewayError::PaymentRequired,
                code => GatewayError::Status(code),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(GatewayError::EmptyResponse)?;

        debug!(chars = content.chars().count(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn gateway(server: &MockServer) -> AiGateway {
        AiGateway::new(
            format!("{}/v1/chat/completions", server.uri()),
            "google/gemini-2.5-flash",
            Some("secret".into()),
        )
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("secret"))
            .and(body_partial_json(json!({
                "model": "google/gemini-2.5-flash",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = gateway(&server).complete("be brief", "hello").await.unwrap();
        assert_eq!(reply, "hi");
    }

    #[tokio::test]
    async fn status_codes_are_classified() {
        for (status, expected) in [(429u16, "Rate limit"), (402, "Payment required"), (500, "AI API error: 500")] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;
            let err = gateway(&server).complete("s", "u").await.unwrap_err();
            assert!(err.to_string().contains(expected), "{status}: {err}");
        }
    }

    #[tokio::test]
    async fn missing_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;
        let err = gateway(&server).complete("s", "u").await.unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let gateway = AiGateway::new(server.uri(), "m", None);
        assert!(matches!(
            gateway.complete("s", "u").await,
            Err(GatewayError::MissingApiKey(_))
        ));
    }
}
