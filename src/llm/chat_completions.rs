//! `OpenAI` Chat Completions driver.
//!
//! Sends a single non-streaming request to `/v1/chat/completions` and
//! returns the first choice's text.

use anyhow::Context;
use serde::Serialize;

use super::provider::AuthScheme;
use super::{ChatMessage, LlmSettings};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Driver for the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Settings this driver was built with.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Request one completion and return the assistant's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url, &self.settings.model);

        let body = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        };

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = match self.settings.provider.auth_scheme() {
                AuthScheme::Bearer => rb.bearer_auth(k),
                AuthScheme::ApiKeyHeader => rb.header("api-key", k),
            };
        }

        let resp = rb.send().await?.error_for_status()?;
        let v: serde_json::Value = resp.json().await?;
        extract_content(&v)
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_content(v: &serde_json::Value) -> anyhow::Result<String> {
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .context("completion response has no choices[0].message.content")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_content() {
        let v = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi there" } }]
        });
        assert_eq!(extract_content(&v).unwrap(), "Hi there");
    }

    #[test]
    fn test_extract_content_missing() {
        assert!(extract_content(&json!({ "choices": [] })).is_err());
        assert!(extract_content(&json!({ "error": { "message": "nope" } })).is_err());
    }

    #[test]
    fn test_request_body() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("q")];
        let body = serde_json::to_value(CompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 300,
            stream: false,
        })
        .unwrap();

        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0], json!({ "role": "system", "content": "sys" }));
        assert_eq!(body["messages"][1], json!({ "role": "user", "content": "q" }));
    }
}
