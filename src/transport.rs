//! The `/ask` exchange: wire types and the HTTP transport.
//!
//! The widget talks to the backend through [`AskTransport`], so tests can
//! substitute a scripted transport and the browser build can reuse the same
//! [`HttpAskClient`] (reqwest maps onto `fetch` on `wasm32`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path of the ask endpoint, relative to the backend origin.
pub const ASK_PATH: &str = "ask";

/// Request body for `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question exactly as typed.
    pub question: String,
}

/// Response body of `POST /ask`.
///
/// `answer` is kept as raw JSON: the widget renders whatever the backend put
/// there, see [`AskResponse::answer_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// The answer, if the backend sent one.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub answer: serde_json::Value,
}

impl AskResponse {
    /// Build a response carrying a text answer.
    #[must_use]
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: serde_json::Value::String(answer.into()),
        }
    }

    /// Text to render for this answer.
    ///
    /// A missing or `null` answer renders as the empty string. Other
    /// non-string values render as their compact JSON text.
    #[must_use]
    pub fn answer_text(&self) -> String {
        match &self.answer {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the body carried an `answer` at all.
    #[must_use]
    pub fn has_answer(&self) -> bool {
        !self.answer.is_null()
    }
}

/// Failure of a single exchange.
#[derive(Error, Debug)]
pub enum AskError {
    /// The configured backend origin cannot address `/ask`.
    #[error("invalid ask endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The request could not be sent or the response could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body is not the expected JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// Sends one question and resolves with the backend's response.
///
/// Futures are not required to be `Send`: the widget runs on a
/// single-threaded executor.
#[async_trait::async_trait(?Send)]
pub trait AskTransport {
    /// Perform one `/ask` exchange.
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError>;
}

/// `reqwest`-backed transport posting JSON to `{origin}/ask`.
#[derive(Debug, Clone)]
pub struct HttpAskClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpAskClient {
    /// Create a client for the backend at `origin` (e.g. `http://localhost:3000`).
    pub fn new(origin: impl AsRef<str>) -> Result<Self, AskError> {
        Self::with_client(origin, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(origin: impl AsRef<str>, http: reqwest::Client) -> Result<Self, AskError> {
        let mut base = Url::parse(origin.as_ref())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(ASK_PATH)?;
        Ok(Self { endpoint, http })
    }

    /// The absolute URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait(?Send)]
impl AskTransport for HttpAskClient {
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
        let body = AskRequest {
            question: question.to_string(),
        };

        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        // No status branching: error bodies are parsed like any other.
        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(
            name: "ask.response",
            status = status.as_u16(),
            bytes = bytes.len(),
            "Received ask response"
        );

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = HttpAskClient::new("http://localhost:3000").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:3000/ask");

        let client = HttpAskClient::new("http://example.com/widget").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://example.com/widget/ask");
    }

    #[test]
    fn test_invalid_origin() {
        let err = HttpAskClient::new("not a url").unwrap_err();
        assert!(matches!(err, AskError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_answer_text() {
        let parse = |s: &str| serde_json::from_str::<AskResponse>(s).unwrap();

        assert_eq!(parse(r#"{"answer":"Hi there"}"#).answer_text(), "Hi there");
        assert_eq!(parse("{}").answer_text(), "");
        assert!(!parse("{}").has_answer());
        assert_eq!(parse(r#"{"answer":null}"#).answer_text(), "");
        assert_eq!(parse(r#"{"answer":42}"#).answer_text(), "42");
        assert_eq!(parse(r#"{"answer":true}"#).answer_text(), "true");
        assert_eq!(parse(r#"{"error":"boom"}"#).answer_text(), "");
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(AskRequest {
            question: "Hello".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "question": "Hello" }));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err: AskError = serde_json::from_str::<AskResponse>("<html>")
            .unwrap_err()
            .into();
        assert!(matches!(err, AskError::MalformedBody(_)));
    }
}
