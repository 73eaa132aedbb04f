//! OpenAI-compatible chat-completions client
//!
//! Works against both Azure OpenAI deployments (model omitted, `api-key`
//! header) and plain OpenAI-compatible endpoints (model set explicitly).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Role constants
pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// A single chat-completion message
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<Content>,
}

impl Message {
    /// Plain-text message constructor
    #[must_use]
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: vec![Content {
                kind: "text".to_string(),
                text: text.into(),
            }],
        }
    }
}

/// A content block (text only; the cooking agent never sends images)
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    messages: &'a [Message],
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    model: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Chat client over an OpenAI-compatible endpoint
pub struct ChatClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    http: reqwest::Client,
}

impl ChatClient {
    /// Create a chat client.
    ///
    /// `endpoint` is the full URL of the chat/completions resource;
    /// `api_key` goes into the `api-key` header.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            // Model stays empty for Azure deployments; set it for OpenAI.
            model: String::new(),
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 800,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the model name sent in the request body
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    /// Override the response token limit
    #[must_use]
    pub fn with_max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// Send a chat-completion request and return the assistant's reply
    ///
    /// # Errors
    ///
    /// Returns `Backend` on non-200 responses, empty choice lists, and
    /// unparseable bodies; transport failures surface as `Http`.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = Payload {
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            model: self.model.clone(),
        };

        tracing::debug!(endpoint = %self.endpoint, count = messages.len(), "chat request");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("chat API {status}: {body}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("chat response parse: {e}")))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Backend("empty response (no choices)".to_string()))?;

        tracing::debug!(chars = reply.len(), "chat reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_wraps_content_block() {
        let msg = Message::text(ROLE_USER, "hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.len(), 1);
        assert_eq!(msg.content[0].kind, "text");
        assert_eq!(msg.content[0].text, "hello");
    }

    #[test]
    fn payload_omits_empty_model() {
        let messages = vec![Message::text(ROLE_SYSTEM, "sys")];
        let payload = Payload {
            messages: &messages,
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 800,
            model: String::new(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
    }
}
