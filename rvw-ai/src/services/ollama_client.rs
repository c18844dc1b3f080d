//! Ollama chat API client
//!
//! Sends one non-streaming `/api/chat` request per batch and returns the
//! assistant message text. No retries: a failed call is reported to the
//! orchestrator, which records it against the batch.

use crate::config::ServiceSettings;
use crate::types::{CompletionService, ServiceRequest, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = concat!("rvw-ai/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Ollama API client
pub struct OllamaClient {
    http_client: reqwest::Client,
    settings: ServiceSettings,
}

impl OllamaClient {
    pub fn new(settings: ServiceSettings) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.settings.endpoint.trim_end_matches('/'))
    }

    fn chat_request<'a>(&'a self, request: &'a ServiceRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.settings.temperature,
            },
        }
    }
}

#[async_trait]
impl CompletionService for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ServiceRequest) -> Result<String, TransportError> {
        let url = self.chat_url();
        tracing::debug!(
            url = %url,
            model = %self.settings.model,
            payload_bytes = request.user.len(),
            "Sending chat request"
        );

        let response = self
            .http_client
            .post(&url)
            .json(&self.chat_request(request))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        extract_content(body)
    }
}

/// Assistant text of a chat response
///
/// Blank text is returned as-is so the recovery parser records it against
/// the batch; only a response without a message is an error.
fn extract_content(body: ChatResponse) -> Result<String, TransportError> {
    body.message
        .map(|message| message.content)
        .ok_or(TransportError::EmptyResponse)
}
