//! Live adapter for the `LlmClient` port using an OpenAI-compatible chat API.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::ports::llm::{ChatMessage, CompletionRequest, CompletionResponse, LlmClient, LlmFuture};

/// Live LLM client that calls `POST {base_url}/chat/completions`.
pub struct LiveLlmClient {
    client: Client,
    endpoint: String,
}

impl LiveLlmClient {
    /// Creates a client for the given API base URL (e.g. `https://host/v1`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { client: Client::new(), endpoint: chat_endpoint(base_url) }
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Request body sent to the chat completions API.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Top-level response from the chat completions API.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error response body.
#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let body = ChatRequest {
                model: &request.model,
                messages: &request.messages,
                temperature: request.temperature,
            };

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&request.credential)
                .json(&body)
                .send()
                .await
                .map_err(|e| UpstreamError::transport(format!("request failed: {e}")))?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| UpstreamError::transport(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                let msg = serde_json::from_str::<ApiError>(&response_text)
                    .map(|e| e.error.message)
                    .unwrap_or(response_text);
                return Err(UpstreamError::status(status.as_u16(), msg));
            }

            parse_chat_response(&response_text)
        })
    }
}

fn parse_chat_response(body: &str) -> Result<CompletionResponse, UpstreamError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::transport(format!("failed to parse response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| CompletionResponse { text })
        .ok_or_else(|| UpstreamError::transport("response contained no message content"))
}
