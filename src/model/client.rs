//! Model client for chat-completion inference endpoints.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use super::message::ChatMessage;

/// Default inference endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://models.github.ai/inference";

/// Default vision model.
pub const DEFAULT_MODEL_NAME: &str = "meta/Llama-3.2-11B-Vision-Instruct";

/// API version sent as the `api-version` query parameter.
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

/// Model client errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Response contained no message content")]
    EmptyResponse,
}

/// Configuration for the inference endpoint and sampling parameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model_name: String,
    pub api_version: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub extra_body: HashMap<String, Value>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_version: Some(DEFAULT_API_VERSION.to_string()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            frequency_penalty: None,
            extra_body: HashMap::new(),
        }
    }
}

impl ModelConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Append `?api-version=<version>` to the request URL.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Send requests without the `api-version` query parameter.
    pub fn without_api_version(mut self) -> Self {
        self.api_version = None;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

    /// Add a provider-specific field to the top level of the request body.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_body.insert(key.into(), value);
        self
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionsRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(flatten)]
    pub extra: &'a HashMap<String, Value>,
}

/// Chat completion returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created: u64,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting for a completion.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletion {
    /// Parse a completion from a raw response body.
    pub fn from_json(body: &str) -> Result<Self, ModelError> {
        serde_json::from_str(body).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// Content of the first choice.
    pub fn first_content(&self) -> Result<&str, ModelError> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(ModelError::EmptyResponse)
    }
}

/// Client for OpenAI-compatible chat-completion endpoints.
pub struct ModelClient {
    config: ModelConfig,
    client: Client,
}

impl ModelClient {
    /// Create a new ModelClient with the given configuration.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create a new ModelClient that sends through an existing HTTP client.
    pub fn with_http_client(config: ModelConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Create a new ModelClient with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ModelConfig::default())
    }

    /// Full URL of the chat-completions route.
    pub fn completions_url(&self) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        match &self.config.api_version {
            Some(version) => format!("{}/chat/completions?api-version={}", base, version),
            None => format!("{}/chat/completions", base),
        }
    }

    /// Build the request body for the given messages.
    pub fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatCompletionsRequest<'a> {
        ChatCompletionsRequest {
            messages,
            model: &self.config.model_name,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            extra: &self.config.extra_body,
        }
    }

    /// Send a single chat-completion request.
    ///
    /// # Arguments
    /// * `messages` - Ordered, role-tagged conversation.
    ///
    /// # Returns
    /// The decoded ChatCompletion. Failures are not retried.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, ModelError> {
        let url = self.completions_url();
        let body = self.build_request(messages);

        tracing::debug!(
            "Sending {} message(s) to {} (model: {})",
            messages.len(),
            url,
            self.config.model_name
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::ApiError {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let text = response.text().await?;
        let completion = ChatCompletion::from_json(&text)?;

        if let Some(usage) = completion.usage {
            tracing::info!(
                "Completion {} used {} tokens ({} prompt, {} completion)",
                completion.id,
                usage.total_tokens,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::{ContentItem, ImageDetailLevel, ImageUrl};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const COMPLETION_BODY: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1730000000,
        "model": "Llama-3.2-11B-Vision-Instruct",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "{\"conclusions\": \"inconnu\"}"}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 120, "completion_tokens": 12, "total_tokens": 132}
    }"#;

    /// Serve one canned HTTP response and return the raw request that was received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn local_client(config: ModelConfig) -> ModelClient {
        let http = Client::builder().no_proxy().build().unwrap();
        ModelClient::with_http_client(config, http)
    }

    fn sample_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("Extract JSON"),
            ChatMessage::user(vec![
                ContentItem::text("Extract the fields"),
                ContentItem::image(
                    ImageUrl::from_url("data:image/jpg;base64,AAAA").with_detail(ImageDetailLevel::Low),
                ),
            ]),
        ]
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.endpoint, "https://models.github.ai/inference");
        assert_eq!(config.model_name, "meta/Llama-3.2-11B-Vision-Instruct");
        assert_eq!(config.api_version.as_deref(), Some("2024-05-01-preview"));
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn test_completions_url() {
        let client = ModelClient::new(ModelConfig::default().with_endpoint("https://host/inference/"));
        assert_eq!(
            client.completions_url(),
            "https://host/inference/chat/completions?api-version=2024-05-01-preview"
        );

        let client = ModelClient::new(
            ModelConfig::default()
                .with_endpoint("https://host/inference")
                .with_api_version("2025-01-01"),
        );
        assert_eq!(
            client.completions_url(),
            "https://host/inference/chat/completions?api-version=2025-01-01"
        );

        let client = ModelClient::new(
            ModelConfig::default()
                .with_endpoint("https://host/inference")
                .without_api_version(),
        );
        assert_eq!(client.completions_url(), "https://host/inference/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let client = ModelClient::with_defaults();
        let messages = sample_messages();
        let value = serde_json::to_value(client.build_request(&messages)).unwrap();

        assert_eq!(value["model"], "meta/Llama-3.2-11B-Vision-Instruct");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"][1]["image_url"]["detail"], "low");
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_request_body_merges_extra_fields() {
        let client = ModelClient::new(
            ModelConfig::default()
                .with_max_tokens(512)
                .with_temperature(0.0)
                .with_extra("seed", json!(42)),
        );
        let messages = sample_messages();
        let value = serde_json::to_value(client.build_request(&messages)).unwrap();

        assert_eq!(value["max_tokens"], 512);
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["seed"], 42);
    }

    #[test]
    fn test_parse_completion() {
        let completion = ChatCompletion::from_json(COMPLETION_BODY).unwrap();
        assert_eq!(completion.id, "chatcmpl-1");
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.unwrap().total_tokens, 132);
        assert_eq!(completion.first_content().unwrap(), r#"{"conclusions": "inconnu"}"#);
    }

    #[test]
    fn test_first_content_empty() {
        let completion = ChatCompletion::from_json(r#"{"choices": []}"#).unwrap();
        assert!(matches!(completion.first_content(), Err(ModelError::EmptyResponse)));

        let completion =
            ChatCompletion::from_json(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
                .unwrap();
        assert!(matches!(completion.first_content(), Err(ModelError::EmptyResponse)));
    }

    #[test]
    fn test_parse_completion_invalid() {
        let err = ChatCompletion::from_json("not json").unwrap_err();
        assert!(matches!(err, ModelError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_token() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", COMPLETION_BODY).await;
        let client = local_client(
            ModelConfig::default()
                .with_endpoint(&base_url)
                .with_api_key("secret-token"),
        );

        let completion = client.complete(&sample_messages()).await.unwrap();
        assert_eq!(completion.first_content().unwrap(), r#"{"conclusions": "inconnu"}"#);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat/completions?api-version=2024-05-01-preview HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer secret-token"));
        assert!(request.contains("\"model\":\"meta/Llama-3.2-11B-Vision-Instruct\""));
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let (base_url, server) =
            serve_once("HTTP/1.1 401 Unauthorized", r#"{"error": "bad credentials"}"#).await;
        let client = local_client(ModelConfig::default().with_endpoint(&base_url));

        let err = client.complete(&sample_messages()).await.unwrap_err();
        match err {
            ModelError::ApiError { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad credentials"));
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }
}
