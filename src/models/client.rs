//! Ollama chat and embedding client
//!
//! Implements the model port against a local Ollama server:
//! - Endpoint: POST /api/chat (tools for text mode, `format` for structured mode)
//! - Endpoint: POST /api/embed (dense retrieval embeddings)
//! - Endpoint: GET /api/version (health check)
//!
//! Responses are requested with `stream: false`; each call yields one reply.

use crate::config::ModelConfig;
use crate::errors::{RagError, Result};
use crate::models::port::{ChatModel, Embedder};
use crate::models::types::{ChatMessage, ModelReply};
use crate::tools::ToolSchema;
use crate::types::ToolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Request timeout (120 seconds; answer synthesis on CPU can be slow)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama client implementing `ChatModel` and `Embedder`
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: Option<f32>,
}

impl OllamaClient {
    /// Create client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_CHAT_MODEL)
    }

    /// Create client for a given server and chat model
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::build(base_url, model, DEFAULT_EMBEDDING_MODEL, None, REQUEST_TIMEOUT)
    }

    /// Create client from the `[model]` config section
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::build(
            &config.ollama_url(),
            &config.chat_model,
            &config.embedding_model,
            Some(config.temperature),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn build(
        base_url: &str,
        model: &str,
        embedding_model: &str,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            temperature,
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Get current chat model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSchema],
        format: Option<&'a serde_json::Value>,
    ) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages: messages.iter().map(OllamaMessage::from_chat).collect(),
            tools: tools.iter().map(OllamaTool::from_schema).collect(),
            format,
            stream: false,
            options: self.temperature.map(|t| OllamaOptions { temperature: t }),
        }
    }

    async fn post_chat(&self, request: &OllamaChatRequest<'_>) -> Result<OllamaChatResponse> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::ModelApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to parse chat response: {}", e)))
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn invoke(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ModelReply> {
        let request = self.chat_request(messages, tools, None);
        let response = self.post_chat(&request).await?;

        tracing::debug!(
            model = %self.model,
            tool_calls = response.message.tool_calls.len(),
            "chat reply received"
        );

        Ok(response.message.into_reply())
    }

    async fn invoke_structured(
        &self,
        messages: &[ChatMessage],
        shape: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request = self.chat_request(messages, &[], Some(shape));
        let response = self.post_chat(&request).await?;

        serde_json::from_str(response.message.content.trim()).map_err(|e| {
            RagError::ContractViolation(format!(
                "structured reply is not JSON ({}): {}",
                e, response.message.content
            ))
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = OllamaEmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to send embed request: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::ModelApiError(format!(
                "Embedding request failed: HTTP {}",
                response.status()
            )));
        }

        let body: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to parse embeddings: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(RagError::ModelApiError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a serde_json::Value>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Message in Ollama's wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl OllamaMessage {
    fn from_chat(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_name: message.tool_name.clone(),
        }
    }

    /// Ollama does not assign call ids, so fresh ones are generated here
    fn into_reply(self) -> ModelReply {
        if self.tool_calls.is_empty() {
            return ModelReply::Text(self.content);
        }

        let calls = self
            .tool_calls
            .into_iter()
            .map(|call| ToolCall::new(call.function.name, call.function.arguments))
            .collect();

        ModelReply::ToolCalls {
            calls,
            content: self.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Tool declaration in Ollama's wire format
#[derive(Debug, Serialize)]
struct OllamaTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> OllamaTool<'a> {
    fn from_schema(schema: &'a ToolSchema) -> Self {
        Self {
            kind: "function",
            function: OllamaFunction {
                name: &schema.name,
                description: &schema.description,
                parameters: &schema.parameters,
            },
        }
    }
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::retrieve_tool_schema;
    use crate::types::Role;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.model(), DEFAULT_CHAT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
        assert_eq!(ChatModel::name(&client), DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = OllamaClient::with_config("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.1:8b");
    }

    #[test]
    fn test_chat_request_with_tools() {
        let client = OllamaClient::new().unwrap();
        let messages = vec![ChatMessage::user("What is the refund policy?")];
        let tools = vec![retrieve_tool_schema()];

        let request = client.chat_request(&messages, &tools, None);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "retrieve");
        assert!(value.get("format").is_none());
    }

    #[test]
    fn test_chat_request_structured() {
        let client = OllamaClient::new().unwrap();
        let messages = vec![ChatMessage::user("grade this")];
        let shape = json!({"type": "object"});

        let request = client.chat_request(&messages, &[], Some(&shape));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["format"], shape);
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_parse_tool_call_reply() {
        let body = json!({
            "model": "qwen2.5:7b-instruct",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "retrieve", "arguments": {"query": "refund policy"}}}
                ]
            },
            "done": true
        });

        let response: OllamaChatResponse = serde_json::from_value(body).unwrap();
        match response.message.into_reply() {
            ModelReply::ToolCalls { calls, .. } => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "retrieve");
                assert_eq!(calls[0].arguments["query"], "refund policy");
                assert!(calls[0].id.starts_with("call_"));
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_text_reply() {
        let body = json!({"message": {"role": "assistant", "content": "Hi there"}, "done": true});
        let response: OllamaChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            response.message.into_reply(),
            ModelReply::Text("Hi there".to_string())
        );
    }

    #[test]
    fn test_tool_message_wire_format() {
        let message = ChatMessage {
            role: Role::Tool,
            content: "Refunds are accepted within 30 days.".to_string(),
            tool_calls: Vec::new(),
            tool_name: Some("retrieve".to_string()),
        };
        let value = serde_json::to_value(OllamaMessage::from_chat(&message)).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_name"], "retrieve");
    }
}
