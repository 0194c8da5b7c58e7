//! Ollama-compatible chat-completion backend (spec §2's "LLM vendor").
//!
//! Grounded on the teacher's `OllamaBackend`: same retry-with-backoff shape
//! over `/api/chat`, generalized to drive through [`drivethru_core`]'s
//! vendor-neutral request/response types instead of a bespoke
//! `GenerationResult`.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use drivethru_core::llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Role, StreamChunk, ToolCall, ToolDefinition,
};
use drivethru_core::traits::LanguageModel;
use drivethru_core::{CoreError, Result};

use crate::LlmError;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:7b-instruct-q4_K_M".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Clone)]
pub struct OllamaLanguageModel {
    client: Client,
    config: OllamaConfig,
}

impl OllamaLanguageModel {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::ExternalService(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    fn build_request(&self, request: &GenerateRequest, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream,
            tools: request.tools.iter().map(OllamaTool::from).collect(),
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens.map(|n| n as i32),
            },
        }
    }

    async fn execute_request(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")).into());
            }
            return Err(LlmError::Api(body).into());
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()).into())
    }

    fn is_retryable(error: &CoreError) -> bool {
        matches!(error, CoreError::ExternalService(_))
    }
}

#[async_trait]
impl LanguageModel for OllamaLanguageModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let ollama_request = self.build_request(&request, false);

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, "ollama request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&ollama_request).await {
                Ok(response) => return Ok(response.into_generate_response()),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string()).into()))
    }

    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>> {
        let ollama_request = self.build_request(&request, true);
        Box::pin(async_stream_adapter(self.client.clone(), self.api_url("/chat"), ollama_request))
    }

    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse> {
        let mut request = request;
        request.tools = tools.to_vec();
        self.generate(request).await
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.config.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn async_stream_adapter(
    client: Client,
    url: String,
    request: OllamaChatRequest,
) -> impl Stream<Item = Result<StreamChunk>> {
    async_stream::stream! {
        let response = match client.post(&url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                yield Err(LlmError::Network(e.to_string()).into());
                return;
            }
        };

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            yield Err(LlmError::Api(body).into());
            return;
        }

        let mut bytes_stream = response.bytes_stream();
        while let Some(chunk) = bytes_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(LlmError::Network(e.to_string()).into());
                    return;
                }
            };
            let text = String::from_utf8_lossy(&chunk).to_string();
            for line in text.lines() {
                if line.is_empty() {
                    continue;
                }
                if let Ok(parsed) = serde_json::from_str::<OllamaStreamChunk>(line) {
                    let done = parsed.done;
                    yield Ok(StreamChunk::text(parsed.message.content));
                    if done {
                        yield Ok(StreamChunk::final_chunk(FinishReason::Stop));
                        return;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&drivethru_core::llm_types::Message> for OllamaMessage {
    fn from(msg: &drivethru_core::llm_types::Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        Self {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ToolDefinition> for OllamaTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OllamaFunction {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    done: bool,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCallFunction {
    name: String,
    arguments: HashMap<String, serde_json::Value>,
}

impl OllamaChatResponse {
    fn into_generate_response(self) -> GenerateResponse {
        let tool_calls = self
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: format!("call_{i}"),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        GenerateResponse {
            text: self.message.content,
            finish_reason: if self.done { FinishReason::Stop } else { FinishReason::Length },
            usage: Some(drivethru_core::llm_types::TokenUsage::new(
                self.prompt_eval_count.unwrap_or(0),
                self.eval_count.unwrap_or(0),
            )),
            tool_calls,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    message: OllamaResponseMessage,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_uses_local_ollama_endpoint() {
        let config = OllamaConfig::default();
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn message_role_maps_to_ollama_role_strings() {
        let msg = drivethru_core::llm_types::Message::user("hi");
        let ollama_msg = OllamaMessage::from(&msg);
        assert_eq!(ollama_msg.role, "user");
        assert_eq!(ollama_msg.content, "hi");
    }
}
