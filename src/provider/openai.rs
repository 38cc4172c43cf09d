//! OpenAI-compatible chat completions adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{bearer_headers, build_client, status_to_error};
use super::{ModelAdapter, ModelChoice, ModelRequest, ProviderKind};
use crate::error::SwarmError;
use crate::tools::{OutputSchema, ToolDescriptor};
use crate::types::*;

/// Adapter for any provider exposing `/chat/completions`.
pub struct OpenAiChatAdapter {
    provider: ProviderKind,
    model: String,
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    tools: Vec<serde_json::Value>,
}

impl OpenAiChatAdapter {
    pub fn new(
        provider: ProviderKind,
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SwarmError> {
        Ok(Self {
            provider,
            model: model.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client()?,
            tools: Vec::new(),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn build_request_body(&self, request: &ModelRequest, with_tools: bool) -> serde_json::Value {
        let params = &request.params;
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.instructions.is_empty() {
            let role = if params.reasoning { "developer" } else { "system" };
            messages.push(serde_json::json!({ "role": role, "content": request.instructions }));
        }
        messages.extend(request.messages.iter().map(message_to_openai));

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert("messages".into(), messages.into());

        if params.reasoning {
            body.insert("max_completion_tokens".into(), params.max_tokens.into());
            body.insert(
                "reasoning_effort".into(),
                params.reasoning_effort.to_string().into(),
            );
        } else {
            body.insert("max_tokens".into(), params.max_tokens.into());
            body.insert("temperature".into(), params.temperature.into());
        }

        if with_tools && !self.tools.is_empty() {
            body.insert("tools".into(), self.tools.clone().into());
            body.insert("parallel_tool_calls".into(), params.parallel_tool_calls.into());
        }

        serde_json::Value::Object(body)
    }

    async fn post_chat(&self, body: &serde_json::Value) -> Result<OpenAiChoice, SwarmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(self.api_key.as_deref()))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await?;
        data.choices.into_iter().next().ok_or_else(|| SwarmError::Model {
            model: self.model.clone(),
            message: "no choices in response".into(),
        })
    }
}

#[async_trait]
impl ModelAdapter for OpenAiChatAdapter {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn initialize(&mut self) -> Result<(), SwarmError> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .headers(bearer_headers(self.api_key.as_deref()))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 404 || status == 405 {
            debug!(provider = %self.provider, "model listing unsupported, skipping check");
            return Ok(());
        }
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let listing: OpenAiModelList = resp.json().await?;
        if listing.data.iter().any(|m| m.id == self.model) {
            Ok(())
        } else {
            Err(SwarmError::Model {
                model: self.model.clone(),
                message: format!("model not offered by {}", self.provider),
            })
        }
    }

    fn attach_tools(&mut self, tools: &[ToolDescriptor]) {
        self.tools = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    }
                })
            })
            .collect();
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelChoice, SwarmError> {
        let body = self.build_request_body(request, true);
        debug!(model = %self.model, messages = request.messages.len(), "chat completion");

        let choice = self.post_chat(&body).await?;
        let calls: Vec<AgentToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::Value::String(tc.function.arguments),
            })
            .collect();
        let text = choice.message.content.unwrap_or_default();
        let finish = choice
            .finish_reason
            .as_deref()
            .map(FinishSignal::from_provider)
            .unwrap_or(if calls.is_empty() {
                FinishSignal::Stop
            } else {
                FinishSignal::ToolCalls
            });

        let message = if calls.is_empty() {
            ModelMessage::assistant(text)
        } else {
            ModelMessage::assistant_with_tool_calls(text, calls)
        };
        Ok(ModelChoice { message, finish })
    }

    async fn structured(
        &self,
        request: &ModelRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, SwarmError> {
        let mut body = self.build_request_body(request, false);
        body["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": schema.strict,
            }
        });

        let choice = self.post_chat(&body).await?;
        if let Some(refusal) = choice.message.refusal {
            warn!(model = %self.model, schema = %schema.name, "model refused structured output");
            return Err(SwarmError::Model {
                model: self.model.clone(),
                message: format!("refused: {refusal}"),
            });
        }
        let text = choice.message.content.unwrap_or_default();
        crate::util::json::parse_reply(&schema.name, &text)
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::Developer => "developer",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    if let Some(result) = msg.tool_result_part() {
        let content = match &result.result {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": content,
        });
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                let arguments = match &tc.arguments {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                };
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": { "name": tc.name, "arguments": arguments }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

// Chat completions response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModelEntry>,
}

#[derive(Deserialize)]
struct OpenAiModelEntry {
    id: String,
}
