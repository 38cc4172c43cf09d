//! Wire types for agent-to-agent invocation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a remote message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// One piece of a remote message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Data {
        data: serde_json::Value,
    },
    File {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The line this part contributes to a flattened prompt.
    fn as_line(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Data { data } => data.to_string(),
            Self::File { uri, .. } => uri.clone(),
        }
    }
}

/// Join parts into one prompt, one line per part, in order.
pub fn flatten_parts(parts: &[Part]) -> String {
    parts.iter().map(Part::as_line).collect::<Vec<_>>().join("\n")
}

/// A message exchanged between agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub message_id: String,
    #[serde(default)]
    pub context_id: String,
    pub role: MessageRole,
    pub parts: Vec<Part>,
}

impl RemoteMessage {
    /// A user message with fresh ids.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            context_id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            parts: vec![Part::text(text)],
        }
    }

    /// An agent reply. Message and context ids are always fresh.
    pub fn agent_reply(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            context_id: Uuid::new_v4().to_string(),
            role: MessageRole::Agent,
            parts: vec![Part::text(text)],
        }
    }

    pub fn flattened(&self) -> String {
        flatten_parts(&self.parts)
    }
}

/// Long-running task handle. Declared for wire compatibility; replies from
/// this crate are always messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMessageResponse {
    Msg(RemoteMessage),
    Task(Task),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub streaming: bool,
    pub push_notifications: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Self-description an agent returns from `GetAgentCard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: AgentCapabilities::default(),
            default_input_modes: vec!["text".into()],
            default_output_modes: vec!["text".into()],
            skills: Vec::new(),
        }
    }

    pub fn with_skill(mut self, id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, tags: Vec<String>) -> Self {
        self.skills.push(AgentSkill {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags,
        });
        self
    }
}

/// The operations a remote agent accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RpcCall {
    GetAgentCard,
    SendMessage { message: RemoteMessage },
}

impl RpcCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetAgentCard => "get_agent_card",
            Self::SendMessage { .. } => "send_message",
        }
    }
}

/// One request frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Name of the calling agent, for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    pub call: RpcCall,
}

/// One response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcResponse {
    AgentCard(AgentCard),
    SendMessage(SendMessageResponse),
    Error { code: String, message: String },
}

impl RpcResponse {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
