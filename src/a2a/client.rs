//! Client for calling a peer agent's server.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::debug;

use super::endpoint::Endpoint;
use super::types::{AgentCard, RemoteMessage, RpcCall, RpcRequest, RpcResponse, SendMessageResponse};
use crate::agent::Delegate;
use crate::error::SwarmError;

/// Handle on a peer agent. Each call opens its own connection.
#[derive(Debug, Clone)]
pub struct AgentClient {
    name: String,
    description: String,
    endpoint: Endpoint,
    caller: Option<String>,
}

impl AgentClient {
    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            endpoint,
            caller: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name the calling agent in requests, for the peer's logs.
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn get_card(&self) -> Result<AgentCard, SwarmError> {
        match self.call(RpcCall::GetAgentCard).await? {
            RpcResponse::AgentCard(card) => Ok(card),
            other => Err(self.unexpected("get_agent_card", &other)),
        }
    }

    pub async fn send_message(&self, message: RemoteMessage) -> Result<SendMessageResponse, SwarmError> {
        match self.call(RpcCall::SendMessage { message }).await? {
            RpcResponse::SendMessage(response) => Ok(response),
            other => Err(self.unexpected("send_message", &other)),
        }
    }

    /// Send one text message and return the flattened reply.
    pub async fn send_text(&self, text: &str) -> Result<String, SwarmError> {
        match self.send_message(RemoteMessage::user_text(text)).await? {
            SendMessageResponse::Msg(reply) => Ok(reply.flattened()),
            SendMessageResponse::Task(task) => Err(SwarmError::decoding(
                format!("reply from agent {}", self.name),
                format!("expected a message, got task {}", task.id),
            )),
        }
    }

    async fn call(&self, call: RpcCall) -> Result<RpcResponse, SwarmError> {
        let method = call.method();
        debug!(peer = %self.name, endpoint = %self.endpoint, method, "calling agent");

        let stream = self
            .endpoint
            .connect()
            .await
            .map_err(|e| self.transport(format!("connect to {} failed: {e}", self.endpoint)))?;
        let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

        let request = RpcRequest {
            caller: self.caller.clone(),
            call,
        };
        let payload = serde_json::to_vec(&request)?;
        framed
            .send(Bytes::from(payload))
            .await
            .map_err(|e| self.transport(format!("{method}: send failed: {e}")))?;

        let frame = framed
            .next()
            .await
            .ok_or_else(|| self.transport(format!("{method}: connection closed before reply")))?
            .map_err(|e| self.transport(format!("{method}: read failed: {e}")))?;

        let response: RpcResponse = serde_json::from_slice(&frame)
            .map_err(|e| SwarmError::decoding(format!("{method} reply from agent {}", self.name), e))?;
        match response {
            RpcResponse::Error { code, message } => Err(SwarmError::Remote {
                agent: self.name.clone(),
                code,
                message,
            }),
            other => Ok(other),
        }
    }

    fn transport(&self, message: String) -> SwarmError {
        SwarmError::transport("agent", self.name.clone(), message)
    }

    fn unexpected(&self, method: &str, response: &RpcResponse) -> SwarmError {
        SwarmError::decoding(
            format!("{method} reply from agent {}", self.name),
            format!("unexpected response {response:?}"),
        )
    }
}

#[async_trait]
impl Delegate for AgentClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn delegate(&self, input: &str) -> Result<String, SwarmError> {
        self.send_text(input).await
    }
}
