//! Agents: the common trait, shared core, and the concrete kinds.

pub mod llm;
pub mod memory;
pub mod remote;

pub use llm::LlmAgent;
pub use memory::Conversation;
pub use remote::RemoteAgent;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::a2a::{AgentCard, Endpoint, Listener};
use crate::error::SwarmError;
use crate::tools::ToolServer;

/// Something a workflow can hand work to.
#[async_trait]
pub trait Delegate: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn delegate(&self, input: &str) -> Result<String, SwarmError>;
}

/// Sub-agents by name.
pub type AgentDirectory = BTreeMap<String, Arc<dyn Delegate>>;

/// A participant in the swarm.
///
/// Lifecycle: construct, attach tool servers and sub-agents, `initialize`
/// once, then serve. Everything after initialization goes through `&self`.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn endpoint(&self) -> &Endpoint;

    /// Whether this agent runs its own server.
    fn serves(&self) -> bool {
        true
    }

    /// Names of the tool servers this agent wants attached.
    fn tool_server_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn attach_tool_servers(&mut self, _servers: Vec<Arc<dyn ToolServer>>) {}

    /// Names of the agents this agent delegates to.
    fn sub_agent_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn attach_agents(&mut self, _directory: &AgentDirectory) -> Result<(), SwarmError> {
        Ok(())
    }

    async fn initialize(&mut self) -> Result<(), SwarmError>;

    /// Answer one flattened request.
    async fn handle(&self, input: &str) -> Result<String, SwarmError>;

    fn card(&self) -> AgentCard;

    /// Hand over the listener bound during initialization.
    fn take_listener(&mut self) -> Option<Listener>;
}

/// Name, description, endpoint and listener shared by every agent kind.
#[derive(Debug)]
pub struct AgentCore {
    pub name: String,
    pub description: String,
    pub endpoint: Endpoint,
    listener: Option<Listener>,
}

impl AgentCore {
    pub fn new(name: impl Into<String>, description: impl Into<String>, endpoint: Option<Endpoint>) -> Self {
        let name = name.into();
        let endpoint = endpoint.unwrap_or_else(|| Endpoint::default_for(&name));
        Self {
            name,
            description: description.into(),
            endpoint,
            listener: None,
        }
    }

    /// Bind the endpoint. A `tcp://host:0` endpoint is rewritten to the
    /// port actually assigned.
    pub async fn bind(&mut self) -> Result<(), SwarmError> {
        if self.listener.is_some() {
            return Ok(());
        }
        let listener = self.endpoint.bind().await.map_err(|e| {
            SwarmError::Initialization(format!("cannot listen on {}: {e}", self.endpoint))
        })?;
        self.endpoint = listener.local_endpoint()?;
        info!(agent = %self.name, endpoint = %self.endpoint, "listener bound");
        self.listener = Some(listener);
        Ok(())
    }

    pub fn take_listener(&mut self) -> Option<Listener> {
        self.listener.take()
    }

    pub fn card(&self) -> AgentCard {
        AgentCard::new(&self.name, &self.description, self.endpoint.to_string())
    }
}
