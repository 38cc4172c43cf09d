//! An agent that lives in another process.

use async_trait::async_trait;

use super::{Agent, AgentCore, Delegate};
use crate::a2a::{AgentCard, AgentClient, Endpoint, Listener};
use crate::error::SwarmError;

/// A peer reachable at a known endpoint. It does not serve; requests are
/// forwarded to the peer.
pub struct RemoteAgent {
    core: AgentCore,
    client: AgentClient,
}

impl RemoteAgent {
    pub fn new(name: impl Into<String>, description: impl Into<String>, endpoint: Endpoint) -> Self {
        let core = AgentCore::new(name, description, Some(endpoint.clone()));
        let client = AgentClient::new(core.name.clone(), endpoint).with_description(core.description.clone());
        Self { core, client }
    }

    pub fn client(&self) -> &AgentClient {
        &self.client
    }
}

#[async_trait]
impl Agent for RemoteAgent {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn description(&self) -> &str {
        &self.core.description
    }

    fn endpoint(&self) -> &Endpoint {
        &self.core.endpoint
    }

    fn serves(&self) -> bool {
        false
    }

    async fn initialize(&mut self) -> Result<(), SwarmError> {
        Ok(())
    }

    async fn handle(&self, input: &str) -> Result<String, SwarmError> {
        self.client.delegate(input).await
    }

    fn card(&self) -> AgentCard {
        self.core.card()
    }

    fn take_listener(&mut self) -> Option<Listener> {
        None
    }
}
