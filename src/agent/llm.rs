//! Agent driven by a model and a tool catalog.

use std::sync::Arc;

use async_trait::async_trait;
use bon::bon;
use tokio::sync::Mutex;
use tracing::info;

use super::memory::Conversation;
use super::{Agent, AgentCore};
use crate::a2a::{AgentCard, Endpoint, Listener};
use crate::agent_loop::ConversationLoop;
use crate::error::SwarmError;
use crate::provider::ModelAdapter;
use crate::tools::{ToolCatalog, ToolServer};
use crate::types::GenerationParams;

/// An agent that answers with its model, calling tools as the model asks.
///
/// History is behind an async mutex, so the agent handles one request at a
/// time.
pub struct LlmAgent {
    core: AgentCore,
    model: Box<dyn ModelAdapter>,
    instructions: String,
    params: GenerationParams,
    server_names: Vec<String>,
    include_tools: Vec<String>,
    exclude_tools: Vec<String>,
    servers: Vec<Arc<dyn ToolServer>>,
    catalog: ToolCatalog,
    memory: Mutex<Conversation>,
}

#[bon]
impl LlmAgent {
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        model: Box<dyn ModelAdapter>,
        #[builder(into, default)] description: String,
        #[builder(into, default)] instructions: String,
        #[builder(default)] params: GenerationParams,
        endpoint: Option<Endpoint>,
        #[builder(default)] servers: Vec<String>,
        #[builder(default)] include_tools: Vec<String>,
        #[builder(default)] exclude_tools: Vec<String>,
    ) -> Self {
        Self {
            core: AgentCore::new(name, description, endpoint),
            model,
            instructions,
            params,
            server_names: servers,
            include_tools,
            exclude_tools,
            servers: Vec::new(),
            catalog: ToolCatalog::empty(),
            memory: Mutex::new(Conversation::new()),
        }
    }
}

impl LlmAgent {
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Copy of the current history.
    pub async fn history(&self) -> Conversation {
        self.memory.lock().await.clone()
    }

    /// Replace the history, e.g. to resume a saved conversation.
    pub async fn restore_history(&self, history: Conversation) {
        *self.memory.lock().await = history;
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn description(&self) -> &str {
        &self.core.description
    }

    fn endpoint(&self) -> &Endpoint {
        &self.core.endpoint
    }

    fn tool_server_names(&self) -> Vec<String> {
        self.server_names.clone()
    }

    fn attach_tool_servers(&mut self, servers: Vec<Arc<dyn ToolServer>>) {
        self.servers = servers;
    }

    async fn initialize(&mut self) -> Result<(), SwarmError> {
        self.model.initialize().await?;
        self.catalog =
            ToolCatalog::resolve(&self.servers, &self.include_tools, &self.exclude_tools).await?;
        self.model.attach_tools(&self.catalog.descriptors());
        self.core.bind().await?;
        info!(
            agent = %self.core.name,
            model = self.model.model_id(),
            tools = self.catalog.len(),
            "agent initialized"
        );
        Ok(())
    }

    async fn handle(&self, input: &str) -> Result<String, SwarmError> {
        let mut memory = self.memory.lock().await;
        ConversationLoop {
            agent: &self.core.name,
            model: self.model.as_ref(),
            tools: &self.catalog,
            instructions: &self.instructions,
            params: &self.params,
        }
        .run(&mut memory, input)
        .await
        .map_err(|e| e.within_agent(&self.core.name))
    }

    fn card(&self) -> AgentCard {
        self.catalog
            .descriptors()
            .into_iter()
            .fold(self.core.card(), |card, tool| {
                card.with_skill(&tool.name, &tool.name, tool.description, vec![tool.server])
            })
    }

    fn take_listener(&mut self) -> Option<Listener> {
        self.core.take_listener()
    }
}
