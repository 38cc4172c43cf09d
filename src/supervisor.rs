//! Registry of agents and tool servers, and the process lifecycle around them.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::a2a::{self, AgentClient, Endpoint};
use crate::agent::{Agent, AgentDirectory, Delegate, LlmAgent, RemoteAgent};
use crate::config::{AgentConfig, SwarmConfig, WorkflowConfig};
use crate::error::SwarmError;
use crate::provider::{create_adapter, ModelAdapter, ModelSpec};
use crate::tools::ToolServer;
use crate::workflow::{Chain, EvaluatorOptimizer, Orchestrator, Parallel, Planner, Router, Workflow, WorkflowAgent};

/// Owns every agent and tool server until [`Supervisor::start`] hands them
/// to their server tasks.
pub struct Supervisor {
    agents: BTreeMap<String, Box<dyn Agent>>,
    tool_servers: BTreeMap<String, Arc<dyn ToolServer>>,
    shutdown: CancellationToken,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
            tool_servers: BTreeMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the registry described by `config`.
    pub fn from_config(config: &SwarmConfig) -> Result<Self, SwarmError> {
        let mut supervisor = Self::new();

        #[cfg(feature = "mcp")]
        for (name, transport) in &config.mcp.servers {
            supervisor.add_tool_server(Arc::new(crate::mcp::McpToolServer::new(
                name.clone(),
                transport.clone(),
            )))?;
        }

        for (name, agent) in &config.agents {
            let built = build_agent(name, agent, config).map_err(|e| e.within_agent(name))?;
            supervisor.add_agent(built)?;
        }
        Ok(supervisor)
    }

    pub fn add_agent(&mut self, agent: Box<dyn Agent>) -> Result<(), SwarmError> {
        let name = agent.name().to_string();
        if self.agents.contains_key(&name) {
            return Err(SwarmError::Configuration(format!("duplicate agent '{name}'")));
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    pub fn add_tool_server(&mut self, server: Arc<dyn ToolServer>) -> Result<(), SwarmError> {
        let name = server.name().to_string();
        if self.tool_servers.contains_key(&name) {
            return Err(SwarmError::Configuration(format!("duplicate tool server '{name}'")));
        }
        self.tool_servers.insert(name, server);
        Ok(())
    }

    pub fn get_agent(&self, name: &str) -> Option<&dyn Agent> {
        self.agents.get(name).map(|agent| agent.as_ref())
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    /// Cancelling this token drains every agent server.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start everything and serve until shutdown.
    pub async fn run(self, entry: &str) -> Result<(), SwarmError> {
        self.start(entry).await?.wait().await
    }

    /// Start tool servers, wire and initialize agents, and spawn their
    /// servers. Returns once every agent is listening.
    pub async fn start(mut self, entry: &str) -> Result<RunningSwarm, SwarmError> {
        match self.agents.get(entry) {
            None => return Err(SwarmError::not_found("agent", entry)),
            Some(agent) if !agent.serves() => {
                return Err(SwarmError::Configuration(format!(
                    "entry agent '{entry}' is remote and cannot be served here"
                )))
            }
            Some(_) => {}
        }

        for (name, server) in &self.tool_servers {
            if let Err(e) = server.start().await {
                error!(server = %name, error = %e, "tool server failed to start");
                shutdown_tool_servers(&self.tool_servers).await;
                return Err(e);
            }
        }

        if let Err(e) = self.wire_and_initialize().await {
            shutdown_tool_servers(&self.tool_servers).await;
            return Err(e);
        }

        let entry_endpoint = self
            .agents
            .get(entry)
            .map(|agent| agent.endpoint().clone())
            .ok_or_else(|| SwarmError::not_found("agent", entry))?;

        let signals = tokio::spawn(cancel_on_signal(self.shutdown.clone()));
        let mut servers = JoinSet::new();

        // Entry agent last.
        let mut agents = std::mem::take(&mut self.agents);
        let entry_agent = agents.remove(entry);
        for mut agent in agents.into_values().chain(entry_agent) {
            if !agent.serves() {
                continue;
            }
            let name = agent.name().to_string();
            let Some(listener) = agent.take_listener() else {
                self.shutdown.cancel();
                signals.abort();
                while servers.join_next().await.is_some() {}
                shutdown_tool_servers(&self.tool_servers).await;
                return Err(SwarmError::Initialization(format!(
                    "agent '{name}' has no bound listener"
                )));
            };
            let agent: Arc<dyn Agent> = Arc::from(agent);
            let token = self.shutdown.clone();
            servers.spawn(async move { (name, a2a::serve(agent, listener, token).await) });
        }
        info!(entry, endpoint = %entry_endpoint, agents = servers.len(), "swarm running");

        Ok(RunningSwarm {
            entry: entry.to_string(),
            entry_endpoint,
            servers,
            tool_servers: self.tool_servers,
            shutdown: self.shutdown,
            signals,
        })
    }

    /// Attach tool servers, initialize, then hand every agent its directory.
    ///
    /// The directory is built after initialization so endpoints bound to
    /// port 0 carry their assigned port.
    async fn wire_and_initialize(&mut self) -> Result<(), SwarmError> {
        for agent in self.agents.values_mut() {
            let servers = agent
                .tool_server_names()
                .into_iter()
                .map(|server| {
                    self.tool_servers.get(&server).cloned().ok_or_else(|| {
                        SwarmError::Configuration(format!("unknown tool server '{server}'"))
                            .within_agent(agent.name())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            agent.attach_tool_servers(servers);
        }

        for agent in self.agents.values_mut() {
            let name = agent.name().to_string();
            agent.initialize().await.map_err(|e| e.within_agent(&name))?;
        }

        let clients: Vec<AgentClient> = self
            .agents
            .values()
            .map(|agent| {
                AgentClient::new(agent.name(), agent.endpoint().clone())
                    .with_description(agent.description())
            })
            .collect();
        for agent in self.agents.values_mut() {
            let directory: AgentDirectory = clients
                .iter()
                .filter(|client| client.name() != agent.name())
                .map(|client| {
                    let delegate: Arc<dyn Delegate> = Arc::new(client.clone().with_caller(agent.name()));
                    (client.name().to_string(), delegate)
                })
                .collect();
            agent.attach_agents(&directory)?;
        }
        Ok(())
    }
}

/// A started swarm.
pub struct RunningSwarm {
    entry: String,
    entry_endpoint: Endpoint,
    servers: JoinSet<(String, Result<(), SwarmError>)>,
    tool_servers: BTreeMap<String, Arc<dyn ToolServer>>,
    shutdown: CancellationToken,
    signals: tokio::task::JoinHandle<()>,
}

impl RunningSwarm {
    pub fn entry_endpoint(&self) -> &Endpoint {
        &self.entry_endpoint
    }

    /// Client for the entry agent.
    pub fn entry_client(&self) -> AgentClient {
        AgentClient::new(self.entry.clone(), self.entry_endpoint.clone())
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Wait for every agent server to exit, then stop the tool servers.
    ///
    /// The first server failure cancels the rest and is returned.
    pub async fn wait(mut self) -> Result<(), SwarmError> {
        let mut first_error = None;
        while let Some(joined) = self.servers.join_next().await {
            let failure = match joined {
                Ok((_, Ok(()))) => None,
                Ok((name, Err(e))) => Some(e.within_agent(name)),
                Err(e) => Some(SwarmError::InvalidState(format!("agent server task failed: {e}"))),
            };
            if let Some(e) = failure {
                error!(error = %e, "agent server failed, shutting down");
                self.shutdown.cancel();
                first_error.get_or_insert(e);
            }
        }

        self.signals.abort();
        shutdown_tool_servers(&self.tool_servers).await;
        info!("swarm stopped");
        first_error.map_or(Ok(()), Err)
    }
}

async fn shutdown_tool_servers(servers: &BTreeMap<String, Arc<dyn ToolServer>>) {
    for (name, server) in servers {
        if let Err(e) = server.shutdown().await {
            warn!(server = %name, error = %e, "tool server shutdown failed");
        }
    }
}

async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = wait_for_signal() => {}
    }
    info!("shutdown signal received");
    token.cancel();
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

fn build_agent(name: &str, agent: &AgentConfig, config: &SwarmConfig) -> Result<Box<dyn Agent>, SwarmError> {
    if let Some(workflow) = &agent.workflow {
        let workflow = build_workflow(workflow, agent, config)?;
        return Ok(Box::new(WorkflowAgent::new(
            name,
            agent.description.clone(),
            agent.url.clone(),
            workflow,
        )));
    }

    if agent.model.is_some() {
        let mut params = agent.request_params.clone();
        let model = build_model(agent, config, &mut params)?;
        return Ok(Box::new(
            LlmAgent::builder()
                .name(name)
                .model(model)
                .description(agent.description.clone())
                .instructions(agent.instructions.clone())
                .params(params)
                .maybe_endpoint(agent.url.clone())
                .servers(agent.servers.clone())
                .include_tools(agent.include_tools.clone())
                .exclude_tools(agent.exclude_tools.clone())
                .build(),
        ));
    }

    match &agent.url {
        Some(url) => Ok(Box::new(RemoteAgent::new(name, agent.description.clone(), url.clone()))),
        None => Err(SwarmError::Configuration(
            "agent needs a model, a workflow, or a url".into(),
        )),
    }
}

fn build_model(
    agent: &AgentConfig,
    config: &SwarmConfig,
    params: &mut crate::types::GenerationParams,
) -> Result<Box<dyn ModelAdapter>, SwarmError> {
    let spec: ModelSpec = agent
        .model
        .as_deref()
        .ok_or_else(|| SwarmError::Configuration("missing model".into()))?
        .parse()?;
    create_adapter(&spec, &config.providers, params)
}

fn build_workflow(workflow: &WorkflowConfig, agent: &AgentConfig, config: &SwarmConfig) -> Result<Workflow, SwarmError> {
    let planner = || -> Result<Planner, SwarmError> {
        let mut params = agent.request_params.clone();
        let model = build_model(agent, config, &mut params)?;
        Ok(Planner::new(model, agent.instructions.clone(), params))
    };

    Ok(match workflow {
        WorkflowConfig::Chain { agents, cumulative } => Workflow::Chain(Chain::new(agents.clone(), *cumulative)),
        WorkflowConfig::Router { agents } => Workflow::Router(Router::new(planner()?, agents.clone())),
        WorkflowConfig::Parallel { fan_out, fan_in } => {
            Workflow::Parallel(Parallel::new(fan_out.clone(), fan_in.clone()))
        }
        WorkflowConfig::Orchestrator { agents } => Workflow::Orchestrator(Orchestrator::new(
            planner()?,
            agents.clone(),
            agent.request_params.max_iterations,
        )),
        WorkflowConfig::EvaluatorOptimizer {
            generator,
            evaluator,
            max_refinements,
            min_rating,
        } => Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new(
            generator.clone(),
            evaluator.clone(),
            *max_refinements,
            *min_rating,
        )),
    })
}
