//! Workflow agents: agents whose reply comes from coordinating other agents.

pub mod chain;
pub mod evaluator;
pub mod orchestrator;
pub mod parallel;
pub mod plan;
pub mod router;

pub use chain::Chain;
pub use evaluator::{Evaluation, EvaluatorOptimizer, Rating};
pub use orchestrator::Orchestrator;
pub use parallel::Parallel;
pub use plan::{Plan, PlanTask, Step, TaskOutput};
pub use router::Router;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::a2a::{AgentCard, Endpoint, Listener};
use crate::agent::{Agent, AgentCore, AgentDirectory, Delegate};
use crate::error::SwarmError;
use crate::provider::{ModelAdapter, ModelRequest};
use crate::tools::StructuredResponse;
use crate::types::{GenerationParams, ModelMessage};

/// The model a router or orchestrator plans with.
pub struct Planner {
    model: Box<dyn ModelAdapter>,
    instructions: String,
    params: GenerationParams,
}

impl Planner {
    pub fn new(model: Box<dyn ModelAdapter>, instructions: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            model,
            instructions: instructions.into(),
            params,
        }
    }

    /// Configured instructions, or `default` when none were given.
    pub fn instructions_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.instructions.trim().is_empty() {
            default
        } else {
            &self.instructions
        }
    }

    pub async fn initialize(&mut self) -> Result<(), SwarmError> {
        self.model.initialize().await
    }

    /// Ask the model for a reply shaped like `T`.
    pub async fn structured<T: StructuredResponse>(
        &self,
        instructions: &str,
        messages: Vec<ModelMessage>,
    ) -> Result<T, SwarmError> {
        let schema = T::output_schema();
        let request = ModelRequest::new(instructions, messages, self.params.clone());
        let value = self.model.structured(&request, schema).await?;
        serde_json::from_value(value)
            .map_err(|e| SwarmError::decoding(format!("{} from {}", schema.name, self.model.model_id()), e))
    }
}

/// Look up `names` in order.
pub(crate) fn resolve_agents(
    directory: &AgentDirectory,
    names: &[String],
) -> Result<Vec<Arc<dyn Delegate>>, SwarmError> {
    names
        .iter()
        .map(|name| {
            directory
                .get(name)
                .cloned()
                .ok_or_else(|| SwarmError::not_found("agent", name))
        })
        .collect()
}

/// Restrict `directory` to `names`, failing on any name it lacks.
pub(crate) fn resolve_directory(
    directory: &AgentDirectory,
    names: &[String],
) -> Result<AgentDirectory, SwarmError> {
    let agents = resolve_agents(directory, names)?;
    Ok(names.iter().cloned().zip(agents).collect())
}

/// The coordination pattern a workflow agent runs.
pub enum Workflow {
    Chain(Chain),
    Router(Router),
    Parallel(Parallel),
    Orchestrator(Orchestrator),
    EvaluatorOptimizer(EvaluatorOptimizer),
}

impl Workflow {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chain(_) => "chain",
            Self::Router(_) => "router",
            Self::Parallel(_) => "parallel",
            Self::Orchestrator(_) => "orchestrator",
            Self::EvaluatorOptimizer(_) => "evaluator_optimizer",
        }
    }

    pub fn agent_names(&self) -> Vec<String> {
        match self {
            Self::Chain(chain) => chain.agent_names().to_vec(),
            Self::Router(router) => router.agent_names().to_vec(),
            Self::Parallel(parallel) => parallel.agent_names(),
            Self::Orchestrator(orchestrator) => orchestrator.agent_names().to_vec(),
            Self::EvaluatorOptimizer(eo) => eo.agent_names(),
        }
    }

    fn attach(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        match self {
            Self::Chain(chain) => chain.attach(directory),
            Self::Router(router) => router.attach(directory),
            Self::Parallel(parallel) => parallel.attach(directory),
            Self::Orchestrator(orchestrator) => orchestrator.attach(directory),
            Self::EvaluatorOptimizer(eo) => eo.attach(directory),
        }
    }

    fn planner_mut(&mut self) -> Option<&mut Planner> {
        match self {
            Self::Router(router) => Some(router.planner_mut()),
            Self::Orchestrator(orchestrator) => Some(orchestrator.planner_mut()),
            _ => None,
        }
    }

    pub async fn run(&self, input: &str) -> Result<String, SwarmError> {
        match self {
            Self::Chain(chain) => chain.run(input).await,
            Self::Router(router) => router.run(input).await,
            Self::Parallel(parallel) => parallel.run(input).await,
            Self::Orchestrator(orchestrator) => orchestrator.run(input).await,
            Self::EvaluatorOptimizer(eo) => eo.run(input).await,
        }
    }
}

/// An agent that answers by running a [`Workflow`] over its sub-agents.
pub struct WorkflowAgent {
    core: AgentCore,
    workflow: Workflow,
}

impl WorkflowAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: Option<Endpoint>,
        workflow: Workflow,
    ) -> Self {
        Self {
            core: AgentCore::new(name, description, endpoint),
            workflow,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }
}

#[async_trait]
impl Agent for WorkflowAgent {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn description(&self) -> &str {
        &self.core.description
    }

    fn endpoint(&self) -> &Endpoint {
        &self.core.endpoint
    }

    fn sub_agent_names(&self) -> Vec<String> {
        self.workflow.agent_names()
    }

    fn attach_agents(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        if self.workflow.agent_names().iter().any(|name| *name == self.core.name) {
            return Err(SwarmError::Configuration(format!(
                "workflow agent '{}' cannot delegate to itself",
                self.core.name
            )));
        }
        self.workflow
            .attach(directory)
            .map_err(|e| e.within_agent(&self.core.name))
    }

    async fn initialize(&mut self) -> Result<(), SwarmError> {
        if let Some(planner) = self.workflow.planner_mut() {
            planner.initialize().await?;
        }
        self.core.bind().await?;
        info!(agent = %self.core.name, workflow = self.workflow.kind(), "workflow agent initialized");
        Ok(())
    }

    async fn handle(&self, input: &str) -> Result<String, SwarmError> {
        self.workflow
            .run(input)
            .await
            .map_err(|e| e.within_agent(&self.core.name))
    }

    fn card(&self) -> AgentCard {
        let kind = self.workflow.kind();
        self.core.card().with_skill(
            kind,
            kind,
            format!("{} workflow over {}", kind, self.workflow.agent_names().join(", ")),
            self.workflow.agent_names(),
        )
    }

    fn take_listener(&mut self) -> Option<Listener> {
        self.core.take_listener()
    }
}
