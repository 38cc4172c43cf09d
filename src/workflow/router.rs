//! Single-shot planning over a roster of agents.

use tracing::{debug, info};

use super::plan::{execute_step, format_outputs, roster, Plan};
use super::{resolve_directory, Planner};
use crate::agent::AgentDirectory;
use crate::error::SwarmError;
use crate::types::ModelMessage;

const DEFAULT_INSTRUCTIONS: &str = "You route requests to specialist agents. \
Break the request into ordered steps; tasks inside a step run at the same time. \
Only use agents from the roster and give each task everything it needs.";

/// Asks its model for a plan once, then runs it: steps in order, each
/// step's tasks concurrently.
pub struct Router {
    planner: Planner,
    agent_names: Vec<String>,
    directory: AgentDirectory,
}

impl Router {
    pub fn new(planner: Planner, agent_names: Vec<String>) -> Self {
        Self {
            planner,
            agent_names,
            directory: AgentDirectory::new(),
        }
    }

    pub fn agent_names(&self) -> &[String] {
        &self.agent_names
    }

    pub(super) fn planner_mut(&mut self) -> &mut Planner {
        &mut self.planner
    }

    pub(super) fn attach(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        self.directory = resolve_directory(directory, &self.agent_names)?;
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<String, SwarmError> {
        let instructions = format!(
            "{}\n\nAvailable agents:\n{}",
            self.planner.instructions_or(DEFAULT_INSTRUCTIONS),
            roster(&self.directory)
        );
        let plan: Plan = self
            .planner
            .structured(&instructions, vec![ModelMessage::user(input)])
            .await?;
        plan.validate(&self.directory)?;
        info!(steps = plan.steps.len(), "router plan ready");

        let mut outputs = Vec::new();
        for step in &plan.steps {
            debug!(step = %step.description, "router step");
            outputs.extend(execute_step(step, &self.directory, input).await?);
        }
        Ok(format_outputs(&outputs))
    }
}
