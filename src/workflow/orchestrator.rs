//! Iterative planning: plan, run the first step, re-plan with the results.

use tracing::{info, warn};

use super::plan::{execute_step, format_outputs, roster, Plan, TaskOutput};
use super::{resolve_directory, Planner};
use crate::agent::AgentDirectory;
use crate::error::SwarmError;
use crate::types::ModelMessage;

const DEFAULT_INSTRUCTIONS: &str = "You coordinate specialist agents toward a goal. \
Given the goal and the results so far, plan the remaining steps. \
Set is_complete to true once the results achieve the goal.";

/// Re-plans after every executed step until the planner reports the goal
/// complete or the round budget runs out.
pub struct Orchestrator {
    planner: Planner,
    agent_names: Vec<String>,
    max_rounds: u32,
    directory: AgentDirectory,
}

impl Orchestrator {
    pub fn new(planner: Planner, agent_names: Vec<String>, max_rounds: u32) -> Self {
        Self {
            planner,
            agent_names,
            max_rounds,
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

    pub async fn run(&self, goal: &str) -> Result<String, SwarmError> {
        let instructions = format!(
            "{}\n\nAvailable agents:\n{}",
            self.planner.instructions_or(DEFAULT_INSTRUCTIONS),
            roster(&self.directory)
        );
        let mut results: Vec<TaskOutput> = Vec::new();

        for round in 1..=self.max_rounds {
            let progress = if results.is_empty() {
                "No steps have run yet.".to_string()
            } else {
                format!("Results so far:\n\n{}", format_outputs(&results))
            };
            let prompt = format!("Goal:\n{goal}\n\n{progress}");
            let plan: Plan = self
                .planner
                .structured(&instructions, vec![ModelMessage::user(prompt)])
                .await?;
            plan.validate(&self.directory)?;

            let Some(step) = plan.steps.first().filter(|_| !plan.is_complete) else {
                info!(round, "orchestrator goal complete");
                return Ok(format_outputs(&results));
            };
            info!(round, step = %step.description, remaining = plan.steps.len(), "orchestrator step");
            results.extend(execute_step(step, &self.directory, goal).await?);
        }

        warn!(max_rounds = self.max_rounds, "orchestrator round budget exhausted");
        Ok(format_outputs(&results))
    }
}
