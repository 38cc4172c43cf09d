//! Plans produced by router and orchestrator models, and their execution.

use std::sync::{Arc, OnceLock};

use futures::future;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{AgentDirectory, Delegate};
use crate::error::SwarmError;
use crate::tools::{OutputSchema, SchemaBuilder, StructuredResponse};

/// One unit of delegated work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTask {
    pub description: String,
    pub agent: String,
}

/// Tasks that may run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    pub tasks: Vec<PlanTask>,
}

/// Ordered steps, plus whether the goal is already met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub is_complete: bool,
}

impl StructuredResponse for Plan {
    fn output_schema() -> &'static OutputSchema {
        static SCHEMA: OnceLock<OutputSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let task = SchemaBuilder::new()
                .string("description", "What the agent should do, with all context it needs")
                .string("agent", "Name of the agent to run the task")
                .build();
            let step = SchemaBuilder::new()
                .string("description", "What this step achieves")
                .array("tasks", task)
                .build();
            let plan = SchemaBuilder::new()
                .array("steps", step)
                .boolean("is_complete", "True when the goal has been fully achieved")
                .build();
            OutputSchema::new("plan", plan)
        })
    }
}

impl Plan {
    /// Every agent the plan names must be in `directory`.
    pub fn validate(&self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        for task in self.steps.iter().flat_map(|step| &step.tasks) {
            if !directory.contains_key(&task.agent) {
                return Err(SwarmError::decoding(
                    "plan",
                    format!("task names unknown agent '{}'", task.agent),
                ));
            }
        }
        Ok(())
    }
}

/// A task's agent and what it returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub agent: String,
    pub output: String,
}

/// Run a step's tasks concurrently; outputs come back in task order.
///
/// Tasks with an empty description receive `fallback_input`.
pub async fn execute_step(
    step: &Step,
    directory: &AgentDirectory,
    fallback_input: &str,
) -> Result<Vec<TaskOutput>, SwarmError> {
    debug!(step = %step.description, tasks = step.tasks.len(), "executing step");
    let runs = step.tasks.iter().map(|task| async move {
        let agent: &Arc<dyn Delegate> = directory
            .get(&task.agent)
            .ok_or_else(|| SwarmError::not_found("agent", task.agent.clone()))?;
        let input = if task.description.trim().is_empty() {
            fallback_input
        } else {
            task.description.as_str()
        };
        let output = agent.delegate(input).await?;
        Ok::<_, SwarmError>(TaskOutput {
            agent: task.agent.clone(),
            output,
        })
    });
    future::join_all(runs).await.into_iter().collect()
}

/// Render outputs as labelled blocks, in order.
pub fn format_outputs(outputs: &[TaskOutput]) -> String {
    outputs
        .iter()
        .map(|o| format!("{}:\n{}", o.agent, o.output))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The roster shown to planning models.
pub fn roster(directory: &AgentDirectory) -> String {
    directory
        .values()
        .map(|agent| format!("- {}: {}", agent.name(), agent.description()))
        .collect::<Vec<_>>()
        .join("\n")
}
