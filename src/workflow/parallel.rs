//! Fan-out to several agents, optional fan-in.

use std::sync::Arc;

use futures::future;

use super::plan::{format_outputs, TaskOutput};
use super::resolve_agents;
use crate::agent::{AgentDirectory, Delegate};
use crate::error::SwarmError;

/// Sends the same input to every fan-out agent concurrently and waits for
/// all of them. Outputs are concatenated in fan-out order; a fan-in agent,
/// if set, turns that concatenation into the final reply.
pub struct Parallel {
    fan_out_names: Vec<String>,
    fan_in_name: Option<String>,
    fan_out: Vec<Arc<dyn Delegate>>,
    fan_in: Option<Arc<dyn Delegate>>,
}

impl Parallel {
    pub fn new(fan_out_names: Vec<String>, fan_in_name: Option<String>) -> Self {
        Self {
            fan_out_names,
            fan_in_name,
            fan_out: Vec::new(),
            fan_in: None,
        }
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.fan_out_names
            .iter()
            .chain(self.fan_in_name.iter())
            .cloned()
            .collect()
    }

    pub(super) fn attach(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        if self.fan_out_names.is_empty() {
            return Err(SwarmError::Configuration(
                "parallel workflow needs at least one fan-out agent".into(),
            ));
        }
        self.fan_out = resolve_agents(directory, &self.fan_out_names)?;
        self.fan_in = match &self.fan_in_name {
            Some(name) => resolve_agents(directory, std::slice::from_ref(name))?.pop(),
            None => None,
        };
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<String, SwarmError> {
        let outputs = future::join_all(self.fan_out.iter().map(|agent| async move {
            agent.delegate(input).await.map(|output| TaskOutput {
                agent: agent.name().to_string(),
                output,
            })
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let combined = format_outputs(&outputs);
        match &self.fan_in {
            Some(fan_in) => fan_in.delegate(&combined).await,
            None => Ok(combined),
        }
    }
}
