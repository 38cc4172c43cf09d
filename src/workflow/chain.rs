//! Sequential pipeline of agents.

use std::sync::Arc;

use tracing::debug;

use super::resolve_agents;
use crate::agent::{AgentDirectory, Delegate};
use crate::error::SwarmError;

/// Runs agents in order, feeding each the previous output.
///
/// In cumulative mode every step instead sees the original request followed
/// by all earlier outputs, separated by blank lines.
pub struct Chain {
    agent_names: Vec<String>,
    cumulative: bool,
    agents: Vec<Arc<dyn Delegate>>,
}

impl Chain {
    pub fn new(agent_names: Vec<String>, cumulative: bool) -> Self {
        Self {
            agent_names,
            cumulative,
            agents: Vec::new(),
        }
    }

    pub fn agent_names(&self) -> &[String] {
        &self.agent_names
    }

    pub(super) fn attach(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        if self.agent_names.is_empty() {
            return Err(SwarmError::Configuration("chain needs at least one agent".into()));
        }
        self.agents = resolve_agents(directory, &self.agent_names)?;
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<String, SwarmError> {
        let mut outputs: Vec<String> = Vec::with_capacity(self.agents.len());
        for (index, agent) in self.agents.iter().enumerate() {
            let prompt = match outputs.last() {
                None => input.to_string(),
                Some(previous) if !self.cumulative => previous.clone(),
                Some(_) => std::iter::once(input)
                    .chain(outputs.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            };
            debug!(step = index + 1, agent = agent.name(), "chain step");
            outputs.push(agent.delegate(&prompt).await?);
        }
        Ok(outputs.pop().unwrap_or_default())
    }
}
