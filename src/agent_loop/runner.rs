//! The bounded generate, act, observe cycle of one agent.

use tracing::{debug, info_span, warn, Instrument};

use super::tooling::{
    execute_parallel_tool_calls, execute_sequential_tool_calls, prepare_calls, rejected_messages,
    tool_messages,
};
use crate::agent::memory::Conversation;
use crate::error::SwarmError;
use crate::provider::{ModelAdapter, ModelRequest};
use crate::tools::ToolCatalog;
use crate::types::{FinishSignal, GenerationParams, ModelMessage};

/// Everything one agent needs to answer a request with its model and tools.
pub struct ConversationLoop<'a> {
    pub agent: &'a str,
    pub model: &'a dyn ModelAdapter,
    pub tools: &'a ToolCatalog,
    pub instructions: &'a str,
    pub params: &'a GenerationParams,
}

impl ConversationLoop<'_> {
    /// Answer `input`, appending every turn to `history`.
    ///
    /// Returns the final assistant text. When the iteration budget runs out
    /// the latest assistant text is returned instead of an error.
    pub async fn run(&self, history: &mut Conversation, input: &str) -> Result<String, SwarmError> {
        let span = info_span!("conversation", agent = self.agent, model = self.model.model_id());
        self.run_inner(history, input).instrument(span).await
    }

    async fn run_inner(&self, history: &mut Conversation, input: &str) -> Result<String, SwarmError> {
        if !self.params.use_history {
            history.clear();
        }
        history.append(ModelMessage::user(input));

        for iteration in 1..=self.params.max_iterations {
            let request = ModelRequest::new(self.instructions, history.snapshot(), self.params.clone());
            let choice = self.model.generate(&request).await?;
            debug!(iteration, finish = ?choice.finish, "model replied");

            let calls: Vec<_> = choice.message.tool_calls().into_iter().cloned().collect();
            if choice.finish != FinishSignal::ToolCalls || calls.is_empty() {
                if let FinishSignal::Other(ref reason) = choice.finish {
                    debug!(iteration, reason = %reason, "unrecognized finish signal");
                }
                let text = choice.message.text();
                history.append(choice.message);
                return Ok(text);
            }

            history.append(choice.message);
            let prepared = match prepare_calls(&calls) {
                Ok(prepared) => prepared,
                Err(error) => {
                    history.extend(rejected_messages(&calls, &error));
                    return Err(error);
                }
            };
            let results = if self.params.parallel_tool_calls {
                execute_parallel_tool_calls(self.agent, self.tools, &prepared).await
            } else {
                execute_sequential_tool_calls(self.agent, self.tools, &prepared).await
            };
            let (messages, failure) = tool_messages(&prepared, results);
            history.extend(messages);
            if let Some(error) = failure {
                return Err(error);
            }
        }

        warn!(
            max_iterations = self.params.max_iterations,
            "iteration budget exhausted, returning latest assistant text"
        );
        Ok(history.last_assistant_text().unwrap_or_default())
    }
}
