use futures::future;
use tracing::{debug, warn};

use crate::error::SwarmError;
use crate::tools::{decode_arguments, JsonObject, ToolCatalog, ToolResult};
use crate::types::{AgentToolCall, ModelMessage};

/// A tool call whose arguments decoded cleanly.
#[derive(Debug, Clone)]
pub(super) struct PreparedCall {
    pub(super) call: AgentToolCall,
    pub(super) arguments: JsonObject,
}

/// Decode every call's arguments before anything runs.
///
/// The first malformed argument set fails the whole batch.
pub(super) fn prepare_calls(calls: &[AgentToolCall]) -> Result<Vec<PreparedCall>, SwarmError> {
    calls
        .iter()
        .map(|call| {
            let arguments = decode_arguments(&call.name, &call.arguments)?;
            Ok(PreparedCall {
                call: call.clone(),
                arguments,
            })
        })
        .collect()
}

/// Error results answering every call of a batch that was rejected before running.
pub(super) fn rejected_messages(calls: &[AgentToolCall], error: &SwarmError) -> Vec<ModelMessage> {
    calls
        .iter()
        .map(|call| {
            ModelMessage::tool_result(
                call.id.clone(),
                serde_json::Value::String(format!("not run: {error}")),
                true,
            )
        })
        .collect()
}

async fn execute_one(agent: &str, catalog: &ToolCatalog, prepared: &PreparedCall) -> Result<ToolResult, SwarmError> {
    let name = prepared.call.name.as_str();
    if !catalog.contains(name) {
        warn!(agent, tool = name, "model requested an unknown tool");
        return Ok(ToolResult::error(format!("unknown tool: {name}")));
    }
    debug!(agent, tool = name, call_id = %prepared.call.id, "executing tool");
    let result = catalog.call(name, prepared.arguments.clone()).await;
    if let Ok(ref r) = result {
        if r.is_error {
            debug!(agent, tool = name, "tool reported an error");
        }
    }
    result
}

/// Run all calls concurrently. Results come back in request order.
pub(super) async fn execute_parallel_tool_calls(
    agent: &str,
    catalog: &ToolCatalog,
    calls: &[PreparedCall],
) -> Vec<Result<ToolResult, SwarmError>> {
    future::join_all(calls.iter().map(|prepared| execute_one(agent, catalog, prepared))).await
}

/// Run calls one at a time, stopping at the first transport failure.
/// Calls after the failure are reported as not run.
pub(super) async fn execute_sequential_tool_calls(
    agent: &str,
    catalog: &ToolCatalog,
    calls: &[PreparedCall],
) -> Vec<Result<ToolResult, SwarmError>> {
    let mut results = Vec::with_capacity(calls.len());
    let mut failed = false;
    for prepared in calls {
        if failed {
            results.push(Ok(ToolResult::error("not run: an earlier tool call failed")));
            continue;
        }
        let result = execute_one(agent, catalog, prepared).await;
        failed = result.is_err();
        results.push(result);
    }
    results
}

/// Turn results into tool messages, in request order.
///
/// Every call gets a message so the history stays well formed; the first
/// transport failure is returned alongside.
pub(super) fn tool_messages(
    calls: &[PreparedCall],
    results: Vec<Result<ToolResult, SwarmError>>,
) -> (Vec<ModelMessage>, Option<SwarmError>) {
    let mut first_error = None;
    let messages = calls
        .iter()
        .zip(results)
        .map(|(prepared, result)| match result {
            Ok(result) => ModelMessage::tool_result(
                prepared.call.id.clone(),
                serde_json::Value::String(result.to_model_text()),
                result.is_error,
            ),
            Err(error) => {
                let message = ModelMessage::tool_result(
                    prepared.call.id.clone(),
                    serde_json::Value::String(format!("tool call failed: {error}")),
                    true,
                );
                first_error.get_or_insert(error);
                message
            }
        })
        .collect();
    (messages, first_error)
}
