//! The tool server trait.

use async_trait::async_trait;

use super::arguments::JsonObject;
use super::types::{ToolDescriptor, ToolResult};
use crate::error::SwarmError;

/// A process or endpoint exposing tools over some transport.
///
/// A server is started once and shared by every agent that names it, so all
/// methods take `&self` and `call_tool` must tolerate concurrent callers.
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn name(&self) -> &str;

    /// Connect and perform the protocol handshake.
    async fn start(&self) -> Result<(), SwarmError>;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SwarmError>;

    /// Invoke a tool. Tool-reported failures come back as
    /// `ToolResult { is_error: true, .. }`; `Err` means the call never completed.
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolResult, SwarmError>;

    async fn shutdown(&self) -> Result<(), SwarmError>;
}
