//! Tool server backed by an MCP client session.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ProtocolVersion, ResourceContents,
};
use rmcp::service::ServiceError;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::transport::{McpRunningService, McpTransport};
use crate::error::SwarmError;
use crate::tools::{JsonObject, ToolContent, ToolDescriptor, ToolResult, ToolServer};

/// A named MCP server reached over stdio, streamable HTTP or SSE.
///
/// The session sits behind a read-write lock: calls and listings share it,
/// start and shutdown replace it.
pub struct McpToolServer {
    name: String,
    transport: McpTransport,
    session: RwLock<Option<McpRunningService>>,
}

impl std::fmt::Debug for McpToolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolServer")
            .field("name", &self.name)
            .field("transport", &self.transport)
            .finish()
    }
}

impl McpToolServer {
    pub fn new(name: impl Into<String>, transport: McpTransport) -> Self {
        Self {
            name: name.into(),
            transport,
            session: RwLock::new(None),
        }
    }

    pub fn transport(&self) -> &McpTransport {
        &self.transport
    }

    pub async fn is_started(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|session| !session.is_closed())
    }
}

#[async_trait]
impl ToolServer for McpToolServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), SwarmError> {
        let mut guard = self.session.write().await;
        if guard.as_ref().is_some_and(|session| !session.is_closed()) {
            return Ok(());
        }

        let client_info = rmcp::model::ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        let session = self.transport.connect(&self.name, client_info).await?;
        info!(
            server = %self.name,
            transport = self.transport.kind(),
            "tool server started"
        );
        *guard = Some(session);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SwarmError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or_else(|| not_started(&self.name))?;

        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => session
                .list_tools(None)
                .await
                .map(|page| page.tools)
                .map_err(|e| map_service_error(&self.name, "list_tools", e))?,
            Err(e) => return Err(map_service_error(&self.name, "list_tools", e)),
        };

        Ok(tools
            .into_iter()
            .map(|tool| {
                ToolDescriptor::new(
                    tool.name.to_string(),
                    tool.description.map(|d| d.to_string()).unwrap_or_default(),
                    serde_json::Value::Object((*tool.input_schema).clone()),
                    self.name.clone(),
                )
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolResult, SwarmError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or_else(|| not_started(&self.name))?;

        debug!(server = %self.name, tool = name, "calling tool");
        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| map_service_error(&self.name, "call_tool", e))?;

        Ok(map_call_result(result))
    }

    async fn shutdown(&self) -> Result<(), SwarmError> {
        let session = self.session.write().await.take();
        if let Some(session) = session {
            session.cancel().await.map_err(|e| {
                SwarmError::transport("tool server", self.name.clone(), format!("shutdown failed: {e}"))
            })?;
            info!(server = %self.name, "tool server stopped");
        }
        Ok(())
    }
}

fn not_started(server: &str) -> SwarmError {
    SwarmError::InvalidState(format!("tool server {server} has not been started"))
}

fn map_content(item: &Content) -> ToolContent {
    if let Some(text) = item.as_text() {
        return ToolContent::Text {
            text: text.text.clone(),
        };
    }
    if let Some(image) = item.as_image() {
        return ToolContent::Image {
            data: image.data.clone(),
            mime_type: image.mime_type.clone(),
        };
    }
    if let Some(resource) = item.as_resource() {
        return match &resource.resource {
            ResourceContents::TextResourceContents {
                uri, mime_type, text, ..
            } => ToolContent::Resource {
                uri: uri.clone(),
                mime_type: mime_type.clone(),
                text: Some(text.clone()),
            },
            ResourceContents::BlobResourceContents { uri, mime_type, .. } => ToolContent::Resource {
                uri: uri.clone(),
                mime_type: mime_type.clone(),
                text: None,
            },
        };
    }
    ToolContent::Text {
        text: serde_json::to_string(item).unwrap_or_default(),
    }
}

fn map_call_result(result: CallToolResult) -> ToolResult {
    ToolResult {
        content: result.content.iter().map(map_content).collect(),
        is_error: result.is_error.unwrap_or(false),
        structured: result.structured_content,
    }
}

fn map_service_error(server: &str, context: &str, error: ServiceError) -> SwarmError {
    let message = match error {
        ServiceError::McpError(error) => {
            format!("{context}: MCP error {}: {}", error.code.0, error.message)
        }
        ServiceError::TransportSend(error) => format!("{context}: send failed: {error}"),
        ServiceError::TransportClosed => format!("{context}: transport closed"),
        ServiceError::UnexpectedResponse => format!("{context}: unexpected response"),
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            format!("{context}: request cancelled{suffix}")
        }
        ServiceError::Timeout { timeout } => {
            return SwarmError::Timeout(timeout.as_millis() as u64);
        }
        other => format!("{context}: {other}"),
    };
    SwarmError::transport("tool server", server, message)
}
