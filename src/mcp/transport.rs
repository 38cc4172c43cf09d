//! MCP transport selection and connection.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::SwarmError;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// How to reach a tool server.
///
/// `sse` endpoints are dialed with the streamable-HTTP client, which reads
/// server-sent event responses on the same connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum McpTransport {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    Http {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    Sse {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl McpTransport {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Http { .. } => "http",
            Self::Sse { .. } => "sse",
        }
    }

    /// Open the transport and run the MCP initialize handshake.
    pub(crate) async fn connect(
        &self,
        server: &str,
        client_info: ClientInfo,
    ) -> Result<McpRunningService, SwarmError> {
        let result = match self {
            Self::Stdio { command, args, env } => {
                let process = TokioChildProcess::new(stdio_command(command, args, env))
                    .map_err(|error| {
                        SwarmError::transport(
                            "tool server",
                            server,
                            format!("failed to spawn `{command}`: {error}"),
                        )
                    })?;
                client_info.into_dyn().serve(process).await
            }
            Self::Http { url, headers } | Self::Sse { url, headers } => {
                let client = reqwest::Client::builder()
                    .default_headers(header_map(server, headers)?)
                    .build()
                    .map_err(|error| SwarmError::transport("tool server", server, error))?;
                let transport = StreamableHttpClientTransport::with_client(
                    client,
                    StreamableHttpClientTransportConfig::with_uri(url.clone()),
                );
                client_info.into_dyn().serve(transport).await
            }
        };
        result.map_err(|error| map_client_initialize_error(server, error))
    }
}

/// Build the child process command. Environment keys are upper-cased.
fn stdio_command(command: &str, args: &[String], env: &BTreeMap<String, String>) -> Command {
    let mut cmd = Command::new(command);
    cmd.args(args);
    cmd.envs(env.iter().map(|(key, value)| (key.to_uppercase(), value)));
    cmd.kill_on_drop(true);
    cmd
}

fn header_map(server: &str, headers: &BTreeMap<String, String>) -> Result<HeaderMap, SwarmError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            SwarmError::Configuration(format!("tool server {server}: invalid header name {name}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            SwarmError::Configuration(format!("tool server {server}: invalid header value: {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(crate) fn map_client_initialize_error(server: &str, error: ClientInitializeError) -> SwarmError {
    let message = match error {
        ClientInitializeError::ConnectionClosed(context) => {
            format!("initialize connection closed: {context}")
        }
        ClientInitializeError::TransportError { error, context } => {
            format!("initialize transport error ({context}): {error}")
        }
        ClientInitializeError::JsonRpcError(error) => {
            format!("initialize JSON-RPC error {}: {}", error.code.0, error.message)
        }
        ClientInitializeError::Cancelled => "initialize cancelled".to_string(),
        other => format!("initialize error: {other}"),
    };
    SwarmError::transport("tool server", server, message)
}
