//! Error types for agent-swarm.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all agent-swarm operations.
#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("agent {agent}: {source}")]
    Agent {
        agent: String,
        #[source]
        source: Box<SwarmError>,
    },

    #[error("{component} transport error ({name}): {message}")]
    Transport {
        component: &'static str,
        name: String,
        message: String,
    },

    #[error("Remote agent {agent} returned {code}: {message}")]
    Remote {
        agent: String,
        code: String,
        message: String,
    },

    #[error("Decoding error ({context}): {message}")]
    Decoding { context: String, message: String },

    #[error("Model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model error ({model}): {message}")]
    Model { model: String, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl SwarmError {
    pub fn transport(
        component: &'static str,
        name: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Transport {
            component,
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn decoding(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decoding {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Tag this error with the agent it surfaced in.
    ///
    /// Already-tagged errors are left alone so the innermost agent name wins.
    pub fn within_agent(self, agent: impl Into<String>) -> Self {
        match self {
            Self::Agent { .. } => self,
            other => Self::Agent {
                agent: agent.into(),
                source: Box::new(other),
            },
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_)
            | Self::Initialization(_)
            | Self::NotFound { .. }
            | Self::Toml(_) => {
                ErrorCategory::Configuration
            }
            Self::Agent { source, .. } => source.category(),
            Self::Transport { .. }
            | Self::Remote { .. }
            | Self::Network(_)
            | Self::Io(_)
            | Self::Timeout(_) => ErrorCategory::Transport,
            Self::ToolExecution { .. } => ErrorCategory::Application,
            Self::Decoding { .. } | Self::Serialization(_) => ErrorCategory::Decoding,
            Self::Api { status, .. } => match status {
                500..=599 | 429 => ErrorCategory::Transport,
                _ => ErrorCategory::Model,
            },
            Self::Model { .. } => ErrorCategory::Model,
            Self::InvalidState(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transport)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SwarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_agent_keeps_innermost_name() {
        let err = SwarmError::Configuration("bad".into())
            .within_agent("inner")
            .within_agent("outer");
        match err {
            SwarmError::Agent { agent, .. } => assert_eq!(agent, "inner"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn wrapped_errors_keep_their_category() {
        let err = SwarmError::transport("tool server", "fs", "closed").within_agent("a");
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "agent a: tool server transport error (fs): closed");
    }

    #[test]
    fn decoding_errors_are_not_retryable() {
        let err = SwarmError::decoding("plan", "missing field `steps`");
        assert_eq!(err.category(), ErrorCategory::Decoding);
        assert!(!err.is_retryable());
    }

    #[test]
    fn api_status_classification() {
        assert_eq!(
            SwarmError::Api { status: 503, message: String::new() }.category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            SwarmError::Api { status: 400, message: String::new() }.category(),
            ErrorCategory::Model
        );
    }
}
