//! Generation parameters and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Per-agent parameters for the conversation loop and the model request.
///
/// Partial tables in configuration override only the fields they name.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationParams {
    /// Keep history across top-level interactions.
    #[builder(default)]
    pub use_history: bool,
    /// Let the model request several tools at once and run them concurrently.
    #[builder(default = true)]
    pub parallel_tool_calls: bool,
    /// Upper bound on model calls per interaction.
    #[builder(default = 20)]
    pub max_iterations: u32,
    #[builder(default = 8196)]
    pub max_tokens: u32,
    #[builder(default = 0.7)]
    pub temperature: f64,
    /// Send reasoning controls instead of plain sampling settings.
    #[builder(default = true)]
    pub reasoning: bool,
    #[builder(default = ReasoningEffort::Medium)]
    pub reasoning_effort: ReasoningEffort,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Reasoning effort level for reasoning models.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishSignal {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Other(String),
}

impl FinishSignal {
    /// Map a provider finish reason string.
    pub fn from_provider(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            "tool_calls" | "function_call" | "tool_use" => Self::ToolCalls,
            other => Self::Other(other.to_string()),
        }
    }
}
