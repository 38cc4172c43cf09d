//! Model adapter trait, model spec parsing and the adapter factory.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use strum::{Display, EnumString};

use crate::config::ProviderConfig;
use crate::error::SwarmError;
use crate::tools::{OutputSchema, ToolDescriptor};
use crate::types::{FinishSignal, GenerationParams, ModelMessage, ReasoningEffort};

/// A request sent to a model adapter.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub instructions: String,
    pub messages: Vec<ModelMessage>,
    pub params: GenerationParams,
}

impl ModelRequest {
    pub fn new(instructions: impl Into<String>, messages: Vec<ModelMessage>, params: GenerationParams) -> Self {
        Self {
            instructions: instructions.into(),
            messages,
            params,
        }
    }
}

/// One model completion: the assistant message and why it ended.
#[derive(Debug, Clone)]
pub struct ModelChoice {
    pub message: ModelMessage,
    pub finish: FinishSignal,
}

/// Core trait implemented by every model backend.
///
/// Tools are attached once at agent initialization and sent with every
/// `generate` call afterwards.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    fn model_id(&self) -> &str;

    /// Verify the backend is reachable and the model exists.
    async fn initialize(&mut self) -> Result<(), SwarmError>;

    fn attach_tools(&mut self, tools: &[ToolDescriptor]);

    async fn generate(&self, request: &ModelRequest) -> Result<ModelChoice, SwarmError>;

    /// Ask for a reply conforming to `schema`, returned as parsed JSON.
    async fn structured(
        &self,
        request: &ModelRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, SwarmError>;
}

/// Providers reachable through an OpenAI-compatible chat completions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    DeepSeek,
    OpenRouter,
    Generic,
}

impl ProviderKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Generic => "http://localhost:11434/v1",
        }
    }
}

/// A parsed `provider.model[.effort]` string, e.g. `openai.o4-mini.high`.
///
/// Model names may contain dots (`openai.gpt-4.1`); the last segment is
/// only taken as the effort when it names one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model: String,
    pub effort: Option<ReasoningEffort>,
}

impl FromStr for ModelSpec {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            SwarmError::Configuration(format!(
                "invalid model '{s}': expected provider.model[.effort]"
            ))
        };
        let (provider, rest) = s.split_once('.').ok_or_else(invalid)?;
        let provider = provider.parse::<ProviderKind>().map_err(|_| {
            SwarmError::Configuration(format!("unknown model provider '{provider}' in '{s}'"))
        })?;

        let (model, effort) = match rest.rsplit_once('.') {
            Some((model, suffix)) => match suffix.parse::<ReasoningEffort>() {
                Ok(effort) => (model, Some(effort)),
                Err(_) => (rest, None),
            },
            None => (rest, None),
        };
        if model.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            provider,
            model: model.to_string(),
            effort,
        })
    }
}

/// Create a model adapter for `spec` using the provider settings.
///
/// The spec's effort suffix, when present, overrides `params.reasoning_effort`.
pub fn create_adapter(
    spec: &ModelSpec,
    providers: &BTreeMap<String, ProviderConfig>,
    params: &mut GenerationParams,
) -> Result<Box<dyn ModelAdapter>, SwarmError> {
    if let Some(effort) = spec.effort {
        params.reasoning_effort = effort;
    }
    let settings = providers
        .get(&spec.provider.to_string())
        .cloned()
        .unwrap_or_default();
    build_adapter(spec, settings)
}

#[cfg(feature = "openai")]
fn build_adapter(spec: &ModelSpec, settings: ProviderConfig) -> Result<Box<dyn ModelAdapter>, SwarmError> {
    let base_url = settings
        .base_url
        .unwrap_or_else(|| spec.provider.default_base_url().to_string());
    let adapter = openai::OpenAiChatAdapter::new(
        spec.provider,
        spec.model.clone(),
        settings.api_key,
        base_url,
    )?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "openai"))]
fn build_adapter(spec: &ModelSpec, _settings: ProviderConfig) -> Result<Box<dyn ModelAdapter>, SwarmError> {
    Err(SwarmError::Configuration(format!(
        "no model adapter compiled in for provider {}",
        spec.provider
    )))
}
