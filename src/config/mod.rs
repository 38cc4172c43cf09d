//! Configuration system (layered: env > secrets file > config file).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::a2a::Endpoint;
use crate::error::SwarmError;
#[cfg(feature = "mcp")]
use crate::mcp::McpTransport;
use crate::types::GenerationParams;
use crate::workflow::Rating;

pub const CONFIG_FILE: &str = "agents.toml";
pub const SECRETS_FILE: &str = "agents.secrets.toml";

/// Prefix for environment overrides, e.g. `AGENTS_OPENAI_API_KEY`.
const ENV_PREFIX: &str = "AGENTS_";

/// Conventional provider variables, used when nothing else sets a key.
const FALLBACK_KEY_VARS: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "openai"),
    ("ANTHROPIC_API_KEY", "anthropic"),
    ("GOOGLE_API_KEY", "google"),
    ("GEMINI_API_KEY", "google"),
    ("DEEPSEEK_API_KEY", "deepseek"),
    ("OPENROUTER_API_KEY", "openrouter"),
];

/// The whole swarm: logging, tool servers, providers and agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub logger: LoggerConfig,
    #[cfg(feature = "mcp")]
    pub mcp: McpConfig,
    pub providers: BTreeMap<String, ProviderConfig>,
    pub agents: BTreeMap<String, AgentConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoggerKind {
    #[default]
    Console,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    #[serde(rename = "type")]
    pub kind: LoggerKind,
    pub level: String,
    /// Where `file` logging appends JSON lines.
    pub path: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            kind: LoggerKind::Console,
            level: "warn".into(),
            path: PathBuf::from("agent.jsonl"),
        }
    }
}

#[cfg(feature = "mcp")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub servers: BTreeMap<String, McpTransport>,
}

/// Credentials and endpoint for one model provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One agent entry.
///
/// With `workflow` set the agent coordinates others; with `model` set it is
/// a model-driven agent; with only `url` it is a remote peer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub url: Option<Endpoint>,
    pub model: Option<String>,
    pub description: String,
    pub instructions: String,
    pub servers: Vec<String>,
    pub include_tools: Vec<String>,
    pub exclude_tools: Vec<String>,
    pub request_params: GenerationParams,
    pub workflow: Option<WorkflowConfig>,
}

fn default_refinements() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowConfig {
    Chain {
        agents: Vec<String>,
        #[serde(default)]
        cumulative: bool,
    },
    Router {
        agents: Vec<String>,
    },
    Parallel {
        fan_out: Vec<String>,
        #[serde(default)]
        fan_in: Option<String>,
    },
    Orchestrator {
        agents: Vec<String>,
    },
    EvaluatorOptimizer {
        generator: String,
        evaluator: String,
        #[serde(default = "default_refinements")]
        max_refinements: u32,
        #[serde(default)]
        min_rating: Option<Rating>,
    },
}

impl SwarmConfig {
    /// Load configuration, searching the usual places when `path` is `None`.
    ///
    /// Loads `.env`, reads the config file and its secrets sibling, then
    /// applies `AGENTS_*` and conventional provider variables. A missing
    /// file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SwarmError> {
        let _ = dotenvy::dotenv();
        let mut table = match locate(path) {
            Some(path) => load_tables(&path)?,
            None => {
                debug!("no configuration file found, using defaults");
                toml::Table::new()
            }
        };
        apply_env_overrides(&mut table, std::env::vars());
        Self::from_table(table)
    }

    /// Parse a single TOML document, without files or environment.
    pub fn from_toml(text: &str) -> Result<Self, SwarmError> {
        Self::from_table(toml::from_str(text)?)
    }

    fn from_table(table: toml::Table) -> Result<Self, SwarmError> {
        Ok(toml::Value::Table(table).try_into()?)
    }

    pub fn provider(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }
}

/// Explicit path, then the working directory, then the platform config dir.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    directories::ProjectDirs::from("", "", "agent-swarm")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Read `path` and deep-merge `agents.secrets.toml` from the same directory.
pub fn load_tables(path: &Path) -> Result<toml::Table, SwarmError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SwarmError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    let mut table: toml::Table = toml::from_str(&text)?;

    let secrets = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(SECRETS_FILE);
    if secrets.is_file() {
        debug!(path = %secrets.display(), "merging secrets");
        let text = std::fs::read_to_string(&secrets)?;
        merge_tables(&mut table, toml::from_str(&text)?);
    }
    Ok(table)
}

/// Deep merge: nested tables merge key by key, anything else in `overlay` wins.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variables to the raw table.
///
/// `AGENTS_LOGGER_LEVEL`, `AGENTS_<PROVIDER>_API_KEY` and
/// `AGENTS_<PROVIDER>_BASE_URL` always win. Conventional variables such as
/// `OPENAI_API_KEY` only fill keys nothing else set.
pub fn apply_env_overrides(table: &mut toml::Table, vars: impl IntoIterator<Item = (String, String)>) {
    let vars: BTreeMap<String, String> = vars.into_iter().collect();

    for (name, value) in &vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        if rest == "LOGGER_LEVEL" {
            set_path(table, &["logger", "level"], value);
        } else if let Some(provider) = rest.strip_suffix("_API_KEY") {
            set_path(table, &["providers", &provider.to_lowercase(), "api_key"], value);
        } else if let Some(provider) = rest.strip_suffix("_BASE_URL") {
            set_path(table, &["providers", &provider.to_lowercase(), "base_url"], value);
        }
    }

    for (var, provider) in FALLBACK_KEY_VARS {
        let Some(value) = vars.get(*var) else {
            continue;
        };
        let already_set = table
            .get("providers")
            .and_then(|p| p.get(*provider))
            .and_then(|p| p.get("api_key"))
            .is_some();
        if !already_set {
            set_path(table, &["providers", provider, "api_key"], value);
        }
    }
}

fn set_path(table: &mut toml::Table, path: &[&str], value: &str) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = table;
    for key in parents {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            *entry = toml::Value::Table(toml::Table::new());
        }
        let toml::Value::Table(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), toml::Value::String(value.to_string()));
}
