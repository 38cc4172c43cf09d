//! agent-swarm: a runtime for cooperating agents.
//!
//! Each agent runs a tool-use loop against a model, serves itself to its
//! peers over a small framed JSON protocol, and may call tools exposed by
//! MCP servers. Workflow agents (chain, router, parallel, orchestrator,
//! evaluator-optimizer) answer by delegating to other agents. A
//! [`supervisor::Supervisor`] wires everything together and drains it on
//! shutdown.
//!
//! # Quick Start
//!
//! ```no_run
//! use agent_swarm::config::SwarmConfig;
//! use agent_swarm::supervisor::Supervisor;
//!
//! # async fn example() -> agent_swarm::error::Result<()> {
//! let config = SwarmConfig::load(None)?;
//! Supervisor::from_config(&config)?.run("planner").await?;
//! # Ok(())
//! # }
//! ```

pub mod a2a;
pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod supervisor;
pub mod tools;
pub mod types;
pub mod util;
pub mod workflow;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "cli")]
pub mod cli;
