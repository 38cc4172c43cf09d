//! Per-agent tool-use loop.

pub mod runner;
mod tooling;

pub use runner::ConversationLoop;
