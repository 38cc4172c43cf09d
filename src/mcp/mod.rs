//! Model Context Protocol tool servers.

pub mod client;
pub mod transport;

pub use client::McpToolServer;
pub use transport::McpTransport;
