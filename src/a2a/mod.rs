//! Agent-to-agent invocation.
//!
//! Every frame is a 4-byte big-endian length followed by a JSON document.
//! A connection carries any number of request/response pairs in sequence.

pub mod client;
pub mod endpoint;
pub mod server;
pub mod types;

pub use client::AgentClient;
pub use endpoint::{Endpoint, Listener};
pub use server::serve;
pub use types::{
    flatten_parts, AgentCapabilities, AgentCard, AgentSkill, MessageRole, Part, RemoteMessage,
    RpcCall, RpcRequest, RpcResponse, SendMessageResponse, Task,
};
