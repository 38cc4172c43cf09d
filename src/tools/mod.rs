//! Tool servers, descriptors and per-agent catalogs.

pub mod arguments;
pub mod catalog;
pub mod schema;
pub mod server;
pub mod types;

pub use arguments::{decode_arguments, JsonObject};
pub use catalog::{filter_tools, ToolCatalog};
pub use schema::{OutputSchema, SchemaBuilder, StructuredResponse};
pub use server::ToolServer;
pub use types::{ToolContent, ToolDescriptor, ToolResult};
