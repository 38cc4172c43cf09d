//! JSON schemas for structured model output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named JSON schema the model must conform to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: serde_json::Value,
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// A type the model can be asked to produce directly.
///
/// Implementors usually cache their schema in a `OnceLock` so it is built
/// once per process.
pub trait StructuredResponse: DeserializeOwned {
    fn output_schema() -> &'static OutputSchema;
}

/// Builder for strict object schemas.
///
/// Strict mode requires every property to be listed as required and
/// forbids additional properties, so `build` enforces both.
pub struct SchemaBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
    description: Option<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            properties: serde_json::Map::new(),
            required: Vec::new(),
            description: None,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), schema);
        self.required.push(name);
        self
    }

    pub fn string(self, name: impl Into<String>, description: &str) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "string", "description": description }),
        )
    }

    pub fn boolean(self, name: impl Into<String>, description: &str) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "boolean", "description": description }),
        )
    }

    pub fn array(self, name: impl Into<String>, items: serde_json::Value) -> Self {
        self.property(name, serde_json::json!({ "type": "array", "items": items }))
    }

    pub fn build(self) -> serde_json::Value {
        let mut schema = serde_json::json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
            "additionalProperties": false,
        });
        if let Some(desc) = self.description {
            schema["description"] = serde_json::Value::String(desc);
        }
        schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
