//! Tool-related types: descriptors and invocation results.

use serde::{Deserialize, Serialize};

/// A tool as advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub input_schema: serde_json::Value,
    /// Name of the tool server that owns this tool.
    pub server: String,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
        server: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            server: server.into(),
        }
    }
}

/// One typed content block returned by a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Resource {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Image {
        data: String,
        mime_type: String,
    },
}

/// Result of a tool invocation.
///
/// `is_error` marks a failure reported by the tool itself; transport
/// failures never produce a `ToolResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            ..Default::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
            structured: None,
        }
    }

    /// Render the result as the text shown to the model.
    ///
    /// Text blocks are kept verbatim, every other block is serialized as
    /// JSON, one block per line. Structured content is used only when there
    /// are no content blocks.
    pub fn to_model_text(&self) -> String {
        if self.content.is_empty() {
            return self
                .structured
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_default();
        }
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All text blocks, resource text included, joined by newlines.
    pub fn all_text(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n")
    }

    pub fn first_text(&self) -> Option<&str> {
        self.texts().next()
    }

    pub fn last_text(&self) -> Option<&str> {
        self.texts().last()
    }

    pub fn uris(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ToolContent::Resource { uri, .. } => Some(uri.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Image blocks as `(data, mime_type)` pairs.
    pub fn images(&self) -> Vec<(&str, &str)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ToolContent::Image { data, mime_type } => Some((data.as_str(), mime_type.as_str())),
                _ => None,
            })
            .collect()
    }

    fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|block| match block {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Resource { text: Some(text), .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mixed() -> ToolResult {
        ToolResult {
            content: vec![
                ToolContent::Text { text: "first".into() },
                ToolContent::Resource {
                    uri: "file:///tmp/a.txt".into(),
                    mime_type: Some("text/plain".into()),
                    text: Some("inside".into()),
                },
                ToolContent::Image {
                    data: "aGk=".into(),
                    mime_type: "image/png".into(),
                },
                ToolContent::Text { text: "last".into() },
            ],
            is_error: false,
            structured: None,
        }
    }

    #[test]
    fn model_text_keeps_text_and_serializes_the_rest() {
        let text = mixed().to_model_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "first");
        assert!(lines[1].contains("\"uri\":\"file:///tmp/a.txt\""));
        assert!(lines[2].contains("\"type\":\"image\""));
        assert_eq!(lines[3], "last");
    }

    #[test]
    fn model_text_falls_back_to_structured() {
        let result = ToolResult {
            structured: Some(json!({"ok": true})),
            ..Default::default()
        };
        assert_eq!(result.to_model_text(), r#"{"ok":true}"#);
    }

    #[test]
    fn text_helpers() {
        let result = mixed();
        assert_eq!(result.first_text(), Some("first"));
        assert_eq!(result.last_text(), Some("last"));
        assert_eq!(result.all_text(), "first\ninside\nlast");
        assert_eq!(result.uris(), vec!["file:///tmp/a.txt"]);
        assert_eq!(result.images(), vec![("aGk=", "image/png")]);
    }
}
