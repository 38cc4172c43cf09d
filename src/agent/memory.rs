//! Conversation message history.

use serde::{Deserialize, Serialize};

use crate::types::{ModelMessage, Role};

/// Ordered, append-only message history owned by one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: ModelMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ModelMessage>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Copy of the history for a model request.
    pub fn snapshot(&self) -> Vec<ModelMessage> {
        self.messages.clone()
    }

    /// Text of the most recent assistant message, if any.
    pub fn last_assistant_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(ModelMessage::text)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
