//! Shared test doubles: scripted model, in-memory tool server, stub delegates.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_swarm::agent::{AgentDirectory, Delegate};
use agent_swarm::error::SwarmError;
use agent_swarm::provider::{ModelAdapter, ModelChoice, ModelRequest};
use agent_swarm::tools::{JsonObject, OutputSchema, ToolDescriptor, ToolResult, ToolServer};
use agent_swarm::types::{AgentToolCall, FinishSignal, ModelMessage};

/// A plain text completion.
pub fn text_choice(text: &str) -> ModelChoice {
    ModelChoice {
        message: ModelMessage::assistant(text),
        finish: FinishSignal::Stop,
    }
}

/// A completion requesting `(id, tool, arguments)` calls.
pub fn tool_call_choice(text: &str, calls: &[(&str, &str, Value)]) -> ModelChoice {
    let calls = calls
        .iter()
        .map(|(id, name, arguments)| AgentToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.clone(),
        })
        .collect();
    ModelChoice {
        message: ModelMessage::assistant_with_tool_calls(text, calls),
        finish: FinishSignal::ToolCalls,
    }
}

/// A model that replays queued completions and records every request.
///
/// Once the queue is empty it repeats `fallback` if set, otherwise answers
/// "Mock response".
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelChoice>>,
    structured: Mutex<VecDeque<Value>>,
    fallback: Option<ModelChoice>,
    pub requests: Arc<Mutex<Vec<ModelRequest>>>,
    pub attached_tools: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelChoice>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn always(choice: ModelChoice) -> Self {
        Self {
            fallback: Some(choice),
            ..Default::default()
        }
    }

    pub fn with_structured(self, values: Vec<Value>) -> Self {
        *self.structured.lock().unwrap() = values.into();
        self
    }

    pub fn request_log(&self) -> Arc<Mutex<Vec<ModelRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl ModelAdapter for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn initialize(&mut self) -> Result<(), SwarmError> {
        Ok(())
    }

    fn attach_tools(&mut self, tools: &[ToolDescriptor]) {
        *self.attached_tools.lock().unwrap() = tools.iter().map(|t| t.name.clone()).collect();
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelChoice, SwarmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        Ok(next
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| text_choice("Mock response")))
    }

    async fn structured(&self, request: &ModelRequest, _schema: &OutputSchema) -> Result<Value, SwarmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SwarmError::InvalidState("no structured reply queued".into()))
    }
}

type ToolHandler = Arc<dyn Fn(&str, &JsonObject) -> Result<ToolResult, SwarmError> + Send + Sync>;

/// An in-memory tool server. Each tool echoes `name:arguments` unless a
/// handler is set.
pub struct StubToolServer {
    name: String,
    tools: Vec<ToolDescriptor>,
    delays: BTreeMap<String, Duration>,
    handler: ToolHandler,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub started: AtomicBool,
    pub stopped: AtomicBool,
    fail_start: bool,
}

impl StubToolServer {
    pub fn new(name: &str, tools: &[&str]) -> Self {
        let server = name.to_string();
        Self {
            name: server.clone(),
            tools: tools
                .iter()
                .map(|tool| {
                    ToolDescriptor::new(
                        *tool,
                        format!("{tool} tool"),
                        json!({"type": "object", "properties": {}}),
                        server.clone(),
                    )
                })
                .collect(),
            delays: BTreeMap::new(),
            handler: Arc::new(|name: &str, args: &JsonObject| Ok(ToolResult::text(format!("{name}:{}", Value::Object(args.clone()))))),
            calls: Arc::new(Mutex::new(Vec::new())),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            fail_start: false,
        }
    }

    pub fn with_delay(mut self, tool: &str, delay: Duration) -> Self {
        self.delays.insert(tool.to_string(), delay);
        self
    }

    pub fn with_handler(
        mut self,
        handler: impl Fn(&str, &JsonObject) -> Result<ToolResult, SwarmError> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

#[async_trait]
impl ToolServer for StubToolServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), SwarmError> {
        if self.fail_start {
            return Err(SwarmError::transport("tool server", &self.name, "handshake refused"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SwarmError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<ToolResult, SwarmError> {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        (self.handler)(name, &arguments)
    }

    async fn shutdown(&self) -> Result<(), SwarmError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

type Reply = Arc<dyn Fn(&str) -> Result<String, SwarmError> + Send + Sync>;

/// A sub-agent double that answers with a function of its input.
pub struct StubDelegate {
    name: String,
    description: String,
    reply: Reply,
    pub inputs: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl StubDelegate {
    pub fn new(
        name: &str,
        reply: impl Fn(&str) -> Result<String, SwarmError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            description: format!("{name} agent"),
            reply: Arc::new(reply),
            inputs: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Always answers `text`.
    pub fn fixed(name: &str, text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(name, move |_| Ok(text.clone()))
    }

    /// Answers `replies` in order, repeating the last one.
    pub fn sequence(name: &str, replies: Vec<String>) -> Arc<Self> {
        let replies = Mutex::new(VecDeque::from(replies));
        Self::new(name, move |_| {
            let mut replies = replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front().unwrap_or_default()
            } else {
                replies.front().cloned().unwrap_or_default()
            };
            Ok(reply)
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delegate for StubDelegate {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn delegate(&self, input: &str) -> Result<String, SwarmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        (self.reply)(input)
    }
}

/// Build a directory from stubs.
pub fn directory(agents: &[Arc<StubDelegate>]) -> AgentDirectory {
    agents
        .iter()
        .map(|agent| {
            let delegate: Arc<dyn Delegate> = agent.clone();
            (agent.name().to_string(), delegate)
        })
        .collect()
}
