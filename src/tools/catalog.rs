//! Per-agent tool catalog: discovery across servers, filtering, routing.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::arguments::JsonObject;
use super::server::ToolServer;
use super::types::{ToolDescriptor, ToolResult};
use crate::error::SwarmError;

/// Apply include/exclude lists to a set of tools.
///
/// A non-empty `include` keeps only the listed names; `exclude` then drops
/// the listed names. Input order is preserved.
pub fn filter_tools(
    tools: Vec<ToolDescriptor>,
    include: &[String],
    exclude: &[String],
) -> Vec<ToolDescriptor> {
    let include: HashSet<&str> = include.iter().map(String::as_str).collect();
    let exclude: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    tools
        .into_iter()
        .filter(|tool| include.is_empty() || include.contains(tool.name.as_str()))
        .filter(|tool| !exclude.contains(tool.name.as_str()))
        .collect()
}

struct ToolRoute {
    descriptor: ToolDescriptor,
    server: Arc<dyn ToolServer>,
}

/// The tools one agent may call, each routed to its owning server.
#[derive(Default)]
pub struct ToolCatalog {
    routes: BTreeMap<String, ToolRoute>,
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("tools", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// List every server's tools and build the filtered catalog.
    ///
    /// Servers are visited in name order; when two servers expose the same
    /// tool name the later one wins.
    pub async fn resolve(
        servers: &[Arc<dyn ToolServer>],
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, SwarmError> {
        let mut ordered: Vec<&Arc<dyn ToolServer>> = servers.iter().collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()));

        let mut merged: BTreeMap<String, ToolRoute> = BTreeMap::new();
        for server in ordered {
            let tools = server.list_tools().await?;
            debug!(server = server.name(), tools = tools.len(), "listed tools");
            for descriptor in tools {
                if let Some(previous) = merged.get(&descriptor.name) {
                    debug!(
                        tool = %descriptor.name,
                        shadowed = previous.server.name(),
                        server = server.name(),
                        "tool name collision, later server wins"
                    );
                }
                merged.insert(
                    descriptor.name.clone(),
                    ToolRoute {
                        descriptor,
                        server: Arc::clone(server),
                    },
                );
            }
        }

        let kept: HashSet<String> = filter_tools(
            merged.values().map(|route| route.descriptor.clone()).collect(),
            include,
            exclude,
        )
        .into_iter()
        .map(|tool| tool.name)
        .collect();
        merged.retain(|name, _| kept.contains(name));

        Ok(Self { routes: merged })
    }

    /// Descriptors in name order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.routes.values().map(|route| route.descriptor.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route a call to the server owning `name`.
    pub async fn call(&self, name: &str, arguments: JsonObject) -> Result<ToolResult, SwarmError> {
        let route = self
            .routes
            .get(name)
            .ok_or_else(|| SwarmError::not_found("tool", name))?;
        route.server.call_tool(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn tool(name: &str, server: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{name} tool"), json!({"type": "object"}), server)
    }

    fn names(tools: &[ToolDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    struct FixedServer {
        name: String,
        tools: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolServer for FixedServer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start(&self) -> Result<(), SwarmError> {
            Ok(())
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SwarmError> {
            Ok(self.tools.iter().map(|t| tool(t, &self.name)).collect())
        }

        async fn call_tool(&self, name: &str, _arguments: JsonObject) -> Result<ToolResult, SwarmError> {
            Ok(ToolResult::text(format!("{}:{name}", self.name)))
        }

        async fn shutdown(&self) -> Result<(), SwarmError> {
            Ok(())
        }
    }

    fn server(name: &str, tools: Vec<&'static str>) -> Arc<dyn ToolServer> {
        Arc::new(FixedServer {
            name: name.into(),
            tools,
        })
    }

    #[test]
    fn include_then_exclude() {
        let tools = vec![tool("a", "s"), tool("b", "s"), tool("c", "s")];
        let filtered = filter_tools(tools, &["a".into(), "b".into()], &["b".into()]);
        assert_eq!(names(&filtered), vec!["a"]);
    }

    #[test]
    fn empty_lists_keep_everything() {
        let tools = vec![tool("a", "s"), tool("b", "s")];
        assert_eq!(names(&filter_tools(tools, &[], &[])), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn later_server_wins_on_collision() {
        let catalog = ToolCatalog::resolve(
            &[server("zeta", vec!["read"]), server("alpha", vec!["read", "list"])],
            &[],
            &[],
        )
        .await
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let result = catalog.call("read", JsonObject::new()).await.unwrap();
        assert_eq!(result.all_text(), "zeta:read");
        assert_eq!(
            catalog.descriptors().iter().find(|t| t.name == "read").unwrap().server,
            "zeta"
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let catalog = ToolCatalog::resolve(&[server("s", vec!["a"])], &[], &["a".into()])
            .await
            .unwrap();
        assert!(catalog.is_empty());
        let err = catalog.call("a", JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, SwarmError::NotFound { kind: "tool", .. }));
    }
}
