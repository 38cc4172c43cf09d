#![cfg(feature = "mcp")]

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use agent_swarm::mcp::{McpToolServer, McpTransport};
use agent_swarm::tools::{ToolContent, ToolServer};

fn mcp_handler(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        let body: serde_json::Value = request.body_json().unwrap_or_else(|_| json!({}));
        let method = body.get("method").and_then(|v| v.as_str()).unwrap_or_default();
        let id = body.get("id").cloned().unwrap_or_else(|| json!(1));

        let result = match method {
            "initialize" => json!({
                "protocolVersion": "2025-03-26",
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": server_name, "version": "0.1.0" }
            }),
            "tools/list" => json!({
                "tools": tools
                    .iter()
                    .map(|(name, description)| json!({
                        "name": name,
                        "description": description,
                        "inputSchema": {
                            "type": "object",
                            "properties": { "query": { "type": "string" } }
                        }
                    }))
                    .collect::<Vec<_>>()
            }),
            "tools/call" => {
                let params = body.get("params").cloned().unwrap_or_default();
                let tool = params.get("name").and_then(|n| n.as_str()).unwrap_or_default();
                if tool == "explode" {
                    json!({
                        "content": [{ "type": "text", "text": "it blew up" }],
                        "isError": true
                    })
                } else {
                    json!({
                        "content": [{ "type": "text", "text": format!("{server_name}:{tool}") }],
                        "structuredContent": {
                            "tool": tool,
                            "arguments": params.get("arguments").cloned().unwrap_or_else(|| json!({}))
                        },
                        "isError": false
                    })
                }
            }
            "notifications/initialized" => return ResponseTemplate::new(202),
            _ => serde_json::Value::Null,
        };

        ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }
}

async fn mock_server(tools: &'static [(&'static str, &'static str)]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(mcp_handler("docs", tools))
        .mount(&server)
        .await;
    server
}

fn methods(requests: &[Request]) -> HashSet<String> {
    requests
        .iter()
        .filter_map(|request| {
            request
                .body_json::<serde_json::Value>()
                .ok()
                .and_then(|body| body.get("method").and_then(|m| m.as_str()).map(str::to_string))
        })
        .collect()
}

#[tokio::test]
async fn http_server_lists_and_calls_tools() {
    let server = mock_server(&[("search", "Search the docs"), ("fetch", "Fetch a page")]).await;
    let tools = McpToolServer::new("docs", McpTransport::http(format!("{}/mcp", server.uri())));

    timeout(Duration::from_secs(2), tools.start()).await.unwrap().unwrap();
    assert!(tools.is_started().await);

    let listed = timeout(Duration::from_secs(2), tools.list_tools()).await.unwrap().unwrap();
    let names: Vec<_> = listed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["search", "fetch"]);
    assert_eq!(listed[0].description, "Search the docs");
    assert_eq!(listed[0].server, "docs");
    assert_eq!(listed[0].input_schema["properties"]["query"]["type"], "string");

    let mut arguments = serde_json::Map::new();
    arguments.insert("query".into(), json!("tokio"));
    let result = timeout(Duration::from_secs(2), tools.call_tool("search", arguments))
        .await
        .unwrap()
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(
        result.content,
        vec![ToolContent::Text {
            text: "docs:search".into()
        }]
    );
    assert_eq!(
        result.structured,
        Some(json!({"tool": "search", "arguments": {"query": "tokio"}}))
    );

    tools.shutdown().await.unwrap();
    assert!(!tools.is_started().await);

    let seen = methods(&server.received_requests().await.unwrap());
    assert!(seen.contains("initialize"));
    assert!(seen.contains("tools/list"));
    assert!(seen.contains("tools/call"));
}

#[tokio::test]
async fn error_results_are_returned_not_raised() {
    let server = mock_server(&[("explode", "Always fails")]).await;
    let tools = McpToolServer::new("docs", McpTransport::http(format!("{}/mcp", server.uri())));
    tools.start().await.unwrap();

    let result = tools.call_tool("explode", Default::default()).await.unwrap();
    assert!(result.is_error);
    assert_eq!(result.to_model_text(), "it blew up");

    tools.shutdown().await.unwrap();
}

#[tokio::test]
async fn configured_headers_are_sent_with_every_request() {
    let server = mock_server(&[]).await;
    let transport = McpTransport::Sse {
        url: format!("{}/mcp", server.uri()),
        headers: BTreeMap::from([("x-swarm-scope".to_string(), "qa".to_string())]),
    };
    let tools = McpToolServer::new("docs", transport);

    tools.start().await.unwrap();
    assert!(tools.list_tools().await.unwrap().is_empty());
    tools.shutdown().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|request| {
        request
            .headers
            .get("x-swarm-scope")
            .and_then(|v| v.to_str().ok())
            == Some("qa")
    }));
}

#[tokio::test]
async fn unreachable_server_fails_to_start_with_its_name() {
    let tools = McpToolServer::new("offline", McpTransport::http("http://127.0.0.1:9/mcp"));
    let err = timeout(Duration::from_secs(5), tools.start()).await.unwrap().unwrap_err();
    assert!(err.to_string().contains("offline"), "got {err}");
    assert!(!tools.is_started().await);
}
