use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracespec_core::model::spec::SpecBody;
use tracespec_core::query::{CompareRequest, TraceRequest, TracesRequest};
use tracespec_core::time::hours_ago;
use tracespec_store::Store;

use crate::protocol::{ApiRequest, ApiResponse};
use crate::query_server::handle_request;

pub struct McpServer {
    store: Store,
    default_hours: u64,
}

#[derive(Deserialize)]
struct McpReq {
    id: Option<Value>,
    method: Option<String>,
    params: Option<Value>,
}

#[derive(Deserialize)]
struct GetTracesArgs {
    service_name: String,
    hours: Option<u64>,
}

#[derive(Deserialize)]
struct DefineSpecArgs {
    name: String,
    description: String,
    spec: SpecBody,
}

fn mcp_ok(id: Option<Value>, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn mcp_err(id: Option<Value>, code: i64, message: String) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

fn text_content(text: String, is_error: bool) -> Value {
    json!({"content": [{"type": "text", "text": text}], "isError": is_error})
}

impl McpServer {
    pub fn new(store: Store, default_hours: u64) -> Self {
        Self {
            store,
            default_hours,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(&line) {
                println!("{}", serde_json::to_string(&reply)?);
            }
        }

        Ok(())
    }

    /// Handles one JSON-RPC frame. Notifications get no reply.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        let input = match serde_json::from_str::<McpReq>(line) {
            Ok(v) => v,
            Err(e) => return Some(mcp_err(None, -32700, e.to_string())),
        };

        let method = input.method.as_deref().unwrap_or_default();
        if method.starts_with("notifications/") {
            return None;
        }

        let reply = match method {
            "initialize" => mcp_ok(
                input.id,
                json!({
                    "protocolVersion": "2024-11-05",
                    "serverInfo": {"name": "tracespec", "version": env!("CARGO_PKG_VERSION")},
                    "capabilities": {"tools": {"listChanged": false}}
                }),
            ),
            "tools/list" => mcp_ok(input.id, json!({ "tools": tool_definitions() })),
            "tools/call" => {
                let params = input.params.unwrap_or_else(|| json!({}));
                let Some(name) = params.get("name").and_then(Value::as_str) else {
                    return Some(mcp_err(input.id, -32602, "missing tool name".to_string()));
                };
                let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
                mcp_ok(input.id, self.call_tool(name, args))
            }
            _ => mcp_err(
                input.id,
                -32601,
                "unsupported method (expected initialize, tools/list, tools/call)".to_string(),
            ),
        };
        Some(reply)
    }

    pub fn call_tool(&self, name: &str, args: Value) -> Value {
        let request = match self.tool_request(name, args) {
            Ok(Some(req)) => req,
            Ok(None) => return text_content(format!("Unknown tool: {name}"), true),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "rejected tool arguments");
                return text_content(format!("Error: invalid tool arguments: {e}"), true);
            }
        };

        let response = handle_request(request, &self.store);
        let is_error = matches!(response, ApiResponse::Error(_));
        let text = match &response {
            ApiResponse::Error(msg) => msg.clone(),
            ApiResponse::SpecDefined(v) => v.message.clone(),
            other => match other.payload().and_then(|v| serde_json::to_string_pretty(&v)) {
                Ok(text) => text,
                Err(e) => return text_content(format!("Error: {e}"), true),
            },
        };
        text_content(text, is_error)
    }

    fn tool_request(&self, name: &str, args: Value) -> anyhow::Result<Option<ApiRequest>> {
        let req = match name {
            "get_traces" => {
                let args: GetTracesArgs = serde_json::from_value(args)?;
                ApiRequest::Traces(TracesRequest {
                    service_name: Some(args.service_name),
                    since: Some(hours_ago(args.hours.unwrap_or(self.default_hours))?),
                })
            }
            "get_trace_by_id" => ApiRequest::Trace(serde_json::from_value::<TraceRequest>(args)?),
            "analyze_trace" => ApiRequest::Analyze(serde_json::from_value::<TraceRequest>(args)?),
            "define_trace_spec" => {
                let args: DefineSpecArgs = serde_json::from_value(args)?;
                ApiRequest::DefineSpec(args.spec.into_specification(args.name, args.description))
            }
            "compare_trace_to_spec" => {
                ApiRequest::Compare(serde_json::from_value::<CompareRequest>(args)?)
            }
            "list_trace_specs" => ApiRequest::Specs,
            _ => return Ok(None),
        };
        Ok(Some(req))
    }
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "get_traces",
            "description": "Retrieve stored traces for a service",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "service_name": {"type": "string", "description": "Name of the service to get traces for"},
                    "hours": {"type": "integer", "description": "Number of hours to look back", "default": 1}
                },
                "required": ["service_name"]
            }
        },
        {
            "name": "get_trace_by_id",
            "description": "Get a specific trace by ID",
            "inputSchema": {
                "type": "object",
                "properties": {"trace_id": {"type": "string", "description": "The trace ID to retrieve"}},
                "required": ["trace_id"]
            }
        },
        {
            "name": "define_trace_spec",
            "description": "Define expected trace specification",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name for this trace specification"},
                    "description": {"type": "string", "description": "Description of what this trace represents"},
                    "spec": {"type": "object", "description": "Object with expected_spans and optional max_total_duration_ms"}
                },
                "required": ["name", "description", "spec"]
            }
        },
        {
            "name": "compare_trace_to_spec",
            "description": "Compare a trace against a specification",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "trace_id": {"type": "string", "description": "The trace ID to analyze"},
                    "spec_name": {"type": "string", "description": "Name of the specification to compare against"}
                },
                "required": ["trace_id", "spec_name"]
            }
        },
        {
            "name": "list_trace_specs",
            "description": "List all defined trace specifications",
            "inputSchema": {"type": "object", "properties": {}}
        },
        {
            "name": "analyze_trace",
            "description": "Summarize services, operations and timing of a trace",
            "inputSchema": {
                "type": "object",
                "properties": {"trace_id": {"type": "string", "description": "The trace ID to analyze"}},
                "required": ["trace_id"]
            }
        }
    ])
}
