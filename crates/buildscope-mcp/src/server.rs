//! MCP server implementation for buildscope-mcp
//!
//! This module provides the MCP server that exposes `dotnet build` and
//! `dotnet test` to LLMs as tools returning structured JSON instead of raw
//! console logs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::McpServer;
use rust_mcp_sdk::mcp_server::ServerHandler;
use rust_mcp_sdk::schema::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams, RpcError,
    TextContent, Tool, ToolInputSchema, schema_utils::CallToolError,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::handlers::{self, HandlerError, ToolContext};

/// Tool name for structured builds
pub const BUILD_TOOL: &str = "build_structured";
/// Tool name for structured test runs
pub const TEST_TOOL: &str = "run_tests";

/// Convert a JSON object into the properties format expected by ToolInputSchema.
///
/// ToolInputSchema expects `HashMap<String, Map<String, Value>>` for properties,
/// where each key maps to a JSON object describing that property's schema.
fn make_properties(json_obj: Value) -> HashMap<String, Map<String, Value>> {
    let mut properties = HashMap::new();
    if let Value::Object(obj) = json_obj {
        for (key, value) in obj {
            if let Value::Object(inner) = value {
                properties.insert(key, inner);
            }
        }
    }
    properties
}

/// Schema shared by both tools: a single required `solution_path`
fn solution_input_schema() -> ToolInputSchema {
    ToolInputSchema::new(
        vec!["solution_path".into()],
        Some(make_properties(json!({
            "solution_path": {
                "type": "string",
                "description": "Path to a .sln file, or a directory in which to look for one"
            }
        }))),
        None,
    )
}

/// The main buildscope MCP server handler
///
/// Holds no mutable state; every tool call owns its own process.
pub struct BuildscopeServer {
    ctx: ToolContext,
}

impl BuildscopeServer {
    /// Create a new server with the given tool context
    #[must_use]
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Get the tool context
    #[must_use]
    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Build the list of available tools
    pub fn build_tools() -> Vec<Tool> {
        vec![Self::build_tool(), Self::test_tool()]
    }

    fn build_tool() -> Tool {
        Tool {
            name: BUILD_TOOL.into(),
            description: Some(
                "Build a solution with dotnet build. Returns JSON: success, exit_code, \
                 errors[] (file, line, column, code, message), warnings[], and raw_output \
                 (truncated). Structured errors without parsing the log."
                    .into(),
            ),
            input_schema: solution_input_schema(),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Structured Build".into()),
        }
    }

    fn test_tool() -> Tool {
        Tool {
            name: TEST_TOOL.into(),
            description: Some(
                "Run a solution's tests with dotnet test. Returns JSON: success, total, \
                 passed, failed, skipped, failed_tests[] (name, message, duration_ms). \
                 Builds first when needed."
                    .into(),
            ),
            input_schema: solution_input_schema(),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Run Tests".into()),
        }
    }

    /// Dispatch a tool call to its handler and serialize the response
    pub async fn dispatch(
        &self,
        name: &str,
        args: Option<Map<String, Value>>,
    ) -> Result<String, HandlerError> {
        match name {
            BUILD_TOOL => to_json(handlers::handle_build_structured(&self.ctx, args).await),
            TEST_TOOL => to_json(handlers::handle_run_tests(&self.ctx, args).await),
            _ => Err(HandlerError::UnknownTool(name.to_string())),
        }
    }
}

fn to_json<T: Serialize>(result: Result<T, HandlerError>) -> Result<String, HandlerError> {
    Ok(serde_json::to_string(&result?)?)
}

/// Wrap a handler outcome as tool result content
///
/// Failures, unknown tool names included, become tool results flagged as
/// errors so the client can show the message, rather than protocol-level
/// errors.
fn tool_result(outcome: Result<String, HandlerError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::text_content(vec![TextContent::new(text, None, None)]),
        Err(err) => {
            let mut result = CallToolResult::text_content(vec![TextContent::new(
                format!("Error: {}", err),
                None,
                None,
            )]);
            result.is_error = Some(true);
            result
        }
    }
}

/// ServerHandler implementation for the MCP protocol
#[async_trait]
impl ServerHandler for BuildscopeServer {
    /// Handle requests to list available tools
    async fn handle_list_tools_request(
        &self,
        _params: Option<PaginatedRequestParams>,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: Self::build_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    /// Handle requests to call a specific tool
    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<CallToolResult, CallToolError> {
        tracing::debug!(tool = %params.name, "Calling tool");

        let outcome = self.dispatch(&params.name, params.arguments).await;
        if let Err(ref err) = outcome {
            tracing::warn!(tool = %params.name, error = %err, "Tool call failed");
        }
        Ok(tool_result(outcome))
    }
}
