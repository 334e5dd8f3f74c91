//! Tool handlers for the MCP server
//!
//! This module implements the handlers for each MCP tool, bridging MCP
//! requests to dotnet invocations and the output parsers, and returning
//! serializable responses.

use std::path::{Path, PathBuf};

use buildscope_parsers::{Diagnostic, TestOutcome, parse_build_output, parse_test_output};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::DEFAULT_MAX_RAW_CHARS;
use crate::runner::{DotnetRunner, RunnerError};
use crate::solution::{SolutionError, resolve_solution_path};

/// Suffix appended to truncated raw output
pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid input - missing or malformed field
    #[error("Invalid input: {0}. Check the tool's required parameters.")]
    InvalidInput(String),

    /// Solution path could not be resolved
    #[error(transparent)]
    Solution(#[from] SolutionError),

    /// dotnet could not be run
    #[error("{0}. Ensure the .NET SDK is installed or pass --dotnet.")]
    Runner(#[from] RunnerError),

    /// No tool with this name
    #[error("Unknown tool: {0}.")]
    UnknownTool(String),

    /// JSON serialization error
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Input Types
// ============================================================================

/// Input for the build_structured and run_tests tools
#[derive(Debug, Clone, Deserialize)]
pub struct SolutionInput {
    /// Path to a `.sln` file or a directory containing one
    pub solution_path: String,
}

// ============================================================================
// Output Types
// ============================================================================

/// Response from the build_structured tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResponse {
    /// Zero exit code and no errors
    pub success: bool,
    /// Exit code of `dotnet build`
    pub exit_code: i32,
    /// Errors in output order
    pub errors: Vec<Diagnostic>,
    /// Warnings in output order
    pub warnings: Vec<Diagnostic>,
    /// Raw tool output, truncated
    pub raw_output: String,
}

/// Response from the run_tests tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    /// No test failed
    pub success: bool,
    /// Tests run
    pub total: usize,
    /// Tests passed
    pub passed: usize,
    /// Tests failed
    pub failed: usize,
    /// Tests skipped
    pub skipped: usize,
    /// Failed tests with messages and durations
    pub failed_tests: Vec<TestOutcome>,
}

/// Everything a tool call needs besides its arguments
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Runner for the dotnet CLI
    pub runner: DotnetRunner,
    /// Base directory for relative solution paths
    pub workspace: Option<PathBuf>,
    /// Limit for `raw_output`
    pub max_raw_chars: usize,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            runner: DotnetRunner::default(),
            workspace: None,
            max_raw_chars: DEFAULT_MAX_RAW_CHARS,
        }
    }
}

// ============================================================================
// Response Builders
// ============================================================================

/// Parse `dotnet build` output into a response
#[must_use]
pub fn build_response(output: &str, max_raw_chars: usize) -> BuildResponse {
    let parsed = parse_build_output(output);
    BuildResponse {
        success: parsed.success(),
        exit_code: parsed.exit_code,
        errors: parsed.errors,
        warnings: parsed.warnings,
        raw_output: truncate_raw_output(output, max_raw_chars),
    }
}

/// Parse `dotnet test` output into a response
#[must_use]
pub fn test_response(output: &str) -> TestResponse {
    let parsed = parse_test_output(output);
    TestResponse {
        success: parsed.success(),
        total: parsed.total,
        passed: parsed.passed,
        failed: parsed.failed,
        skipped: parsed.skipped,
        failed_tests: parsed.failed_tests,
    }
}

/// Keep at most `max_chars` characters, marking the cut
#[must_use]
pub fn truncate_raw_output(output: &str, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &output[..cut], TRUNCATION_MARKER),
        None => output.to_string(),
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Parse input from MCP arguments into a typed struct
fn parse_input<T: for<'de> Deserialize<'de>>(
    args: Option<Map<String, Value>>,
) -> Result<T, HandlerError> {
    let value = args
        .map(Value::Object)
        .unwrap_or(Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| HandlerError::InvalidInput(e.to_string()))
}

/// Extract and resolve the `solution_path` argument
fn solution_from_args(
    args: Option<Map<String, Value>>,
    workspace: Option<&Path>,
) -> Result<PathBuf, HandlerError> {
    let input: SolutionInput = parse_input(args)?;
    if input.solution_path.trim().is_empty() {
        return Err(HandlerError::InvalidInput(
            "solution_path cannot be empty. Provide a .sln file or a directory containing one"
                .to_string(),
        ));
    }
    Ok(resolve_solution_path(&input.solution_path, workspace)?)
}

/// Handle the build_structured tool
///
/// Builds the solution and returns its errors and warnings.
pub async fn handle_build_structured(
    ctx: &ToolContext,
    args: Option<Map<String, Value>>,
) -> Result<BuildResponse, HandlerError> {
    let solution = solution_from_args(args, ctx.workspace.as_deref())?;
    tracing::info!(solution = %solution.display(), "Building solution");

    let output = ctx.runner.build(&solution).await?;
    let response = build_response(&output.text, ctx.max_raw_chars);

    tracing::info!(
        success = response.success,
        errors = response.errors.len(),
        warnings = response.warnings.len(),
        "Build finished"
    );
    Ok(response)
}

/// Handle the run_tests tool
///
/// Runs the solution's tests and returns counts and failed tests.
pub async fn handle_run_tests(
    ctx: &ToolContext,
    args: Option<Map<String, Value>>,
) -> Result<TestResponse, HandlerError> {
    let solution = solution_from_args(args, ctx.workspace.as_deref())?;
    tracing::info!(solution = %solution.display(), "Running tests");

    let output = ctx.runner.test(&solution).await?;
    let response = test_response(&output.text);

    tracing::info!(
        success = response.success,
        total = response.total,
        failed = response.failed,
        "Test run finished"
    );
    Ok(response)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    /// Helper to convert a JSON Value to a Map for testing
    fn to_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected JSON object"),
        }
    }

    #[test]
    fn test_parse_solution_input() {
        let args = to_map(json!({ "solution_path": "/src/App.sln" }));
        let input: SolutionInput = parse_input(Some(args)).expect("parse");
        assert_eq!(input.solution_path, "/src/App.sln");
    }

    #[test]
    fn test_parse_solution_input_missing() {
        let result: Result<SolutionInput, _> = parse_input(None);
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_solution_input_wrong_type() {
        let args = to_map(json!({ "solution_path": 42 }));
        let result: Result<SolutionInput, _> = parse_input(Some(args));
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_solution_path_rejected() {
        let args = to_map(json!({ "solution_path": "  " }));
        let result = solution_from_args(Some(args), None);
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }

    #[test]
    fn test_truncate_raw_output_short() {
        assert_eq!(truncate_raw_output("abc", 3), "abc");
        assert_eq!(truncate_raw_output("", 10), "");
    }

    #[test]
    fn test_truncate_raw_output_long() {
        assert_eq!(
            truncate_raw_output("abcdef", 4),
            format!("abcd{}", TRUNCATION_MARKER)
        );
    }

    #[test]
    fn test_truncate_raw_output_respects_char_boundaries() {
        let output = "ошибка сборки";
        assert_eq!(
            truncate_raw_output(output, 6),
            format!("ошибка{}", TRUNCATION_MARKER)
        );
    }

    #[test]
    fn test_build_response_shape() {
        let output = "Program.cs(5,1): error CS1513: } expected\nProgram.cs(2): warning : unused\n\nExit code: 1";
        let response = build_response(output, 4000);

        assert!(!response.success);
        assert_eq!(response.exit_code, 1);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.raw_output, output);

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], json!(false));
        assert!(json["warnings"][0]["column"].is_null());
        assert!(json["warnings"][0]["code"].is_null());
    }

    #[test]
    fn test_test_response_shape() {
        let output = "Failed A.B [3 ms]\nMessage: nope\nFailed! - Failed: 1, Passed: 4, Skipped: 0";
        let response = test_response(output);

        assert!(!response.success);
        assert_eq!(
            (response.total, response.passed, response.failed, response.skipped),
            (5, 4, 1, 0)
        );

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json["failed_tests"],
            json!([{ "name": "A.B", "message": "nope", "duration_ms": 3 }])
        );
    }

    #[test]
    fn test_empty_output_is_success() {
        assert!(build_response("", 10).success);
        assert!(test_response("").success);
    }

    #[tokio::test]
    async fn test_handle_build_missing_solution() {
        let ctx = ToolContext::default();
        let args = to_map(json!({ "solution_path": "/nonexistent/buildscope/App.sln" }));
        let result = handle_build_structured(&ctx, Some(args)).await;
        assert!(matches!(
            result,
            Err(HandlerError::Solution(SolutionError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_handle_run_tests_missing_argument() {
        let ctx = ToolContext::default();
        let result = handle_run_tests(&ctx, None).await;
        assert!(matches!(result, Err(HandlerError::InvalidInput(_))));
    }
}
