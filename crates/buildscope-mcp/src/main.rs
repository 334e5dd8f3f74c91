//! buildscope-mcp: MCP server for structured dotnet build and test results
//!
//! This binary crate serves the `build_structured` and `run_tests` tools over
//! stdio, and offers a `parse` subcommand for already-captured output.

use anyhow::{Context, Result};
use clap::Parser;
use rust_mcp_sdk::mcp_server::{McpServerOptions, ToMcpServerHandler, server_runtime};
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, LATEST_PROTOCOL_VERSION, ServerCapabilities,
    ServerCapabilitiesTools,
};
use rust_mcp_sdk::{McpServer, StdioTransport, TransportOptions};
use tokio::io::AsyncReadExt;
use tracing::info;

use buildscope_mcp::config::{Command, Config, OutputKind};
use buildscope_mcp::handlers::{self, ToolContext};
use buildscope_mcp::runner::DotnetRunner;
use buildscope_mcp::server::BuildscopeServer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate().context("Invalid configuration")?;

    match config.command {
        Some(Command::Parse { kind }) => parse_stdin(kind, config.max_raw_chars).await,
        None => serve(&config).await,
    }
}

/// Parse captured output from stdin and print the JSON result
async fn parse_stdin(kind: OutputKind, max_raw_chars: usize) -> Result<()> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read stdin")?;

    let json = match kind {
        OutputKind::Build => {
            serde_json::to_string_pretty(&handlers::build_response(&input, max_raw_chars))
        }
        OutputKind::Tests => serde_json::to_string_pretty(&handlers::test_response(&input)),
    }
    .context("Failed to serialize result")?;

    println!("{}", json);
    Ok(())
}

/// Run the MCP server on stdio until the client disconnects
async fn serve(config: &Config) -> Result<()> {
    let ctx = ToolContext {
        runner: DotnetRunner::new(config.dotnet.clone()),
        workspace: config.workspace_path(),
        max_raw_chars: config.max_raw_chars,
    };

    info!(
        dotnet = %config.dotnet.display(),
        workspace = ?ctx.workspace,
        "Starting buildscope-mcp server..."
    );

    let server_details = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            title: Some("Buildscope".into()),
            description: Some(env!("CARGO_PKG_DESCRIPTION").into()),
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Use build_structured to build a .NET solution and get errors and warnings as \
             JSON, and run_tests to get test counts and failed tests."
                .into(),
        ),
        protocol_version: LATEST_PROTOCOL_VERSION.into(),
    };

    let transport = StdioTransport::new(TransportOptions::default())
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to open stdio transport")?;

    let handler = BuildscopeServer::new(ctx);
    let server = server_runtime::create_server(McpServerOptions {
        server_details,
        transport,
        handler: handler.to_mcp_server_handler(),
        task_store: None,
        client_task_store: None,
    });

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("MCP server stopped with an error")?;

    info!("buildscope-mcp server stopped");
    Ok(())
}
