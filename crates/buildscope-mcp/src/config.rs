//! Configuration for the buildscope-mcp server
//!
//! This module provides configuration types and utilities for the MCP server,
//! including the dotnet executable, workspace settings, and logging options.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Default limit for the `raw_output` field of build responses
pub const DEFAULT_MAX_RAW_CHARS: usize = 4000;

/// Buildscope MCP Server - structured dotnet build and test results
#[derive(Parser, Debug, Clone)]
#[command(name = "buildscope-mcp")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to MCP server mode)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// dotnet executable used to build and test solutions
    ///
    /// Defaults to `dotnet` resolved through PATH.
    #[arg(short, long, env = "BUILDSCOPE_DOTNET", default_value = "dotnet")]
    pub dotnet: PathBuf,

    /// Base directory for relative solution paths
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "BUILDSCOPE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Maximum number of characters of raw build output returned to clients
    #[arg(long, env = "BUILDSCOPE_MAX_RAW_CHARS", default_value_t = DEFAULT_MAX_RAW_CHARS)]
    pub max_raw_chars: usize,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr to avoid interfering with MCP stdio
    /// transport.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            dotnet: PathBuf::from("dotnet"),
            workspace: None,
            max_raw_chars: DEFAULT_MAX_RAW_CHARS,
            verbose: false,
            quiet: false,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse captured tool output from stdin and print the JSON result
    ///
    /// Example:
    ///   dotnet build MyApp.sln 2>&1 | buildscope-mcp parse build
    Parse {
        /// Which tool produced the output
        #[arg(value_enum)]
        kind: OutputKind,
    },
}

/// Kind of captured output accepted by the `parse` subcommand
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// `dotnet build` output
    Build,
    /// `dotnet test` output
    Tests,
}

impl Config {
    /// Get the workspace path, using current directory as default
    ///
    /// Returns `None` if no workspace is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workspace path is specified but doesn't exist or isn't a directory
    /// - The raw output limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref workspace) = self.workspace {
            if !workspace.exists() {
                return Err(ConfigError::WorkspaceNotFound(workspace.clone()));
            }
            if !workspace.is_dir() {
                return Err(ConfigError::WorkspaceNotDirectory(workspace.clone()));
            }
        }

        if self.max_raw_chars == 0 {
            return Err(ConfigError::InvalidMaxRawChars);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Workspace path not found
    #[error("Workspace path not found: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    /// Workspace path is not a directory
    #[error("Workspace path is not a directory: {}", .0.display())]
    WorkspaceNotDirectory(PathBuf),

    /// Raw output limit must be positive
    #[error("--max-raw-chars must be greater than zero")]
    InvalidMaxRawChars,
}
