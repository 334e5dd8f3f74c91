// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! dotnet process execution
//!
//! Runs `dotnet build` / `dotnet test` and captures their combined output in
//! the shape the parsers expect: stdout, a newline, stderr, and on failure a
//! trailing `Exit code: <N>` line.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Logger argument that makes `dotnet test` print result and message lines
pub const TEST_LOGGER: &str = "console;verbosity=detailed";

/// Offset added to the signal number of a signalled process, as shells do
#[cfg(unix)]
const SIGNAL_EXIT_BASE: i32 = 128;

/// Exit code used when the platform reports neither a code nor a signal
const UNKNOWN_EXIT_CODE: i32 = 1;

/// Errors running the dotnet executable
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be started
    #[error("Failed to start {}: {source}", .program.display())]
    Spawn {
        /// Program that failed to start
        program: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Waiting for the process or reading its output failed
    #[error("Failed to collect output from {}: {source}", .program.display())]
    Output {
        /// Program being run
        program: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Captured output of one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// stdout, newline, stderr, plus the exit code marker on failure
    pub text: String,
    /// Process exit code
    pub exit_code: i32,
}

impl ToolOutput {
    /// Combine captured streams into parser input
    ///
    /// The `Exit code:` marker is appended only for non-zero exit codes. The
    /// marker is unsigned, so a negative code (Windows reports NTSTATUS
    /// failures that way) is written as `i32::MAX`; `exit_code` keeps the
    /// real value.
    #[must_use]
    pub fn from_streams(stdout: &[u8], stderr: &[u8], exit_code: i32) -> Self {
        let mut text = String::from_utf8_lossy(stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(stderr));
        if exit_code != 0 {
            text.push_str(&format!("\nExit code: {}", marker_code(exit_code)));
        }
        Self { text, exit_code }
    }
}

/// Runs the dotnet CLI
#[derive(Debug, Clone)]
pub struct DotnetRunner {
    program: PathBuf,
}

impl Default for DotnetRunner {
    fn default() -> Self {
        Self::new("dotnet")
    }
}

impl DotnetRunner {
    /// Create a runner for the given executable
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this runner invokes
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `dotnet build <solution>` in the solution's directory
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] if the process cannot be started or its
    /// output cannot be collected.
    pub async fn build(&self, solution: &Path) -> Result<ToolOutput, RunnerError> {
        let solution_arg = solution.as_os_str().to_string_lossy();
        self.run(solution_dir(solution), &["build", &*solution_arg])
            .await
    }

    /// Run `dotnet test <solution>` with the detailed console logger
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] if the process cannot be started or its
    /// output cannot be collected.
    pub async fn test(&self, solution: &Path) -> Result<ToolOutput, RunnerError> {
        let solution_arg = solution.as_os_str().to_string_lossy();
        self.run(
            solution_dir(solution),
            &["test", &*solution_arg, "--logger", TEST_LOGGER],
        )
        .await
    }

    /// Run the executable with `args` in `working_dir`
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] if the process cannot be started or its
    /// output cannot be collected.
    pub async fn run(&self, working_dir: &Path, args: &[&str]) -> Result<ToolOutput, RunnerError> {
        debug!(
            program = %self.program.display(),
            dir = %working_dir.display(),
            ?args,
            "Running tool"
        );

        let child = Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| RunnerError::Output {
                program: self.program.clone(),
                source,
            })?;

        let exit_code = exit_code_of(output.status);
        if exit_code != 0 {
            warn!(program = %self.program.display(), exit_code, "Tool exited with failure");
        }

        Ok(ToolOutput::from_streams(
            &output.stdout,
            &output.stderr,
            exit_code,
        ))
    }
}

/// Code written to the marker line for a failed process
fn marker_code(exit_code: i32) -> i32 {
    if exit_code < 0 { i32::MAX } else { exit_code }
}

/// Exit code of a finished process
///
/// A process terminated by a signal has no exit code; it is reported as
/// `128 + signal`, so it is never mistaken for success.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE.saturating_add(signal);
        }
    }

    UNKNOWN_EXIT_CODE
}

/// Directory a solution is built from
fn solution_dir(solution: &Path) -> &Path {
    solution
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
