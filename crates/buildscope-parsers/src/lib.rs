// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! buildscope-parsers: Build and test log processing for buildscope-mcp
//!
//! This library crate turns the free-text console output of `dotnet build`
//! and `dotnet test` into structured records. Both parsers are pure functions:
//! unrecognised lines are skipped, so parsing never fails.
//!
//! # Example
//!
//! ```
//! use buildscope_parsers::{parse_build_output, parse_test_output};
//!
//! let build = parse_build_output("Program.cs(12,3): error CS0001: boom\nExit code: 1");
//! assert_eq!(build.errors.len(), 1);
//! assert_eq!(build.exit_code, 1);
//! assert!(!build.success());
//!
//! let run = parse_test_output("Passed Suite.Works [4 ms]\nFailed Suite.Breaks [9 ms]");
//! assert_eq!(run.total, 2);
//! assert_eq!(run.failed_tests[0].name, "Suite.Breaks");
//! ```

pub mod build;
pub mod result;
pub mod test_run;

pub use build::{extract_exit_code, parse_build_output, parse_diagnostic_line};
pub use result::{BuildParseResult, Diagnostic, Severity, TestOutcome, TestParseResult};
pub use test_run::{SummaryCounts, find_summary, parse_test_output};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::build::parse_build_output;
    pub use crate::result::{BuildParseResult, Diagnostic, TestOutcome, TestParseResult};
    pub use crate::test_run::parse_test_output;
}
