//! Parse result types

use serde::{Deserialize, Serialize};

/// Severity of a compiler diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Compilation error
    Error,
    /// Compiler warning
    Warning,
}

impl Severity {
    /// Classify a severity keyword, ignoring ASCII case
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("error") {
            Some(Self::Error)
        } else if keyword.eq_ignore_ascii_case("warning") {
            Some(Self::Warning)
        } else {
            None
        }
    }

    /// The lowercase keyword as it appears in MSBuild output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A single compiler-reported error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file as printed by the compiler
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column, when the compiler reported one
    pub column: Option<u32>,
    /// Diagnostic code such as `CS0103`
    pub code: Option<String>,
    /// Diagnostic message text
    pub message: String,
}

impl Diagnostic {
    /// Location in MSBuild form: `file(line,column)` or `file(line)`
    #[must_use]
    pub fn location(&self) -> String {
        match self.column {
            Some(column) => format!("{}({},{})", self.file, self.line, column),
            None => format!("{}({})", self.file, self.line),
        }
    }
}

/// Result of parsing `dotnet build` output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParseResult {
    /// Exit code reported by the invoking process, `0` when absent
    pub exit_code: i32,
    /// Errors in source order
    pub errors: Vec<Diagnostic>,
    /// Warnings in source order
    pub warnings: Vec<Diagnostic>,
}

impl BuildParseResult {
    /// Create an empty result
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The build succeeded: zero exit code and no errors
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.errors.is_empty()
    }

    /// Total number of errors and warnings
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// Outcome of one failed test
///
/// Only failing tests are itemised; passing and skipped tests are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Fully qualified test name
    pub name: String,
    /// Always `false` for itemised outcomes
    #[serde(skip_serializing, default)]
    pub passed: bool,
    /// Failure message lines joined with single spaces
    pub message: Option<String>,
    /// Duration in milliseconds, when reported
    pub duration_ms: Option<u64>,
}

impl TestOutcome {
    /// Create a failed outcome
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        message: Option<String>,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message,
            duration_ms,
        }
    }
}

/// Result of parsing `dotnet test` output
///
/// `total` is always `passed + failed + skipped`. When the runner prints no
/// summary line the counts are tallied from result lines, which is
/// best-effort for low-verbosity logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestParseResult {
    /// Tests run
    pub total: usize,
    /// Tests passed
    pub passed: usize,
    /// Tests failed
    pub failed: usize,
    /// Tests skipped
    pub skipped: usize,
    /// Failed tests in source order
    pub failed_tests: Vec<TestOutcome>,
}

impl TestParseResult {
    /// Create an empty result
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// No test failed
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}
