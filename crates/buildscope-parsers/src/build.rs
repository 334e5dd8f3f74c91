//! `dotnet build` output parsing
//!
//! MSBuild reports compiler diagnostics one per line in the form
//!
//! ```text
//! <file>(<line>[,<column>]): error|warning [<code>]: <message>
//! ```
//!
//! Any other line is progress noise and is skipped. The invoking process may
//! append a standalone `Exit code: <N>` line after the tool's own output; it
//! is picked up by a separate whole-text pass.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::result::{BuildParseResult, Diagnostic, Severity};

static DIAGNOSTIC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\(([0-9]+)(?:,([0-9]+))?\):\s*((?i:error|warning))\s*(\S*?):\s*(.*)$")
        .expect("diagnostic line pattern is valid")
});

static EXIT_CODE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*Exit code:[ \t]*([0-9]+)[ \t\r]*$")
        .expect("exit code pattern is valid")
});

/// Parse the combined stdout/stderr of `dotnet build`
///
/// Errors and warnings keep the order in which they were printed. The exit
/// code defaults to `0` when no `Exit code:` line is present.
#[must_use]
pub fn parse_build_output(output: &str) -> BuildParseResult {
    let mut result = BuildParseResult::empty();
    if output.is_empty() {
        return result;
    }

    for line in output.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_diagnostic_line(line) {
            Some((Severity::Error, diagnostic)) => result.errors.push(diagnostic),
            Some((Severity::Warning, diagnostic)) => result.warnings.push(diagnostic),
            None => {
                if line.contains("error") || line.contains("warning") {
                    tracing::trace!(line, "Skipping unrecognised diagnostic-like line");
                }
            }
        }
    }

    if let Some(code) = extract_exit_code(output) {
        result.exit_code = code;
    }

    tracing::debug!(
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        exit_code = result.exit_code,
        "Parsed build output"
    );

    result
}

/// Recognise a single MSBuild diagnostic line
///
/// The line is trimmed first. Returns `None` for anything that does not fit
/// the diagnostic grammar, including line or column numbers too large to be
/// real source positions.
#[must_use]
pub fn parse_diagnostic_line(line: &str) -> Option<(Severity, Diagnostic)> {
    let caps = DIAGNOSTIC_LINE.captures(line.trim())?;

    let severity = Severity::from_keyword(&caps[4])?;
    let line_number = caps[2].parse::<u32>().ok()?;
    let column = match caps.get(3) {
        Some(m) => Some(m.as_str().parse::<u32>().ok()?),
        None => None,
    };
    let code = Some(caps[5].trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let diagnostic = Diagnostic {
        file: clean_file(&caps[1]),
        line: line_number,
        column,
        code,
        message: caps[6].trim().to_string(),
    };

    Some((severity, diagnostic))
}

/// Find the `Exit code: <N>` marker appended by the invoking process
///
/// Only standalone lines with an unsigned decimal code count. When several
/// are present the last one that fits in `i32` wins, since the marker is
/// written after the tool's own output.
#[must_use]
pub fn extract_exit_code(output: &str) -> Option<i32> {
    EXIT_CODE_LINE
        .captures_iter(output)
        .filter_map(|caps| caps[1].parse::<i32>().ok())
        .last()
}

/// Trim whitespace and one layer of enclosing double quotes
fn clean_file(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}
