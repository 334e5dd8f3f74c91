//! `dotnet test` console logger output parsing
//!
//! Parsing happens in two passes:
//! - a line pass that tallies `Passed`/`Failed`/`Skipped` result lines and
//!   collects the message lines that follow each failure
//! - a whole-text search for the runner's summary line, which overrides the
//!   line tallies when present
//!
//! # Example
//!
//! ```
//! use buildscope_parsers::test_run::parse_test_output;
//!
//! let output = "\
//!   Failed Calc.Tests.Divide [12 ms]
//!   Error Message: Assert.Equal() Failure
//!   Stack Trace: at Calc.Tests.Divide()
//! Failed!  - Failed:     1, Passed:     7, Skipped:     0, Total:     8";
//!
//! let result = parse_test_output(output);
//! assert_eq!((result.failed, result.passed, result.total), (1, 7, 8));
//! assert_eq!(result.failed_tests[0].duration_ms, Some(12));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::result::{TestOutcome, TestParseResult};

static RESULT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Passed|Failed|Skipped)\s+(.+?)(?:\s+\[([0-9]+)\s*ms\])?\s*$")
        .expect("result line pattern is valid")
});

static MESSAGE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Error Message|Message|Stack Trace):\s*(.*)$")
        .expect("message line pattern is valid")
});

static SUMMARY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:Failed|Passed)!\s*-\s*Failed:\s*([0-9]+),\s*Passed:\s*([0-9]+),\s*Skipped:\s*([0-9]+)",
    )
    .expect("summary line pattern is valid")
});

/// Counts reported by the runner's summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    /// Tests failed
    pub failed: usize,
    /// Tests passed
    pub passed: usize,
    /// Tests skipped
    pub skipped: usize,
}

/// Parse the console logger output of `dotnet test`
///
/// When a summary line such as
/// `Failed! - Failed: 2, Passed: 10, Skipped: 1` is present its counts are
/// authoritative. Otherwise counts come from the individual result lines;
/// if none were found but failure blocks were, `failed` is inferred from
/// the number of failure blocks. That fallback is best-effort: a failure
/// printed without a recognisable result line is not counted.
///
/// `total` saturates on absurd summary counts.
#[must_use]
pub fn parse_test_output(output: &str) -> TestParseResult {
    if output.is_empty() {
        return TestParseResult::empty();
    }

    let mut scanner = OutcomeScanner::default();
    for line in output.split('\n') {
        scanner.process_line(line);
    }
    let (tally, failed_tests) = scanner.finish();

    let summary = find_summary(output);
    let counts = reconcile(tally, summary, failed_tests.len());

    tracing::debug!(
        passed = counts.passed,
        failed = counts.failed,
        skipped = counts.skipped,
        failed_tests = failed_tests.len(),
        from_summary = summary.is_some(),
        "Parsed test output"
    );

    TestParseResult {
        total: counts
            .passed
            .saturating_add(counts.failed)
            .saturating_add(counts.skipped),
        passed: counts.passed,
        failed: counts.failed,
        skipped: counts.skipped,
        failed_tests,
    }
}

/// Search the whole output for the runner's summary line
///
/// Matching is case-insensitive. The first summary line whose counts fit in
/// `usize` is used; `None` when there is no such line.
#[must_use]
pub fn find_summary(output: &str) -> Option<SummaryCounts> {
    SUMMARY_LINE.captures_iter(output).find_map(|caps| {
        Some(SummaryCounts {
            failed: caps[1].parse().ok()?,
            passed: caps[2].parse().ok()?,
            skipped: caps[3].parse().ok()?,
        })
    })
}

/// Combine line tallies with the summary line
fn reconcile(
    tally: SummaryCounts,
    summary: Option<SummaryCounts>,
    failure_blocks: usize,
) -> SummaryCounts {
    match summary {
        Some(summary) => summary,
        None if tally == SummaryCounts::default() && failure_blocks > 0 => SummaryCounts {
            failed: failure_blocks,
            ..tally
        },
        None => tally,
    }
}

/// A failed test whose message lines are still being collected
#[derive(Debug)]
struct OpenFailure {
    name: String,
    duration_ms: Option<u64>,
    message_lines: Vec<String>,
}

/// Line pass state: tallies, collected failures and the open failure record
#[derive(Debug, Default)]
pub(crate) struct OutcomeScanner {
    tally: SummaryCounts,
    open: Option<OpenFailure>,
    failed_tests: Vec<TestOutcome>,
}

impl OutcomeScanner {
    /// Feed one raw output line
    pub(crate) fn process_line(&mut self, raw: &str) {
        let line = raw.trim();

        if let Some(caps) = RESULT_LINE.captures(line) {
            self.flush();

            let name = caps[2].trim();
            match &caps[1] {
                "Passed" => self.tally.passed += 1,
                "Skipped" => self.tally.skipped += 1,
                _ => {
                    self.tally.failed += 1;
                    let duration_ms = caps.get(3).and_then(|m| m.as_str().parse().ok());
                    self.open(name, duration_ms);
                }
            }
            return;
        }

        if self.open.is_some() {
            if let Some(caps) = MESSAGE_LINE.captures(line) {
                self.accumulate(caps[1].trim());
            }
        }
    }

    /// Start collecting a new failed test
    pub(crate) fn open(&mut self, name: &str, duration_ms: Option<u64>) {
        self.flush();
        self.open = Some(OpenFailure {
            name: name.to_string(),
            duration_ms,
            message_lines: Vec::new(),
        });
    }

    /// Append a message line to the open failure, if any
    ///
    /// Returns `false` when no failure is open.
    pub(crate) fn accumulate(&mut self, text: &str) -> bool {
        match self.open.as_mut() {
            Some(open) => {
                open.message_lines.push(text.to_string());
                true
            }
            None => false,
        }
    }

    /// Close the open failure and record it
    pub(crate) fn flush(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };

        let joined = open.message_lines.join(" ");
        let joined = joined.trim();
        let message = (!joined.is_empty()).then(|| joined.to_string());

        self.failed_tests
            .push(TestOutcome::failed(open.name, message, open.duration_ms));
    }

    /// Flush any open failure and return the tallies and failures
    pub(crate) fn finish(mut self) -> (SummaryCounts, Vec<TestOutcome>) {
        self.flush();
        (self.tally, self.failed_tests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn counts(failed: usize, passed: usize, skipped: usize) -> SummaryCounts {
        SummaryCounts {
            failed,
            passed,
            skipped,
        }
    }

    #[test]
    fn test_parse_empty_output() {
        let result = parse_test_output("");
        assert_eq!(result, TestParseResult::empty());
        assert!(result.success());
    }

    #[test]
    fn test_failed_test_with_message_lines() {
        let output = "\
  Failed MyTest.Case [123 ms]
  Message: expected 1
  Message: but was 2
  Passed MyTest.Other [3 ms]";

        let result = parse_test_output(output);
        assert_eq!(
            result.failed_tests,
            vec![TestOutcome::failed(
                "MyTest.Case",
                Some("expected 1 but was 2".to_string()),
                Some(123)
            )]
        );
        assert_eq!((result.passed, result.failed, result.skipped), (1, 1, 0));
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_all_message_labels_collected() {
        let output = "\
Failed Ns.T.Boom [1 ms]
Error Message: Assert.True() Failure
Stack Trace: at Ns.T.Boom() in T.cs:line 10
Message: extra";
        let result = parse_test_output(output);
        assert_eq!(
            result.failed_tests[0].message.as_deref(),
            Some("Assert.True() Failure at Ns.T.Boom() in T.cs:line 10 extra")
        );
    }

    #[test]
    fn test_message_lines_ignored_without_open_failure() {
        let output = "\
Message: stray
Passed Ns.T.Ok [2 ms]
Error Message: also stray";
        let result = parse_test_output(output);
        assert!(result.failed_tests.is_empty());
        assert_eq!(result.passed, 1);
    }

    #[test]
    fn test_message_labels_are_case_sensitive() {
        let output = "Failed Ns.T.Boom\nmessage: lower case label\nERROR MESSAGE: upper";
        let result = parse_test_output(output);
        assert_eq!(result.failed_tests[0].message, None);
    }

    #[test]
    fn test_failure_without_duration_or_message() {
        let result = parse_test_output("Failed Ns.T.Quiet");
        assert_eq!(
            result.failed_tests,
            vec![TestOutcome::failed("Ns.T.Quiet", None, None)]
        );
        assert!(!result.success());
    }

    #[test]
    fn test_blank_message_becomes_none() {
        let result = parse_test_output("Failed Ns.T.Blank [5 ms]\nMessage:   \nMessage:");
        assert_eq!(result.failed_tests[0].message, None);
        assert_eq!(result.failed_tests[0].duration_ms, Some(5));
    }

    #[test]
    fn test_consecutive_failures_close_each_other() {
        let output = "\
Failed A [1 ms]
Message: a
Failed B [2 ms]
Message: b
Skipped C";
        let result = parse_test_output(output);
        let names: Vec<_> = result.failed_tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(result.failed_tests[1].message.as_deref(), Some("b"));
        assert_eq!((result.failed, result.skipped), (2, 1));
    }

    #[test]
    fn test_result_keywords_are_case_sensitive() {
        let result = parse_test_output("passed Ns.T.A\nFAILED Ns.T.B");
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_summary_overrides_line_counts() {
        let output = "\
Passed A [1 ms]
Failed B [2 ms]
Failed! - Failed: 2, Passed: 10, Skipped: 1";
        let result = parse_test_output(output);
        assert_eq!((result.failed, result.passed, result.skipped), (2, 10, 1));
        assert_eq!(result.total, 13);
        assert_eq!(result.failed_tests.len(), 1);
    }

    #[test]
    fn test_summary_before_result_lines_still_authoritative() {
        let output = "Passed!  - Failed:     0, Passed:     4, Skipped:     0\nPassed A\nPassed B";
        let result = parse_test_output(output);
        assert_eq!((result.failed, result.passed, result.skipped), (0, 4, 0));
    }

    #[test]
    fn test_find_summary_case_insensitive() {
        assert_eq!(
            find_summary("PASSED! - FAILED: 0, PASSED: 3, SKIPPED: 2"),
            Some(counts(0, 3, 2))
        );
        assert_eq!(find_summary("Total tests: 3"), None);
    }

    #[test]
    fn test_find_summary_rejects_overflow() {
        assert_eq!(
            find_summary("Failed! - Failed: 99999999999999999999999, Passed: 1, Skipped: 0"),
            None
        );
    }

    #[test]
    fn test_reconcile_prefers_summary() {
        let tally = counts(1, 1, 1);
        assert_eq!(reconcile(tally, Some(counts(5, 6, 7)), 1), counts(5, 6, 7));
        assert_eq!(reconcile(tally, None, 1), tally);
    }

    #[test]
    fn test_reconcile_infers_failed_from_blocks() {
        assert_eq!(reconcile(SummaryCounts::default(), None, 3), counts(3, 0, 0));
        assert_eq!(
            reconcile(SummaryCounts::default(), None, 0),
            SummaryCounts::default()
        );
    }

    #[test]
    fn test_scanner_transitions() {
        let mut scanner = OutcomeScanner::default();

        assert!(!scanner.accumulate("ignored"));

        scanner.open("First", Some(7));
        assert!(scanner.accumulate("one"));
        assert!(scanner.accumulate("two"));

        scanner.open("Second", None);
        scanner.flush();
        scanner.flush();

        let (tally, failed) = scanner.finish();
        assert_eq!(tally, SummaryCounts::default());
        assert_eq!(
            failed,
            vec![
                TestOutcome::failed("First", Some("one two".to_string()), Some(7)),
                TestOutcome::failed("Second", None, None),
            ]
        );
    }

    #[test]
    fn test_scanner_finish_flushes_open_failure() {
        let mut scanner = OutcomeScanner::default();
        scanner.process_line("  Failed Ns.T.Last [40 ms]\r");
        scanner.process_line("  Error Message: boom\r");

        let (tally, failed) = scanner.finish();
        assert_eq!(tally, counts(1, 0, 0));
        assert_eq!(failed[0].message.as_deref(), Some("boom"));
        assert_eq!(failed[0].duration_ms, Some(40));
    }

    #[test]
    fn test_name_with_spaces_and_parameters() {
        let result = parse_test_output("Failed Ns.T.Theory(a: 1, b: \"x y\") [8 ms]");
        assert_eq!(result.failed_tests[0].name, "Ns.T.Theory(a: 1, b: \"x y\")");
        assert_eq!(result.failed_tests[0].duration_ms, Some(8));
    }

    #[test]
    fn test_duration_with_space_before_ms() {
        let result = parse_test_output("Failed Ns.T.Slow [1500ms]");
        assert_eq!(result.failed_tests[0].duration_ms, Some(1500));
        assert_eq!(result.failed_tests[0].name, "Ns.T.Slow");
    }

    #[test]
    fn test_summary_digits_are_ascii() {
        let output = "Passed! - Failed: \u{663}, Passed: 1, Skipped: 0\n\
                      Failed! - Failed: 2, Passed: 10, Skipped: 1";
        assert_eq!(find_summary(output), Some(counts(2, 10, 1)));

        let result = parse_test_output(output);
        assert_eq!(
            (result.failed, result.passed, result.skipped, result.total),
            (2, 10, 1, 13)
        );
    }

    #[test]
    fn test_overflowing_summary_does_not_mask_later_one() {
        let output = "Failed! - Failed: 99999999999999999999999, Passed: 1, Skipped: 0\n\
                      Passed! - Failed: 0, Passed: 4, Skipped: 0";
        assert_eq!(find_summary(output), Some(counts(0, 4, 0)));
    }

    #[test]
    fn test_non_ascii_duration_ignored() {
        let result = parse_test_output("Failed Ns.T.Odd [\u{663} ms]");
        assert_eq!(result.failed_tests[0].duration_ms, None);
    }
}
