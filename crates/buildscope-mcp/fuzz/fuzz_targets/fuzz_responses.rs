#![no_main]

use buildscope_mcp::handlers::{TRUNCATION_MARKER, build_response, test_response};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, rest)) = data.split_first() else {
        return;
    };
    let output = String::from_utf8_lossy(rest);
    let max_raw_chars = usize::from(limit) + 1;

    let build = build_response(&output, max_raw_chars);
    let kept = build
        .raw_output
        .strip_suffix(TRUNCATION_MARKER)
        .unwrap_or(&build.raw_output);
    assert!(kept.chars().count() <= max_raw_chars);
    assert!(serde_json::to_string(&build).is_ok());

    let tests = test_response(&output);
    assert_eq!(tests.success, tests.failed == 0);
    assert!(serde_json::to_string(&tests).is_ok());
});
