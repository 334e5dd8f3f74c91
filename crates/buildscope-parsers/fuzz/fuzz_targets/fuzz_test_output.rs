// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for `dotnet test` output parsing
//!
//! This fuzzes `parse_test_output`, including the open failure record that
//! spans several lines.

#![no_main]

use libfuzzer_sys::fuzz_target;

use buildscope_parsers::parse_test_output;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let result = parse_test_output(&input);

    assert_eq!(
        result.total,
        result
            .passed
            .saturating_add(result.failed)
            .saturating_add(result.skipped)
    );
});
