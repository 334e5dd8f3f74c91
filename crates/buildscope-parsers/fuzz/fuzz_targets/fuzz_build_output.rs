// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for `dotnet build` output parsing
//!
//! This fuzzes `parse_build_output`, which must accept any text.

#![no_main]

use libfuzzer_sys::fuzz_target;

use buildscope_parsers::parse_build_output;

fuzz_target!(|data: &[u8]| {
    // Process output is decoded lossily before parsing, so do the same here
    let input = String::from_utf8_lossy(data);
    let result = parse_build_output(&input);

    // Every diagnostic came from a distinct non-blank line
    assert!(result.diagnostic_count() <= input.lines().count());
    // The exit code marker is an unsigned digit run
    assert!(result.exit_code >= 0);
});
