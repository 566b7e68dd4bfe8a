//! Fuzz target for /proc/[pid]/stat parsing.
//!
//! Tests that `parse_stat_content` handles arbitrary input without panicking,
//! and that an accepted record keeps its name delimiters consistent.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp_core::collect::proc_parsers::parse_stat_content;

fuzz_target!(|data: &str| {
    if let Ok(record) = parse_stat_content(data) {
        // The name sits inside the outermost parentheses
        assert!(data.contains(&format!("({})", record.name)));
    }
});
