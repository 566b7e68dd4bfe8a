//! Fuzz target for /proc/[pid]/cmdline and status parsing.
//!
//! cmdline is arbitrary bytes (argv may be rewritten by the process), so the
//! parser must cope with any input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp_core::collect::proc_parsers::{parse_cmdline, parse_effective_uid};

fuzz_target!(|data: &[u8]| {
    if let Some(command) = parse_cmdline(data) {
        assert!(!command.is_empty());
        assert!(!command.contains('\0'));
    }
    let _ = parse_effective_uid(&String::from_utf8_lossy(data));
});
