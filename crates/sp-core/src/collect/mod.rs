//! Process collection from the /proc filesystem.
//!
//! This module provides the evidence layer of a snapshot:
//! - Pid enumeration over the procfs root
//! - Pure parsers for stat/status/cmdline/comm records
//! - Per-process fact extraction with per-record error isolation
//! - Effective uid to account name resolution

mod enumerate;
mod extract;
mod identity;
pub mod proc_parsers;
mod types;

pub use enumerate::{enumerate_pids, is_pid_name, EnumerationError, ProcessIds};
pub use extract::{
    ExtractError, ProcReader, ProcessExtractor, DEFAULT_CMDLINE_MAX_BYTES, DEFAULT_PROC_ROOT,
};
pub use identity::{
    owner_label, CachedUserResolver, PasswdResolver, StaticUserResolver, UserResolver,
    OWNER_NAME_WIDTH,
};
pub use proc_parsers::{parse_stat_content, StatParseError, StatRecord};
pub use types::ProcessRecord;
