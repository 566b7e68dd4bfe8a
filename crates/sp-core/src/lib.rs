//! showproc core library
//!
//! This library provides a `ps -ef` style process snapshot:
//! - Process collection from /proc (enumeration, per-process extraction)
//! - Terminal resolution against /dev
//! - Clock baseline and derived metrics
//! - Report rendering (table, JSON, JSON lines)
//! - Configuration, logging and exit codes for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod clock;
pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod snapshot;
pub mod tty;

#[cfg(test)]
pub(crate) mod test_utils;

pub use clock::SystemClock;
pub use snapshot::{
    LiveSnapshotEngine, Snapshot, SnapshotEngine, SnapshotError, SnapshotOptions,
};
