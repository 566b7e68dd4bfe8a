//! showproc common types.
//!
//! Foundational types shared by the snapshot engine and its CLI:
//! - Process and device identifiers
//! - Error categories with stable codes
//! - Output format selection

pub mod error;
pub mod id;
pub mod output;

pub use error::{ErrorCategory, SkipReason};
pub use id::{DeviceNumber, ProcessId};
pub use output::OutputFormat;
