//! Error categories shared across showproc crates.
//!
//! Each skipped process maps to a category and a stable numeric code so
//! machine consumers (JSON output, JSONL logs) can group failures without
//! parsing messages:
//! - 20-29: Collection errors (per-process records)
//! - 30-39: Identity errors (uid to account name)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Per-process record collection errors.
    Collection,
    /// Account lookup errors.
    Identity,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Identity => write!(f, "identity"),
        }
    }
}

/// Why a process was left out of a snapshot.
///
/// Skips never abort the snapshot; they are counted and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A record could not be opened, usually because the process exited.
    #[error("record unavailable")]
    RecordUnavailable,
    /// A record was present but did not parse.
    #[error("record malformed")]
    RecordMalformed,
    /// The effective uid has no account.
    #[error("identity lookup failed")]
    IdentityLookupFailure,
}

impl SkipReason {
    /// Stable code for this skip reason.
    pub fn code(self) -> u32 {
        match self {
            SkipReason::RecordUnavailable => 21,
            SkipReason::RecordMalformed => 22,
            SkipReason::IdentityLookupFailure => 30,
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            SkipReason::RecordUnavailable | SkipReason::RecordMalformed => {
                ErrorCategory::Collection
            }
            SkipReason::IdentityLookupFailure => ErrorCategory::Identity,
        }
    }

    /// Whether this skip is the routine enumerate/exit race rather than a
    /// defect worth surfacing.
    pub fn is_expected_race(self) -> bool {
        matches!(self, SkipReason::RecordUnavailable)
    }
}
