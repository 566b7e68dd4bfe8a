//! Per-process fact extraction from a procfs root.
//!
//! Each call to [`ProcessExtractor::extract`] is an independent fallible
//! operation: a process that exits between enumeration and extraction yields
//! [`ExtractError::RecordUnavailable`] for that pid only.

use super::identity::{owner_label, UserResolver};
use super::proc_parsers::{
    bracketed_name, parse_cmdline, parse_comm, parse_effective_uid, parse_stat_content,
};
use super::types::ProcessRecord;
use sp_common::{ErrorCategory, ProcessId, SkipReason};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Default procfs mount point.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Default cap on bytes read from `/proc/[pid]/cmdline`.
pub const DEFAULT_CMDLINE_MAX_BYTES: usize = 4096;

/// Errors that can occur while extracting one process.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PID {pid}: cannot read {record}: {source}")]
    RecordUnavailable {
        pid: ProcessId,
        record: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("PID {pid}: malformed {record}: {message}")]
    RecordMalformed {
        pid: ProcessId,
        record: &'static str,
        message: String,
    },

    #[error("PID {pid}: no account for effective uid {uid}")]
    IdentityLookupFailure { pid: ProcessId, uid: u32 },
}

impl ExtractError {
    pub fn pid(&self) -> ProcessId {
        match self {
            ExtractError::RecordUnavailable { pid, .. }
            | ExtractError::RecordMalformed { pid, .. }
            | ExtractError::IdentityLookupFailure { pid, .. } => *pid,
        }
    }

    pub fn skip_reason(&self) -> SkipReason {
        match self {
            ExtractError::RecordUnavailable { .. } => SkipReason::RecordUnavailable,
            ExtractError::RecordMalformed { .. } => SkipReason::RecordMalformed,
            ExtractError::IdentityLookupFailure { .. } => SkipReason::IdentityLookupFailure,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.skip_reason().category()
    }

    fn malformed(pid: ProcessId, record: &'static str, message: impl Into<String>) -> Self {
        ExtractError::RecordMalformed {
            pid,
            record,
            message: message.into(),
        }
    }
}

/// Reads raw per-process records below a procfs root.
#[derive(Debug, Clone)]
pub struct ProcReader {
    root: PathBuf,
    cmdline_max_bytes: usize,
}

impl Default for ProcReader {
    fn default() -> Self {
        ProcReader::new(DEFAULT_PROC_ROOT, DEFAULT_CMDLINE_MAX_BYTES)
    }
}

impl ProcReader {
    pub fn new(root: impl Into<PathBuf>, cmdline_max_bytes: usize) -> Self {
        ProcReader {
            root: root.into(),
            cmdline_max_bytes: cmdline_max_bytes.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, pid: ProcessId, record: &str) -> PathBuf {
        self.root.join(pid.to_string()).join(record)
    }

    /// Read a whole text record. Empty records are malformed.
    ///
    /// The kernel writes process names as raw bytes, so invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn read_text(&self, pid: ProcessId, record: &'static str) -> Result<String, ExtractError> {
        let path = self.record_path(pid, record);
        let bytes = fs::read(&path).map_err(|source| ExtractError::RecordUnavailable {
            pid,
            record,
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        if content.trim().is_empty() {
            return Err(ExtractError::malformed(pid, record, "record is empty"));
        }
        Ok(content)
    }

    /// Read at most `limit` bytes of a binary record. Empty is allowed.
    pub fn read_bounded(
        &self,
        pid: ProcessId,
        record: &'static str,
        limit: usize,
    ) -> Result<Vec<u8>, ExtractError> {
        let path = self.record_path(pid, record);
        let unavailable = |source| ExtractError::RecordUnavailable {
            pid,
            record,
            source,
        };
        let file = File::open(&path).map_err(unavailable)?;
        let mut buf = Vec::with_capacity(limit.min(DEFAULT_CMDLINE_MAX_BYTES));
        file.take(limit as u64)
            .read_to_end(&mut buf)
            .map_err(unavailable)?;
        Ok(buf)
    }

    /// Command line joined by spaces, or `[name]` when it is empty.
    pub fn read_command(&self, pid: ProcessId) -> Result<String, ExtractError> {
        let raw = self.read_bounded(pid, "cmdline", self.cmdline_max_bytes)?;
        if let Some(command) = parse_cmdline(&raw) {
            return Ok(command);
        }

        let comm = self.read_text(pid, "comm")?;
        let name = parse_comm(&comm)
            .ok_or_else(|| ExtractError::malformed(pid, "comm", "no executable name"))?;
        Ok(bracketed_name(&name))
    }
}

/// Builds [`ProcessRecord`]s from procfs and an account database.
#[derive(Debug)]
pub struct ProcessExtractor<U> {
    reader: ProcReader,
    users: U,
}

impl<U: UserResolver> ProcessExtractor<U> {
    pub fn new(reader: ProcReader, users: U) -> Self {
        ProcessExtractor { reader, users }
    }

    pub fn reader(&self) -> &ProcReader {
        &self.reader
    }

    /// Read and correlate stat, status and cmdline/comm for `pid`.
    ///
    /// # Errors
    /// * `RecordUnavailable` if a record cannot be opened (process exited,
    ///   permission denied)
    /// * `RecordMalformed` if a record is empty or does not parse
    /// * `IdentityLookupFailure` if the effective uid has no account
    pub fn extract(&self, pid: ProcessId) -> Result<ProcessRecord, ExtractError> {
        let stat_content = self.reader.read_text(pid, "stat")?;
        let stat = parse_stat_content(&stat_content)
            .map_err(|e| ExtractError::malformed(pid, "stat", e.to_string()))?;

        let status = self.reader.read_text(pid, "status")?;
        let owner_uid = parse_effective_uid(&status)
            .ok_or_else(|| ExtractError::malformed(pid, "status", "no effective uid"))?;

        let command = self.reader.read_command(pid)?;

        let owner = self
            .users
            .user_name(owner_uid)
            .ok_or(ExtractError::IdentityLookupFailure {
                pid,
                uid: owner_uid,
            })?;

        trace!(
            pid = pid.0,
            ppid = stat.ppid,
            uid = owner_uid,
            tty = %stat.tty_nr,
            "Extracted process facts"
        );

        Ok(ProcessRecord {
            pid,
            ppid: ProcessId(stat.ppid),
            owner_uid,
            owner_name: owner_label(&owner),
            cpu_ticks: stat.cpu_ticks(),
            name: stat.name,
            command,
            state: stat.state,
            tty_device_number: stat.tty_nr,
            start_ticks: stat.starttime,
        })
    }
}
