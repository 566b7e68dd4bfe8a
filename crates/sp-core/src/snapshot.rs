//! Snapshot pipeline: enumerate, extract, resolve, compute, collect rows.
//!
//! Every pid is an independent fallible unit. Records that fail extraction
//! are skipped and reported; only an unreadable process root or clock fails
//! the whole snapshot.

use crate::clock::{ClockError, SystemClock};
use crate::collect::{
    enumerate_pids, CachedUserResolver, EnumerationError, ExtractError, PasswdResolver,
    ProcReader, ProcessExtractor, UserResolver,
};
use crate::config::SnapshotConfig;
use crate::logging::{event_names, LogContext, Stage};
use crate::metrics::ProcessMetrics;
use crate::report::ProcessRow;
use crate::tty::{DeviceSource, FsDeviceSource, TerminalResolver};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use sp_common::{ErrorCategory, ProcessId, SkipReason};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::thread;
use thiserror::Error;

/// Errors that abort a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error("cannot read system clock: {0}")]
    Clock(#[from] ClockError),

    #[error("extraction worker panicked")]
    WorkerPanicked,
}

/// Per-run selection and parallelism.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Restrict to these pids; empty means every process.
    pub pids: Vec<ProcessId>,
    /// Extraction worker threads; 1 is fully sequential.
    pub jobs: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        SnapshotOptions {
            pids: Vec::new(),
            jobs: 1,
        }
    }
}

/// A process left out of the snapshot, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProcess {
    pub pid: ProcessId,
    pub reason: SkipReason,
    pub category: ErrorCategory,
    /// Stable numeric code for `reason`.
    pub code: u32,
    pub message: String,
}

impl From<&ExtractError> for SkippedProcess {
    fn from(err: &ExtractError) -> Self {
        let reason = err.skip_reason();
        SkippedProcess {
            pid: err.pid(),
            reason,
            category: reason.category(),
            code: reason.code(),
            message: err.to_string(),
        }
    }
}

/// Provenance of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMetadata {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub proc_root: PathBuf,
    pub boot_time: i64,
    pub ticks_per_second: u64,
}

/// Result of one pass over the process root.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub metadata: SnapshotMetadata,
    /// One row per successfully extracted process, in enumeration order.
    pub rows: Vec<ProcessRow>,
    pub skipped: Vec<SkippedProcess>,
    /// Requested pids that were not in the process root.
    pub missing: Vec<ProcessId>,
}

impl Snapshot {
    /// Whether anything beyond the routine exit race was left out.
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
            || self
                .skipped
                .iter()
                .any(|s| !s.reason.is_expected_race())
    }
}

/// The live engine: passwd accounts, `/dev` terminals, local time.
pub type LiveSnapshotEngine =
    SnapshotEngine<CachedUserResolver<PasswdResolver>, FsDeviceSource, Local>;

/// Turns a process root into [`Snapshot`]s.
pub struct SnapshotEngine<U, S, Tz> {
    extractor: ProcessExtractor<U>,
    terminals: TerminalResolver<S>,
    clock: SystemClock,
    tz: Tz,
}

impl LiveSnapshotEngine {
    /// Build the engine for `config`, reading the clock once.
    pub fn from_config(config: &SnapshotConfig) -> Result<Self, SnapshotError> {
        let clock = SystemClock::read_for_root(&config.proc_root)?;
        let reader = ProcReader::new(&config.proc_root, config.cmdline_max_bytes);
        Ok(SnapshotEngine::new(
            ProcessExtractor::new(reader, CachedUserResolver::new(PasswdResolver)),
            TerminalResolver::new(&config.dev_root),
            clock,
            Local,
        ))
    }
}

impl<U, S, Tz> SnapshotEngine<U, S, Tz>
where
    U: UserResolver,
    S: DeviceSource,
    Tz: TimeZone + Sync,
    Tz::Offset: Display,
{
    pub fn new(
        extractor: ProcessExtractor<U>,
        terminals: TerminalResolver<S>,
        clock: SystemClock,
        tz: Tz,
    ) -> Self {
        SnapshotEngine {
            extractor,
            terminals,
            clock,
            tz,
        }
    }

    pub fn clock(&self) -> &SystemClock {
        &self.clock
    }

    /// Extract one process and derive its display row.
    pub fn build_row(&self, pid: ProcessId) -> Result<ProcessRow, ExtractError> {
        let record = self.extractor.extract(pid)?;
        let tty = self.terminals.resolve(record.tty_device_number);
        let metrics =
            ProcessMetrics::compute(&self.clock, record.start_ticks, record.cpu_ticks, &self.tz);
        Ok(ProcessRow::new(record, tty, metrics))
    }

    /// Take one snapshot.
    ///
    /// # Errors
    /// * `Enumeration` if the process root cannot be listed
    /// * `WorkerPanicked` if a parallel extraction worker panicked
    pub fn take(&self, options: &SnapshotOptions, ctx: &LogContext) -> Result<Snapshot, SnapshotError> {
        let root = self.extractor.reader().root();
        let jobs = options.jobs.max(1);
        crate::log_event!(
            ctx,
            DEBUG,
            event_names::SCAN_STARTED,
            Stage::Scan,
            "Starting process scan",
            proc_root = tracing::field::display(root.display()),
            jobs = jobs as u64
        );

        let wanted: HashSet<ProcessId> = options.pids.iter().copied().collect();
        let pids = enumerate_pids(root)?.filter(|pid| wanted.is_empty() || wanted.contains(pid));

        let results = if jobs == 1 {
            pids.map(|pid| (pid, self.build_row(pid))).collect()
        } else {
            let pids: Vec<ProcessId> = pids.collect();
            self.build_rows_parallel(&pids, jobs)?
        };

        let mut seen = HashSet::with_capacity(results.len());
        let mut rows = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (pid, result) in results {
            seen.insert(pid);
            match result {
                Ok(row) => rows.push(row),
                Err(err) => {
                    self.log_skip(ctx, &err);
                    skipped.push(SkippedProcess::from(&err));
                }
            }
        }

        let mut missing = Vec::new();
        for pid in &options.pids {
            if !seen.contains(pid) && !missing.contains(pid) {
                missing.push(*pid);
            }
        }

        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                run_id: ctx.run_id.clone(),
                generated_at: DateTime::from_timestamp(self.clock.now(), 0)
                    .unwrap_or_else(Utc::now),
                proc_root: root.to_path_buf(),
                boot_time: self.clock.boot_time(),
                ticks_per_second: self.clock.ticks_per_second(),
            },
            rows,
            skipped,
            missing,
        };

        crate::log_event!(
            ctx,
            DEBUG,
            event_names::SCAN_FINISHED,
            Stage::Scan,
            "Process scan finished",
            rows = snapshot.rows.len() as u64,
            skipped = snapshot.skipped.len() as u64,
            missing = snapshot.missing.len() as u64
        );
        Ok(snapshot)
    }

    /// Split `pids` into at most `jobs` contiguous chunks, one scoped thread
    /// each, and concatenate the results in the original order.
    fn build_rows_parallel(
        &self,
        pids: &[ProcessId],
        jobs: usize,
    ) -> Result<Vec<(ProcessId, Result<ProcessRow, ExtractError>)>, SnapshotError> {
        if pids.is_empty() {
            return Ok(Vec::new());
        }
        let chunk_size = pids.len().div_ceil(jobs);

        thread::scope(|s| {
            let handles: Vec<_> = pids
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|&pid| (pid, self.build_row(pid)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut results = Vec::with_capacity(pids.len());
            for handle in handles {
                let chunk = handle.join().map_err(|_| {
                    tracing::error!(target: event_names::INTERNAL_ERROR, "extraction worker panicked");
                    SnapshotError::WorkerPanicked
                })?;
                results.extend(chunk);
            }
            Ok(results)
        })
    }

    fn log_skip(&self, ctx: &LogContext, err: &ExtractError) {
        let reason = err.skip_reason();
        if reason.is_expected_race() {
            crate::log_event!(
                ctx,
                DEBUG,
                event_names::SCAN_RECORD_SKIPPED,
                Stage::Scan,
                "Process vanished during scan",
                pid = err.pid().0,
                reason = tracing::field::display(reason),
                error = tracing::field::display(err)
            );
        } else {
            crate::log_event!(
                ctx,
                WARN,
                event_names::SCAN_RECORD_SKIPPED,
                Stage::Scan,
                "Skipping process",
                pid = err.pid().0,
                reason = tracing::field::display(reason),
                category = tracing::field::display(reason.category()),
                error = tracing::field::display(err)
            );
        }
    }
}
