//! Process enumeration from the procfs root directory.

use sp_common::ProcessId;
use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// The process root could not be listed. Without it there is no snapshot.
#[derive(Debug, Error)]
#[error("cannot list process root {root}: {source}")]
pub struct EnumerationError {
    pub root: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Whether a directory entry name is a process id: non-empty, ASCII digits only.
pub fn is_pid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Lazy, one-shot iterator over the pids in a procfs root.
///
/// Yields pids in directory listing order; no sorting is applied.
#[derive(Debug)]
pub struct ProcessIds {
    entries: ReadDir,
}

impl Iterator for ProcessIds {
    type Item = ProcessId;

    fn next(&mut self) -> Option<ProcessId> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    trace!(error = %e, "Skipping unreadable /proc entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_pid_name(name) {
                continue;
            }
            // Digit strings beyond u32 are not pids
            if let Ok(pid) = name.parse::<ProcessId>() {
                return Some(pid);
            }
        }
        None
    }
}

/// List the process ids under `root`.
pub fn enumerate_pids(root: &Path) -> Result<ProcessIds, EnumerationError> {
    let entries = fs::read_dir(root).map_err(|source| EnumerationError {
        root: root.to_path_buf(),
        source,
    })?;
    Ok(ProcessIds { entries })
}
