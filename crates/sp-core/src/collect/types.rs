//! Records produced by process collection.

use serde::{Deserialize, Serialize};
use sp_common::{DeviceNumber, ProcessId};

/// Facts about one process, valid only for the instant they were read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    // === Core identity ===
    /// Process ID.
    pub pid: ProcessId,

    /// Parent process ID. May name a process that already exited.
    pub ppid: ProcessId,

    /// Effective user ID.
    pub owner_uid: u32,

    /// Account name of the effective user, as displayed (see
    /// [`super::identity::owner_label`]).
    pub owner_name: String,

    // === Command info ===
    /// Name from the statistics record.
    pub name: String,

    /// Full command line, or `[name]` when the command line is empty.
    pub command: String,

    /// State character (R, S, D, Z, ...).
    pub state: char,

    // === Terminal ===
    /// Controlling terminal, [`DeviceNumber::NONE`] when there is none.
    pub tty_device_number: DeviceNumber,

    // === Timing ===
    /// Start time in clock ticks since boot.
    pub start_ticks: u64,

    /// Own user + kernel ticks.
    pub cpu_ticks: u64,
}

