//! Process and device identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(ProcessId)
    }
}

/// Composite device number (`dev_t`) in the Linux encoding.
///
/// Layout, from glibc's `gnu_dev_major`/`gnu_dev_minor`:
/// - major: bits 8..20 and 32..44
/// - minor: bits 0..8 and 20..32 (and 44..64)
///
/// The 32-bit `tty_nr` reported in `/proc/<pid>/stat` uses the same low-bit
/// layout, so values from `stat(2)` and from procfs decode identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceNumber(pub u64);

impl DeviceNumber {
    /// No controlling terminal.
    pub const NONE: DeviceNumber = DeviceNumber(0);

    /// Compose a device number from its major and minor parts.
    pub fn from_parts(major: u32, minor: u32) -> Self {
        let major = u64::from(major);
        let minor = u64::from(minor);
        DeviceNumber(
            ((major & 0x0000_0fff) << 8)
                | ((major & 0xffff_f000) << 32)
                | (minor & 0x0000_00ff)
                | ((minor & 0xffff_ff00) << 12),
        )
    }

    pub fn major(self) -> u32 {
        (((self.0 >> 8) & 0x0000_0fff) | ((self.0 >> 32) & 0xffff_f000)) as u32
    }

    pub fn minor(self) -> u32 {
        ((self.0 & 0x0000_00ff) | ((self.0 >> 12) & 0xffff_ff00)) as u32
    }

    /// Major/minor pair, the unit device matching is done on.
    pub fn parts(self) -> (u32, u32) {
        (self.major(), self.minor())
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}
