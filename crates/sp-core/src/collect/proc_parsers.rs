//! Parsers for /proc filesystem records.
//!
//! Pure functions over record contents; reading the files is the job of
//! [`super::extract`]. Keeping the parsers free of I/O lets the tests and the
//! fuzz target feed them synthetic input.
//!
//! # Records Parsed
//! - `/proc/[pid]/stat` - pid, name, state, ppid, tty, CPU ticks, start ticks
//! - `/proc/[pid]/status` - effective uid
//! - `/proc/[pid]/cmdline` - NUL separated argument vector
//! - `/proc/[pid]/comm` - executable name

use sp_common::DeviceNumber;
use thiserror::Error;

/// Positions of the fields read from `/proc/[pid]/stat`.
///
/// Indices count whitespace-separated fields after the closing parenthesis
/// of the name, starting at 0. In proc(5) numbering (pid = 1, comm = 2) the
/// field at index `i` is field `i + 3`.
pub mod stat_fields {
    /// (3) state
    pub const STATE: usize = 0;
    /// (4) ppid
    pub const PPID: usize = 1;
    /// (7) tty_nr
    pub const TTY_NR: usize = 4;
    /// (14) utime
    pub const UTIME: usize = 11;
    /// (15) stime
    pub const STIME: usize = 12;
    /// (22) starttime
    pub const STARTTIME: usize = 19;

    /// Fewest fields after the name that still carry everything we read.
    pub const MIN_FIELDS: usize = STARTTIME + 1;
}

/// Errors from parsing a `/proc/[pid]/stat` line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatParseError {
    #[error("record is empty")]
    Empty,

    #[error("missing '(' before process name")]
    MissingNameStart,

    #[error("missing ')' after process name")]
    MissingNameEnd,

    #[error("invalid pid field {0:?}")]
    InvalidPid(String),

    #[error("insufficient stat fields: expected at least {expected}, got {actual}")]
    InsufficientFields { expected: usize, actual: usize },

    #[error("invalid {field} field {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Facts parsed from `/proc/[pid]/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    pub pid: u32,
    /// Name between the first `(` and the last `)`.
    pub name: String,
    pub state: char,
    pub ppid: u32,
    pub tty_nr: DeviceNumber,
    /// User-mode ticks.
    pub utime: u64,
    /// Kernel-mode ticks.
    pub stime: u64,
    /// Start time in clock ticks since boot.
    pub starttime: u64,
}

impl StatRecord {
    /// Own CPU ticks (user + kernel), excluding waited-for children.
    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Parse `/proc/[pid]/stat` content.
///
/// Format: pid (comm) state ppid pgrp session tty_nr tpgid flags
///         minflt cminflt majflt cmajflt utime stime cutime cstime
///         priority nice num_threads itrealvalue starttime ...
///
/// The name may contain spaces and parentheses, so it ends at the last `)`
/// in the line; no field after it can contain one.
pub fn parse_stat_content(content: &str) -> Result<StatRecord, StatParseError> {
    let content = content.trim_end_matches(['\n', '\0']);
    if content.trim().is_empty() {
        return Err(StatParseError::Empty);
    }

    let name_start = content.find('(').ok_or(StatParseError::MissingNameStart)?;
    let name_end = content
        .rfind(')')
        .filter(|&end| end > name_start)
        .ok_or(StatParseError::MissingNameEnd)?;

    let pid_str = content[..name_start].trim();
    let pid = pid_str
        .parse::<u32>()
        .map_err(|_| StatParseError::InvalidPid(pid_str.to_string()))?;

    let name = content[name_start + 1..name_end].to_string();

    let fields: Vec<&str> = content[name_end + 1..].split_whitespace().collect();
    if fields.len() < stat_fields::MIN_FIELDS {
        return Err(StatParseError::InsufficientFields {
            expected: stat_fields::MIN_FIELDS,
            actual: fields.len(),
        });
    }

    let state = fields[stat_fields::STATE]
        .chars()
        .next()
        .ok_or(StatParseError::InvalidField {
            field: "state",
            value: String::new(),
        })?;

    Ok(StatRecord {
        pid,
        name,
        state,
        ppid: parse_field(&fields, stat_fields::PPID, "ppid")?,
        tty_nr: DeviceNumber(parse_tty_nr(fields[stat_fields::TTY_NR])?),
        utime: parse_field(&fields, stat_fields::UTIME, "utime")?,
        stime: parse_field(&fields, stat_fields::STIME, "stime")?,
        starttime: parse_field(&fields, stat_fields::STARTTIME, "starttime")?,
    })
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    field: &'static str,
) -> Result<T, StatParseError> {
    let value = fields[index];
    value.parse::<T>().map_err(|_| StatParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

// The kernel prints tty_nr as a signed int.
fn parse_tty_nr(value: &str) -> Result<u64, StatParseError> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .map(u64::from)
        .ok_or_else(|| StatParseError::InvalidField {
            field: "tty_nr",
            value: value.to_string(),
        })
}

/// Parse the effective uid from `/proc/[pid]/status`.
///
/// Line format: `Uid:\t<real>\t<effective>\t<saved>\t<fs>`.
pub fn parse_effective_uid(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().nth(1))
        .and_then(|euid| euid.parse::<u32>().ok())
}

/// Render `/proc/[pid]/cmdline` bytes as a command string.
///
/// Trailing NUL terminators are dropped and every remaining NUL becomes a
/// single space. Returns `None` when nothing is left (kernel threads,
/// zombies).
pub fn parse_cmdline(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().rposition(|&b| b != 0)? + 1;
    let joined: Vec<u8> = bytes[..end]
        .iter()
        .map(|&b| if b == 0 { b' ' } else { b })
        .collect();
    Some(String::from_utf8_lossy(&joined).into_owned())
}

/// First token of `/proc/[pid]/comm`.
pub fn parse_comm(content: &str) -> Option<String> {
    content.split_whitespace().next().map(str::to_string)
}

/// Bracketed name shown when a process has no command line.
pub fn bracketed_name(name: &str) -> String {
    format!("[{}]", name)
}
