//! System clock baseline for a snapshot.
//!
//! Boot time, the snapshot instant and the kernel tick rate are read once
//! and carried as an immutable [`SystemClock`] into every computation that
//! converts ticks to wall time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Tick rate assumed when `sysconf(_SC_CLK_TCK)` is unusable (USER_HZ).
pub const FALLBACK_TICKS_PER_SECOND: u64 = 100;

/// Errors that can occur while reading the system clock baseline.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("sysinfo(2) failed: {0}")]
    SysInfo(#[source] io::Error),

    #[error("cannot read uptime from {path}: {source}")]
    Uptime {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed uptime record {path}: {content:?}")]
    UptimeMalformed { path: PathBuf, content: String },

    #[error("ticks per second must be positive")]
    ZeroTickRate,
}

/// Process-wide clock context, constructed once per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock {
    boot_time: i64,
    now: i64,
    ticks_per_second: u64,
}

impl SystemClock {
    /// Build a clock from explicit values (Unix seconds).
    pub fn new(boot_time: i64, now: i64, ticks_per_second: u64) -> Result<Self, ClockError> {
        if ticks_per_second == 0 {
            return Err(ClockError::ZeroTickRate);
        }
        Ok(SystemClock {
            boot_time,
            now,
            ticks_per_second,
        })
    }

    /// Read the live clock: uptime from `sysinfo(2)`, tick rate from `sysconf`.
    pub fn read() -> Result<Self, ClockError> {
        let uptime = system_uptime_secs()?;
        let now = chrono::Utc::now().timestamp();
        let clock = SystemClock::new(now - uptime, now, clk_tck())?;
        debug!(
            boot_time = clock.boot_time,
            now = clock.now,
            ticks_per_second = clock.ticks_per_second,
            "Read system clock"
        );
        Ok(clock)
    }

    /// Read the clock for a procfs root.
    ///
    /// The real `/proc` uses `sysinfo(2)`; any other root (a captured or
    /// synthetic tree) supplies its own `uptime` record.
    pub fn read_for_root(proc_root: &Path) -> Result<Self, ClockError> {
        if proc_root == Path::new("/proc") {
            #[cfg(target_os = "linux")]
            return SystemClock::read();
        }
        let uptime = read_uptime_file(&proc_root.join("uptime"))?;
        let now = chrono::Utc::now().timestamp();
        SystemClock::new(now - uptime, now, clk_tck())
    }

    /// Absolute boot time (Unix seconds).
    pub fn boot_time(&self) -> i64 {
        self.boot_time
    }

    /// Snapshot instant (Unix seconds).
    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

/// System clock ticks per second.
/// On Linux, typically 100 (USER_HZ).
#[cfg(unix)]
pub fn clk_tck() -> u64 {
    let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if tck > 0 {
        tck as u64
    } else {
        warn!(
            fallback = FALLBACK_TICKS_PER_SECOND,
            "sysconf(_SC_CLK_TCK) unavailable, using fallback tick rate"
        );
        FALLBACK_TICKS_PER_SECOND
    }
}

#[cfg(not(unix))]
pub fn clk_tck() -> u64 {
    FALLBACK_TICKS_PER_SECOND
}

#[cfg(target_os = "linux")]
fn system_uptime_secs() -> Result<i64, ClockError> {
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::sysinfo(&mut info) };
    if ret == -1 {
        return Err(ClockError::SysInfo(io::Error::last_os_error()));
    }
    Ok(info.uptime as i64)
}

#[cfg(not(target_os = "linux"))]
fn system_uptime_secs() -> Result<i64, ClockError> {
    read_uptime_file(Path::new("/proc/uptime"))
}

/// Whole seconds since boot from an `uptime` record (`<up> <idle>`).
pub fn read_uptime_file(path: &Path) -> Result<i64, ClockError> {
    let content = fs::read_to_string(path).map_err(|source| ClockError::Uptime {
        path: path.to_path_buf(),
        source,
    })?;
    parse_uptime(&content).ok_or_else(|| ClockError::UptimeMalformed {
        path: path.to_path_buf(),
        content: content.trim().to_string(),
    })
}

fn parse_uptime(content: &str) -> Option<i64> {
    let up = content.split_whitespace().next()?.parse::<f64>().ok()?;
    (up.is_finite() && up >= 0.0).then(|| up.trunc() as i64)
}
