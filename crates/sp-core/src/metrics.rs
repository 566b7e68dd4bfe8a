//! Derived per-process metrics: utilization, start label, CPU time.
//!
//! All tick to wall-time conversion goes through the snapshot's
//! [`SystemClock`]. Start times use integer tick-rate division, so
//! sub-second precision is dropped.

use crate::clock::SystemClock;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

/// Metrics derived for one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    /// Absolute start time (Unix seconds).
    pub start_time: i64,
    /// Wall time since start, in ticks. Zero or negative under clock skew.
    pub elapsed_ticks: i64,
    /// Lifetime CPU utilization, truncated to an integer in `[0, 100]`.
    pub cpu_percent: u8,
    /// `HH:MM` if started today, otherwise `Mon DD`.
    pub start_label: String,
    /// Cumulative CPU time as `HH:MM:SS`.
    pub cpu_time_label: String,
}

impl ProcessMetrics {
    /// Compute all metrics, rendering the start label in `tz`.
    pub fn compute<Tz>(clock: &SystemClock, start_ticks: u64, cpu_ticks: u64, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let start = start_time(clock, start_ticks);
        let elapsed = elapsed_ticks(clock, start);
        ProcessMetrics {
            start_time: start,
            elapsed_ticks: elapsed,
            cpu_percent: cpu_utilization_percent(cpu_ticks, elapsed),
            start_label: start_label_at(start, clock.now(), tz),
            cpu_time_label: cpu_time_label(cpu_ticks, clock.ticks_per_second()),
        }
    }
}

/// `boot_time + start_ticks / ticks_per_second`, whole seconds.
pub fn start_time(clock: &SystemClock, start_ticks: u64) -> i64 {
    let secs = start_ticks / clock.ticks_per_second();
    clock
        .boot_time()
        .saturating_add(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// `(now - start_time) * ticks_per_second`.
pub fn elapsed_ticks(clock: &SystemClock, start_time: i64) -> i64 {
    let tps = i64::try_from(clock.ticks_per_second()).unwrap_or(i64::MAX);
    clock.now().saturating_sub(start_time).saturating_mul(tps)
}

/// `floor(100 * cpu_ticks / elapsed_ticks)`, clamped to `[0, 100]`.
///
/// A zero or negative elapsed time leaves the ratio undefined; the result is
/// then 0 rather than an error.
pub fn cpu_utilization_percent(cpu_ticks: u64, elapsed_ticks: i64) -> u8 {
    if elapsed_ticks <= 0 {
        debug!(cpu_ticks, elapsed_ticks, "Degenerate elapsed time, reporting 0% CPU");
        return 0;
    }
    let percent = u128::from(cpu_ticks) * 100 / elapsed_ticks as u128;
    percent.min(100) as u8
}

/// `HH:MM` when `start` falls on the same local calendar day as `now`,
/// otherwise `Mon DD`.
pub fn start_label<Tz>(start: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if start.date_naive() == now.date_naive() {
        start.format("%H:%M").to_string()
    } else {
        start.format("%b %d").to_string()
    }
}

/// [`start_label`] for Unix timestamps, rendered in `tz`.
pub fn start_label_at<Tz>(start: i64, now: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match (
        DateTime::from_timestamp(start, 0),
        DateTime::from_timestamp(now, 0),
    ) {
        (Some(start), Some(now)) => {
            start_label(&start.with_timezone(tz), &now.with_timezone(tz))
        }
        _ => "?".to_string(),
    }
}

/// `cpu_ticks / ticks_per_second` as `HH:MM:SS`; hours are not bounded.
pub fn cpu_time_label(cpu_ticks: u64, ticks_per_second: u64) -> String {
    let secs = cpu_ticks / ticks_per_second.max(1);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
