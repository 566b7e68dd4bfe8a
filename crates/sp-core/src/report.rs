//! Snapshot rendering: fixed-column table, JSON document, JSON lines.

use crate::collect::ProcessRecord;
use crate::metrics::ProcessMetrics;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use sp_common::{OutputFormat, ProcessId};
use std::io::{self, Write};

/// Column titles, in display order.
pub const COLUMNS: [&str; 8] = ["UID", "PID", "PPID", "C", "STIME", "TTY", "TIME", "CMD"];

/// One displayable process row.
///
/// The first eight fields are the table columns; the rest only appear in
/// JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// Owner account name, truncated for display.
    pub uid: String,
    pub pid: ProcessId,
    pub ppid: ProcessId,
    /// Lifetime CPU utilization percent.
    #[serde(rename = "c")]
    pub cpu_percent: u8,
    pub stime: String,
    pub tty: String,
    pub time: String,
    pub cmd: String,

    pub owner_uid: u32,
    pub name: String,
    pub state: char,
    /// Start time (Unix seconds).
    pub start_time: i64,
    pub cpu_ticks: u64,
}

impl ProcessRow {
    pub fn new(record: ProcessRecord, tty: String, metrics: ProcessMetrics) -> Self {
        ProcessRow {
            uid: record.owner_name,
            pid: record.pid,
            ppid: record.ppid,
            cpu_percent: metrics.cpu_percent,
            stime: metrics.start_label,
            tty,
            time: metrics.cpu_time_label,
            cmd: record.command,
            owner_uid: record.owner_uid,
            name: record.name,
            state: record.state,
            start_time: metrics.start_time,
            cpu_ticks: record.cpu_ticks,
        }
    }
}

fn columns_line(cells: [&dyn std::fmt::Display; 8]) -> String {
    let [uid, pid, ppid, c, stime, tty, time, cmd] = cells;
    format!("{uid:<10} {pid:<8} {ppid:<8} {c:<2} {stime:<6} {tty:<8} {time:<10} {cmd}")
}

/// The header line, without a trailing newline.
pub fn header_line() -> String {
    let [uid, pid, ppid, c, stime, tty, time, cmd] = COLUMNS;
    columns_line([&uid, &pid, &ppid, &c, &stime, &tty, &time, &cmd])
}

/// One table line for `row`, without a trailing newline.
pub fn format_row(row: &ProcessRow) -> String {
    // Raw integers: ProcessId's Display does not honour width flags
    columns_line([
        &row.uid,
        &row.pid.0,
        &row.ppid.0,
        &row.cpu_percent,
        &row.stime,
        &row.tty,
        &row.time,
        &row.cmd,
    ])
}

/// Header plus one line per row.
pub fn write_table<W: Write>(out: &mut W, rows: &[ProcessRow]) -> io::Result<()> {
    writeln!(out, "{}", header_line())?;
    for row in rows {
        writeln!(out, "{}", format_row(row))?;
    }
    Ok(())
}

/// The whole snapshot as one pretty-printed JSON document.
pub fn write_json<W: Write>(out: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, snapshot)?;
    writeln!(out)
}

/// One compact JSON object per row.
pub fn write_jsonl<W: Write>(out: &mut W, rows: &[ProcessRow]) -> io::Result<()> {
    for row in rows {
        serde_json::to_writer(&mut *out, row)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Render `snapshot` in `format`.
pub fn render<W: Write>(out: &mut W, snapshot: &Snapshot, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_table(out, &snapshot.rows),
        OutputFormat::Json => write_json(out, snapshot),
        OutputFormat::Jsonl => write_jsonl(out, &snapshot.rows),
    }?;
    out.flush()
}
