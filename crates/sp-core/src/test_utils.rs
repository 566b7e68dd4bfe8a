//! Test utilities for sp-core.
//!
//! Builds throwaway procfs trees on disk so collection code can be tested
//! against known records without depending on the host's processes.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Synthetic `/proc/[pid]/stat` line with the given values at their kernel
/// positions and plausible filler elsewhere.
pub fn stat_line(
    pid: u32,
    name: &str,
    ppid: u32,
    tty_nr: u64,
    utime: u64,
    stime: u64,
    start_ticks: u64,
) -> String {
    format!(
        "{pid} ({name}) S {ppid} {pid} {pid} {tty_nr} -1 4194304 1000 0 0 0 {utime} {stime} 3 4 20 0 1 0 {start_ticks} 1000000 100 18446744073709551615 0 0 0 0 0 0 0 0 65536 0 0 0 17 0 0 0 0 0 0\n"
    )
}

/// Description of one fake process directory.
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub pid: u32,
    pub name: String,
    pub ppid: u32,
    pub real_uid: Option<u32>,
    pub uid: u32,
    pub tty_nr: u64,
    pub utime: u64,
    pub stime: u64,
    pub start_ticks: u64,
    pub cmdline: Vec<u8>,
}

impl FakeProcess {
    /// A root-owned process without a terminal whose command line is its name.
    pub fn new(pid: u32, name: &str) -> Self {
        let mut cmdline = name.as_bytes().to_vec();
        cmdline.push(0);
        FakeProcess {
            pid,
            name: name.to_string(),
            ppid: 1,
            real_uid: None,
            uid: 0,
            tty_nr: 0,
            utime: 0,
            stime: 0,
            start_ticks: 0,
            cmdline,
        }
    }

    pub fn ppid(mut self, ppid: u32) -> Self {
        self.ppid = ppid;
        self
    }

    /// Effective uid.
    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    pub fn real_uid(mut self, uid: u32) -> Self {
        self.real_uid = Some(uid);
        self
    }

    pub fn tty(mut self, tty_nr: u64) -> Self {
        self.tty_nr = tty_nr;
        self
    }

    pub fn ticks(mut self, utime: u64, stime: u64) -> Self {
        self.utime = utime;
        self.stime = stime;
        self
    }

    pub fn start_ticks(mut self, start_ticks: u64) -> Self {
        self.start_ticks = start_ticks;
        self
    }

    pub fn cmdline(mut self, raw: &[u8]) -> Self {
        self.cmdline = raw.to_vec();
        self
    }

    fn status(&self) -> String {
        let real = self.real_uid.unwrap_or(self.uid);
        format!(
            "Name:\t{}\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t{pid}\nPid:\t{pid}\nPPid:\t{}\nTracerPid:\t0\nUid:\t{real}\t{euid}\t{euid}\t{euid}\nGid:\t0\t0\t0\t0\n",
            self.name,
            self.ppid,
            pid = self.pid,
            real = real,
            euid = self.uid,
        )
    }
}

/// A procfs-shaped directory tree in a temporary directory.
pub struct FakeProcTree {
    dir: TempDir,
}

impl Default for FakeProcTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcTree {
    pub fn new() -> Self {
        FakeProcTree {
            dir: TempDir::new().expect("create fake proc root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.dir.path().join(pid.to_string())
    }

    /// Write all records of `process`, replacing any existing ones.
    pub fn add(&self, process: &FakeProcess) {
        let dir = self.pid_dir(process.pid);
        fs::create_dir_all(&dir).expect("create pid dir");
        let stat = stat_line(
            process.pid,
            &process.name,
            process.ppid,
            process.tty_nr,
            process.utime,
            process.stime,
            process.start_ticks,
        );
        fs::write(dir.join("stat"), stat).expect("write stat");
        fs::write(dir.join("status"), process.status()).expect("write status");
        fs::write(dir.join("cmdline"), &process.cmdline).expect("write cmdline");
        fs::write(dir.join("comm"), format!("{}\n", process.name)).expect("write comm");
    }

    pub fn write_record(&self, pid: u32, record: &str, content: &[u8]) {
        let dir = self.pid_dir(pid);
        fs::create_dir_all(&dir).expect("create pid dir");
        fs::write(dir.join(record), content).expect("write record");
    }

    pub fn remove_record(&self, pid: u32, record: &str) {
        fs::remove_file(self.pid_dir(pid).join(record)).expect("remove record");
    }

    /// Simulate a process exiting.
    pub fn remove_process(&self, pid: u32) {
        fs::remove_dir_all(self.pid_dir(pid)).expect("remove pid dir");
    }

    /// Add a non-process entry (`self`, `sys`, `net`, ...).
    pub fn add_dir(&self, name: &str) {
        fs::create_dir_all(self.dir.path().join(name)).expect("create dir");
    }

    /// Write `/proc/uptime` with the given seconds since boot.
    pub fn set_uptime(&self, seconds: f64) {
        fs::write(
            self.dir.path().join("uptime"),
            format!("{:.2} {:.2}\n", seconds, seconds * 3.0),
        )
        .expect("write uptime");
    }
}
