//! On-disk fake procfs roots for CLI tests.
//!
//! Every process is owned by uid 0 so the host's passwd database always
//! resolves the owner.

#![allow(dead_code)]
// Test support provides more helpers than any single test uses.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake `/proc`, an empty device root and an isolated config home.
pub struct FakeRoot {
    dir: TempDir,
}

impl FakeRoot {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        for sub in ["proc", "dev", "xdg"] {
            fs::create_dir_all(dir.path().join(sub)).expect("create subdir");
        }
        fs::write(dir.path().join("proc/uptime"), "120.00 360.00\n").expect("write uptime");
        FakeRoot { dir }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.dir.path().join("proc")
    }

    pub fn dev_root(&self) -> PathBuf {
        self.dir.path().join("dev")
    }

    pub fn xdg_home(&self) -> PathBuf {
        self.dir.path().join("xdg")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a root-owned process with no terminal and zero CPU time.
    pub fn add_process(&self, pid: u32, ppid: u32, name: &str, cmdline: &[u8]) {
        let dir = self.proc_root().join(pid.to_string());
        fs::create_dir_all(&dir).expect("create pid dir");
        let stat = format!(
            "{pid} ({name}) S {ppid} {pid} {pid} 0 -1 4194304 100 0 0 0 0 0 0 0 20 0 1 0 0 1000000 100 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0\n"
        );
        fs::write(dir.join("stat"), stat).expect("write stat");
        fs::write(
            dir.join("status"),
            format!("Name:\t{name}\nPid:\t{pid}\nPPid:\t{ppid}\nUid:\t0\t0\t0\t0\nGid:\t0\t0\t0\t0\n"),
        )
        .expect("write status");
        fs::write(dir.join("cmdline"), cmdline).expect("write cmdline");
        fs::write(dir.join("comm"), format!("{name}\n")).expect("write comm");
    }

    pub fn write_record(&self, pid: u32, record: &str, content: &[u8]) {
        fs::write(self.proc_root().join(pid.to_string()).join(record), content)
            .expect("write record");
    }

    /// A small, typical process table.
    pub fn populated() -> Self {
        let root = FakeRoot::new();
        root.add_process(1, 0, "systemd", b"/sbin/init\0splash\0");
        root.add_process(2, 0, "kthreadd", b"");
        root.add_process(812, 1, "cron", b"/usr/sbin/cron\0-f\0");
        fs::create_dir_all(root.proc_root().join("self")).expect("create self");
        root
    }
}
