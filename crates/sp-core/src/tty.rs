//! Controlling-terminal resolution.
//!
//! Maps a `tty_nr` device number to a display name by matching it against
//! the character devices under the device root. The device directories are
//! scanned once per resolver into a lookup table; every later call is a map
//! hit.

use sp_common::DeviceNumber;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Default device root.
pub const DEFAULT_DEV_ROOT: &str = "/dev";

/// Display value for "no terminal".
pub const NO_TERMINAL: &str = "?";

/// Pseudo-terminal subdirectory of the device root.
const PTS_DIR: &str = "pts";

/// Standard-stream aliases in the device root. A match on one of these is
/// shown as the first pseudo-terminal.
const STD_STREAM_ALIASES: [&str; 3] = ["stdin", "stdout", "stderr"];
const STD_STREAM_LABEL: &str = "pts/0";

/// A character device found in a device directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Entry name within its directory.
    pub name: String,
    pub device: DeviceNumber,
}

impl DeviceEntry {
    pub fn new(name: impl Into<String>, device: DeviceNumber) -> Self {
        DeviceEntry {
            name: name.into(),
            device,
        }
    }
}

/// Source of character-device listings.
pub trait DeviceSource: Send + Sync {
    /// Character devices in `dir`, in directory listing order.
    fn char_devices(&self, dir: &Path) -> io::Result<Vec<DeviceEntry>>;
}

/// Lists character devices from the filesystem.
///
/// Symlinks are followed, so `/dev/stdin` reports the device it points at.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDeviceSource;

impl DeviceSource for FsDeviceSource {
    #[cfg(unix)]
    fn char_devices(&self, dir: &Path) -> io::Result<Vec<DeviceEntry>> {
        use std::os::unix::fs::{FileTypeExt, MetadataExt};

        let mut devices = Vec::new();
        for entry in fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            // Dangling links and permission errors just mean "not a match"
            let Ok(meta) = fs::metadata(entry.path()) else {
                continue;
            };
            if !meta.file_type().is_char_device() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            devices.push(DeviceEntry::new(name, DeviceNumber(meta.rdev())));
        }
        Ok(devices)
    }

    #[cfg(not(unix))]
    fn char_devices(&self, dir: &Path) -> io::Result<Vec<DeviceEntry>> {
        fs::read_dir(dir).map(|_| Vec::new())
    }
}

/// Fixed device listings keyed by directory, for tests and captured trees.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceSource {
    dirs: HashMap<PathBuf, Vec<DeviceEntry>>,
}

impl StaticDeviceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(
        mut self,
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        device: DeviceNumber,
    ) -> Self {
        self.dirs
            .entry(dir.into())
            .or_default()
            .push(DeviceEntry::new(name, device));
        self
    }
}

impl DeviceSource for StaticDeviceSource {
    fn char_devices(&self, dir: &Path) -> io::Result<Vec<DeviceEntry>> {
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such device directory"))
    }
}

#[derive(Debug, Default)]
struct DeviceTable {
    primary: HashMap<(u32, u32), String>,
    pts: HashMap<(u32, u32), String>,
}

impl DeviceTable {
    fn lookup(&self, parts: (u32, u32)) -> Option<&str> {
        self.primary
            .get(&parts)
            .or_else(|| self.pts.get(&parts))
            .map(String::as_str)
    }
}

/// Resolves device numbers to terminal names under a device root.
#[derive(Debug)]
pub struct TerminalResolver<S = FsDeviceSource> {
    dev_root: PathBuf,
    source: S,
    table: OnceLock<DeviceTable>,
}

impl TerminalResolver<FsDeviceSource> {
    pub fn new(dev_root: impl Into<PathBuf>) -> Self {
        TerminalResolver::with_source(dev_root, FsDeviceSource)
    }
}

impl Default for TerminalResolver<FsDeviceSource> {
    fn default() -> Self {
        TerminalResolver::new(DEFAULT_DEV_ROOT)
    }
}

impl<S: DeviceSource> TerminalResolver<S> {
    pub fn with_source(dev_root: impl Into<PathBuf>, source: S) -> Self {
        TerminalResolver {
            dev_root: dev_root.into(),
            source,
            table: OnceLock::new(),
        }
    }

    pub fn dev_root(&self) -> &Path {
        &self.dev_root
    }

    /// Terminal name for `device`: a path relative to the device root
    /// (`tty1`, `pts/3`), or `"?"` when there is none.
    pub fn resolve(&self, device: DeviceNumber) -> String {
        if device.is_none() {
            return NO_TERMINAL.to_string();
        }
        match self.table().lookup(device.parts()) {
            Some(name) => name.to_string(),
            None => {
                trace!(device = %device, "No device entry for terminal");
                NO_TERMINAL.to_string()
            }
        }
    }

    fn table(&self) -> &DeviceTable {
        self.table.get_or_init(|| self.scan())
    }

    fn scan(&self) -> DeviceTable {
        let mut table = DeviceTable::default();

        for entry in self.list(&self.dev_root) {
            let label = if STD_STREAM_ALIASES.contains(&entry.name.as_str()) {
                STD_STREAM_LABEL.to_string()
            } else {
                entry.name
            };
            table.primary.entry(entry.device.parts()).or_insert(label);
        }

        let pts_root = self.dev_root.join(PTS_DIR);
        for entry in self.list(&pts_root) {
            table
                .pts
                .entry(entry.device.parts())
                .or_insert_with(|| format!("{PTS_DIR}/{}", entry.name));
        }

        debug!(
            dev_root = %self.dev_root.display(),
            primary = table.primary.len(),
            pts = table.pts.len(),
            "Indexed terminal devices"
        );
        table
    }

    fn list(&self, dir: &Path) -> Vec<DeviceEntry> {
        match self.source.char_devices(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Device directory unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}
