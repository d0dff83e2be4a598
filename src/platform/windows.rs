//! Windows hosts file.

use std::path::{Path, PathBuf};

use super::{read_hosts, replace_file_atomic, HostsFile};
use crate::error::Result;

/// Writes require an elevated process; otherwise `PermissionDenied`.
pub struct WindowsHostsFile {
    path: PathBuf,
}

impl WindowsHostsFile {
    pub fn new() -> Self {
        let root = std::env::var_os("SystemRoot")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
        Self {
            path: root.join(r"System32\drivers\etc\hosts"),
        }
    }
}

impl Default for WindowsHostsFile {
    fn default() -> Self {
        Self::new()
    }
}

impl HostsFile for WindowsHostsFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        read_hosts(&self.path)
    }

    fn write(&self, content: &str) -> Result<()> {
        replace_file_atomic(&self.path, content.as_bytes())
    }
}
