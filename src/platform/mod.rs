//! Platform abstraction for the OS hosts file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Read/replace access to a hosts file.
pub trait HostsFile: Send + Sync {
    /// Path being operated on.
    fn path(&self) -> &Path;
    /// Current content (the system mirror).
    fn read(&self) -> Result<String>;
    /// Replace the whole file. Readers see either the old or the new content.
    fn write(&self, content: &str) -> Result<()>;
}

/// Get the platform HostsFile implementation.
/// If HOSTSWITCH_HOSTS_FILE is set (e.g. in tests), uses FileHostsFile with that path.
pub fn default_hosts_file(settings: &Settings) -> Arc<dyn HostsFile> {
    if let Some(path) = &settings.hosts_file {
        return Arc::new(FileHostsFile::new(path));
    }
    #[cfg(unix)]
    return Arc::new(unix::UnixHostsFile::new(!settings.no_elevate));

    #[cfg(windows)]
    return Arc::new(windows::WindowsHostsFile::new());
}

/// Run `hosts.write` on the blocking pool. An elevated write can wait on a
/// password prompt for as long as the user takes.
pub async fn write_blocking(hosts: &Arc<dyn HostsFile>, content: &str) -> Result<()> {
    let hosts = Arc::clone(hosts);
    let content = content.to_string();
    tokio::task::spawn_blocking(move || hosts.write(&content))
        .await
        .map_err(|e| Error::TransportFailure(format!("hosts write: {e}")))?
}

/// HostsFile for an arbitrary path, no privilege escalation.
#[derive(Debug, Clone)]
pub struct FileHostsFile {
    path: PathBuf,
}

impl FileHostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HostsFile for FileHostsFile {
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

/// Read a hosts file; a missing file reads as empty.
pub fn read_hosts(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Sibling temp path used while replacing `path`.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hostswitch".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Write `bytes` to a sibling temp file, fsync, then rename over `path`.
///
/// Existing permissions are carried over. The temp file is removed on failure.
pub fn replace_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = staging_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(&tmp, meta.permissions())?;
        }
        fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    Ok(())
}
