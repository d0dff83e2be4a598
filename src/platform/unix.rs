//! Unix (macOS, Linux) hosts file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use super::{read_hosts, replace_file_atomic, HostsFile};
use crate::error::{Error, Result};

pub const SYSTEM_HOSTS: &str = "/etc/hosts";

pub struct UnixHostsFile {
    path: PathBuf,
    elevate: bool,
}

impl UnixHostsFile {
    pub fn new(elevate: bool) -> Self {
        Self {
            path: PathBuf::from(SYSTEM_HOSTS),
            elevate,
        }
    }

    /// Stage content in a private temp file, then copy it next to the target
    /// and rename it into place as root.
    fn write_elevated(&self, content: &str) -> Result<()> {
        let staged = stage(content)?;
        run_privileged_swap(staged.path(), &self.path)
    }
}

impl HostsFile for UnixHostsFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        read_hosts(&self.path)
    }

    fn write(&self, content: &str) -> Result<()> {
        match replace_file_atomic(&self.path, content.as_bytes()) {
            Err(Error::PermissionDenied(_)) if self.elevate => {
                tracing::info!(
                    path = %self.path.display(),
                    "permission denied, retrying with elevation"
                );
                self.write_elevated(content)
            }
            other => other,
        }
    }
}

/// Uniquely named, created exclusively and readable only by the owner.
/// Removed when the handle drops.
fn stage(content: &str) -> Result<NamedTempFile> {
    let dir = std::env::temp_dir();
    let mut staged = tempfile::Builder::new()
        .prefix("hostswitch-")
        .suffix(".hosts")
        .tempfile_in(&dir)
        .map_err(|e| Error::io(&dir, e))?;
    staged
        .write_all(content.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| Error::io(staged.path(), e))?;
    Ok(staged)
}

#[cfg(not(target_os = "macos"))]
fn run_privileged_swap(staged: &Path, target: &Path) -> Result<()> {
    let tmp = super::staging_path(target);
    let status = Command::new("pkexec")
        .args(["sh", "-c", "cp \"$1\" \"$2\" && chmod 644 \"$2\" && mv \"$2\" \"$3\"", "sh"])
        .arg(staged)
        .arg(&tmp)
        .arg(target)
        .status();
    swap_outcome(status, target)
}

#[cfg(target_os = "macos")]
fn run_privileged_swap(staged: &Path, target: &Path) -> Result<()> {
    let tmp = super::staging_path(target);
    let quote = |p: &Path| format!("'{}'", p.to_string_lossy().replace('\'', "'\\''"));
    let shell = format!(
        "cp {src} {tmp} && chmod 644 {tmp} && mv {tmp} {dst}",
        src = quote(staged),
        tmp = quote(&tmp),
        dst = quote(target)
    );
    let status = Command::new("osascript")
        .args([
            "-e",
            &format!(
                "do shell script \"{}\" with administrator privileges",
                shell.replace('\\', "\\\\").replace('"', "\\\"")
            ),
        ])
        .status();
    swap_outcome(status, target)
}

fn swap_outcome(status: std::io::Result<std::process::ExitStatus>, target: &Path) -> Result<()> {
    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(Error::PermissionDenied(target.to_path_buf())),
        Err(e) => Err(Error::io(target, e)),
    }
}
