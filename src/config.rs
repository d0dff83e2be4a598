//! Data directory layout and environment-driven settings.
//!
//! Supports HOSTSWITCH_HOME env var override for testing.

use std::path::{Path, PathBuf};

/// Paths for the hostswitch data store.
#[derive(Debug, Clone)]
pub struct HostswitchPaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub profiles_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl HostswitchPaths {
    /// Build paths from base directory (e.g. ProjectDirs data dir or HOSTSWITCH_HOME).
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.toml"),
            profiles_dir: base.join("profiles"),
            lock_file: base.join("store.lock"),
            data_dir: base,
        }
    }

    /// Paths for testing: use a temp dir as base.
    pub fn for_test(base: impl AsRef<Path>) -> Self {
        Self::from_base(base.as_ref().to_path_buf())
    }

    /// Get default paths (respects HOSTSWITCH_HOME).
    pub fn default_paths() -> Self {
        let base = if let Ok(home) = std::env::var("HOSTSWITCH_HOME") {
            PathBuf::from(home)
        } else if let Some(dirs) =
            directories::ProjectDirs::from("dev", "hostswitch", "hostswitch")
        {
            dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from(".hostswitch")
        };
        Self::from_base(base)
    }

    /// Content file of one profile as written at store revision `rev`.
    pub fn profile_file(&self, id: &crate::profile::ProfileId, rev: u64) -> PathBuf {
        self.profiles_dir.join(format!("{id}.{rev}.hosts"))
    }

    /// Common fragment as written at store revision `rev`.
    pub fn common_file(&self, rev: u64) -> PathBuf {
        self.data_dir.join(format!("common.{rev}.hosts"))
    }
}

/// Runtime settings read from the environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// HOSTSWITCH_HOSTS_FILE: operate on this file instead of the OS hosts file.
    pub hosts_file: Option<PathBuf>,
    /// HOSTSWITCH_NO_ELEVATE: never fall back to pkexec/osascript.
    pub no_elevate: bool,
    /// HOSTSWITCH_LOG: tracing filter directive.
    pub log_filter: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            hosts_file: std::env::var_os("HOSTSWITCH_HOSTS_FILE").map(PathBuf::from),
            no_elevate: std::env::var_os("HOSTSWITCH_NO_ELEVATE").is_some(),
            log_filter: std::env::var("HOSTSWITCH_LOG").ok(),
        }
    }
}
