//! Filesystem backend: TOML metadata plus one content file per profile.
//!
//! ```text
//! config.toml                  mode, next_seq, revision, [[profiles]]
//! common.<rev>.hosts           common fragment
//! profiles/<id>.<rev>.hosts    profile content
//! store.lock                   advisory lock
//! ```
//!
//! Content files are immutable once referenced. A write puts changed content
//! under the next revision and then replaces config.toml, which is the only
//! commit point.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, ConfigSnapshot, StoreState};
use crate::bundle::Bundle;
use crate::config::HostswitchPaths;
use crate::error::{Error, Result};
use crate::platform::replace_file_atomic;
use crate::policy::ActiveSet;
use crate::profile::{ActivationMode, Profile, ProfileId};

/// config.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mode: ActivationMode,
    #[serde(default)]
    next_seq: u64,
    /// Bumped on every committed write.
    #[serde(default)]
    revision: u64,
    /// Revision of the current common fragment file; none means empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    common_rev: Option<u64>,
    #[serde(default)]
    profiles: Vec<ProfileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileEntry {
    id: ProfileId,
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    seq: u64,
    #[serde(default)]
    rev: u64,
}

impl ConfigFile {
    /// Content files this config references.
    fn content_files(&self, paths: &HostswitchPaths) -> Vec<PathBuf> {
        self.profiles
            .iter()
            .map(|e| paths.profile_file(&e.id, e.rev))
            .chain(self.common_rev.map(|rev| paths.common_file(rev)))
            .collect()
    }
}

/// Held for the duration of one load or read-modify-write.
struct StoreLock {
    _file: fs::File,
}

impl StoreLock {
    fn acquire(paths: &HostswitchPaths, exclusive: bool) -> Result<Self> {
        fs::create_dir_all(&paths.data_dir).map_err(|e| Error::io(&paths.data_dir, e))?;
        let file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&paths.lock_file)
            .map_err(|e| Error::io(&paths.lock_file, e))?;
        let locked = if exclusive {
            fs2::FileExt::lock_exclusive(&file)
        } else {
            fs2::FileExt::lock_shared(&file)
        };
        locked.map_err(|e| Error::io(&paths.lock_file, e))?;
        Ok(Self { _file: file })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::File::open(path) {
        Ok(mut file) => {
            let mut s = String::new();
            file.read_to_string(&mut s).map_err(|e| Error::io(path, e))?;
            Ok(Some(s))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Parse config.toml. A missing store is an empty one.
fn read_config(paths: &HostswitchPaths) -> Result<ConfigFile> {
    match read_optional(&paths.config_file)? {
        Some(s) => toml::from_str(&s).map_err(|e| {
            Error::TransportFailure(format!("parse {}: {e}", paths.config_file.display()))
        }),
        None => Ok(ConfigFile::default()),
    }
}

fn read_common(paths: &HostswitchPaths, config: &ConfigFile) -> Result<String> {
    match config.common_rev {
        Some(rev) => Ok(read_optional(&paths.common_file(rev))?.unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// Load the full state along with the config it was read from.
fn load_state(paths: &HostswitchPaths) -> Result<(ConfigFile, StoreState)> {
    let config = read_config(paths)?;

    let mut profiles = Vec::with_capacity(config.profiles.len());
    for entry in &config.profiles {
        let path = paths.profile_file(&entry.id, entry.rev);
        profiles.push(Profile {
            id: entry.id,
            name: entry.name.clone(),
            content: read_optional(&path)?.unwrap_or_default(),
            active: entry.active,
            seq: entry.seq,
        });
    }
    let next_seq = profiles
        .iter()
        .map(|p| p.seq + 1)
        .max()
        .unwrap_or(0)
        .max(config.next_seq);

    let state = StoreState {
        profiles,
        common: read_common(paths, &config)?,
        mode: config.mode,
        next_seq,
    };
    Ok((config, state))
}

/// Persist `after` as the next revision of `committed`.
///
/// On failure every file written for the new revision is removed and the
/// committed revision is left as it was.
fn save_state(
    paths: &HostswitchPaths,
    committed: &ConfigFile,
    before: &StoreState,
    after: &StoreState,
) -> Result<()> {
    let mut written = Vec::new();
    let config = match write_revision(paths, committed, before, after, &mut written) {
        Ok(config) => config,
        Err(e) => {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }
    };

    let live = config.content_files(paths);
    for path in committed.content_files(paths) {
        if live.contains(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not remove superseded content file"
            ),
        }
    }
    Ok(())
}

fn write_revision(
    paths: &HostswitchPaths,
    committed: &ConfigFile,
    before: &StoreState,
    after: &StoreState,
    written: &mut Vec<PathBuf>,
) -> Result<ConfigFile> {
    fs::create_dir_all(&paths.profiles_dir).map_err(|e| Error::io(&paths.profiles_dir, e))?;
    let revision = committed.revision + 1;

    let mut entries = Vec::with_capacity(after.profiles.len());
    for p in &after.profiles {
        let unchanged = before
            .profiles
            .iter()
            .any(|old| old.id == p.id && old.content == p.content);
        let kept = committed
            .profiles
            .iter()
            .find(|e| e.id == p.id)
            .filter(|_| unchanged)
            .map(|e| e.rev);
        let rev = match kept {
            Some(rev) => rev,
            None => {
                let path = paths.profile_file(&p.id, revision);
                replace_file_atomic(&path, p.content.as_bytes())?;
                written.push(path);
                revision
            }
        };
        entries.push(ProfileEntry {
            id: p.id,
            name: p.name.clone(),
            active: p.active,
            seq: p.seq,
            rev,
        });
    }

    let common_rev = if before.common == after.common {
        committed.common_rev
    } else {
        let path = paths.common_file(revision);
        replace_file_atomic(&path, after.common.as_bytes())?;
        written.push(path);
        Some(revision)
    };

    let config = ConfigFile {
        mode: after.mode,
        next_seq: after.next_seq,
        revision,
        common_rev,
        profiles: entries,
    };
    let s = toml::to_string_pretty(&config)
        .map_err(|e| Error::TransportFailure(format!("serialize config: {e}")))?;
    replace_file_atomic(&paths.config_file, s.as_bytes())?;
    Ok(config)
}

/// Backend persisting to a hostswitch data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    paths: HostswitchPaths,
}

impl FileBackend {
    pub fn new(paths: HostswitchPaths) -> Self {
        Self { paths }
    }

    async fn read(&self) -> Result<StoreState> {
        let paths = self.paths.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = StoreLock::acquire(&paths, false)?;
            load_state(&paths).map(|(_, state)| state)
        })
        .await
        .map_err(|e| Error::TransportFailure(format!("load: {e}")))?
    }

    /// Locked read-modify-write on the blocking pool. If `f` or any write
    /// fails, the committed revision is what the next load sees.
    async fn mutate<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let paths = self.paths.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = StoreLock::acquire(&paths, true)?;
            let (committed, before) = load_state(&paths)?;
            let mut after = before.clone();
            let out = f(&mut after)?;
            save_state(&paths, &committed, &before, &after)?;
            tracing::debug!(op, dir = %paths.data_dir.display(), "store written");
            Ok(out)
        })
        .await
        .map_err(|e| Error::TransportFailure(format!("{op}: {e}")))?
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn load_config(&self) -> Result<ConfigSnapshot> {
        Ok(self.read().await?.config())
    }

    async fn load_common_fragment(&self) -> Result<String> {
        let paths = self.paths.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = StoreLock::acquire(&paths, false)?;
            read_common(&paths, &read_config(&paths)?)
        })
        .await
        .map_err(|e| Error::TransportFailure(format!("load common: {e}")))?
    }

    async fn create_profile(&self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        let name = name.to_string();
        let content = content.map(str::to_string);
        self.mutate("create", move |s| s.create(&name, content.as_deref())).await
    }

    async fn rename_profile(&self, id: &ProfileId, new_name: &str) -> Result<()> {
        let id = *id;
        let new_name = new_name.to_string();
        self.mutate("rename", move |s| s.rename(&id, &new_name)).await
    }

    async fn delete_profile(&self, id: &ProfileId) -> Result<()> {
        let id = *id;
        self.mutate("delete", move |s| s.delete(&id).map(|_| ())).await
    }

    async fn update_profile_content(&self, id: &ProfileId, content: &str) -> Result<()> {
        let id = *id;
        let content = content.to_string();
        self.mutate("update", move |s| s.update_content(&id, &content)).await
    }

    async fn apply_active_set(&self, active: &ActiveSet) -> Result<()> {
        let active = active.clone();
        self.mutate("activate", move |s| s.apply_active_set(&active)).await
    }

    async fn set_mode(&self, mode: ActivationMode) -> Result<()> {
        self.mutate("set_mode", move |s| {
            s.set_mode(mode);
            Ok(())
        })
        .await
    }

    async fn set_common_fragment(&self, content: &str) -> Result<()> {
        let content = content.to_string();
        self.mutate("set_common", move |s| {
            s.set_common(&content);
            Ok(())
        })
        .await
    }

    async fn import_bundle(&self, bundle: &Bundle) -> Result<Vec<ProfileId>> {
        let bundle = bundle.clone();
        self.mutate("import", move |s| s.import(&bundle)).await
    }
}
