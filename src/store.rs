//! Cached view of the authoritative profile store.

use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::profile::{ActivationMode, Profile, ProfileId};

/// One consistent view of profiles, common fragment and mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub profiles: Vec<Profile>,
    pub common: String,
    pub mode: ActivationMode,
}

impl Snapshot {
    pub fn new(profiles: Vec<Profile>, common: String, mode: ActivationMode) -> Self {
        Self {
            profiles,
            common,
            mode,
        }
    }

    /// Look up a profile by id. Absent is not an error.
    pub fn find(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Fails with `NameCollision` if another profile (not `excluding`) uses `name`.
    pub fn assert_unique_name(&self, name: &str, excluding: Option<&ProfileId>) -> Result<()> {
        let taken = self
            .profiles
            .iter()
            .any(|p| p.name == name && Some(&p.id) != excluding);
        if taken {
            return Err(Error::NameCollision(name.to_string()));
        }
        Ok(())
    }

    /// Active profiles in composition order.
    pub fn active_profiles(&self) -> Vec<&Profile> {
        let mut active: Vec<&Profile> = self.profiles.iter().filter(|p| p.active).collect();
        active.sort_by(|a, b| a.seq.cmp(&b.seq).then_with(|| a.id.cmp(&b.id)));
        active
    }

    pub fn active_count(&self) -> usize {
        self.profiles.iter().filter(|p| p.active).count()
    }

    /// Profiles in creation order, for listing.
    pub fn ordered(&self) -> Vec<&Profile> {
        let mut all: Vec<&Profile> = self.profiles.iter().collect();
        all.sort_by(|a, b| a.seq.cmp(&b.seq).then_with(|| a.id.cmp(&b.id)));
        all
    }
}

/// Holder of the current snapshot.
///
/// Readers get an `Arc<Snapshot>` and keep a consistent view for as long as
/// they hold it; `replace_snapshot` swaps the whole thing in one step.
#[derive(Debug, Default)]
pub struct ProfileStore {
    current: RwLock<Arc<Snapshot>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace_snapshot(&self, profiles: Vec<Profile>, common: String, mode: ActivationMode) {
        let next = Arc::new(Snapshot::new(profiles, common, mode));
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn find(&self, id: &ProfileId) -> Option<Profile> {
        self.snapshot().find(id).cloned()
    }
}
