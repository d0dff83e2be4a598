//! Authoritative store model shared by the backends.

use crate::backend::ConfigSnapshot;
use crate::bundle::{disambiguate, Bundle};
use crate::error::{Error, Result};
use crate::policy::ActiveSet;
use crate::profile::{normalize_name, ActivationMode, Profile, ProfileId};

/// Everything a backend persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub profiles: Vec<Profile>,
    pub common: String,
    pub mode: ActivationMode,
    pub next_seq: u64,
}

impl StoreState {
    pub fn config(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            profiles: self.profiles.clone(),
            mode: self.mode,
        }
    }

    fn name_taken(&self, name: &str, excluding: Option<&ProfileId>) -> bool {
        self.profiles
            .iter()
            .any(|p| p.name == name && Some(&p.id) != excluding)
    }

    fn get_mut(&mut self, id: &ProfileId) -> Result<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(Error::NotFound(*id))
    }

    fn push(&mut self, name: String, content: String, active: bool) -> ProfileId {
        let id = ProfileId::generate();
        self.profiles.push(Profile {
            id,
            name,
            content,
            active,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        id
    }

    pub fn create(&mut self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        let name = normalize_name(name)?;
        if self.name_taken(&name, None) {
            return Err(Error::NameCollision(name));
        }
        Ok(self.push(name, content.unwrap_or_default().to_string(), false))
    }

    pub fn rename(&mut self, id: &ProfileId, new_name: &str) -> Result<()> {
        let name = normalize_name(new_name)?;
        if self.name_taken(&name, Some(id)) {
            return Err(Error::NameCollision(name));
        }
        self.get_mut(id)?.name = name;
        Ok(())
    }

    pub fn delete(&mut self, id: &ProfileId) -> Result<Profile> {
        let idx = self
            .profiles
            .iter()
            .position(|p| &p.id == id)
            .ok_or(Error::NotFound(*id))?;
        Ok(self.profiles.remove(idx))
    }

    pub fn update_content(&mut self, id: &ProfileId, content: &str) -> Result<()> {
        self.get_mut(id)?.content = content.to_string();
        Ok(())
    }

    /// Every id in `active` must exist; all other profiles become inactive.
    pub fn apply_active_set(&mut self, active: &ActiveSet) -> Result<()> {
        let missing = active
            .iter()
            .find(|id| !self.profiles.iter().any(|p| &p.id == *id));
        if let Some(missing) = missing {
            return Err(Error::NotFound(*missing));
        }
        for p in &mut self.profiles {
            p.active = active.contains(&p.id);
        }
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ActivationMode) {
        self.mode = mode;
    }

    pub fn set_common(&mut self, content: &str) {
        self.common = content.to_string();
    }

    /// Merge `bundle` with rename-on-conflict.
    ///
    /// In single-select mode (after applying the bundle's mode) at most one
    /// profile ends up active: the first active incoming one, if any, and
    /// every existing profile is deactivated in that case.
    pub fn import(&mut self, bundle: &Bundle) -> Result<Vec<ProfileId>> {
        bundle.validate()?;

        if let Some(mode) = bundle.mode {
            self.mode = mode;
        }
        if let Some(common) = &bundle.common {
            self.common = common.clone();
        }

        let single = self.mode == ActivationMode::SingleSelect;
        let mut created = Vec::with_capacity(bundle.profiles.len());
        let mut first_active: Option<ProfileId> = None;

        for incoming in &bundle.profiles {
            let base = normalize_name(&incoming.name)?;
            let name = disambiguate(&base, |n| self.name_taken(n, None));
            let active = incoming.active && !single;
            let id = self.push(name, incoming.content.clone(), active);
            if incoming.active && first_active.is_none() {
                first_active = Some(id);
            }
            created.push(id);
        }

        if single {
            if let Some(winner) = first_active {
                for p in &mut self.profiles {
                    p.active = p.id == winner;
                }
            }
        }
        Ok(created)
    }
}
