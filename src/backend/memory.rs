//! In-process backend for tests and embedding.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{Backend, ConfigSnapshot, StoreState};
use crate::bundle::Bundle;
use crate::error::Result;
use crate::policy::ActiveSet;
use crate::profile::{ActivationMode, ProfileId};

/// Backend holding its state in memory. Each mutation runs against a copy
/// that is committed only on success.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<StoreState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored state.
    pub fn state(&self) -> StoreState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn load_config(&self) -> Result<ConfigSnapshot> {
        Ok(self.lock().config())
    }

    async fn load_common_fragment(&self) -> Result<String> {
        Ok(self.lock().common.clone())
    }

    async fn create_profile(&self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        self.mutate(|s| s.create(name, content))
    }

    async fn rename_profile(&self, id: &ProfileId, new_name: &str) -> Result<()> {
        self.mutate(|s| s.rename(id, new_name))
    }

    async fn delete_profile(&self, id: &ProfileId) -> Result<()> {
        self.mutate(|s| s.delete(id).map(|_| ()))
    }

    async fn update_profile_content(&self, id: &ProfileId, content: &str) -> Result<()> {
        self.mutate(|s| s.update_content(id, content))
    }

    async fn apply_active_set(&self, active: &ActiveSet) -> Result<()> {
        self.mutate(|s| s.apply_active_set(active))
    }

    async fn set_mode(&self, mode: ActivationMode) -> Result<()> {
        self.mutate(|s| {
            s.set_mode(mode);
            Ok(())
        })
    }

    async fn set_common_fragment(&self, content: &str) -> Result<()> {
        self.mutate(|s| {
            s.set_common(content);
            Ok(())
        })
    }

    async fn import_bundle(&self, bundle: &Bundle) -> Result<Vec<ProfileId>> {
        self.mutate(|s| s.import(bundle))
    }
}
