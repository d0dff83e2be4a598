//! Shared test helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hostswitch::backend::{Backend, ConfigSnapshot, MemoryBackend};
use hostswitch::bundle::Bundle;
use hostswitch::policy::ActiveSet;
use hostswitch::profile::{ActivationMode, ProfileId};
use hostswitch::sync::SyncClient;
use hostswitch::{Error, Result};
use tempfile::TempDir;

/// Create a temp directory for use as HOSTSWITCH_HOME.
/// Uses current dir (workspace) so sandbox allows full access.
pub fn temp_home() -> TempDir {
    tempfile::Builder::new()
        .prefix("hostswitch_test_")
        .tempdir_in(std::env::current_dir().unwrap_or_else(|_| std::path::Path::new(".").into()))
        .expect("temp dir")
}

/// Client over a fresh in-memory backend.
pub async fn memory_client() -> SyncClient {
    SyncClient::connect(Arc::new(MemoryBackend::new()))
        .await
        .unwrap()
}

/// Memory backend whose mutations can be made to fail with TransportFailure.
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: MemoryBackend,
    failing: AtomicBool,
    drop_next_load: AtomicBool,
}

impl FlakyBackend {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make the next `load_config` fail once.
    pub fn drop_next_load(&self) {
        self.drop_next_load.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::TransportFailure("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn load_config(&self) -> Result<ConfigSnapshot> {
        if self.drop_next_load.swap(false, Ordering::SeqCst) {
            return Err(Error::TransportFailure("reload dropped".into()));
        }
        self.inner.load_config().await
    }

    async fn load_common_fragment(&self) -> Result<String> {
        self.inner.load_common_fragment().await
    }

    async fn create_profile(&self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        self.check()?;
        self.inner.create_profile(name, content).await
    }

    async fn rename_profile(&self, id: &ProfileId, new_name: &str) -> Result<()> {
        self.check()?;
        self.inner.rename_profile(id, new_name).await
    }

    async fn delete_profile(&self, id: &ProfileId) -> Result<()> {
        self.check()?;
        self.inner.delete_profile(id).await
    }

    async fn update_profile_content(&self, id: &ProfileId, content: &str) -> Result<()> {
        self.check()?;
        self.inner.update_profile_content(id, content).await
    }

    async fn apply_active_set(&self, active: &ActiveSet) -> Result<()> {
        self.check()?;
        self.inner.apply_active_set(active).await
    }

    async fn set_mode(&self, mode: ActivationMode) -> Result<()> {
        self.check()?;
        self.inner.set_mode(mode).await
    }

    async fn set_common_fragment(&self, content: &str) -> Result<()> {
        self.check()?;
        self.inner.set_common_fragment(content).await
    }

    async fn import_bundle(&self, bundle: &Bundle) -> Result<Vec<ProfileId>> {
        self.check()?;
        self.inner.import_bundle(bundle).await
    }
}

/// Names of the active profiles in the client's cache.
pub fn active_names(client: &SyncClient) -> Vec<String> {
    client
        .snapshot()
        .active_profiles()
        .iter()
        .map(|p| p.name.clone())
        .collect()
}
