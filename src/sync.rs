//! Sync client: every mutation is one backend round trip followed by an
//! authoritative reload.
//!
//! Mutations are serialized by an async mutex held across the round trip and
//! the reload, so a toggle is always computed from the snapshot the previous
//! mutation produced. On failure the cached snapshot is left as it was.
//!
//! A reload that fails after a committed mutation marks the cache stale. The
//! next mutation re-fetches before it runs and fails if it cannot.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::bundle::{self, Bundle, ImportSource};
use crate::compose::compose;
use crate::error::{Error, Result};
use crate::platform::{self, HostsFile};
use crate::policy::next_active_set;
use crate::profile::{normalize_name, ActivationMode, ProfileId};
use crate::store::{ProfileStore, Snapshot};

pub struct SyncClient {
    backend: Arc<dyn Backend>,
    store: ProfileStore,
    gate: Mutex<()>,
    stale: AtomicBool,
}

impl SyncClient {
    /// Client with an empty cache; call `reload` before trusting it.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            store: ProfileStore::new(),
            gate: Mutex::new(()),
            stale: AtomicBool::new(false),
        }
    }

    /// Client with the cache already populated from the backend.
    pub async fn connect(backend: Arc<dyn Backend>) -> Result<Self> {
        let client = Self::new(backend);
        client.reload().await?;
        Ok(client)
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    /// Composed hosts body for the cached snapshot.
    pub fn compose(&self) -> String {
        compose(&self.snapshot())
    }

    pub fn export_bundle(&self) -> Bundle {
        bundle::export(&self.snapshot())
    }

    /// Re-fetch everything from the backend.
    pub async fn reload(&self) -> Result<()> {
        let _guard = self.gate.lock().await;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<()> {
        let config = self.backend.load_config().await?;
        let common = self.backend.load_common_fragment().await?;
        self.store.replace_snapshot(config.profiles, common, config.mode);
        self.stale.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Whether the cache may lag behind a mutation the backend committed.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Run one mutation under the gate and reload on success.
    async fn mutate<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(Arc<Snapshot>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _guard = self.gate.lock().await;
        if self.is_stale() {
            tracing::debug!(op, "cache stale, re-fetching first");
            if let Err(e) = self.fetch().await {
                tracing::warn!(op, error = %e, "re-fetch of stale cache failed");
                return Err(e);
            }
        }
        tracing::debug!(op, "mutation dispatched");
        let out = match f(self.store.snapshot()).await {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(op, error = %e, "mutation failed");
                return Err(e);
            }
        };
        if let Err(e) = self.fetch().await {
            self.stale.store(true, Ordering::SeqCst);
            tracing::warn!(op, error = %e, "reload after mutation failed");
            return Err(e);
        }
        tracing::info!(op, "mutation applied");
        Ok(out)
    }

    pub async fn create(&self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        let name = normalize_name(name)?;
        self.mutate("create", |snap| async move {
            snap.assert_unique_name(&name, None)?;
            self.backend.create_profile(&name, content).await
        })
        .await
    }

    pub async fn rename(&self, id: &ProfileId, new_name: &str) -> Result<()> {
        let name = normalize_name(new_name)?;
        self.mutate("rename", |snap| async move {
            snap.assert_unique_name(&name, Some(id))?;
            self.backend.rename_profile(id, &name).await
        })
        .await
    }

    pub async fn delete(&self, id: &ProfileId) -> Result<()> {
        self.mutate("delete", |_| self.backend.delete_profile(id)).await
    }

    pub async fn update_content(&self, id: &ProfileId, content: &str) -> Result<()> {
        self.mutate("update_content", |_| self.backend.update_profile_content(id, content))
            .await
    }

    /// Toggle `id` under the current mode, committing the whole resulting
    /// active set in one backend write.
    pub async fn toggle_active(&self, id: &ProfileId) -> Result<()> {
        self.mutate("toggle_active", |snap| async move {
            let next = next_active_set(&snap.profiles, snap.mode, id)?;
            self.backend.apply_active_set(&next).await
        })
        .await
    }

    /// Switching mode leaves active flags as they are.
    pub async fn set_mode(&self, mode: ActivationMode) -> Result<()> {
        self.mutate("set_mode", |_| self.backend.set_mode(mode)).await
    }

    pub async fn set_common(&self, content: &str) -> Result<()> {
        self.mutate("set_common", |_| self.backend.set_common_fragment(content)).await
    }

    pub async fn import_bundle(&self, bundle: &Bundle) -> Result<Vec<ProfileId>> {
        self.mutate("import_bundle", |_| self.backend.import_bundle(bundle)).await
    }

    /// Import a raw hosts body as one new profile named after `label`.
    pub async fn import_raw(&self, label: &str, content: &str) -> Result<ProfileId> {
        let name = bundle::raw_profile_name(label)?;
        let ids = self.import_bundle(&Bundle::single(name, content)).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| Error::TransportFailure("import created no profile".to_string()))
    }

    /// Import from a labelled payload (`.json` bundle or raw body).
    pub async fn import_source(&self, label: &str, bytes: &[u8]) -> Result<Vec<ProfileId>> {
        let source = ImportSource::detect(label, bytes)?;
        self.import_bundle(&source.into_bundle()).await
    }

    /// Compose the cached snapshot (re-fetched first if stale) and write it
    /// to `hosts` on the blocking pool.
    pub async fn apply(&self, hosts: &Arc<dyn HostsFile>) -> Result<String> {
        let _guard = self.gate.lock().await;
        if self.is_stale() {
            self.fetch().await?;
        }
        let composed = compose(&self.store.snapshot());
        platform::write_blocking(hosts, &composed).await?;
        tracing::info!(
            path = %hosts.path().display(),
            bytes = composed.len(),
            "hosts file written"
        );
        Ok(composed)
    }
}
