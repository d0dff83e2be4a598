//! Persistence backend: the authoritative store behind the sync client.

use async_trait::async_trait;

use crate::bundle::Bundle;
use crate::error::Result;
use crate::policy::ActiveSet;
use crate::profile::{ActivationMode, Profile, ProfileId};

pub mod file;
pub mod memory;
pub mod state;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use state::StoreState;

/// Profiles and mode as returned by `load_config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub profiles: Vec<Profile>,
    pub mode: ActivationMode,
}

/// One typed round trip per operation. Every mutation either applies in full
/// or returns an error without changing the stored state.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn load_config(&self) -> Result<ConfigSnapshot>;

    async fn load_common_fragment(&self) -> Result<String>;

    async fn create_profile(&self, name: &str, content: Option<&str>) -> Result<ProfileId>;

    async fn rename_profile(&self, id: &ProfileId, new_name: &str) -> Result<()>;

    async fn delete_profile(&self, id: &ProfileId) -> Result<()>;

    async fn update_profile_content(&self, id: &ProfileId, content: &str) -> Result<()>;

    /// Replace the whole active set in one write.
    async fn apply_active_set(&self, active: &ActiveSet) -> Result<()>;

    async fn set_mode(&self, mode: ActivationMode) -> Result<()>;

    async fn set_common_fragment(&self, content: &str) -> Result<()>;

    /// Merge a bundle; returns the ids of the profiles it created.
    async fn import_bundle(&self, bundle: &Bundle) -> Result<Vec<ProfileId>>;
}
