//! System mirror: the last observed content of the OS hosts file.

use chrono::{DateTime, Utc};

use crate::compose::{sync_state, SyncState};
use crate::error::Result;
use crate::platform::HostsFile;

/// Read-only copy of the OS hosts file. Replaced wholesale on refresh, never
/// patched, and never confused with composed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMirror {
    pub content: String,
    pub observed_at: DateTime<Utc>,
}

impl SystemMirror {
    /// Read the hosts file now. Independent of store mutations.
    pub fn observe(hosts: &dyn HostsFile) -> Result<Self> {
        Ok(Self {
            content: hosts.read()?,
            observed_at: Utc::now(),
        })
    }

    pub fn state_against(&self, composed: &str) -> SyncState {
        sync_state(composed, &self.content)
    }
}
