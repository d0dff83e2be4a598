//! Interactive session context.
//!
//! Holds what the agent is looking at (the system mirror, the common
//! fragment, or one profile) and routes reads and saves to the right place.
//! Passed explicitly; nothing here is global.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hosts::SystemMirror;
use crate::platform::{self, HostsFile};
use crate::profile::ProfileId;
use crate::sync::SyncClient;

/// Entry currently selected for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    System,
    Common,
    Profile(ProfileId),
}

pub struct Session {
    pub client: SyncClient,
    hosts: Arc<dyn HostsFile>,
    selection: Option<Selection>,
    mirror: Option<SystemMirror>,
}

impl Session {
    pub fn new(client: SyncClient, hosts: Arc<dyn HostsFile>) -> Self {
        Self {
            client,
            hosts,
            selection: None,
            mirror: None,
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn hosts_file(&self) -> &dyn HostsFile {
        self.hosts.as_ref()
    }

    /// Last observed system mirror, if any.
    pub fn mirror(&self) -> Option<&SystemMirror> {
        self.mirror.as_ref()
    }

    /// Re-read the OS hosts file into the mirror.
    pub fn refresh_mirror(&mut self) -> Result<&SystemMirror> {
        let mirror = SystemMirror::observe(self.hosts.as_ref())?;
        Ok(self.mirror.insert(mirror))
    }

    /// Select an entry. Selecting a profile the cache does not know fails
    /// with `NotFound`; selecting the system entry refreshes the mirror.
    pub fn select(&mut self, selection: Selection) -> Result<()> {
        match selection {
            Selection::Profile(id) if self.client.store().find(&id).is_none() => {
                return Err(Error::NotFound(id));
            }
            Selection::System => {
                self.refresh_mirror()?;
            }
            _ => {}
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Text of the selected entry, or `None` with nothing selected.
    pub fn selected_content(&self) -> Option<String> {
        let snapshot = self.client.snapshot();
        match self.selection? {
            Selection::System => self.mirror.as_ref().map(|m| m.content.clone()),
            Selection::Common => Some(snapshot.common.clone()),
            Selection::Profile(id) => snapshot.find(&id).map(|p| p.content.clone()),
        }
    }

    /// Save `content` into the selected entry. Saving the system entry writes
    /// the OS hosts file directly and refreshes the mirror.
    pub async fn save_selected(&mut self, content: &str) -> Result<()> {
        match self.selection {
            None => Ok(()),
            Some(Selection::Common) => self.client.set_common(content).await,
            Some(Selection::Profile(id)) => self.client.update_content(&id, content).await,
            Some(Selection::System) => {
                platform::write_blocking(&self.hosts, content).await?;
                tracing::info!(path = %self.hosts.path().display(), "system hosts edited directly");
                self.refresh_mirror().map(|_| ())
            }
        }
    }

    /// Delete a profile, clearing the selection if it pointed at it.
    pub async fn delete_profile(&mut self, id: &ProfileId) -> Result<()> {
        self.client.delete(id).await?;
        if self.selection == Some(Selection::Profile(*id)) {
            self.selection = None;
        }
        Ok(())
    }

    /// Create a profile and select it.
    pub async fn create_profile(&mut self, name: &str, content: Option<&str>) -> Result<ProfileId> {
        let id = self.client.create(name, content).await?;
        self.selection = Some(Selection::Profile(id));
        Ok(id)
    }

    /// Write the composed body to the OS hosts file and refresh the mirror.
    pub async fn apply(&mut self) -> Result<String> {
        let composed = self.client.apply(&self.hosts).await?;
        self.refresh_mirror()?;
        Ok(composed)
    }
}
