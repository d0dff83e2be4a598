//! Profile entities and the activation mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable, opaque profile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(uuid::Uuid);

impl ProfileId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// A named, independently activatable hosts fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub content: String,
    pub active: bool,
    /// Creation sequence assigned by the backend; the composition order key.
    pub seq: u64,
}

/// Whether at most one or any number of profiles may be active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationMode {
    #[default]
    #[serde(rename = "single")]
    SingleSelect,
    #[serde(rename = "multi")]
    MultiSelect,
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationMode::SingleSelect => f.write_str("single"),
            ActivationMode::MultiSelect => f.write_str("multi"),
        }
    }
}

/// Trim a requested profile name and reject empty ones.
pub fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
