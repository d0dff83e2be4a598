//! Import/export bundles.
//!
//! A bundle is the portable JSON form of the whole store:
//!
//! ```json
//! { "profiles": [{ "name": "A", "content": "1.1.1.1 a", "active": true }],
//!   "common": "# shared\n", "mode": "single" }
//! ```
//!
//! Unknown fields are ignored. A non-JSON source is imported as a single raw
//! profile named after the file stem.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::{normalize_name, ActivationMode};
use crate::store::Snapshot;

pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub profiles: Vec<BundleProfile>,
    /// Replaces the local common fragment on import when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,
    /// Replaces the local activation mode on import when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ActivationMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleProfile {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub active: bool,
}

impl Bundle {
    /// Bundle carrying one inactive profile and nothing else.
    pub fn single(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            profiles: vec![BundleProfile {
                name: name.into(),
                content: content.into(),
                active: false,
            }],
            ..Self::default()
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let bundle: Bundle =
            serde_json::from_slice(bytes).map_err(|e| Error::MalformedBundle(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::MalformedBundle(e.to_string()))
    }

    /// Every profile must carry a usable name.
    pub fn validate(&self) -> Result<()> {
        for (i, p) in self.profiles.iter().enumerate() {
            normalize_name(&p.name)
                .map_err(|_| Error::MalformedBundle(format!("profile #{i} has an empty name")))?;
        }
        Ok(())
    }
}

/// Serialize a whole snapshot, profiles in creation order.
pub fn export(snapshot: &Snapshot) -> Bundle {
    Bundle {
        version: Some(BUNDLE_VERSION),
        exported_at: Some(chrono::Utc::now().to_rfc3339()),
        profiles: snapshot
            .ordered()
            .into_iter()
            .map(|p| BundleProfile {
                name: p.name.clone(),
                content: p.content.clone(),
                active: p.active,
            })
            .collect(),
        common: Some(snapshot.common.clone()),
        mode: Some(snapshot.mode),
    }
}

/// Decoded import payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Bundle(Bundle),
    Raw { name: String, content: String },
}

impl ImportSource {
    /// `.json` labels decode as bundles; anything else is a raw hosts body.
    pub fn detect(label: &str, bytes: &[u8]) -> Result<Self> {
        let path = Path::new(label);
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            return Bundle::from_json(bytes).map(ImportSource::Bundle);
        }
        let name = raw_profile_name(label)?;
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::MalformedBundle(format!("{label} is not valid UTF-8")))?;
        Ok(ImportSource::Raw { name, content })
    }

    pub fn into_bundle(self) -> Bundle {
        match self {
            ImportSource::Bundle(b) => b,
            ImportSource::Raw { name, content } => Bundle::single(name, content),
        }
    }
}

/// Profile name for a raw import: the file stem of `label`.
pub fn raw_profile_name(label: &str) -> Result<String> {
    let stem = Path::new(label)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize_name(&stem)
        .map_err(|_| Error::MalformedBundle(format!("cannot derive a name from {label:?}")))
}

/// First of `name`, `name (2)`, `name (3)`, ... that `taken` rejects.
pub fn disambiguate(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{name} ({n})");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
