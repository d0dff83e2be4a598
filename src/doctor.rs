//! Doctor command: health checks for the store and the hosts file.

use crate::compose::SyncState;
use crate::hosts::SystemMirror;
use crate::platform::HostsFile;
use crate::profile::ActivationMode;
use crate::store::Snapshot;

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
}

impl CheckResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Run all doctor checks against a loaded snapshot.
pub fn run_checks(snapshot: &Snapshot, hosts: &dyn HostsFile) -> Vec<CheckResult> {
    let mut results = Vec::new();

    // 1. Store summary
    results.push(CheckResult::pass(format!(
        "{} profile(s), {} active, mode {}",
        snapshot.profiles.len(),
        snapshot.active_count(),
        snapshot.mode
    )));

    // 2. Single-select invariant
    if snapshot.mode == ActivationMode::SingleSelect && snapshot.active_count() > 1 {
        let names: Vec<&str> = snapshot
            .active_profiles()
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        results.push(CheckResult::fail(format!(
            "single-select mode with several active profiles ({}); the next toggle will resolve it",
            names.join(", ")
        )));
    }

    // 3. Duplicate names
    let mut names: Vec<&str> = snapshot.profiles.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    let before = names.len();
    names.dedup();
    if names.len() != before {
        results.push(CheckResult::fail("duplicate profile names in store"));
    }

    // 4. Hosts file readable and in sync
    let path = hosts.path().display().to_string();
    match SystemMirror::observe(hosts) {
        Ok(mirror) => {
            let composed = crate::compose::compose(snapshot);
            match mirror.state_against(&composed) {
                SyncState::InSync => {
                    results.push(CheckResult::pass(format!("{path} matches composed output")))
                }
                SyncState::Diverged => results.push(CheckResult::fail(format!(
                    "{path} differs from composed output. Run 'hostswitch apply'."
                ))),
            }
        }
        Err(e) => results.push(CheckResult::fail(format!("cannot read {path}: {e}"))),
    }

    results
}
