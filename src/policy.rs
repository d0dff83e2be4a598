//! Activation policy: the next legal active set for a toggle.
//!
//! Pure decision logic. The result is committed by the caller as a single
//! durable mutation, so a single-select swap from A to B is never observed
//! with both (or, transiently, neither) active.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::profile::{ActivationMode, Profile, ProfileId};

/// The complete set of profiles that should be active after a mutation.
pub type ActiveSet = BTreeSet<ProfileId>;

/// Active set currently described by `profiles`.
pub fn current_active_set(profiles: &[Profile]) -> ActiveSet {
    profiles.iter().filter(|p| p.active).map(|p| p.id).collect()
}

/// Compute the active set after toggling `id` under `mode`.
///
/// Under `SingleSelect` toggling an inactive profile makes it the only active
/// one and toggling an active profile leaves none active, which also repairs
/// a store that still has several active profiles from `MultiSelect`.
pub fn next_active_set(
    profiles: &[Profile],
    mode: ActivationMode,
    id: &ProfileId,
) -> Result<ActiveSet> {
    let target = profiles
        .iter()
        .find(|p| &p.id == id)
        .ok_or(Error::NotFound(*id))?;

    let next = match mode {
        ActivationMode::SingleSelect => {
            if target.active {
                ActiveSet::new()
            } else {
                ActiveSet::from([*id])
            }
        }
        ActivationMode::MultiSelect => {
            let mut set = current_active_set(profiles);
            if !set.remove(id) {
                set.insert(*id);
            }
            set
        }
    };
    Ok(next)
}
