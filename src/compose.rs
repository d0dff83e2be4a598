//! Composition of the candidate system hosts body.

use crate::store::Snapshot;

/// Render the common fragment followed by every active profile, in
/// `(seq, id)` order.
///
/// Fragments are joined verbatim; a newline is inserted only where a
/// fragment lacks a trailing one and more content follows. Empty fragments
/// add nothing.
pub fn compose(snapshot: &Snapshot) -> String {
    let fragments = std::iter::once(snapshot.common.as_str())
        .chain(snapshot.active_profiles().into_iter().map(|p| p.content.as_str()))
        .filter(|f| !f.is_empty());

    let mut out = String::new();
    for fragment in fragments {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(fragment);
    }
    out
}

/// Whether the OS hosts file matches what composition would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    InSync,
    Diverged,
}

pub fn sync_state(composed: &str, mirror: &str) -> SyncState {
    if composed == mirror {
        SyncState::InSync
    } else {
        SyncState::Diverged
    }
}
