//! Composition order, determinism and idempotence.

mod common;

use hostswitch::compose::compose;
use hostswitch::profile::{ActivationMode, Profile, ProfileId};
use hostswitch::store::Snapshot;

fn profile(name: &str, content: &str, active: bool, seq: u64) -> Profile {
    Profile {
        id: ProfileId::generate(),
        name: name.into(),
        content: content.into(),
        active,
        seq,
    }
}

#[test]
fn common_first_then_active_by_creation_order() {
    // Listed out of creation order on purpose.
    let snapshot = Snapshot::new(
        vec![
            profile("late", "3.3.3.3 c\n", true, 5),
            profile("off", "9.9.9.9 x\n", false, 1),
            profile("early", "1.1.1.1 a\n", true, 0),
        ],
        "# shared\n".into(),
        ActivationMode::MultiSelect,
    );
    assert_eq!(compose(&snapshot), "# shared\n1.1.1.1 a\n3.3.3.3 c\n");
}

#[test]
fn missing_trailing_newline_does_not_fuse_lines() {
    let snapshot = Snapshot::new(
        vec![profile("a", "1.1.1.1 a", true, 0), profile("b", "2.2.2.2 b", true, 1)],
        "# shared".into(),
        ActivationMode::MultiSelect,
    );
    assert_eq!(compose(&snapshot), "# shared\n1.1.1.1 a\n2.2.2.2 b");
}

#[test]
fn empty_everything_composes_to_empty() {
    assert_eq!(compose(&Snapshot::default()), "");
}

#[test]
fn composition_is_deterministic() {
    let snapshot = Snapshot::new(
        vec![profile("a", "1.1.1.1 a\n", true, 0), profile("b", "2.2.2.2 b\n", true, 0)],
        "# shared\n".into(),
        ActivationMode::MultiSelect,
    );
    assert_eq!(compose(&snapshot).as_bytes(), compose(&snapshot).as_bytes());
}

#[tokio::test]
async fn toggle_on_then_off_leaves_output_unchanged() {
    let client = common::memory_client().await;
    client.set_common("# shared\n").await.unwrap();
    let a = client.create("A", Some("1.1.1.1 a\n")).await.unwrap();
    let b = client.create("B", Some("2.2.2.2 b\n")).await.unwrap();
    client.toggle_active(&a).await.unwrap();
    let before = client.compose();

    client.toggle_active(&b).await.unwrap();
    client.toggle_active(&b).await.unwrap();
    client.toggle_active(&a).await.unwrap();

    // Single-select: b took over from a, then was switched off, then a back on.
    assert_eq!(client.compose(), before);
}

#[tokio::test]
async fn multi_select_toggle_pair_is_noop() {
    let client = common::memory_client().await;
    client.set_mode(ActivationMode::MultiSelect).await.unwrap();
    let a = client.create("A", Some("1.1.1.1 a\n")).await.unwrap();
    let b = client.create("B", Some("2.2.2.2 b\n")).await.unwrap();
    client.toggle_active(&a).await.unwrap();
    let before = client.compose();

    client.toggle_active(&b).await.unwrap();
    client.toggle_active(&b).await.unwrap();
    assert_eq!(client.compose(), before);
}
