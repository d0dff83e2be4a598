//! Single-select exclusivity and multi-select independence.

mod common;

use hostswitch::profile::ActivationMode;

#[tokio::test]
async fn single_select_never_more_than_one_active() {
    let client = common::memory_client().await;
    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
        ids.push(client.create(name, Some(name)).await.unwrap());
    }

    // Deterministic pseudo-random toggle sequence.
    let mut x: u32 = 7;
    for _ in 0..60 {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let id = ids[(x >> 16) as usize % ids.len()];
        client.toggle_active(&id).await.unwrap();
        assert!(client.snapshot().active_count() <= 1);
    }
}

#[tokio::test]
async fn single_select_swap_and_deactivate() {
    let client = common::memory_client().await;
    let a = client.create("A", None).await.unwrap();
    let b = client.create("B", None).await.unwrap();

    client.toggle_active(&a).await.unwrap();
    assert_eq!(common::active_names(&client), vec!["A"]);

    client.toggle_active(&b).await.unwrap();
    assert_eq!(common::active_names(&client), vec!["B"]);

    client.toggle_active(&b).await.unwrap();
    assert!(common::active_names(&client).is_empty());
}

#[tokio::test]
async fn multi_select_flips_only_target() {
    let client = common::memory_client().await;
    client.set_mode(ActivationMode::MultiSelect).await.unwrap();
    let a = client.create("A", None).await.unwrap();
    let b = client.create("B", None).await.unwrap();

    client.toggle_active(&a).await.unwrap();
    client.toggle_active(&b).await.unwrap();
    assert_eq!(common::active_names(&client), vec!["A", "B"]);

    client.toggle_active(&a).await.unwrap();
    assert_eq!(common::active_names(&client), vec!["B"]);
}

#[tokio::test]
async fn switching_to_single_keeps_flags_until_next_toggle() {
    let client = common::memory_client().await;
    client.set_mode(ActivationMode::MultiSelect).await.unwrap();
    let a = client.create("A", None).await.unwrap();
    let b = client.create("B", None).await.unwrap();
    let c = client.create("C", None).await.unwrap();
    client.toggle_active(&a).await.unwrap();
    client.toggle_active(&b).await.unwrap();

    client.set_mode(ActivationMode::SingleSelect).await.unwrap();
    assert_eq!(client.snapshot().active_count(), 2);

    client.toggle_active(&c).await.unwrap();
    assert_eq!(common::active_names(&client), vec!["C"]);
}
