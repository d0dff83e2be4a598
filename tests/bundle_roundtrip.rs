//! Export then import into an empty store; collision and raw import rules.

mod common;

use hostswitch::bundle::{Bundle, ImportSource};
use hostswitch::profile::ActivationMode;
use hostswitch::Error;

#[tokio::test]
async fn export_import_round_trip() {
    let source = common::memory_client().await;
    source.set_common("# shared\n").await.unwrap();
    let a = source.create("A", Some("1.1.1.1 a")).await.unwrap();
    source.create("B", Some("2.2.2.2 b")).await.unwrap();
    source.toggle_active(&a).await.unwrap();

    let json = source.export_bundle().to_json().unwrap();

    let target = common::memory_client().await;
    target
        .import_bundle(&Bundle::from_json(json.as_bytes()).unwrap())
        .await
        .unwrap();

    let snap = target.snapshot();
    assert_eq!(snap.mode, ActivationMode::SingleSelect);
    assert_eq!(snap.common, "# shared\n");
    let got: Vec<(&str, &str, bool)> = snap
        .ordered()
        .into_iter()
        .map(|p| (p.name.as_str(), p.content.as_str(), p.active))
        .collect();
    assert_eq!(got, vec![("A", "1.1.1.1 a", true), ("B", "2.2.2.2 b", false)]);
    assert!(snap.find(&a).is_none(), "ids are regenerated");
}

#[test]
fn bundle_schema_ignores_unknown_fields() {
    let json = br#"{
        "mode": "multi",
        "profiles": [{ "name": "A", "content": "1.1.1.1 a", "active": true, "color": "red" }],
        "common": "",
        "theme": "dark"
    }"#;
    let bundle = Bundle::from_json(json).unwrap();
    assert_eq!(bundle.mode, Some(ActivationMode::MultiSelect));
    assert_eq!(bundle.profiles.len(), 1);
}

#[test]
fn malformed_bundle_rejected() {
    assert!(matches!(
        Bundle::from_json(b"{ \"profiles\": 3 }"),
        Err(Error::MalformedBundle(_))
    ));
    assert!(matches!(
        Bundle::from_json(br#"{ "profiles": [{ "name": "  " }] }"#),
        Err(Error::MalformedBundle(_))
    ));
}

#[tokio::test]
async fn import_renames_on_conflict() {
    let client = common::memory_client().await;
    client.create("Work", Some("local")).await.unwrap();
    client.create("Work (2)", Some("local 2")).await.unwrap();

    let json = br#"{ "profiles": [{ "name": "Work", "content": "imported" }] }"#;
    client
        .import_bundle(&Bundle::from_json(json).unwrap())
        .await
        .unwrap();

    let snap = client.snapshot();
    assert_eq!(snap.find_by_name("Work").unwrap().content, "local");
    assert_eq!(snap.find_by_name("Work (3)").unwrap().content, "imported");
}

#[tokio::test]
async fn import_under_single_select_keeps_one_active() {
    let client = common::memory_client().await;
    let local = client.create("Local", None).await.unwrap();
    client.toggle_active(&local).await.unwrap();

    let json = br#"{ "profiles": [
        { "name": "X", "active": true },
        { "name": "Y", "active": true }
    ] }"#;
    client
        .import_bundle(&Bundle::from_json(json).unwrap())
        .await
        .unwrap();

    assert_eq!(common::active_names(&client), vec!["X"]);
}

#[tokio::test]
async fn raw_import_uses_file_stem() {
    let client = common::memory_client().await;
    let body = "10.0.0.9 dev.local\n# not validated {{";
    let ids = client
        .import_source("/tmp/backups/dev-box.hosts", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(ids.len(), 1);
    let snap = client.snapshot();
    let p = snap.find(&ids[0]).unwrap();
    assert_eq!(p.name, "dev-box");
    assert_eq!(p.content, body);
    assert!(!p.active);
}

#[test]
fn detect_picks_bundle_for_json_labels() {
    let src = ImportSource::detect("backup.JSON", br#"{ "profiles": [] }"#).unwrap();
    assert!(matches!(src, ImportSource::Bundle(_)));
    let src = ImportSource::detect("office.txt", b"1.2.3.4 x").unwrap();
    assert_eq!(
        src,
        ImportSource::Raw {
            name: "office".into(),
            content: "1.2.3.4 x".into()
        }
    );
}

#[tokio::test]
async fn raw_import_collision_gets_suffix() {
    let client = common::memory_client().await;
    client.create("office", Some("old")).await.unwrap();

    let id = client.import_raw("office.hosts", "10.1.1.1 printer").await.unwrap();

    let snap = client.snapshot();
    let p = snap.find(&id).unwrap();
    assert_eq!(p.name, "office (2)");
    assert_eq!(p.content, "10.1.1.1 printer");
    assert_eq!(snap.find_by_name("office").unwrap().content, "old");
}
