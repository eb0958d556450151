//! REST backing store against a mock tenant API

mod common;

use library_core::library::{
    analyze, ContentStore, HttpStore, InstallCounts, Installer, LedgerStore, LibraryStore,
    MemoryLedger, RecordKind, TenantEntry,
};
use library_core::LibraryError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer, token: Option<&str>) -> HttpStore {
    HttpStore::new(
        &format!("{}/api/", server.uri()),
        "acme",
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_and_create_with_bearer_token() {
    common::init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tenants/acme/wiki"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "w-1", "title": "MQL", "trigger": "mql", "enabled": true}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/tenants/acme/wiki"))
        .and(body_json(json!({
            "title": "ARR",
            "trigger": "arr",
            "aliases": [],
            "category": null,
            "definition": "What ARR means",
            "link": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "w-2",
            "title": "ARR",
            "trigger": "arr",
            "definition": "What ARR means"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server, Some("s3cret"));
    let corpus = store.list_all().await.unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus[0].title(), "MQL");

    let created = store.create(&common::entry("ARR", "arr")).await.unwrap();
    assert_eq!(created.id, "w-2");
    assert!(created.enabled);
}

#[tokio::test]
async fn test_create_accepts_id_only_response() {
    common::init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/tenants/acme/wiki"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "w-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn ContentStore> = Arc::new(store_for(&server, None));
    let ledger = Arc::new(MemoryLedger::new());
    let installer = Installer::new(store, ledger.clone());

    let analysis = analyze(&[], vec![common::entry("ARR", "arr")]);
    let result = installer
        .install(&common::pack("revops", "1", "b.json"), &analysis.candidates)
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.error_count, 0);
    assert_eq!(result.owned_entry_ids, vec!["w-42".to_string()]);

    let record = ledger.get("revops").await.unwrap().unwrap();
    assert_eq!(record.owned_entry_ids, vec!["w-42".to_string()]);
}

#[tokio::test]
async fn test_create_keeps_sent_content_for_id_only_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenants/acme/wiki"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "w-43",
            "createdAt": "2025-06-01T08:00:00Z"
        })))
        .mount(&server)
        .await;

    let sent = common::entry("NRR", "nrr");
    let created = store_for(&server, None).create(&sent).await.unwrap();

    assert_eq!(created.id, "w-43");
    assert_eq!(created.content, sent);
    assert!(created.enabled);
    assert!(created.created_at.is_some());
}

#[tokio::test]
async fn test_ids_are_escaped_as_single_path_segments() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tenants/acme/wiki/w%2F9%3Fx%23y"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenants/acme.com%2Feu/libraries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/libraries/lib%2F1/install"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "wikiEntries": 0, "plays": 0, "banners": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    store.delete("w/9?x#y").await.unwrap();
    store.install_library("lib/1", "globex").await.unwrap();

    let other = HttpStore::new(
        &format!("{}/api", server.uri()),
        "acme.com/eu",
        None,
        Duration::from_secs(5),
    )
    .unwrap();
    assert!(other.list_my_libraries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_writes_are_entry_write_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenants/acme/wiki"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tenants/acme/wiki/w-9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let err = store.create(&common::entry("ARR", "arr")).await.unwrap_err();
    assert!(matches!(err, LibraryError::EntryWriteFailed { .. }));

    let err = store.delete("w-9").await.unwrap_err();
    assert!(matches!(err, LibraryError::EntryWriteFailed { .. }));
}

#[tokio::test]
async fn test_install_over_http_replaces_duplicate() {
    common::init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/tenants/acme/wiki/w-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tenants/acme/wiki"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "w-7",
            "title": "Marketing Qualified Lead",
            "trigger": "mql"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn ContentStore> = Arc::new(store_for(&server, None));
    let ledger = Arc::new(MemoryLedger::new());
    let installer = Installer::new(store, ledger);

    let existing: Vec<TenantEntry> = vec![serde_json::from_value(json!({
        "id": "w-1", "title": "MQL", "trigger": "mql"
    }))
    .unwrap()];
    let mut analysis = analyze(
        &existing,
        vec![common::entry("Marketing Qualified Lead", "mql")],
    );
    analysis.candidates[0].selected = true;

    let result = installer
        .install(&common::pack("revops", "1", "b.json"), &analysis.candidates)
        .await
        .unwrap();
    assert_eq!(result.deleted_duplicates, 1);
    assert_eq!(result.owned_entry_ids, vec!["w-7".to_string()]);
}

#[tokio::test]
async fn test_library_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tenants/acme/libraries/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenants/acme/plays"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p-1", "title": "Beat Competitor X", "steps": ["discover", "demo"]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/libraries/lib-1/install"))
        .and(body_json(json!({"targetTenantId": "globex"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "wikiEntries": 3, "plays": 1, "banners": 0
        })))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    assert!(store.get_library_by_id("missing").await.unwrap().is_none());

    let plays = store.list_records(RecordKind::Play).await.unwrap();
    assert_eq!(plays[0].display_title(), "Beat Competitor X");
    assert!(plays[0].fields.contains_key("steps"));

    let counts = store.install_library("lib-1", "globex").await.unwrap();
    assert_eq!(
        counts,
        InstallCounts {
            wiki_entries: 3,
            plays: 1,
            banners: 0
        }
    );
}
