//! Integration tests for the sync orchestrator and media reconciler,
//! running against an in-memory database and a mock provider.

use instafeed::models::connection::{Entity as Connection, INVALID_TOKEN_SENTINEL};
use instafeed::orchestrator::{SyncOrchestrator, SyncOutcome};
use instafeed::repositories::MediaRepository;
use sea_orm::{ConnectionTrait, EntityTrait, Statement};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils;
use test_utils::{
    account_details, client_for, insert_connection, media_entry, oauth_error_body, setup_test_db,
    test_sync_config,
};

fn orchestrator_for(db: &sea_orm::DatabaseConnection, mock_uri: &str) -> SyncOrchestrator {
    SyncOrchestrator::new(
        Arc::new(db.clone()),
        client_for(mock_uri),
        &test_sync_config(),
    )
}

#[tokio::test]
async fn run_isolates_failures_and_marks_revoked_tokens() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    // A: healthy, B: sentinel already set, C: provider reports code 190
    let a = insert_connection(&db, "a.myshopify.com", "111", "token_a", 30, 1)
        .await
        .unwrap();
    let _b = insert_connection(&db, "b.myshopify.com", "222", INVALID_TOKEN_SENTINEL, 30, 2)
        .await
        .unwrap();
    let c = insert_connection(&db, "c.myshopify.com", "333", "token_c", 30, 3)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/111/media"))
        .and(query_param("access_token", "token_a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                media_entry("m1", "IMAGE"),
                media_entry("m2", "VIDEO"),
                media_entry("m3", "IMAGE"),
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("access_token", "token_a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 42)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/333/media"))
        .and(query_param("access_token", "token_c"))
        .respond_with(ResponseTemplate::new(400).set_body_json(oauth_error_body()))
        .mount(&mock_server)
        .await;

    let report = orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();

    assert_eq!(report.total_shops, 3);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.fail_count, 2);

    assert_eq!(report.results[0].shop, "a.myshopify.com");
    match &report.results[0].outcome {
        SyncOutcome::Success {
            media_count,
            images,
            videos,
        } => {
            assert_eq!(*media_count, 3);
            assert_eq!(*images, 2);
            assert_eq!(*videos, 1);
        }
        other => panic!("expected success for A, got {other:?}"),
    }

    assert_eq!(report.results[1].shop, "b.myshopify.com");
    assert!(matches!(
        &report.results[1].outcome,
        SyncOutcome::Skipped { reason } if reason == "token_expired"
    ));

    assert_eq!(report.results[2].shop, "c.myshopify.com");
    assert!(matches!(&report.results[2].outcome, SyncOutcome::Failed { .. }));

    // C's token became the sentinel so the next run skips it cheaply.
    let c_after = Connection::find_by_id(c.id).one(&db).await.unwrap().unwrap();
    assert_eq!(c_after.access_token, INVALID_TOKEN_SENTINEL);

    // A's profile was refreshed from the provider.
    let a_after = Connection::find_by_id(a.id).one(&db).await.unwrap().unwrap();
    assert_eq!(a_after.username, "shop_a");
    assert_eq!(a_after.media_count, 42);

    // The sentinel connection must cause zero network calls.
    let requests = mock_server.received_requests().await.unwrap();
    assert!(
        requests.iter().all(|request| {
            !request
                .url
                .query_pairs()
                .any(|(key, value)| key == "access_token" && value == INVALID_TOKEN_SENTINEL)
        }),
        "sentinel token must never be sent to the provider"
    );
}

#[tokio::test]
async fn sentinel_connection_reports_skipped_again_on_next_run() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    insert_connection(&db, "b.myshopify.com", "222", INVALID_TOKEN_SENTINEL, 30, 1)
        .await
        .unwrap();

    let orchestrator = orchestrator_for(&db, &mock_server.uri());
    for _ in 0..2 {
        let report = orchestrator.run().await.unwrap();
        assert!(matches!(
            &report.results[0].outcome,
            SyncOutcome::Skipped { .. }
        ));
    }

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_remote_response_preserves_stored_media() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    let connection = insert_connection(&db, "a.myshopify.com", "111", "token_a", 30, 1)
        .await
        .unwrap();

    // Seed two stored items via a first reconciliation.
    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media_entry("m1", "IMAGE"), media_entry("m2", "VIDEO")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 2)),
        )
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator_for(&db, &mock_server.uri());
    orchestrator.run().await.unwrap();

    let media_repo = MediaRepository::new(Arc::new(db.clone()));
    let count_before = media_repo.count_for_connection(connection.id).await.unwrap();
    assert_eq!(count_before, 2);

    // Provider hiccup: empty page. Stored media must survive.
    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 2)),
        )
        .mount(&mock_server)
        .await;

    let report = orchestrator.run().await.unwrap();
    match &report.results[0].outcome {
        SyncOutcome::Success { media_count, .. } => assert_eq!(*media_count, 0),
        other => panic!("expected zero-count success, got {other:?}"),
    }

    let count_after = media_repo.count_for_connection(connection.id).await.unwrap();
    assert_eq!(count_before, count_after);
}

#[tokio::test]
async fn reconciliation_is_idempotent_for_unchanged_remote_set() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    let connection = insert_connection(&db, "a.myshopify.com", "111", "token_a", 30, 1)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                media_entry("m1", "IMAGE"),
                media_entry("m2", "VIDEO"),
                media_entry("m3", "IMAGE"),
            ]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 3)),
        )
        .mount(&mock_server)
        .await;

    let orchestrator = orchestrator_for(&db, &mock_server.uri());
    let media_repo = MediaRepository::new(Arc::new(db.clone()));

    orchestrator.run().await.unwrap();
    let first: Vec<(String, i32)> = media_repo
        .list_for_connection(connection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.instagram_media_id, m.display_order))
        .collect();

    orchestrator.run().await.unwrap();
    let second: Vec<(String, i32)> = media_repo
        .list_for_connection(connection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.instagram_media_id, m.display_order))
        .collect();

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            ("m1".to_string(), 1),
            ("m2".to_string(), 2),
            ("m3".to_string(), 3)
        ]
    );
}

#[tokio::test]
async fn stores_at_most_ten_items_in_fetch_order() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    let connection = insert_connection(&db, "a.myshopify.com", "111", "token_a", 30, 1)
        .await
        .unwrap();

    let entries: Vec<serde_json::Value> = (1..=15)
        .map(|i| media_entry(&format!("m{i}"), "IMAGE"))
        .collect();

    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": entries })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 15)),
        )
        .mount(&mock_server)
        .await;

    orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();

    let media_repo = MediaRepository::new(Arc::new(db.clone()));
    let stored = media_repo.list_for_connection(connection.id).await.unwrap();
    assert_eq!(stored.len(), 10);
    for (index, item) in stored.iter().enumerate() {
        assert_eq!(item.instagram_media_id, format!("m{}", index + 1));
        assert_eq!(item.display_order, index as i32 + 1);
    }
}

#[tokio::test]
async fn albums_are_filtered_and_display_order_stays_dense() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    let connection = insert_connection(&db, "a.myshopify.com", "111", "token_a", 30, 1)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                media_entry("img1", "IMAGE"),
                media_entry("alb1", "CAROUSEL_ALBUM"),
                media_entry("vid1", "VIDEO"),
                media_entry("alb2", "CAROUSEL_ALBUM"),
                media_entry("img2", "IMAGE"),
            ]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 5)),
        )
        .mount(&mock_server)
        .await;

    let report = orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();
    match &report.results[0].outcome {
        SyncOutcome::Success {
            media_count,
            images,
            videos,
        } => {
            assert_eq!(*media_count, 3);
            assert_eq!(*images, 2);
            assert_eq!(*videos, 1);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let media_repo = MediaRepository::new(Arc::new(db.clone()));
    let stored = media_repo.list_for_connection(connection.id).await.unwrap();
    let ids_and_orders: Vec<(String, i32)> = stored
        .into_iter()
        .map(|m| (m.instagram_media_id, m.display_order))
        .collect();
    assert_eq!(
        ids_and_orders,
        vec![
            ("img1".to_string(), 1),
            ("vid1".to_string(), 2),
            ("img2".to_string(), 3)
        ]
    );
}

#[tokio::test]
async fn token_expiring_within_lead_window_is_refreshed_and_used() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    // Expires in 6 days, inside the 7-day lead window.
    let connection = insert_connection(&db, "a.myshopify.com", "111", "old_token", 6, 1)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/refresh_access_token"))
        .and(query_param("grant_type", "ig_exchange_token"))
        .and(query_param("access_token", "old_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_token",
            "token_type": "bearer",
            "expires_in": 5_184_000
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Media and profile mocks only answer the refreshed token, proving the
    // run already uses it.
    Mock::given(method("GET"))
        .and(path("/111/media"))
        .and(query_param("access_token", "new_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media_entry("m1", "IMAGE")]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("access_token", "new_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 1)),
        )
        .mount(&mock_server)
        .await;

    let report = orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();
    assert_eq!(report.success_count, 1);

    let after = Connection::find_by_id(connection.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.access_token, "new_token");

    let remaining = after.token_expires_at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    assert!(remaining > chrono::Duration::days(59));
    assert!(remaining <= chrono::Duration::days(60));
}

#[tokio::test]
async fn token_outside_lead_window_is_not_refreshed() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    // Expires in 8 days, outside the 7-day lead window.
    insert_connection(&db, "a.myshopify.com", "111", "token_a", 8, 1)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/111/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media_entry("m1", "IMAGE")]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 1)),
        )
        .mount(&mock_server)
        .await;

    orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|request| request.url.path() != "/refresh_access_token"),
        "no refresh attempt expected outside the lead window"
    );
}

#[tokio::test]
async fn refresh_failure_is_swallowed_and_sync_uses_stale_token() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    let connection = insert_connection(&db, "a.myshopify.com", "111", "stale_token", 2, 1)
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/refresh_access_token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream busted"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/111/media"))
        .and(query_param("access_token", "stale_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media_entry("m1", "IMAGE")]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("access_token", "stale_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_details("111", "shop_a", 1)),
        )
        .mount(&mock_server)
        .await;

    let report = orchestrator_for(&db, &mock_server.uri()).run().await.unwrap();
    assert_eq!(report.success_count, 1);

    let after = Connection::find_by_id(connection.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.access_token, "stale_token");
}

#[tokio::test]
async fn run_fails_when_connections_cannot_be_loaded() {
    let db = setup_test_db().await.unwrap();
    let mock_server = MockServer::start().await;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "DROP TABLE instagram_connections".to_string(),
    ))
    .await
    .unwrap();

    let result = orchestrator_for(&db, &mock_server.uri()).run().await;
    assert!(result.is_err());
}
