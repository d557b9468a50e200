// Integration tests for `Console` against a mocked REST API.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idcon_core::{
    ActionType, AuthCredentials, BatchStatus, Console, ConsoleConfig, CoreError, EntityKind,
    FieldValue, FinishOutcome, Level, Preferences, RefreshMode, User, Wizard,
};

// ── Helpers ─────────────────────────────────────────────────────────

const ENTITLEMENTS: &str = r#"{"REALM_SEARCH":["/"],"USER_SEARCH":["/"],"USER_READ":["/"],"USER_CREATE":["/"],"USER_UPDATE":["/"],"USER_DELETE":["/"]}"#;

fn user_json(key: &str, username: &str) -> serde_json::Value {
    json!({
        "key": key,
        "username": username,
        "realm": "/",
        "status": "active",
        "lastChangeDate": "2026-10-19T10:00:00Z",
    })
}

fn provisioned(entity: serde_json::Value) -> serde_json::Value {
    json!({ "entity": entity, "propagationStatuses": [] })
}

async fn connect() -> (MockServer, Console) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/accessTokens/login"))
        .and(basic_auth("admin", "password"))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Syncope-Token", "jwt"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users/self"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Syncope-Entitlements", ENTITLEMENTS)
                .set_body_json(user_json("admin-key", "admin")),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/syncope/rest", server.uri())).unwrap();
    let config = ConsoleConfig::new(
        url,
        AuthCredentials::Password {
            username: "admin".into(),
            password: SecretString::from("password".to_owned()),
        },
    );
    let console = Console::connect(config, |_| Preferences::default())
        .await
        .unwrap();
    (server, console)
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_loads_session_entitlements() {
    let (_server, console) = connect().await;

    let session = console.session();
    assert_eq!(session.username(), "admin");
    assert!(session.owns("USER_READ,USER_UPDATE", &["/even"]));
    assert!(!session.owns("ROLE_CREATE", &[]));
    assert!(console
        .ensure_allowed(EntityKind::Role, ActionType::Create, None)
        .is_err());
}

// ── Directories ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_user_directory_third_page_of_twenty_five() {
    let (server, console) = connect().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("size", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 0, "totalCount": 25, "result": [],
        })))
        .mount(&server)
        .await;

    let last_five: Vec<_> = (21..=25)
        .map(|i| user_json(&format!("u{i}"), &format!("user{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("page", "3"))
        .and(query_param("size", "10"))
        .and(query_param("realm", "/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 3, "size": 10, "totalCount": 25, "result": last_five,
        })))
        .mount(&server)
        .await;

    let mut view = console.directory(EntityKind::User, console.users(None, None));
    assert!(view.checkboxes());
    view.goto(2).await.unwrap();

    let keys: Vec<_> = view.rows().iter().filter_map(|u| u.key.clone()).collect();
    assert_eq!(keys, vec!["u21", "u22", "u23", "u24", "u25"]);
    assert_eq!(view.pagination().total, 25);
    assert_eq!(view.pagination().range_label(), "21-25 of 25");
}

#[tokio::test]
async fn test_delete_sends_row_entity_tag_and_refresh_clamps() {
    let (server, console) = connect().await;

    Mock::given(method("DELETE"))
        .and(path("/syncope/rest/users/u11"))
        .and(header("If-Match", "\"1792404000000\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(provisioned(user_json("u11", "user11"))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("size", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 0, "totalCount": 10, "result": [],
        })))
        .mount(&server)
        .await;

    let first_ten: Vec<_> = (1..=10)
        .map(|i| user_json(&format!("u{i}"), &format!("user{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("page", "1"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 10, "totalCount": 10, "result": first_ten,
        })))
        .mount(&server)
        .await;

    let victim: User = serde_json::from_value(user_json("u11", "user11")).unwrap();
    console.delete(&victim).await.unwrap();

    // Page 2 no longer exists once the eleventh user is gone.
    let mut view = console.directory(EntityKind::User, console.users(None, None));
    view.goto(1).await.unwrap();
    assert_eq!(view.pagination().page, 0);
    assert_eq!(view.rows().len(), 10);
}

// ── Wizards ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wizard_without_key_creates() {
    let (server, console) = connect().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/users"))
        .and(body_partial_json(json!({"username": "rossini", "realm": "/"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(provisioned(user_json("new-key", "rossini"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut wizard = Wizard::create(User {
        username: "rossini".into(),
        realm: "/".into(),
        ..User::default()
    });
    let outcome = console.finish_wizard(&mut wizard).await;

    match outcome {
        FinishOutcome::Closed { entity, created } => {
            assert!(created);
            assert_eq!(entity.key.as_deref(), Some("new-key"));
        }
        FinishOutcome::Open { error } => panic!("wizard stayed open: {error}"),
    }
    let notes = console.session().drain_notifications();
    assert_eq!(notes[0].level, Level::Success);
}

#[tokio::test]
async fn test_edit_wizard_updates_with_read_entity_tag() {
    let (server, console) = connect().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users/u1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"42\"")
                .set_body_json(user_json("u1", "rossini")),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/syncope/rest/users/u1"))
        .and(header("If-Match", "\"42\""))
        .and(body_partial_json(json!({"username": "verdi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(provisioned(user_json("u1", "verdi"))))
        .expect(1)
        .mount(&server)
        .await;

    let row: User = serde_json::from_value(user_json("u1", "rossini")).unwrap();
    let mut wizard = console.edit_wizard(&row).await.unwrap();
    assert_eq!(wizard.etag(), Some("\"42\""));
    wizard.set("username", FieldValue::text("verdi")).unwrap();

    let outcome = console.finish_wizard(&mut wizard).await;
    assert!(matches!(outcome, FinishOutcome::Closed { created: false, .. }));
}

#[tokio::test]
async fn test_rejected_submit_keeps_wizard_open_and_notifies() {
    let (server, console) = connect().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "type": "InvalidUser",
            "elements": ["username already taken"],
        })))
        .mount(&server)
        .await;

    let mut wizard = Wizard::create(User {
        username: "rossini".into(),
        realm: "/".into(),
        ..User::default()
    });
    let outcome = console.finish_wizard(&mut wizard).await;

    assert!(!outcome.is_closed());
    assert!(wizard.error().unwrap().contains("InvalidUser"));
    let notes = console.session().drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Error);
    assert!(notes[0].message.contains("username already taken"));
}

// ── Batch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_suspend_records_each_key() {
    let (server, console) = connect().await;

    for key in ["u1", "u2"] {
        Mock::given(method("GET"))
            .and(path(format!("/syncope/rest/users/{key}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"7\"")
                    .set_body_json(user_json(key, key)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/syncope/rest/users/u1/status"))
        .and(header("If-Match", "\"7\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(provisioned(user_json("u1", "u1"))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/syncope/rest/users/u2/status"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;

    let keys = vec!["u1".to_owned(), "u2".to_owned()];
    let report = console
        .run_batch(EntityKind::User, ActionType::Suspend, &keys)
        .await
        .unwrap();

    assert_eq!(report.results["u1"], BatchStatus::Success);
    assert!(!report.results["u2"].is_success());
    assert_eq!(report.summary(), "Suspend: 1 succeeded, 1 failed");
}

#[tokio::test]
async fn test_batch_rejects_action_without_batch_form() {
    let (_server, console) = connect().await;

    let err = console
        .run_batch(EntityKind::Role, ActionType::Delete, &["r1".to_owned()])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unsupported { .. }));
}

#[tokio::test]
async fn test_refresh_view_after_create_shows_last_page() {
    let (server, console) = connect().await;
    let last_six: Vec<_> = (21..=26)
        .map(|i| user_json(&format!("u{i}"), &format!("user{i}")))
        .collect();

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("size", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 0, "totalCount": 26, "result": [],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 3, "size": 10, "totalCount": 26,
            "result": last_six,
        })))
        .mount(&server)
        .await;

    let mut view = console.directory(EntityKind::User, console.users(None, None));
    view.refresh(RefreshMode::LastPage).await.unwrap();
    assert_eq!(view.pagination().page, 2);
    assert_eq!(view.rows().len(), 6);
}
