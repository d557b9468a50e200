// Integration tests for `RestClient` using wiremock.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idcon_api::{
    AttrSchemaType, Error, ListQuery, PlainSchema, RestClient, Role, SchemaType, StatusType,
    TransportConfig, User,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::new(
        &format!("{}/syncope/rest", server.uri()),
        "Two",
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

fn user_json(key: &str, username: &str) -> serde_json::Value {
    json!({
        "key": key,
        "username": username,
        "realm": "/",
        "status": "active",
        "mustChangePassword": false,
        "roles": ["User reviewer"],
    })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_installs_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/accessTokens/login"))
        .and(basic_auth("admin", "password"))
        .and(header("X-Syncope-Domain", "Two"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("X-Syncope-Token", "jwt-token")
                .insert_header("X-Syncope-Token-Expire", "2026-10-19T12:00:00Z"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/roles"))
        .and(header("Authorization", "Bearer jwt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"key": "Other"}])))
        .mount(&server)
        .await;

    let token = client
        .login("admin", &SecretString::from("password".to_owned()))
        .await
        .unwrap();
    assert_eq!(token.token, "jwt-token");
    assert_eq!(token.expires_at.as_deref(), Some("2026-10-19T12:00:00Z"));
    assert!(client.has_token());

    let roles = client.list_roles().await.unwrap();
    assert_eq!(roles[0].key.as_deref(), Some("Other"));
}

#[tokio::test]
async fn test_login_failure_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/accessTokens/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("wrong".to_owned()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_self_info_reads_entitlement_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users/self"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "X-Syncope-Entitlements",
                    r#"{"USER_READ":["/","/even"],"REALM_SEARCH":["/"]}"#,
                )
                .insert_header("X-Syncope-Delegations", r#"["delegation-1"]"#)
                .set_body_json(user_json("u1", "admin")),
        )
        .mount(&server)
        .await;

    let info = client.self_info().await.unwrap();
    assert_eq!(info.user.username, "admin");
    assert_eq!(info.entitlements["USER_READ"].len(), 2);
    assert!(info.entitlements["REALM_SEARCH"].contains("/"));
    assert_eq!(info.delegations, vec!["delegation-1"]);
}

// ── Search & paging ─────────────────────────────────────────────────

#[tokio::test]
async fn test_search_users_sends_paging_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("page", "3"))
        .and(query_param("size", "10"))
        .and(query_param("orderby", "username ASC"))
        .and(query_param("fiql", "username==r*"))
        .and(query_param("realm", "/even"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 3,
            "size": 10,
            "totalCount": 25,
            "result": [user_json("u21", "rossini")],
        })))
        .mount(&server)
        .await;

    let query = ListQuery::default()
        .page(3)
        .size(10)
        .order_by("username ASC")
        .fiql("username==r*")
        .realm("/even");
    let page = client.search_users(&query).await.unwrap();

    assert_eq!(page.total_count, 25);
    assert_eq!(page.result.len(), 1);
    assert_eq!(page.result[0].username, "rossini");
}

#[tokio::test]
async fn test_count_users_uses_zero_size() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("size", "0"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 0, "totalCount": 42, "result": []
        })))
        .mount(&server)
        .await;

    let total = client
        .count_users(&ListQuery::default().page(4).size(50))
        .await
        .unwrap();
    assert_eq!(total, 42);
}

// ── Conditional writes ──────────────────────────────────────────────

#[tokio::test]
async fn test_read_captures_etag_and_update_sends_if_match() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/users/u1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"1700000000000\"")
                .set_body_json(user_json("u1", "verdi")),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/syncope/rest/users/u1"))
        .and(header("If-Match", "\"1700000000000\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity": user_json("u1", "verdi2"),
            "propagationStatuses": [
                {"resource": "resource-ldap", "status": "SUCCESS"}
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let read = client.read_user("u1").await.unwrap();
    assert_eq!(read.etag.as_deref(), Some("\"1700000000000\""));

    let mut user = read.entity;
    user.username = "verdi2".into();
    let result = client
        .update_user("u1", read.etag.as_deref(), &user)
        .await
        .unwrap();
    assert_eq!(result.entity.username, "verdi2");
    assert_eq!(result.propagation_statuses[0].resource, "resource-ldap");
}

#[tokio::test]
async fn test_stale_etag_maps_to_precondition_failed() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/syncope/rest/users/u1"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;

    let err = client.delete_user("u1", Some("\"1\"")).await.unwrap_err();
    assert!(matches!(err, Error::PreconditionFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_user_status_posts_status_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/users/u1/status"))
        .and(body_json(json!({"key": "u1", "type": "SUSPEND", "onSyncope": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity": user_json("u1", "verdi"),
        })))
        .mount(&server)
        .await;

    let result = client
        .set_user_status("u1", None, StatusType::Suspend)
        .await
        .unwrap();
    assert!(result.propagation_statuses.is_empty());
}

// ── Unpaged collections ─────────────────────────────────────────────

#[tokio::test]
async fn test_create_role_returns_location_key() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/roles"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "https://idm/syncope/rest/roles/Auditor"),
        )
        .mount(&server)
        .await;

    let role = Role {
        key: Some("Auditor".into()),
        entitlements: vec!["AUDIT_LIST".into()],
        realms: vec!["/".into()],
        ..Role::default()
    };
    let key = client.create_role(&role).await.unwrap();
    assert_eq!(key.as_deref(), Some("Auditor"));
}

#[tokio::test]
async fn test_list_plain_schemas_by_type_path() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/schemas/PLAIN"))
        .and(query_param("anyTypeClass", "minimal user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"key": "fullname", "type": "String", "mandatoryCondition": "true"},
            {"key": "loginDate", "type": "Date", "conversionPattern": "yyyy-MM-dd"},
        ])))
        .mount(&server)
        .await;

    let schemas: Vec<PlainSchema> = client
        .list_schemas(&["minimal user".to_owned()], None)
        .await
        .unwrap();
    assert_eq!(schemas.len(), 2);
    assert_eq!(schemas[1].kind, AttrSchemaType::Date);
    assert_eq!(schemas[1].conversion_pattern.as_deref(), Some("yyyy-MM-dd"));
}

#[tokio::test]
async fn test_delete_schema_uses_type_segment() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/syncope/rest/schemas/VIRTUAL/rvirtualdata"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_schema(SchemaType::Virtual, "rvirtualdata")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_params_types_values() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/keymaster/params"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "password.cipher.algorithm": "SHA1",
            "jwt.lifetime.minutes": 120,
            "authentication.attributes": ["username", "email"],
        })))
        .mount(&server)
        .await;

    let params = client.list_params().await.unwrap();
    assert_eq!(params.len(), 3);
    let multi = params
        .iter()
        .find(|p| p.key.as_deref() == Some("authentication.attributes"))
        .unwrap();
    assert!(multi.multivalue);
    assert_eq!(multi.values, vec!["username", "email"]);
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_client_exception_from_headers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/users"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("X-Application-Error-Code", "InvalidUser")
                .insert_header(
                    "X-Application-Error-Info",
                    "InvalidUser:username: must not be blank",
                ),
        )
        .mount(&server)
        .await;

    let err = client.create_user(&User::default()).await.unwrap_err();
    match err {
        Error::Client(ref exceptions) => {
            assert_eq!(exceptions[0].kind, "InvalidUser");
            assert_eq!(exceptions[0].elements, vec!["username: must not be blank"]);
        }
        other => panic!("expected client exception, got {other:?}"),
    }
    assert_eq!(err.to_string(), "InvalidUser: username: must not be blank");
}

#[tokio::test]
async fn test_forbidden_and_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/syncope/rest/roles/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let err = client.read_role("secret").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }), "got {err:?}");
    assert_eq!(err.status(), Some(403));

    let err = client.read_role("missing").await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}
