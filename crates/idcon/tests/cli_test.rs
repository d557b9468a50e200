//! Integration tests for the `idcon` CLI binary.
//!
//! Parsing, help, completions and error exits run without a server;
//! the directory tests drive the binary against a mocked REST API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `idcon` binary with env isolation.
///
/// Clears all `IDCON_*` env vars and points config and data directories
/// at `home` so tests never touch the user's real configuration.
fn idcon_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("idcon");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("IDCON_PROFILE")
        .env_remove("IDCON_URL")
        .env_remove("IDCON_DOMAIN")
        .env_remove("IDCON_USERNAME")
        .env_remove("IDCON_PASSWORD")
        .env_remove("IDCON_TOKEN")
        .env_remove("IDCON_OUTPUT")
        .env_remove("IDCON_INSECURE")
        .env_remove("IDCON_TIMEOUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const ENTITLEMENTS: &str = r#"{"USER_SEARCH":["/"],"USER_READ":["/"],"USER_DELETE":["/"]}"#;

async fn mock_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/syncope/rest/accessTokens/login"))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Syncope-Token", "jwt"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/syncope/rest/accessTokens/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users/self"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Syncope-Entitlements", ENTITLEMENTS)
                .set_body_json(json!({ "key": "admin-key", "username": "admin", "realm": "/" })),
        )
        .mount(&server)
        .await;

    server
}

fn connected_cmd(home: &std::path::Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = idcon_cmd(home);
    cmd.env("IDCON_PASSWORD", "password").args([
        "--url",
        &format!("{}/syncope/rest", server.uri()),
        "--username",
        "admin",
    ]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = idcon_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("users")
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("realms"))
            .and(predicate::str::contains("schemas")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("idcon"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Subcommand discovery ────────────────────────────────────────────

#[test]
fn test_users_subcommands_exist() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["users", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("must-change-password"))
                .and(predicate::str::contains("suspend")),
        );
}

#[test]
fn test_implementations_require_type() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["implementations", "list"])
        .assert()
        .code(2);
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_list_without_config_fails() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["users", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config").or(predicate::str::contains("profile")));
}

#[test]
fn test_unknown_profile_lists_available() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["--profile", "lab", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lab"));
}

#[test]
fn test_delete_requires_keys() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["users", "delete"])
        .assert()
        .code(2);
}

#[test]
fn test_config_show_no_config() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path()).args(["config", "show"]).assert().success();
}

#[test]
fn test_config_set_then_show_redacts_nothing_unset() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["config", "set", "url", "https://idm.example.com/syncope/rest"])
        .assert()
        .success();
    idcon_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://idm.example.com/syncope/rest")
                .and(predicate::str::contains("****").not()),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    idcon_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

// ── Against a mocked server ─────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_users_list_third_page() {
    let server = mock_server().await;
    let rows: Vec<_> = (21..=25)
        .map(|i| json!({ "key": format!("u{i}"), "username": format!("user{i}"), "realm": "/" }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 3, "size": 10, "totalCount": 25, "result": rows,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 0, "totalCount": 25, "result": [],
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = connected_cmd(home.path(), &server);
    let output = tokio::task::spawn_blocking(move || {
        cmd.args(["users", "list", "--page", "3", "--size", "10"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    let text = combined_output(&output);
    assert!(output.status.success(), "list failed:\n{text}");
    assert!(text.contains("user21") && text.contains("user25"));
    assert!(text.contains("Showing 21-25 of 25 (page 3 of 3)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_users_list_keyword_and_clauses_become_fiql() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/syncope/rest/users"))
        .and(query_param("fiql", "username=~*ross*;$groups==root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "size": 10, "totalCount": 1,
            "result": [{ "key": "u1", "username": "rossini", "realm": "/" }],
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = connected_cmd(home.path(), &server);
    let output = tokio::task::spawn_blocking(move || {
        cmd.args(["users", "list", "--filter", "ross", "--where", "$groups==root"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    let text = combined_output(&output);
    assert!(output.status.success(), "list failed:\n{text}");
    assert!(text.contains("rossini"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_json() {
    let server = mock_server().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = connected_cmd(home.path(), &server);
    let output = tokio::task::spawn_blocking(move || {
        cmd.args(["--output", "json", "whoami"]).output().unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let identity: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(identity["username"], "admin");
    assert_eq!(identity["domain"], "Master");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_without_entitlement_is_denied() {
    let server = mock_server().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = connected_cmd(home.path(), &server);
    let output = tokio::task::spawn_blocking(move || {
        cmd.args(["roles", "create"]).output().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
}
