//! Integration tests for the `choprest` CLI binary.
//!
//! Argument parsing, help output, and completions run without a server.
//! Catalog-backed commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAP_KEY: &str = "0123456789abcdef0123456789abcdef";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `choprest` binary with env isolation.
///
/// Clears all `CHOPREST_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn choprest_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("choprest");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CHOPREST_PROFILE")
        .env_remove("CHOPREST_API_URL")
        .env_remove("CHOPREST_MAP_KEY")
        .env_remove("CHOPREST_OUTPUT")
        .env_remove("CHOPREST_TIMEOUT");
    cmd
}

fn choprest_cmd() -> assert_cmd::Command {
    choprest_cmd_in(Path::new("/tmp/choprest-cli-test-nonexistent"))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn catalog_rows() -> Value {
    json!([
        {"id": 1, "restaurantName": "을지면옥", "regionName": "서울 중구",
         "status": "NORMAL", "parking": "Y", "lat": 37.5660, "lng": 126.9910},
        {"id": 2, "restaurantName": "진진", "branchName": "서교점", "regionName": "서울 마포구",
         "status": "NORMAL", "wifi": "Y", "lat": 37.5568, "lng": 126.9237},
        {"id": 3, "restaurantName": "폐업식당", "regionName": "서울 중구",
         "status": "CLOSED", "lat": 37.5670, "lng": 126.9785}
    ])
}

async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_rows()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants"))
        .and(query_param("keyword", "진진"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([catalog_rows()[1]])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_rows()[1].clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout was not JSON ({e}):\n{}",
            combined_output(output)
        )
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = choprest_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    choprest_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("restaurants")
            .and(predicate::str::contains("nearby"))
            .and(predicate::str::contains("map"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    choprest_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("choprest"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    choprest_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    choprest_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = choprest_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_unknown_service_is_a_usage_error() {
    let output = choprest_cmd()
        .args(["restaurants", "list", "--service", "valet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown service 'valet'"));
}

#[test]
fn test_region_and_service_conflict() {
    let output = choprest_cmd()
        .args(["restaurants", "list", "--region", "중구", "--service", "wifi"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_bad_here_pair() {
    let output = choprest_cmd()
        .args(["map", "--here", "37.5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("expected LAT,LNG"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_follows_xdg() {
    let home = tempfile::tempdir().unwrap();
    choprest_cmd_in(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("choprest").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    choprest_cmd_in(home.path())
        .args(["config", "set", "nearby_radius_m", "2500"])
        .assert()
        .success();
    choprest_cmd_in(home.path())
        .args(["config", "set", "map_key", MAP_KEY])
        .assert()
        .success();

    let output = choprest_cmd_in(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let shown = stdout_json(&output);
    assert_eq!(shown["profiles"]["default"]["nearby_radius_m"], json!(2500.0));
    assert_eq!(shown["profiles"]["default"]["map_key"], json!("****"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let output = choprest_cmd_in(home.path())
        .args(["config", "set", "colour", "red"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown config key 'colour'"));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let output = choprest_cmd()
        .args(["--profile", "nowhere", "restaurants", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown profile 'nowhere'"));
}

// ── Catalog commands ────────────────────────────────────────────────

#[test]
fn test_connection_refused() {
    let output = choprest_cmd()
        .args(["--api-url", "http://127.0.0.1:9", "restaurants", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_list_plain() {
    let server = catalog_server().await;
    choprest_cmd()
        .args(["--api-url", &server.uri(), "-o", "plain", "restaurants", "list"])
        .assert()
        .success()
        .stdout("1\n2\n3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_list_filters() {
    let server = catalog_server().await;
    choprest_cmd()
        .args(["--api-url", &server.uri(), "-o", "plain"])
        .args(["restaurants", "list", "--region", "중구", "--operating"])
        .assert()
        .success()
        .stdout("1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_regions() {
    let server = catalog_server().await;
    choprest_cmd()
        .args(["--api-url", &server.uri(), "-o", "plain"])
        .args(["restaurants", "list", "--regions"])
        .assert()
        .success()
        .stdout("서울 마포구\n서울 중구\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_search_table() {
    let server = catalog_server().await;
    choprest_cmd()
        .args(["--api-url", &server.uri(), "restaurants", "search", "진진"])
        .assert()
        .success()
        .stdout(predicate::str::contains("진진 서교점").and(predicate::str::contains("wifi")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_get_json() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "-o", "json", "restaurants", "get", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let restaurant = stdout_json(&output);
    assert_eq!(restaurant["id"], json!(2));
    assert_eq!(restaurant["branch"], json!("서교점"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restaurants_get_missing() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "restaurants", "get", "99"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("restaurant '99' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nearby_sorted_by_distance() {
    let server = catalog_server().await;
    choprest_cmd()
        .args(["--api-url", &server.uri(), "-o", "plain"])
        .args(["nearby", "--lat", "37.5665", "--lng", "126.9780", "--radius", "1500"])
        .assert()
        .success()
        .stdout("3\n1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nearby_without_hits() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri()])
        .args(["nearby", "--lat", "35.1796", "--lng", "129.0756", "--radius", "500"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

// ── Map ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_map_auto_shows_every_result() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .env("CHOPREST_MAP_KEY", MAP_KEY)
        .args(["--api-url", &server.uri(), "-o", "json", "map"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["status"], json!("ready"));
    assert_eq!(view["mode"], json!("auto"));
    assert_eq!(view["markers"].as_array().map(Vec::len), Some(3));
    assert_eq!(view["overlay"], Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_map_filter_narrows_markers() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "--map-key", MAP_KEY, "-o", "json"])
        .args(["map", "--region", "중구", "--operating"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["mode"], json!("auto"));
    assert_eq!(view["results"], json!(1));
    let markers = view["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["title"], json!("을지면옥"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_map_select_pins_one_marker() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "--map-key", MAP_KEY, "-o", "json"])
        .args(["map", "--select", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["mode"], json!("manual"));
    assert_eq!(view["entity_id"], json!(2));
    assert_eq!(view["markers"].as_array().map(Vec::len), Some(1));
    assert_eq!(view["zoom"], json!(2));
    assert!(view["overlay"].as_str().is_some_and(|html| html.contains("진진")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_map_select_unknown_entity() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "--map-key", MAP_KEY])
        .args(["map", "--select", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_map_here_nearby() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "--map-key", MAP_KEY, "-o", "json"])
        .args(["map", "--here", "37.5665,126.9780", "--nearby", "--radius", "300"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["location"]["lat"], json!(37.5665));
    assert_eq!(view["markers"].as_array().map(Vec::len), Some(1));
    assert_eq!(view["results"], json!(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_map_rejects_malformed_key() {
    let server = catalog_server().await;
    let output = choprest_cmd()
        .args(["--api-url", &server.uri(), "--map-key", "not-a-key", "map"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Map provider key"));
}

#[test]
fn test_map_without_key() {
    let home = tempfile::tempdir().unwrap();
    let output = choprest_cmd_in(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "map"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}
