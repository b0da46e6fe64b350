//! End-to-end tests of the `confdesk` binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = r#"{
    "meta": {"name": "demo_addon", "displayName": "Demo Add-on"},
    "pages": {
        "configuration": {
            "title": "Configuration",
            "tabs": [
                {
                    "name": "account",
                    "title": "Account",
                    "entity": [
                        {"field": "name", "label": "Account name", "required": true},
                        {"field": "host", "label": "Host"},
                        {"field": "password", "label": "Password", "encrypted": true}
                    ]
                }
            ]
        },
        "inputs": {
            "title": "Inputs",
            "services": [
                {
                    "name": "feed",
                    "title": "Feed",
                    "entity": [
                        {"field": "name", "label": "Name", "required": true},
                        {"field": "interval", "label": "Interval", "defaultValue": 300}
                    ]
                }
            ]
        }
    }
}"#;

struct Workspace {
    _dir: TempDir,
    config: PathBuf,
    store: PathBuf,
}

fn workspace(entities: Value) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("globalConfig.json");
    let store = dir.path().join("entities.json");
    std::fs::write(&config, CONFIG).unwrap();
    std::fs::write(&store, serde_json::to_string_pretty(&entities).unwrap()).unwrap();
    Workspace {
        _dir: dir,
        config,
        store,
    }
}

fn confdesk(ws: &Workspace) -> Command {
    let mut cmd = Command::cargo_bin("confdesk").unwrap();
    cmd.env_remove("CONFDESK_CONFIG")
        .env_remove("CONFDESK_STORE")
        .arg("--config")
        .arg(&ws.config)
        .arg("--store")
        .arg(&ws.store);
    cmd
}

fn stored(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn check_lists_components() {
    let ws = workspace(json!({}));
    confdesk(&ws)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo Add-on"))
        .stdout(predicate::str::contains("account"))
        .stdout(predicate::str::contains("feed"));
}

#[test]
fn missing_config_fails() {
    Command::cargo_bin("confdesk")
        .unwrap()
        .env_remove("CONFDESK_CONFIG")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration given"));
}

#[test]
fn config_from_environment() {
    let ws = workspace(json!({}));
    Command::cargo_bin("confdesk")
        .unwrap()
        .env("CONFDESK_CONFIG", &ws.config)
        .env("CONFDESK_STORE", &ws.store)
        .arg("check")
        .assert()
        .success();
}

#[test]
fn create_then_list() {
    let ws = workspace(json!({}));
    confdesk(&ws)
        .args(["save", "account", "--set", "name=acct1", "--set", "host=h1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved account 'acct1'"));

    assert_eq!(stored(&ws.store)["account"]["acct1"]["host"], json!("h1"));

    confdesk(&ws)
        .args(["list", "account"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acct1"))
        .stdout(predicate::str::contains("host=h1"));
}

#[test]
fn create_without_name_is_rejected() {
    let ws = workspace(json!({}));
    confdesk(&ws)
        .args(["save", "account", "--set", "host=h1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Field Account name is required"));

    assert_eq!(stored(&ws.store), json!({}));
}

#[test]
fn duplicate_create_is_rolled_back() {
    let ws = workspace(json!({"account": {"acct1": {"name": "acct1", "host": "h1"}}}));
    confdesk(&ws)
        .args(["save", "account", "--set", "name=acct1", "--set", "host=h2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));

    assert_eq!(stored(&ws.store)["account"]["acct1"]["host"], json!("h1"));
}

#[test]
fn edit_updates_in_place() {
    let ws = workspace(json!({"account": {"acct1": {"name": "acct1", "host": "h1"}}}));
    confdesk(&ws)
        .args(["save", "account", "--mode", "edit", "--entity", "acct1"])
        .args(["--set", "host=h2"])
        .assert()
        .success();

    assert_eq!(stored(&ws.store)["account"]["acct1"]["host"], json!("h2"));
}

#[test]
fn edit_keeps_stored_password() {
    let ws = workspace(json!({
        "account": {"acct1": {"name": "acct1", "host": "h1", "password": "s3cret"}}
    }));
    confdesk(&ws)
        .args(["save", "account", "--mode", "edit", "--entity", "acct1"])
        .args(["--set", "host=h2"])
        .assert()
        .success();

    let entities = stored(&ws.store);
    assert_eq!(entities["account"]["acct1"]["host"], json!("h2"));
    assert_eq!(entities["account"]["acct1"]["password"], json!("s3cret"));
}

#[test]
fn edit_cannot_rename() {
    let ws = workspace(json!({"account": {"acct1": {"name": "acct1"}}}));
    confdesk(&ws)
        .args(["save", "account", "--mode", "edit", "--entity", "acct1"])
        .args(["--set", "name=other"])
        .assert()
        .failure();
}

#[test]
fn clone_copies_content_under_new_name() {
    let ws = workspace(json!({
        "account": {"acct1": {"name": "acct1", "host": "h1", "password": "s3cret"}}
    }));
    confdesk(&ws)
        .args(["save", "account", "--mode", "clone", "--entity", "acct1"])
        .args(["--set", "name=acct2"])
        .assert()
        .success();

    let entities = stored(&ws.store);
    assert_eq!(entities["account"]["acct2"]["host"], json!("h1"));
    assert!(entities["account"]["acct2"].get("password").is_none());
}

#[test]
fn render_prints_dialog_view() {
    let ws = workspace(json!({}));
    let output = confdesk(&ws)
        .args(["render", "feed"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let view: Value = serde_json::from_slice(&output).unwrap();
    let interval = view["controls"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["field"] == "interval")
        .unwrap();
    assert_eq!(interval["value"], json!(300));
    assert_eq!(view["submitEnabled"], json!(true));
}

#[test]
fn delete_removes_entity() {
    let ws = workspace(json!({"account": {"acct1": {"name": "acct1"}}}));
    confdesk(&ws)
        .args(["delete", "account", "acct1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted account 'acct1'"));

    assert_eq!(stored(&ws.store)["account"], json!({}));
}

#[test]
fn delete_refuses_entity_in_use() {
    let ws = workspace(json!({"account": {"acct1": {"name": "acct1", "refCount": 2}}}));
    confdesk(&ws)
        .args(["delete", "account", "acct1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("in use"));

    assert!(stored(&ws.store)["account"].get("acct1").is_some());
}

#[test]
fn unknown_component_fails() {
    let ws = workspace(json!({}));
    confdesk(&ws)
        .args(["list", "nope"])
        .assert()
        .failure();
}
