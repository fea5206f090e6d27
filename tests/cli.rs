use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

fn bucket_backup() -> Command {
    Command::cargo_bin("bucket-backup").unwrap()
}

#[test]
fn print_an_example_config() {
    bucket_backup()
        .arg("--example-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[general]"))
        .stdout(predicate::str::contains("api_root"));
}

#[test]
fn missing_credentials_is_a_hard_error() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "[general]\n").unwrap();

    bucket_backup()
        .args(&["-c", config.to_str().unwrap(), "workspace"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No credentials found"));
}

#[test]
fn a_command_is_required() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "[general]\n").unwrap();

    bucket_backup()
        .args(&["-c", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No command given"));
}

#[test]
fn list_the_workspaces_end_to_end() {
    let mut server = mockito::Server::new();
    let body = json!({
        "values": [{
            "name": "Acme",
            "slug": "acme",
            "links": { "html": { "href": "https://bitbucket.org/acme/" } },
        }],
    });
    let _m = server
        .mock("GET", "/workspaces")
        .with_body(body.to_string())
        .create();

    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(
        &config,
        format!("[general]\napi_root = \"{}\"\n", server.url()),
    )
    .unwrap();

    bucket_backup()
        .args(&[
            "-c",
            config.to_str().unwrap(),
            "-u",
            "michael",
            "-p",
            "secret",
            "workspace",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Acme (acme) - https://bitbucket.org/acme/",
        ));
}
