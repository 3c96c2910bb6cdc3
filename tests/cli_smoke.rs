use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;

fn webprobe() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("webprobe"));
    cmd.env_remove("WEBPROBE_ORACLE_URL")
        .env_remove("WEBPROBE_ORACLE_API_KEY")
        .env_remove("WEBPROBE_ORACLE_PREFIX")
        .env_remove("WEBPROBE_OUTPUT_DIR")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn help_lists_commands() {
    let assert = webprobe().arg("--help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    for command in ["explore", "serve", "config", "info"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn config_set_get_and_validate_round() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    let path_arg = path.to_str().expect("unicode path");

    webprobe()
        .args(["--config", path_arg, "config", "set", "explorer.settle_delay_ms", "750"])
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("settle_delay_ms: 750"));

    let assert = webprobe()
        .args(["--config", path_arg, "config", "get", "explorer.settle_delay_ms"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("750"));

    webprobe()
        .args(["--config", path_arg, "config", "validate"])
        .assert()
        .success();
}

#[test]
fn invalid_config_values_are_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    fs::write(&path, "oracle:\n  base_url: not-a-url\n").unwrap();

    webprobe()
        .args(["--config", path.to_str().unwrap(), "config", "validate"])
        .assert()
        .failure();
}

#[test]
fn explore_rejects_non_http_urls_before_launching() {
    webprobe()
        .args(["explore", "javascript:alert(1)"])
        .assert()
        .failure();
}
