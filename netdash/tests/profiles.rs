//! Tests for profile load/save and resolution through the binary
//! (non-interactive paths only).
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn run_netdash(config_home: &Path, args: &[&str]) -> (bool, String) {
    let exe = env!("CARGO_BIN_EXE_netdash");
    let output = Command::new(exe)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("NETDASH_USER")
        .env_remove("NETDASH_PASSWORD")
        .args(args)
        .output()
        .expect("run netdash");
    let ok = output.status.success();
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (ok, text)
}

fn profiles_path(config_home: &Path) -> PathBuf {
    config_home.join("netdash").join("profiles.json")
}

#[test]
fn test_profile_created_on_first_use() {
    let td = tempfile::tempdir().unwrap();
    let (ok, out) = run_netdash(td.path(), &["--profile", "unittest", "http://example:1", "--dry-run"]);
    assert!(ok, "{out}");
    let data = fs::read_to_string(profiles_path(td.path())).expect("profiles.json created");
    assert!(data.contains("unittest"), "profiles.json missing profile entry: {data}");
    assert!(out.contains("http://example:1/ as admin every 10000ms"), "{out}");
}

#[test]
fn test_profile_overwrite_only_when_changed() {
    let td = tempfile::tempdir().unwrap();
    run_netdash(td.path(), &["--profile", "prod", "http://one:5000", "--dry-run"]);
    let first = fs::read_to_string(profiles_path(td.path())).unwrap();
    // identical input must not rewrite the file or prompt
    run_netdash(td.path(), &["--profile", "prod", "http://one:5000", "--dry-run"]);
    let second = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert_eq!(first, second, "Profile file changed despite identical input");
    // --save overwrites without a prompt
    run_netdash(td.path(), &["--profile", "prod", "--save", "http://two:5000", "--dry-run"]);
    let third = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(third.contains("two"), "Updated URL not written: {third}");
}

#[test]
fn test_profile_fields_persisted_and_loaded() {
    let td = tempfile::tempdir().unwrap();
    run_netdash(
        td.path(),
        &["--profile", "secureX", "--tls-ca", "/tmp/cert.pem", "-u", "ops", "-i", "30000", "https://host:5443", "--dry-run"],
    );
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("secureX"));
    assert!(data.contains("cert.pem"));
    assert!(data.contains("\"username\": \"ops\""), "{data}");
    assert!(data.contains("30000"));
    assert!(!data.contains("password"));

    // name only -> loaded from the file
    let (ok, out) = run_netdash(td.path(), &["-P", "secureX", "--dry-run"]);
    assert!(ok, "{out}");
    assert!(out.contains("https://host:5443/ as ops every 30000ms"), "{out}");
}

#[test]
fn test_cli_user_overrides_profile_without_saving() {
    let td = tempfile::tempdir().unwrap();
    run_netdash(td.path(), &["-P", "lab", "-u", "first", "http://lab:5000", "--dry-run"]);
    let (_ok, out) = run_netdash(td.path(), &["-P", "lab", "-u", "second", "--dry-run"]);
    assert!(out.contains("as second"), "{out}");
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("first") && !data.contains("second"), "{data}");
}
