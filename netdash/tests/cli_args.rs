//! CLI arg parsing tests for netdash, run against the built binary.
use assert_cmd::Command;

fn run(args: &[&str]) -> (bool, String) {
    let out = Command::cargo_bin("netdash")
        .expect("netdash binary")
        .args(args)
        .output()
        .expect("run netdash");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    (out.status.success(), text)
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let (ok, text) = run(&["--help"]);
    assert!(ok);
    for flag in ["--tls-ca", "-t", "--profile", "-P", "--user", "-u", "--interval", "-i", "--demo", "--dry-run", "--log"] {
        assert!(text.contains(flag), "help text missing {flag}\n{text}");
    }
}

#[test]
fn test_flags_are_accepted_before_help() {
    // --help after other flags still exits early, without touching the network
    for args in [
        &["--tls-ca", "/tmp/cert.pem", "--help"][..],
        &["-t", "/tmp/cert.pem", "--help"],
        &["--profile", "dev", "--help"],
        &["-u", "ops", "-i", "5000", "--help"],
    ] {
        let (ok, text) = run(args);
        assert!(ok, "{args:?} did not succeed");
        assert!(text.contains("Usage:"), "{args:?}: {text}");
    }
}

#[test]
fn test_bad_interval_prints_usage() {
    let (_ok, text) = run(&["--interval", "soon"]);
    assert!(text.contains("invalid --interval"), "{text}");
    assert!(text.contains("Usage:"));
}

#[test]
fn test_demo_dry_run_does_not_connect() {
    let td = tempfile::tempdir().unwrap();
    let out = Command::cargo_bin("netdash")
        .unwrap()
        .env("XDG_CONFIG_HOME", td.path())
        .args(["--demo", "--dry-run"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("demo"), "{stdout}");
    assert!(td.path().join("netdash").join("netdash.log").exists());
}

#[test]
fn test_demo_rejects_zero_interval() {
    let td = tempfile::tempdir().unwrap();
    let out = Command::cargo_bin("netdash")
        .unwrap()
        .env("XDG_CONFIG_HOME", td.path())
        .args(["--demo", "--dry-run", "-i", "0"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&out.get_output().stderr).to_string();
    assert!(stderr.contains("greater than zero"), "{stderr}");
}
