//! Black-box tests for the rback binary.
//!
//! Each test runs the binary inside a fresh temp directory so the default
//! archive location and `rback.toml` lookup stay isolated.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run rback with the given arguments from `dir`.
fn run_rback(dir: &Path, args: &[&str]) -> Output {
    let binary = env!("CARGO_BIN_EXE_rback");

    Command::new(binary)
        .args(args)
        .current_dir(dir)
        .env_remove("RBACK_CONFIG")
        .env_remove("RBACK_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run rback")
}

#[test]
fn test_both_modes_is_usage_error() {
    let dir = TempDir::new().unwrap();

    let output = run_rback(dir.path(), &["--export", "--import"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rback: usage error"), "stderr: {}", stderr);
    assert!(!dir.path().join("archive.rback").exists());
}

#[test]
fn test_unknown_argument_is_usage_error() {
    let dir = TempDir::new().unwrap();

    let output = run_rback(dir.path(), &["--restore"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("rback: usage error"));
}

#[test]
fn test_no_mode_prints_usage() {
    let dir = TempDir::new().unwrap();

    let output = run_rback(dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--export"));
    assert!(stdout.contains("--import"));
}

#[test]
fn test_import_missing_archive() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("nowhere");

    let output = run_rback(dir.path(), &["--import", "-f", target.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unable to find archive"), "stderr: {}", stderr);
    assert!(!dir.path().join("nowhere.rback").exists());
    assert!(!target.exists());
}

#[test]
fn test_import_reports_archive() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("archive.rback"),
        "0.0.0.0,192.168.1.1,0.0.0.0,UG,100,0,0,eth0\n\
         192.168.1.0,0.0.0.0,255.255.255.0,U,100,0,0,eth0\n",
    )
    .unwrap();

    let output = run_rback(dir.path(), &["--import"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("imported: 0.0.0.0,192.168.1.1,0.0.0.0,UG,100,0,0,eth0"));
    assert!(stdout.contains("read 2 routes from"));
}

#[test]
fn test_import_json_report() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("backup.rback");
    fs::write(&archive, "10.0.0.0,0.0.0.0,255.0.0.0,U,0,0,0,eth1\n").unwrap();

    let output = run_rback(
        dir.path(),
        &["--import", "--json", "-f", dir.path().join("backup").to_str().unwrap()],
    );

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mode"], "import");
    assert_eq!(value["routes"][0]["iface"], "eth1");
}

#[cfg(unix)]
#[test]
fn test_export_with_configured_command() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rback.toml"),
        r#"
[capture]
command = "printf"
args = ['Kernel IP routing table\nDestination Gateway Genmask Flags Metric Ref Use Iface\n0.0.0.0 192.168.1.1 0.0.0.0 UG 0 0 0 eth0\n192.168.1.0 0.0.0.0 255.255.255.0 U 0 0 0 eth0\n']
"#,
    )
    .unwrap();

    let output = run_rback(dir.path(), &["--export", "-f", "snapshot"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let archive = fs::read_to_string(dir.path().join("snapshot.rback")).unwrap();
    assert_eq!(
        archive,
        "0.0.0.0,192.168.1.1,0.0.0.0,UG,0,0,0,eth0\n\
         192.168.1.0,0.0.0.0,255.255.255.0,U,0,0,0,eth0\n"
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("exported 2 routes to 'snapshot.rback'"));
}

#[test]
fn test_export_missing_command() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rback.toml"),
        "[capture]\ncommand = \"rback-no-such-route-command\"\n",
    )
    .unwrap();

    let output = run_rback(dir.path(), &["--export"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unable to start"));
    assert!(!dir.path().join("archive.rback").exists());
}
