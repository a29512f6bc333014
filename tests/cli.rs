use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Config whose tools can never be found on `PATH`
const UNREACHABLE_TOOLS: &str = r#"
settle-delay-ms = 0

[tools]
builder = "enclave-pack-test-missing-builder"
runtime = "enclave-pack-test-missing-runtime"
container = "enclave-pack-test-missing-container"
bridge = "enclave-pack-test-missing-bridge"
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pack.toml"), UNREACHABLE_TOOLS).unwrap();
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("enclave-pack").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env("ENCLAVE_PACK_CONFIG", self.dir.path().join("pack.toml"));
        cmd
    }

    fn write(&self, name: &str, contents: &[u8]) {
        fs::write(self.dir.path().join(name), contents).unwrap();
    }
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("enclave-pack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("pack")
                .and(predicate::str::contains("deploy"))
                .and(predicate::str::contains("attest"))
                .and(predicate::str::contains("verify")),
        );
}

#[test]
fn pack_reports_missing_tools() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["pack", "nginx:alpine"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "enclave-pack-test-missing-builder required",
        ));
}

#[test]
fn pack_rejects_traversal_before_dependency_checks() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["pack", "nginx:alpine", "--output", "../escape.eif"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("path traversal"));
}

#[test]
fn pack_rejects_absolute_output() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["pack", "nginx:alpine", "-o", "/tmp/escape.eif"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absolute paths are not allowed"));
}

#[test]
fn deploy_rejects_out_of_range_cpu_count() {
    let ws = Workspace::new();
    ws.write("app.eif", b"enclave image");
    ws.cmd()
        .args(["deploy", "app.eif", "--cpu-count", "32"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid resource bounds"));
}

#[test]
fn deploy_rejects_small_memory() {
    let ws = Workspace::new();
    ws.write("app.eif", b"enclave image");
    ws.cmd()
        .args(["deploy", "app.eif", "--memory", "128"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("memory 128"));
}

#[test]
fn deploy_reports_missing_artifact() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["deploy", "missing.eif"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("enclave image not found"));
}

#[test]
fn deploy_reports_missing_runtime() {
    let ws = Workspace::new();
    ws.write("app.eif", b"enclave image");
    ws.cmd()
        .args(["deploy", "app.eif", "-p", "8080"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "enclave-pack-test-missing-runtime required",
        ));
}

#[test]
fn deploy_rejects_port_out_of_range() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["deploy", "app.eif", "-p", "70000"])
        .assert()
        .failure();
}

#[test]
fn attest_rejects_traversal() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["attest", "app.eif", "-o", "docs/../../app.cbor"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("path traversal"));
}

#[test]
fn attest_reports_missing_runtime() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["attest", "app.eif"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("attest: "));
}

#[test]
fn verify_reports_missing_document() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["verify", "missing.cbor"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn verify_rejects_short_document() {
    let ws = Workspace::new();
    ws.write("short.cbor", &[0u8; 50]);
    ws.cmd()
        .args(["verify", "short.cbor"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid attestation document"));
}

#[test]
fn verify_succeeds_without_verification_engine() {
    let ws = Workspace::new();
    ws.write("app.cbor", &[0xa5u8; 128]);
    ws.cmd()
        .args(["verify", "app.cbor"])
        .assert()
        .success()
        .stdout("structural\n")
        .stderr(predicate::str::contains("Full verification unavailable"));
}

#[test]
fn unreadable_config_is_an_error() {
    let ws = Workspace::new();
    ws.write("app.cbor", &[0xa5u8; 128]);
    ws.cmd()
        .args(["verify", "app.cbor", "--config", "nope.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config"));
}
