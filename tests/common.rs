use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::path::Path;

pub fn crosswork() -> Command {
    cargo_bin_cmd!("crosswork")
}

/// Run `init` against a store path and assert success
#[allow(dead_code)]
pub fn init_store(store: &Path) {
    crosswork()
        .arg("--store")
        .arg(store)
        .arg("init")
        .assert()
        .success();
}

/// Run a subcommand with `--format json` and parse its stdout
#[allow(dead_code)]
pub fn run_json(store: &Path, args: &[&str]) -> serde_json::Value {
    let output = crosswork()
        .arg("--store")
        .arg(store)
        .args(["--format", "json"])
        .args(args)
        .output()
        .expect("failed to run crosswork");
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not valid JSON")
}
