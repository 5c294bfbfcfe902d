//! End-to-end checks of the binary that need no chain.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("futarchy-liquidity").unwrap();
    cmd.env_remove("WALLET_PRIVATE_KEY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn prices_json_reports_conditional_prices() {
    let output = cli()
        .args(["prices", "--json", "--spot", "100", "--probability", "0.5", "--impact", "10"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let body: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(body["command"], "prices");
    assert!(body["yes_price"].to_string().contains("105"));
    assert!(body["no_price"].to_string().contains("95"));
    assert_eq!(body["pools"].as_array().unwrap().len(), 6);
}

#[test]
fn prices_table_lists_every_pool() {
    cli()
        .args(["prices", "--spot", "100", "--probability", "0.3", "--impact", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("YES_C/YES_M").and(predicate::str::contains("NO_M/M")));
}

#[test]
fn prices_rejects_probability_outside_unit_interval() {
    cli()
        .args(["prices", "--spot", "100", "--probability", "1.5", "--impact", "10"])
        .assert()
        .failure();
}

#[test]
fn setup_with_missing_config_fails() {
    let mut proposal = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(proposal, "spot_price = 100").unwrap();
    cli()
        .args(["setup", "--config", "/nonexistent/config.toml"])
        .arg(proposal.path())
        .assert()
        .failure();
}

#[test]
fn malformed_config_is_reported_with_location() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "[chain]\nrpc_url = = \"x\"").unwrap();
    cli()
        .args(["positions", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn config_without_private_key_fails_before_connecting() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        config,
        "[chain]\nrpc_url = \"http://127.0.0.1:1\"\n\n[contracts]\nposition_manager = \"0x91fd594c46d8b01e62dbdebed2401dde01817834\"\nfactory = \"0xa0864cca6e114013ab0e27cbd5b6f4c8947da766\""
    )
    .unwrap();
    cli()
        .current_dir(std::env::temp_dir())
        .args(["positions", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("WALLET_PRIVATE_KEY"));
}
