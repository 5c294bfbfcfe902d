//! Configuration, proposal and removal files loaded from disk.

use std::io::Write;

use alloy_primitives::U256;
use futarchy_liquidity::error::{ConfigError, Error};
use futarchy_liquidity::infrastructure::config::proposal::ProposalConfig;
use futarchy_liquidity::infrastructure::config::removal;
use futarchy_liquidity::infrastructure::config::settings::Config;
use rust_decimal_macros::dec;

fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_config_file_with_adapter() {
    let file = write_file(
        ".toml",
        r#"
        [chain]
        rpc_url = "https://rpc.gnosischain.com"

        [contracts]
        position_manager = "0x91fd594c46d8b01e62dbdebed2401dde01817834"
        factory = "0xa0864cca6e114013ab0e27cbd5b6f4c8947da766"
        adapter = "0x00000000000000000000000000000000000000ad"

        [output]
        directory = "artifacts"

        [logging]
        level = "debug"
        format = "json"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.chain.chain_id, 100);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.output.directory, std::path::PathBuf::from("artifacts"));
    assert!(config.default_adapter().unwrap().is_some());
    assert_eq!(config.rpc_url().unwrap().host_str(), Some("rpc.gnosischain.com"));
}

#[test]
fn missing_config_file_is_a_read_error() {
    let err = Config::load("/nonexistent/futarchy-liquidity.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn proposal_file_extension_selects_format() {
    let json = write_file(
        ".json",
        r#"{
            "proposal_address": "0x0000000000000000000000000000000000000a11",
            "adapter_address": "0x00000000000000000000000000000000000000ad",
            "spot_price": "100",
            "event_probability": "0.5",
            "impact": "10",
            "liquidity_amount": "1"
        }"#,
    );
    let toml = write_file(
        ".toml",
        r#"
        proposal_address = "0x0000000000000000000000000000000000000a11"
        adapter_address = "0x00000000000000000000000000000000000000ad"
        spot_price = 100
        event_probability = 0.5
        impact = 10
        liquidity_amount = 1
        "#,
    );

    for file in [&json, &toml] {
        let plan = ProposalConfig::load(file.path())
            .unwrap()
            .into_plan(None)
            .unwrap();
        let prices = plan.params.conditional_prices().unwrap();
        assert_eq!(prices.yes, dec!(105));
        assert_eq!(prices.no, dec!(95));
    }
}

#[test]
fn proposal_without_adapter_needs_a_default() {
    let toml = write_file(
        ".toml",
        r#"
        proposal_address = "0x0000000000000000000000000000000000000a11"
        spot_price = 100
        event_probability = 0.5
        impact = 10
        liquidity_amount = 1
        "#,
    );
    let err = ProposalConfig::load(toml.path())
        .unwrap()
        .into_plan(None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingField {
            field: "adapter_address"
        })
    ));
}

#[test]
fn removal_list_from_toml_file() {
    let file = write_file(
        ".toml",
        r#"
        [[positions]]
        token_id = "0x10"
        collect = true

        [[positions]]
        token_id = 17
        enabled = false
        "#,
    );
    let items = removal::load(file.path(), 25).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].token_id, U256::from(16));
    assert!(items[0].collect);
    assert_eq!(items[0].percentage, 25);
    assert!(!items[1].enabled);
}
