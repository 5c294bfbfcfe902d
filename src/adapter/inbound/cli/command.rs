//! Command-line interface definitions.
//!
//! Defines the CLI structure using `clap`: offline price previews, the
//! six-pool setup, position listing and removal, and collateral split/merge.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::paths;

/// Futarchy pool liquidity management CLI
#[derive(Parser, Debug)]
#[command(name = "futarchy-liquidity")]
#[command(version, about)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the six pool prices from market parameters (offline)
    Prices(PricesArgs),

    /// Create the proposal's pools and add liquidity
    Setup(SetupArgs),

    /// List positions owned by the wallet
    Positions(ConfigPathArg),

    /// Remove liquidity from one position
    Remove(RemoveArgs),

    /// Remove liquidity from positions in a removal list or setup artifact
    RemoveBatch(RemoveBatchArgs),

    /// Split collateral to cover a conditional token shortfall
    Split(SplitArgs),

    /// Merge matched YES/NO pairs back into collateral
    Merge(MergeArgs),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct PricesArgs {
    /// Proposal file to read market parameters from.
    #[arg(long, conflicts_with_all = ["spot", "probability", "impact"])]
    pub proposal: Option<PathBuf>,

    /// Spot price of the company token in currency.
    #[arg(long, required_unless_present = "proposal")]
    pub spot: Option<Decimal>,

    /// Event probability between 0 and 1.
    #[arg(long, required_unless_present = "proposal")]
    pub probability: Option<Decimal>,

    /// Price impact in percent.
    #[arg(long, required_unless_present = "proposal")]
    pub impact: Option<Decimal>,
}

#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Proposal file (TOML or JSON).
    pub proposal: PathBuf,

    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Run without prompting; honors `skip_existing_pools`.
    #[arg(long)]
    pub auto: bool,

    /// Stop after the first failed pool.
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Position token id (decimal or 0x-hex).
    #[arg(long)]
    pub token_id: String,

    /// Share of liquidity to remove, 1-100.
    #[arg(long, default_value = "100")]
    pub percentage: u32,

    /// Collect owed tokens without removing liquidity.
    #[arg(long, conflicts_with = "percentage")]
    pub collect_only: bool,
}

#[derive(Parser, Debug)]
pub struct RemoveBatchArgs {
    /// Removal list or setup artifact (JSON or TOML).
    pub file: PathBuf,

    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Percentage for entries that do not set one.
    #[arg(long, default_value = "100")]
    pub percentage: u32,

    /// Run without prompting.
    #[arg(long)]
    pub auto: bool,

    /// Stop after the first failed position.
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Parser, Debug)]
pub struct SplitArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Proposal contract address.
    #[arg(long)]
    pub proposal: String,

    /// Conditional token to top up.
    #[arg(long)]
    pub token: String,

    /// Balance of the conditional token to reach, in token units.
    #[arg(long)]
    pub amount: Decimal,

    /// Adapter address; defaults to `contracts.adapter`.
    #[arg(long)]
    pub adapter: Option<String>,
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Proposal contract address.
    #[arg(long)]
    pub proposal: String,

    /// Adapter address; defaults to `contracts.adapter`.
    #[arg(long)]
    pub adapter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_factory_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "futarchy-liquidity");
    }

    #[test]
    fn test_parse_prices_with_parameters() {
        let cli = Cli::try_parse_from([
            "futarchy-liquidity",
            "prices",
            "--spot",
            "100",
            "--probability",
            "0.5",
            "--impact",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Prices(args) => {
                assert_eq!(args.spot, Some(Decimal::ONE_HUNDRED));
                assert!(args.proposal.is_none());
            }
            other => panic!("Expected Prices command, got {other:?}"),
        }
    }

    #[test]
    fn test_prices_requires_parameters_or_proposal() {
        assert!(Cli::try_parse_from(["futarchy-liquidity", "prices"]).is_err());
        assert!(
            Cli::try_parse_from(["futarchy-liquidity", "prices", "--proposal", "p.toml"]).is_ok()
        );
    }

    #[test]
    fn test_setup_flags() {
        let cli = Cli::try_parse_from([
            "futarchy-liquidity",
            "setup",
            "proposal.toml",
            "--auto",
            "--stop-on-error",
        ])
        .unwrap();
        if let Commands::Setup(args) = cli.command {
            assert!(args.auto);
            assert!(args.stop_on_error);
            assert_eq!(args.proposal, PathBuf::from("proposal.toml"));
        } else {
            panic!("Expected Setup command");
        }
    }

    #[test]
    fn test_remove_defaults_to_full() {
        let cli =
            Cli::try_parse_from(["futarchy-liquidity", "remove", "--token-id", "42"]).unwrap();
        if let Commands::Remove(args) = cli.command {
            assert_eq!(args.percentage, 100);
            assert!(!args.collect_only);
        } else {
            panic!("Expected Remove command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "futarchy-liquidity",
            "--json",
            "-vv",
            "positions",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Positions(_)));
    }
}
