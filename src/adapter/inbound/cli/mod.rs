//! CLI module graph and command dispatch.

pub mod command;
#[cfg(feature = "evm")]
pub mod conditional;
pub mod diagnostic;
pub mod output;
pub mod paths;
#[cfg(feature = "evm")]
pub mod positions;
pub mod prices;
pub mod prompt;
#[cfg(feature = "evm")]
pub mod remove;
#[cfg(feature = "evm")]
pub mod setup;

use std::path::Path;

use self::command::{Cli, ColorChoice, Commands};
use self::output::OutputConfig;
use crate::error::Result;
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::settings::Config;

#[cfg(feature = "evm")]
use crate::application::session::Session;

/// Connect to the configured chain behind a spinner.
#[cfg(feature = "evm")]
pub(crate) async fn connect(config: &Config) -> Result<Session> {
    let spinner = output::spinner("Connecting to chain");
    match crate::infrastructure::bootstrap::connect_session(config).await {
        Ok(session) => {
            output::spinner_success(&spinner, &format!("Connected as {}", session.owner()));
            Ok(session)
        }
        Err(e) => {
            output::spinner_fail(&spinner, "Connection failed");
            Err(e)
        }
    }
}

fn apply_color(choice: &ColorChoice) {
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
}

/// Load the configuration file for a chain command and start logging.
fn load_config(path: &Path, verbose: u8) -> Result<Config> {
    let mut config = Config::load(path)?;
    config.logging = config.logging.clone().with_verbosity(verbose);
    config.init_logging();
    Ok(config)
}

/// Path of the configuration file a command reads, if any.
#[must_use]
pub fn config_path(command: &Commands) -> Option<&Path> {
    match command {
        Commands::Prices(_) => None,
        Commands::Setup(args) => Some(&args.config),
        Commands::Positions(args) => Some(&args.config),
        Commands::Remove(args) => Some(&args.config),
        Commands::RemoveBatch(args) => Some(&args.config),
        Commands::Split(args) => Some(&args.config),
        Commands::Merge(args) => Some(&args.config),
    }
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns the first fatal error of the command. Batch commands report
/// per-item failures in their output and still return `Ok`.
pub async fn run(cli: Cli) -> Result<()> {
    apply_color(&cli.color);
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    let config = match config_path(&cli.command) {
        Some(path) => Some(load_config(path, cli.verbose)?),
        None => {
            LoggingConfig::default().with_verbosity(cli.verbose).init();
            None
        }
    };

    match (&cli.command, config) {
        (Commands::Prices(args), _) => prices::execute(args),
        #[cfg(feature = "evm")]
        (Commands::Setup(args), Some(config)) => setup::execute(args, &config).await,
        #[cfg(feature = "evm")]
        (Commands::Positions(_), Some(config)) => positions::execute(&config).await,
        #[cfg(feature = "evm")]
        (Commands::Remove(args), Some(config)) => remove::execute(args, &config).await,
        #[cfg(feature = "evm")]
        (Commands::RemoveBatch(args), Some(config)) => {
            remove::execute_batch(args, &config).await
        }
        #[cfg(feature = "evm")]
        (Commands::Split(args), Some(config)) => conditional::execute_split(args, &config).await,
        #[cfg(feature = "evm")]
        (Commands::Merge(args), Some(config)) => conditional::execute_merge(args, &config).await,
        _ => Err(crate::error::ConfigError::InvalidValue {
            field: "command",
            reason: "this build has no chain support; enable the `evm` feature".to_string(),
        }
        .into()),
    }
}
