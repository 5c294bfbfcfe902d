use clap::Parser;
use futarchy_liquidity::adapter::inbound::cli::command::Cli;
use futarchy_liquidity::adapter::inbound::cli::{self, diagnostic, output};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli_args = Cli::parse();
    let config_path = cli::config_path(&cli_args.command).map(|path| path.to_path_buf());

    tokio::select! {
        result = cli::run(cli_args) => {
            if let Err(e) = result {
                match config_path
                    .as_deref()
                    .and_then(|path| diagnostic::locate(&e, path))
                {
                    Some(located) => eprintln!("{}", diagnostic::render(located)),
                    None => output::error(&e.to_string()),
                }
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Interrupted");
            std::process::exit(130);
        }
    }
}
