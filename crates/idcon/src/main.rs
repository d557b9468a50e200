mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use idcon_core::{Console, Preferences};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "idcon", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let console_config = config::resolve_console_config(&cli.global)?;
            let spinner = output::spinner("Signing in", cli.global.quiet);
            let connected = Console::connect(console_config, load_preferences).await;
            spinner.finish_and_clear();
            let console = connected?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &console, &cli.global).await;
            console.disconnect().await;
            result
        }
    }
}

/// Per-user preferences from the local store; falls back to in-memory
/// defaults when the store cannot be read.
fn load_preferences(session: &idcon_core::Session) -> Preferences {
    idcon_config::user_preferences(session.domain(), session.username()).unwrap_or_else(|e| {
        warn!(error = %e, "preferences unavailable, using defaults");
        Preferences::default()
    })
}
