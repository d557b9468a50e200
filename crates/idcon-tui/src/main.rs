//! `idcon-tui`: terminal console for administering an identity repository.
//!
//! Built on [ratatui](https://ratatui.rs). Each tab is a paged directory
//! (users, groups, roles, realms, schemas, applications, implementations,
//! domains, parameters) with entitlement-gated row actions and wizards for
//! creating and editing entries. Screens are navigable via number keys 1-9.
//!
//! Logs go to a daily rolling file under the data directory so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use idcon_config::{Defaults, Profile};
use idcon_core::ConsoleConfig;

use crate::app::App;

/// Terminal console for administering identity repositories.
#[derive(Parser, Debug)]
#[command(name = "idcon-tui", version, about)]
struct Cli {
    /// Profile from the shared config file
    #[arg(short, long, env = "IDCON_PROFILE")]
    profile: Option<String>,

    /// REST base URL; skips the config file (password from IDCON_PASSWORD)
    #[arg(short = 'u', long, env = "IDCON_URL")]
    url: Option<String>,

    /// Tenant domain
    #[arg(short, long, env = "IDCON_DOMAIN")]
    domain: Option<String>,

    /// Username for password sign-in, with --url
    #[arg(long, env = "IDCON_USERNAME")]
    username: Option<String>,

    /// Log file (defaults to a daily file under the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout and stderr belong to the terminal UI.
/// The guard must live as long as the app so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "idcon_tui={log_level},idcon_core={log_level},idcon_api={log_level}"
        ))
    });

    let file_appender = match &cli.log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let name = path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("idcon-tui.log"));
            tracing_appender::rolling::never(dir, name)
        }
        None => tracing_appender::rolling::daily(idcon_config::data_dir().join("logs"), "idcon-tui.log"),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Console settings from `--url`, or from a profile of the config file.
fn console_config(cli: &Cli) -> Result<ConsoleConfig> {
    if let Some(url) = &cli.url {
        let profile = Profile {
            url: url.clone(),
            domain: cli
                .domain
                .clone()
                .unwrap_or_else(|| idcon_core::config::DEFAULT_DOMAIN.to_owned()),
            auth_mode: "password".into(),
            username: cli.username.clone(),
            password_env: Some("IDCON_PASSWORD".into()),
            ..Profile::default()
        };
        return idcon_config::profile_to_console_config(&profile, "cli", &Defaults::default())
            .wrap_err("cannot sign in with --url");
    }

    let config = idcon_config::load_config().wrap_err("cannot read the config file")?;
    let name = cli
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());
    let Some(profile) = config.profiles.get(&name) else {
        return Err(eyre!(
            "profile '{name}' not found in {}; run `idcon config init` first",
            idcon_config::config_path().display()
        ));
    };

    let mut profile = profile.clone();
    if let Some(domain) = &cli.domain {
        profile.domain.clone_from(domain);
    }
    idcon_config::profile_to_console_config(&profile, &name, &config.defaults)
        .wrap_err_with(|| format!("profile '{name}' is incomplete"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = console_config(&cli)?;
    info!(url = %config.url, domain = %config.domain, "starting idcon-tui");

    let mut app = App::new(config);
    app.run().await?;

    Ok(())
}
