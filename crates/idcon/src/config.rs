//! CLI configuration: thin wrapper around `idcon_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--url,
//! --domain, --username, --token, --insecure, --timeout).

use std::time::Duration;

use idcon_core::ConsoleConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use idcon_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with flag overrides applied.
///
/// Without a stored profile, flags alone must name the server.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None if global.url.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile {
            domain: idcon_core::config::DEFAULT_DOMAIN.into(),
            auth_mode: "password".into(),
            ..Profile::default()
        },
    };

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref domain) = global.domain {
        profile.domain.clone_from(domain);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
        profile.auth_mode = "password".into();
    }
    if let Some(ref token) = global.token {
        profile.token = Some(token.clone());
        profile.auth_mode = "token".into();
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    Ok((name, profile))
}

/// Build a `ConsoleConfig` from config file, profile and CLI overrides.
pub fn resolve_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let config = load_config_or_default();
    let (name, profile) = effective_profile(global, &config)?;
    let mut console_config =
        idcon_config::profile_to_console_config(&profile, &name, &config.defaults)?;
    console_config.timeout = Duration::from_secs(global.timeout);
    Ok(console_config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["idcon"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_stored_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                url: "https://idm.example.com/syncope/rest".into(),
                domain: "Master".into(),
                auth_mode: "password".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );
        let (name, profile) =
            effective_profile(&global(&["--domain", "Two", "--token", "jwt"]), &config).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.domain, "Two");
        assert_eq!(profile.auth_mode, "token");
    }

    #[test]
    fn unknown_named_profile_lists_available() {
        let config = Config::default();
        let err = effective_profile(&global(&["--profile", "prod"]), &config).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "(none)"));
    }

    #[test]
    fn url_flag_stands_in_for_missing_profile() {
        let config = Config::default();
        let (_, profile) =
            effective_profile(&global(&["--url", "http://localhost:9080/syncope/rest"]), &config)
                .unwrap();
        assert_eq!(profile.domain, "Master");
        assert!(matches!(
            effective_profile(&global(&[]), &config),
            Err(CliError::NoConfig { .. })
        ));
    }
}
