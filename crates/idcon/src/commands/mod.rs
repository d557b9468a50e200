//! Command dispatch: routes each top-level command to its handler.

pub mod config_cmd;
pub mod entity;
pub mod util;

use serde::Serialize;

use idcon_core::{ActionType, BatchReport, Console, EntityKind};

use crate::cli::{Command, GlobalOpts, OutputFormat, SchemaKind, UsersCommand};
use crate::error::CliError;
use crate::output;

use self::entity::{
    Applications, DerSchemas, Domains, Groups, Implementations, Params, PlainSchemas, Realms,
    Roles, Users, VirSchemas,
};

/// Run a connected command.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Users(args) => match args.command {
            UsersCommand::Common(cmd) => entity::handle(&Users, cmd, console, global).await,
            UsersCommand::MustChangePassword { keys } => {
                user_batch(ActionType::MustChangePassword, &keys, console, global).await
            }
            UsersCommand::Suspend { keys } => {
                user_batch(ActionType::Suspend, &keys, console, global).await
            }
            UsersCommand::Reactivate { keys } => {
                user_batch(ActionType::Reactivate, &keys, console, global).await
            }
        },
        Command::Groups(args) => entity::handle(&Groups, args.command, console, global).await,
        Command::Roles(args) => entity::handle(&Roles, args.command, console, global).await,
        Command::Realms(args) => entity::handle(&Realms, args.command, console, global).await,
        Command::Schemas(args) => match args.kind {
            SchemaKind::Plain => entity::handle(&PlainSchemas, args.command, console, global).await,
            SchemaKind::Derived => entity::handle(&DerSchemas, args.command, console, global).await,
            SchemaKind::Virtual => entity::handle(&VirSchemas, args.command, console, global).await,
        },
        Command::Domains(args) => entity::handle(&Domains, args.command, console, global).await,
        Command::Applications(args) => {
            entity::handle(&Applications, args.command, console, global).await
        }
        Command::Implementations(args) => {
            let resource = Implementations { kind: args.kind };
            entity::handle(&resource, args.command, console, global).await
        }
        Command::Params(args) => entity::handle(&Params, args.command, console, global).await,
        Command::Whoami => whoami(console, global),
        // Config and Completions are handled before connecting
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    // Anything still queued (lookup warnings, ...) is shown on the way out.
    flush_notifications(console, global, result.is_err());
    result
}

/// Print and clear the session's notifications. With `skip_errors`,
/// error notifications are dropped because the command's own error
/// reports the same failure.
pub fn flush_notifications(console: &Console, global: &GlobalOpts, skip_errors: bool) {
    let notes: Vec<_> = console
        .session()
        .drain_notifications()
        .into_iter()
        .filter(|n| !(skip_errors && n.level == idcon_core::Level::Error))
        .collect();
    output::print_notifications(&notes, output::should_color(&global.color), global.quiet);
}

/// Print a batch report; any failed key fails the command.
pub fn print_batch(report: &BatchReport, global: &GlobalOpts) -> Result<(), CliError> {
    let rendered = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            output::render_batch(report, output::should_color(&global.color))
        }
        ref other => output::render_value(other, report)?,
    };
    output::print_output(&rendered, global.quiet);
    if report.all_succeeded() {
        Ok(())
    } else {
        Err(CliError::BatchFailed {
            summary: report.summary(),
        })
    }
}

async fn user_batch(
    action: ActionType,
    keys: &[String],
    console: &Console,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    console.ensure_allowed(EntityKind::User, action, None)?;
    let spinner = output::spinner(action.label(), global.quiet);
    let report = console.run_batch(EntityKind::User, action, keys).await;
    spinner.finish_and_clear();
    print_batch(&report?, global)
}

// ── Whoami ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Identity<'a> {
    username: &'a str,
    domain: &'a str,
    url: &'a str,
    entitlements: Vec<&'a str>,
    delegations: &'a [String],
}

fn whoami(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let session = console.session();
    let identity = Identity {
        username: session.username(),
        domain: session.domain(),
        url: console.config().url.as_str(),
        entitlements: session.entitlements().collect(),
        delegations: session.delegations(),
    };
    let rendered = match global.output {
        OutputFormat::Table => {
            let mut lines = vec![
                format!("User:         {}", identity.username),
                format!("Domain:       {}", identity.domain),
                format!("Server:       {}", identity.url),
                format!("Entitlements: {}", identity.entitlements.len()),
            ];
            lines.extend(identity.entitlements.iter().map(|e| format!("  {e}")));
            if !identity.delegations.is_empty() {
                lines.push(format!("Delegated by: {}", identity.delegations.join(", ")));
            }
            lines.join("\n")
        }
        OutputFormat::Plain => identity.username.to_owned(),
        ref other => output::render_value(other, &identity)?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
