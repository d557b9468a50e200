//! Clap derive structures for the `idcon` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// idcon -- administer an identity repository from the command line
#[derive(Debug, Parser)]
#[command(
    name = "idcon",
    version,
    about = "Administer identity repositories from the command line",
    long_about = "A console for identity repository administration.\n\n\
        Browse users, groups, roles, realms, schemas, domains, applications,\n\
        implementations and parameters; create and edit them the way the\n\
        admin console wizards do.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Deployment profile to use
    #[arg(long, short = 'p', env = "IDCON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST base URL (overrides profile)
    #[arg(long, short = 'u', env = "IDCON_URL", global = true)]
    pub url: Option<String>,

    /// Tenant domain (overrides profile)
    #[arg(long, short = 'd', env = "IDCON_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// Username for password auth (overrides profile)
    #[arg(long, env = "IDCON_USERNAME", global = true)]
    pub username: Option<String>,

    /// Pre-issued access token
    #[arg(long, env = "IDCON_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "IDCON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "IDCON_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "IDCON_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one key per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage groups
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Manage roles
    Roles(EntityArgs),

    /// Manage the realm tree
    Realms(EntityArgs),

    /// Manage plain, derived and virtual schemas
    Schemas(SchemasArgs),

    /// Manage domains (tenants)
    Domains(EntityArgs),

    /// Manage applications and their privileges
    #[command(alias = "apps")]
    Applications(EntityArgs),

    /// Manage pluggable implementations
    #[command(alias = "impls")]
    Implementations(ImplementationsArgs),

    /// Manage configuration parameters
    Params(EntityArgs),

    /// Show the authenticated user and entitlements
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Paging, sorting and filtering shared by every list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page to show, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Rows per page: 10, 25, 50 or 100 (saved as your preference)
    #[arg(long, short = 'n')]
    pub size: Option<u32>,

    /// Sort column, optionally suffixed with :asc or :desc
    /// Examples: "username", "lastChangeDate:desc"
    #[arg(long, short = 's')]
    pub sort: Option<String>,

    /// Keyword matched against names
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Search clause, repeatable and joined with AND; prefix with | for OR
    /// Examples: "username==ross*", "$groups==root", "|$roles==Other"
    #[arg(long = "where", short = 'w', value_name = "CLAUSE")]
    pub clauses: Vec<String>,

    /// Realm to search in (full path)
    #[arg(long, short = 'r')]
    pub realm: Option<String>,

    /// Columns to show, comma-separated (saved as your preference)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub columns: Option<Vec<String>>,
}

/// How a wizard's working copy is filled from the command line.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// JSON file with the entity to start from
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Field assignment, repeatable (lists are comma-separated)
    /// Examples: "username=rossini", "roles=Other,User reviewer"
    #[arg(long = "set", short = 'S', value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

/// Operations every entity kind supports.
#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List one page of the directory
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one entity
    Get {
        /// Key (full path for realms)
        key: String,
    },

    /// Create an entity
    Create(EditArgs),

    /// Update an entity
    Update {
        /// Key (full path for realms)
        key: String,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Create a copy of an existing entity
    Clone {
        /// Key of the entity to copy
        key: String,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Delete one or more entities
    #[command(alias = "rm")]
    Delete {
        /// Keys (full paths for realms)
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show the wizard steps and fields
    Fields,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    #[command(flatten)]
    Common(EntityCommand),

    /// Toggle the must-change-password flag
    MustChangePassword {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Suspend users
    Suspend {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Reactivate suspended users
    Reactivate {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCHEMAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SchemasArgs {
    /// Schema type
    #[arg(long = "type", short = 't', default_value = "plain", global = true)]
    pub kind: SchemaKind,

    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaKind {
    Plain,
    Derived,
    Virtual,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IMPLEMENTATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ImplementationsArgs {
    /// Implementation type (e.g. ACCOUNT_RULE, PASSWORD_RULE, LOGIC_ACTIONS)
    #[arg(long = "type", short = 't', required = true)]
    pub kind: String,

    #[command(subcommand)]
    pub command: EntityCommand,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (url, domain, auth_mode, username, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password or token in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn implementation_type_goes_before_the_operation() {
        let cli =
            Cli::try_parse_from(["idcon", "implementations", "-t", "ACCOUNT_RULE", "list"]).unwrap();
        match cli.command {
            Command::Implementations(args) => {
                assert_eq!(args.kind, "ACCOUNT_RULE");
                assert!(matches!(args.command, EntityCommand::List(_)));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["idcon", "implementations", "list"]).is_err());
    }

    #[test]
    fn schema_type_is_accepted_after_the_operation() {
        let cli = Cli::try_parse_from(["idcon", "schemas", "list", "--type", "derived"]).unwrap();
        match cli.command {
            Command::Schemas(args) => assert!(matches!(args.kind, SchemaKind::Derived)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
