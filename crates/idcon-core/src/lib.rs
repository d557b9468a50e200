// idcon-core: Console logic between idcon-api and the front ends (CLI/TUI).
//
// Paged directory views, entity wizards, entitlement-gated actions,
// search composition and the per-user session.

pub mod actions;
pub mod batch;
pub mod config;
pub mod console;
pub mod directory;
pub mod entitlement;
pub mod error;
pub mod model;
pub mod notification;
pub mod preferences;
pub mod search;
pub mod session;
pub mod wizard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use actions::{Action, ActionType};
pub use batch::{BatchReport, BatchStatus};
pub use config::{AuthCredentials, ConsoleConfig, TlsVerification};
pub use console::Console;
pub use directory::{
    Column, DataProvider, DirectoryView, Pagination, RefreshMode, SortParam, Tabular,
};
pub use error::CoreError;
pub use notification::{Level, Notification};
pub use preferences::{MemoryPreferences, PreferenceStore, Preferences};
pub use search::SearchClause;
pub use session::Session;
pub use wizard::{EntityService, FieldValue, FinishOutcome, Form, Mode, Wizard};

pub use model::{
    Application, ConfParam, DerSchema, Domain, Entity, EntityKind, Group, Implementation,
    PlainSchema, Privilege, Realm, Role, StatusType, User, VirSchema,
};
