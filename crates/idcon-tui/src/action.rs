//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;

use idcon_core::{ActionType, Console, Notification};

use crate::screen::ScreenId;

/// A destructive operation waiting for the operator's yes or no.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    /// Screen that asked and runs the operation on confirmation.
    pub screen: ScreenId,
    pub action: ActionType,
    /// Names of the rows the action applies to.
    pub targets: Vec<String>,
}

impl fmt::Display for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.targets.as_slice() {
            [one] => write!(f, "{} {one}?", self.action.label()),
            many => write!(f, "{} {} selected items?", self.action.label(), many.len()),
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,

    // ── Connection ────────────────────────────────────────────────
    /// Signed in; screens bind their directories to this console.
    Connected(Console),
    Connecting,
    Disconnected(String),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmRequest),
    ConfirmYes,
    ConfirmNo,
    /// Delivered to the asking screen after a yes.
    Confirmed(ScreenId),

    // ── Search ────────────────────────────────────────────────────
    OpenSearch,
    CloseSearch,
    SearchInput(String),
    /// Keyword filter for the active directory; empty clears it.
    SearchSubmit(String),

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
