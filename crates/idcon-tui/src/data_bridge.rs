//! Data bridge: signs in and forwards session notifications as actions.
//!
//! Runs as a background task: connects the [`Console`], hands it to the
//! screens, then drains the session's notification queue into the TUI's
//! action channel until cancelled.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use idcon_core::{Console, ConsoleConfig, Preferences, Session};

use crate::action::Action;

const NOTIFICATION_POLL: Duration = Duration::from_millis(200);

/// Spawn the bridge between the [`Console`] session and the TUI.
pub async fn spawn_data_bridge(
    config: ConsoleConfig,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    let console = tokio::select! {
        () = cancel.cancelled() => return,
        connected = Console::connect(config, load_preferences) => match connected {
            Ok(console) => console,
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                let _ = action_tx.send(Action::Disconnected(idcon_core::notification::describe(&e)));
                return;
            }
        },
    };

    let session = console.session();
    info!(user = session.username(), domain = session.domain(), "signed in");
    let _ = action_tx.send(Action::Connected(console.clone()));

    let mut poll = tokio::time::interval(NOTIFICATION_POLL);
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            _ = poll.tick() => {
                for notification in console.session().drain_notifications() {
                    let _ = action_tx.send(Action::Notify(notification));
                }
            }
        }
    }

    console.disconnect().await;
    debug!("data bridge shut down");
}

fn load_preferences(session: &Session) -> Preferences {
    idcon_config::user_preferences(session.domain(), session.username()).unwrap_or_else(|e| {
        warn!(error = %e, "preferences unavailable, using defaults");
        Preferences::default()
    })
}
