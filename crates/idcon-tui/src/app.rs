//! Application core: event loop, screen management, action dispatch.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use idcon_core::{ConsoleConfig, Level, Notification};

use crate::action::{Action, ConfirmRequest};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::panel;

const TOAST_TTL: Duration = Duration::from_secs(3);
const ERROR_TOAST_TTL: Duration = Duration::from_secs(6);

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection_status: ConnectionStatus,
    /// Signed-in user, for the status bar.
    identity: Option<String>,
    help_visible: bool,
    search_active: bool,
    search_query: String,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    config: Option<ConsoleConfig>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmRequest>,
    /// Notification toasts, oldest first; the front one is shown.
    notifications: VecDeque<(Notification, Instant)>,
}

impl App {
    pub fn new(config: ConsoleConfig) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> = create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::default(),
            previous_screen: None,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            identity: None,
            help_visible: false,
            search_active: false,
            search_query: String::new(),
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            config: Some(config),
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notifications: VecDeque::new(),
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop until the operator quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_screens()?;

        if let Some(config) = self.config.take() {
            let cancel = self.data_cancel.clone();
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(config, tx, cancel).await;
            });
        }

        let mut events = EventReader::new(
            Duration::from_millis(100), // inbox draining, throbbers
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        // Let the bridge sign out before the runtime shuts down.
        tokio::time::sleep(Duration::from_millis(150)).await;
        info!("TUI event loop ended");
        Ok(())
    }

    fn active_captures_keys(&self) -> bool {
        self.screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_keys())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        // Confirmation dialog captures all input
        if self.pending_confirm.is_some() {
            return match key.code {
                KeyCode::Char('y' | 'Y') => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        // Wizards and menus take every key
        if self.active_captures_keys() {
            if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                return screen.handle_key_event(key);
            }
        }

        if self.search_active {
            return match key.code {
                KeyCode::Esc => Ok(Some(Action::CloseSearch)),
                KeyCode::Enter => Ok(Some(Action::SearchSubmit(self.search_query.clone()))),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    Ok(Some(Action::SearchInput(self.search_query.clone())))
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    Ok(Some(Action::SearchInput(self.search_query.clone())))
                }
                _ => Ok(None),
            };
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('/')) => return Ok(Some(Action::OpenSearch)),

            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                let n = c as u8 - b'0';
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            (KeyModifiers::NONE, KeyCode::Esc) => {
                if !self.notifications.is_empty() {
                    return Ok(Some(Action::DismissNotification));
                }
                return Ok(Some(Action::GoBack));
            }

            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Send `action` to one screen and queue its follow-up.
    fn forward(&mut self, id: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&id) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Process a single action: update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Resize(w, h) => self.terminal_size = (*w, *h),

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }

            Action::CloseSearch => {
                self.search_active = false;
                self.search_query.clear();
            }

            Action::SearchInput(_) => {}

            Action::SearchSubmit(_) => {
                self.search_active = false;
                self.forward(self.active_screen, action)?;
            }

            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,

            Action::Connected(console) => {
                let session = console.session();
                self.identity = Some(format!("{}@{}", session.username(), session.domain()));
                self.connection_status = ConnectionStatus::Connected;
                self.broadcast(action)?;
            }

            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Failed(reason.clone());
                self.identity = None;
                self.notifications
                    .push_back((Notification::error(reason.clone()), Instant::now()));
                self.broadcast(action)?;
            }

            Action::ShowConfirm(request) => self.pending_confirm = Some(request.clone()),

            Action::ConfirmYes => {
                if let Some(request) = self.pending_confirm.take() {
                    self.action_tx.send(Action::Confirmed(request.screen))?;
                }
            }

            Action::ConfirmNo => {
                if let Some(request) = self.pending_confirm.take() {
                    self.forward(request.screen, action)?;
                }
            }

            Action::Confirmed(id) => self.forward(*id, action)?,

            Action::Notify(notification) => {
                self.notifications
                    .push_back((notification.clone(), Instant::now()));
            }

            Action::DismissNotification => {
                self.notifications.pop_front();
            }

            Action::Tick => {
                self.expire_notifications();
                self.broadcast(action)?;
            }

            Action::Render => {}
        }

        Ok(())
    }

    /// Drop the shown toast once it has been up long enough; the next one
    /// starts its clock when it comes to the front.
    fn expire_notifications(&mut self) {
        let Some((notification, shown)) = self.notifications.front() else {
            return;
        };
        let ttl = if notification.level == Level::Error {
            ERROR_TOAST_TTL
        } else {
            TOAST_TTL
        };
        if shown.elapsed() > ttl {
            self.notifications.pop_front();
            if let Some((_, next)) = self.notifications.front_mut() {
                *next = Instant::now();
            }
        }
    }

    // ── Render ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        // Overlays, last is topmost
        if let Some((notification, _)) = self.notifications.front() {
            render_notification(frame, area, notification);
        }
        if let Some(confirm) = &self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let narrow = self.terminal_size.0 < 120;
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                let label = if narrow { id.label_short() } else { id.label() };
                Line::from(Span::styled(format!(" {} {label} ", id.number()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::ELECTRIC_PURPLE)),
                Span::styled(&self.search_query, Style::default().fg(theme::NEON_CYAN)),
                Span::styled("█", Style::default().fg(theme::NEON_CYAN)),
                Span::styled("  Esc cancel  Enter filter (empty clears)", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let connection_indicator = match &self.connection_status {
            ConnectionStatus::Connected => Span::styled(
                format!("● {}", self.identity.as_deref().unwrap_or("connected")),
                Style::default().fg(theme::SUCCESS_GREEN),
            ),
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Failed(_) => {
                Span::styled("○ sign-in failed", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ signing in", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
        };

        let screen_hints = self
            .screens
            .get(&self.active_screen)
            .map_or("", |s| s.hints());
        let line = Line::from(vec![
            Span::raw(" "),
            connection_indicator,
            Span::styled(" │ ", theme::key_hint()),
            Span::styled(screen_hints, theme::key_hint()),
            Span::styled("  ? help  / search  q quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Render the help overlay centered on screen.
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = panel::centered(area, 64, 27);
    let inner = panel::render_panel(frame, help_area, "Keyboard Shortcuts");

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(theme::NEON_CYAN),
        ))
    };
    let key = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<12}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        section("Navigation"),
        key("1-9 Tab", "Jump to / next screen"),
        key("t T", "Next / previous sub-tab"),
        key("j/k ↑/↓", "Move up/down"),
        key("←/→ [ ]", "Previous / next page"),
        key("g G", "First / last page"),
        Line::from(""),
        section("Directory"),
        key("n", "New"),
        key("Enter e", "Edit (or view when read-only)"),
        key("c d", "Clone / delete"),
        key("x", "Row actions"),
        key("Space a b", "Select / select page / batch actions"),
        key("< > s", "Pick column / sort on it"),
        key("r v R", "Rows per page / columns / refresh"),
        Line::from(""),
        section("Wizard"),
        key("Tab ↑/↓", "Next / previous field"),
        key("←/→ Space", "Change choice or flag"),
        key("Enter", "Next step, save on the last"),
        key("PgUp PgDn", "Previous / next step"),
        key("Ctrl+S Esc", "Save / cancel"),
        Line::from(""),
        section("Global"),
        key("/ ? q", "Search / this help / quit"),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Render a centered confirmation dialog.
fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmRequest) {
    let dialog_area = panel::centered(area, 54, 6);
    frame.render_widget(Clear, dialog_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        dialog_area,
    );

    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::ELECTRIC_YELLOW));

    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(Span::styled(
            format!("  {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

/// Render a notification toast in the bottom-right corner.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let msg_len = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 70).min(area.width);
    let height = if msg_len > width.saturating_sub(6) { 4 } else { 3 };

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2); // above status bar
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = theme::level_marker(notification.level);

    frame.render_widget(Clear, toast_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        toast_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(&notification.message, Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::action::ConfirmRequest;
    use idcon_core::{ActionType, AuthCredentials};

    fn app() -> App {
        let url = idcon_config::parse_url("http://localhost:9080/syncope/rest").unwrap();
        let auth = AuthCredentials::Token(secrecy::SecretString::from("jwt".to_owned()));
        App::new(ConsoleConfig::new(url, auth))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn number_keys_switch_screens() {
        let mut app = app();
        let action = app.handle_key_event(press(KeyCode::Char('4'))).unwrap();
        assert!(matches!(action, Some(Action::SwitchScreen(ScreenId::Realms))));
    }

    #[test]
    fn confirm_dialog_captures_keys_and_routes_yes_to_screen() {
        let mut app = app();
        app.process_action(&Action::ShowConfirm(ConfirmRequest {
            screen: ScreenId::Groups,
            action: ActionType::Delete,
            targets: vec!["staff".into()],
        }))
        .unwrap();

        // Global keys are swallowed while the dialog is up.
        assert!(app.handle_key_event(press(KeyCode::Char('q'))).unwrap().is_none());
        let yes = app.handle_key_event(press(KeyCode::Char('y'))).unwrap().unwrap();
        app.process_action(&yes).unwrap();

        assert!(app.pending_confirm.is_none());
        assert!(matches!(
            app.action_rx.try_recv(),
            Ok(Action::Confirmed(ScreenId::Groups))
        ));
    }

    #[test]
    fn search_submit_closes_the_bar() {
        let mut app = app();
        app.process_action(&Action::OpenSearch).unwrap();
        for c in "ro".chars() {
            app.handle_key_event(press(KeyCode::Char(c))).unwrap();
        }
        let submit = app.handle_key_event(press(KeyCode::Enter)).unwrap().unwrap();
        assert!(matches!(&submit, Action::SearchSubmit(q) if q == "ro"));
        app.process_action(&submit).unwrap();
        assert!(!app.search_active);
    }

    #[test]
    fn toasts_queue_in_arrival_order() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::success())).unwrap();
        app.process_action(&Action::Notify(Notification::error("boom"))).unwrap();
        assert_eq!(app.notifications.len(), 2);

        app.process_action(&Action::DismissNotification).unwrap();
        assert_eq!(app.notifications.front().unwrap().0.message, "boom");
    }
}
