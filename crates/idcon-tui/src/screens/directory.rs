//! Paged directory screen shared by every entity kind.
//!
//! The [`DirectoryView`] lives behind an async mutex; keys spawn tasks
//! that fetch through it and post results to an inbox, which the screen
//! drains on every tick. Rendering only reads the last snapshot.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex as StdMutex};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use idcon_core::actions::{allowed, visible_actions, visible_batch_actions};
use idcon_core::preferences::PAGINATOR_CHOICES;
use idcon_core::{
    ActionType, Column, Console, CoreError, DataProvider, DirectoryView, Entity, EntityKind,
    EntityService, FinishOutcome, Form, Level, Mode, Notification, Pagination, RefreshMode,
    SortParam, Tabular, Wizard,
};

use crate::action::{Action, ConfirmRequest};
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;
use crate::widgets::panel;

use super::wizard::{WizardKey, WizardModal};

// ── Kind seam ───────────────────────────────────────────────────────

/// What a directory lists and how a create starts.
pub trait DirectoryKind: Send + Sync + 'static {
    type Item: Form + Tabular + Default;
    type Provider: DataProvider<Item = Self::Item> + 'static;

    /// Rows carry checkboxes for batch actions.
    const CHECKBOXES: bool = false;

    /// Rows matching `keyword`, or all rows.
    fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider;

    fn template(&self) -> Self::Item {
        Self::Item::default()
    }
}

// ── Async plumbing ──────────────────────────────────────────────────

type SharedView<P> = Arc<Mutex<DirectoryView<P>>>;
type Inbox<T> = Arc<StdMutex<Vec<Delivery<T>>>>;

/// Results posted by background tasks.
enum Delivery<T> {
    Page(Snapshot<T>),
    Opened(Wizard<T>),
    Finished(FinishOutcome<T>, Wizard<T>),
    /// The task failed and has already notified the session.
    Failed,
}

fn deliver<T>(inbox: &Inbox<T>, delivery: Delivery<T>) {
    if let Ok(mut queue) = inbox.lock() {
        queue.push(delivery);
    }
}

/// What the table shows, copied out of the view after each fetch.
struct Snapshot<T> {
    rows: Vec<T>,
    pagination: Pagination,
    columns: Vec<&'static Column>,
    sort: Option<SortParam>,
    selected: BTreeSet<String>,
}

impl<T: Tabular> Snapshot<T> {
    fn of<P: DataProvider<Item = T>>(view: &DirectoryView<P>) -> Self {
        Self {
            rows: view.rows().to_vec(),
            pagination: view.pagination(),
            columns: view.visible_columns(),
            sort: view.sort().cloned(),
            selected: view.selected().into_iter().collect(),
        }
    }
}

enum ViewOp<P> {
    Refresh(RefreshMode),
    Goto(u32),
    NextPage,
    PrevPage,
    Sort(&'static str),
    Rows(u32),
    Provider(P),
    Columns(Vec<String>),
    Toggle(String),
    ToggleAll,
}

impl<P: DataProvider> ViewOp<P> {
    fn fetches(&self) -> bool {
        !matches!(self, Self::Columns(_) | Self::Toggle(_) | Self::ToggleAll)
    }

    async fn apply(self, view: &mut DirectoryView<P>) -> Result<(), CoreError> {
        match self {
            Self::Refresh(mode) => view.refresh(mode).await,
            Self::Goto(page) => view.goto(page).await,
            Self::NextPage => view.next_page().await,
            Self::PrevPage => view.prev_page().await,
            Self::Sort(column) => view.sort_by(column).await,
            Self::Rows(rows) => view.set_rows(rows).await,
            Self::Provider(provider) => view.set_provider(provider).await,
            Self::Columns(columns) => view.set_columns(columns),
            Self::Toggle(key) => {
                view.toggle_selected(&key);
                Ok(())
            }
            Self::ToggleAll => {
                view.toggle_all();
                Ok(())
            }
        }
    }
}

/// Refetch and post the new page.
async fn refresh_into<P>(
    view: &SharedView<P>,
    console: &Console,
    inbox: &Inbox<P::Item>,
    mode: RefreshMode,
) where
    P: DataProvider,
{
    let mut view = view.lock().await;
    match view.refresh(mode).await {
        Ok(()) => deliver(inbox, Delivery::Page(Snapshot::of(&view))),
        Err(e) => {
            console.session().on_exception(&e);
            deliver(inbox, Delivery::Failed);
        }
    }
}

// ── Modals ──────────────────────────────────────────────────────────

enum OpenWizard<T> {
    Create(T),
    Edit(T),
    View(T),
    Clone(T),
}

enum MenuTarget<T> {
    Row(T),
    Selection(Vec<String>),
}

struct Menu<T> {
    title: String,
    items: Vec<ActionType>,
    cursor: usize,
    target: MenuTarget<T>,
}

struct ColumnChooser {
    entries: Vec<(&'static Column, bool)>,
    cursor: usize,
}

enum Modal<T> {
    Wizard(WizardModal<T>),
    Menu(Menu<T>),
    Columns(ColumnChooser),
}

/// A confirmed action waiting for the operator's yes.
enum Pending<T> {
    Delete(T),
    Batch(ActionType, Vec<String>),
}

// ── Screen ──────────────────────────────────────────────────────────

pub struct DirectoryScreen<K: DirectoryKind> {
    id: ScreenId,
    kind: K,
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    console: Option<Console>,
    view: Option<SharedView<K::Provider>>,
    inbox: Inbox<K::Item>,
    page: Option<Snapshot<K::Item>>,
    loaded: bool,
    loading: bool,
    keyword: String,
    table_state: TableState,
    /// Column the sort keys act on, as an index into the visible columns.
    sort_cursor: usize,
    modal: Option<Modal<K::Item>>,
    pending: Option<Pending<K::Item>>,
    throbber: ThrobberState,
}

impl<K> DirectoryScreen<K>
where
    K: DirectoryKind,
    Console: EntityService<K::Item>,
{
    pub fn new(id: ScreenId, kind: K) -> Self {
        Self {
            id,
            kind,
            focused: false,
            action_tx: None,
            console: None,
            view: None,
            inbox: Arc::new(StdMutex::new(Vec::new())),
            page: None,
            loaded: false,
            loading: false,
            keyword: String::new(),
            table_state: TableState::default().with_selected(Some(0)),
            sort_cursor: 0,
            modal: None,
            pending: None,
            throbber: ThrobberState::default(),
        }
    }

    fn entity_kind() -> EntityKind {
        <K::Item as Entity>::KIND
    }

    fn keyword(&self) -> Option<&str> {
        Some(self.keyword.as_str()).filter(|k| !k.is_empty())
    }

    fn handles(&self) -> Option<(Console, SharedView<K::Provider>, Inbox<K::Item>)> {
        Some((
            self.console.clone()?,
            Arc::clone(self.view.as_ref()?),
            Arc::clone(&self.inbox),
        ))
    }

    fn selected_row(&self) -> Option<&K::Item> {
        let page = self.page.as_ref()?;
        page.rows.get(self.table_state.selected()?)
    }

    fn row_actions(&self, row: &K::Item) -> Vec<ActionType> {
        self.console.as_ref().map_or_else(Vec::new, |c| {
            visible_actions(&c.session(), Self::entity_kind(), row.realm())
        })
    }

    fn may(&self, action: ActionType, realm: Option<&str>) -> bool {
        self.console
            .as_ref()
            .is_some_and(|c| allowed(&c.session(), Self::entity_kind(), action, realm))
    }

    // ── Background work ──────────────────────────────────────────────

    fn run_view(&mut self, op: ViewOp<K::Provider>) {
        let Some((console, view, inbox)) = self.handles() else {
            return;
        };
        if op.fetches() {
            self.loading = true;
        }
        tokio::spawn(async move {
            let mut view = view.lock().await;
            let delivery = match op.apply(&mut view).await {
                Ok(()) => Delivery::Page(Snapshot::of(&view)),
                Err(e) => {
                    console.session().on_exception(&e);
                    Delivery::Failed
                }
            };
            deliver(&inbox, delivery);
        });
    }

    fn open_wizard(&mut self, open: OpenWizard<K::Item>) {
        let Some((console, _, inbox)) = self.handles() else {
            return;
        };
        self.loading = true;
        tokio::spawn(async move {
            let wizard = match open {
                OpenWizard::Create(template) => Ok(Wizard::create(template)),
                OpenWizard::Edit(row) => console.edit_wizard(&row).await,
                OpenWizard::View(row) => console
                    .edit_wizard(&row)
                    .await
                    .map(|w| Wizard::read_only(w.working().clone())),
                OpenWizard::Clone(row) => console.clone_wizard(&row).await,
            };
            match wizard {
                Ok(mut wizard) => {
                    if wizard.mode() != Mode::ReadOnly {
                        console.load_choices(&mut wizard).await;
                    }
                    deliver(&inbox, Delivery::Opened(wizard));
                }
                Err(e) => {
                    console.session().on_exception(&e);
                    deliver(&inbox, Delivery::Failed);
                }
            }
        });
    }

    fn submit_wizard(&mut self) {
        let Some((console, _, inbox)) = self.handles() else {
            return;
        };
        let Some(Modal::Wizard(modal)) = self.modal.as_mut() else {
            return;
        };
        let Some(mut wizard) = modal.begin_submit() else {
            return;
        };
        tokio::spawn(async move {
            let outcome = console.finish_wizard(&mut wizard).await;
            deliver(&inbox, Delivery::Finished(outcome, wizard));
        });
    }

    fn delete(&mut self, row: K::Item) {
        let Some((console, view, inbox)) = self.handles() else {
            return;
        };
        self.loading = true;
        tokio::spawn(async move {
            match console.delete(&row).await {
                Ok(()) => console.session().success(),
                Err(e) => {
                    console.session().on_exception(&e);
                }
            }
            refresh_into(&view, &console, &inbox, RefreshMode::Keep).await;
        });
    }

    fn run_batch(&mut self, action: ActionType, keys: Vec<String>) {
        let Some((console, view, inbox)) = self.handles() else {
            return;
        };
        self.loading = true;
        let kind = Self::entity_kind();
        tokio::spawn(async move {
            let session = console.session();
            match console.run_batch(kind, action, &keys).await {
                Ok(report) if report.all_succeeded() => {
                    session.notify(Notification::new(Level::Success, report.summary()));
                }
                Ok(report) => {
                    let failures: Vec<String> = report
                        .failed()
                        .map(|(key, message)| format!("{key}: {message}"))
                        .collect();
                    session.notify(Notification::new(
                        Level::Warning,
                        format!("{} ({})", report.summary(), failures.join("; ")),
                    ));
                }
                Err(e) => {
                    session.on_exception(&e);
                }
            }
            refresh_into(&view, &console, &inbox, RefreshMode::Keep).await;
        });
    }

    fn drain_inbox(&mut self) {
        let deliveries = self
            .inbox
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default();

        for delivery in deliveries {
            match delivery {
                Delivery::Page(snapshot) => {
                    self.loading = false;
                    self.loaded = true;
                    let rows = snapshot.rows.len();
                    let selected = self.table_state.selected().unwrap_or(0);
                    self.table_state
                        .select(Some(selected.min(rows.saturating_sub(1))));
                    self.sort_cursor = self
                        .sort_cursor
                        .min(snapshot.columns.len().saturating_sub(1));
                    self.page = Some(snapshot);
                }
                Delivery::Opened(wizard) => {
                    self.loading = false;
                    self.modal = Some(Modal::Wizard(WizardModal::new(wizard)));
                }
                Delivery::Finished(FinishOutcome::Closed { created, .. }, _) => {
                    self.modal = None;
                    let mode = if created {
                        RefreshMode::LastPage
                    } else {
                        RefreshMode::Keep
                    };
                    self.run_view(ViewOp::Refresh(mode));
                }
                Delivery::Finished(FinishOutcome::Open { .. }, wizard) => {
                    if let Some(Modal::Wizard(modal)) = self.modal.as_mut() {
                        modal.finished(wizard);
                    }
                }
                Delivery::Failed => self.loading = false,
            }
        }
    }

    // ── Row and batch actions ────────────────────────────────────────

    fn confirm(&mut self, pending: Pending<K::Item>, action: ActionType, targets: Vec<String>) {
        self.pending = Some(pending);
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::ShowConfirm(ConfirmRequest {
                screen: self.id,
                action,
                targets,
            }));
        }
    }

    fn perform(&mut self, action: ActionType, target: MenuTarget<K::Item>) {
        match target {
            MenuTarget::Row(row) => match action {
                ActionType::Edit => self.open_wizard(OpenWizard::Edit(row)),
                ActionType::Clone => self.open_wizard(OpenWizard::Clone(row)),
                ActionType::Delete => {
                    let name = row.name().to_owned();
                    self.confirm(Pending::Delete(row), action, vec![name]);
                }
                _ => {
                    if let Some(key) = row.key() {
                        let keys = vec![key.to_owned()];
                        self.run_batch(action, keys);
                    }
                }
            },
            MenuTarget::Selection(keys) => {
                if action.needs_confirm() {
                    let targets = keys.clone();
                    self.confirm(Pending::Batch(action, keys), action, targets);
                } else {
                    self.run_batch(action, keys);
                }
            }
        }
    }

    fn create(&mut self) {
        let template = self.kind.template();
        let Some(console) = &self.console else {
            return;
        };
        match console.ensure_allowed(Self::entity_kind(), ActionType::Create, template.realm()) {
            Ok(()) => self.open_wizard(OpenWizard::Create(template)),
            Err(e) => {
                console.session().on_exception(&e);
            }
        }
    }

    /// Edit when allowed, otherwise show the row read-only.
    fn edit_selected(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        if self.row_actions(&row).contains(&ActionType::Edit) {
            self.open_wizard(OpenWizard::Edit(row));
        } else {
            self.open_wizard(OpenWizard::View(row));
        }
    }

    fn row_action(&mut self, action: ActionType) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        if self.row_actions(&row).contains(&action) {
            self.perform(action, MenuTarget::Row(row));
        } else if let Some(console) = &self.console {
            console.session().warn(format!(
                "{} is not allowed on {}",
                action.label(),
                row.name()
            ));
        }
    }

    fn open_row_menu(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        let items = self.row_actions(&row);
        if items.is_empty() {
            return;
        }
        self.modal = Some(Modal::Menu(Menu {
            title: row.name().to_owned(),
            items,
            cursor: 0,
            target: MenuTarget::Row(row),
        }));
    }

    /// Actions allowed on every selected row of the page.
    fn open_batch_menu(&mut self) {
        let (Some(console), Some(page)) = (&self.console, &self.page) else {
            return;
        };
        let keys: Vec<String> = page.selected.iter().cloned().collect();
        if keys.is_empty() {
            console.session().info("Select rows with Space first");
            return;
        }

        let session = console.session();
        let kind = Self::entity_kind();
        let mut items = visible_batch_actions(&session, kind, None);
        for row in page
            .rows
            .iter()
            .filter(|r| r.key().is_some_and(|k| page.selected.contains(k)))
        {
            let here = visible_batch_actions(&session, kind, row.realm());
            items.retain(|a| here.contains(a));
        }
        if items.is_empty() {
            session.warn("No batch action is allowed on the selection");
            return;
        }

        self.modal = Some(Modal::Menu(Menu {
            title: format!("{} selected", keys.len()),
            items,
            cursor: 0,
            target: MenuTarget::Selection(keys),
        }));
    }

    fn open_columns(&mut self) {
        let Some(page) = &self.page else {
            return;
        };
        let visible: Vec<&str> = page.columns.iter().map(|c| c.id).collect();
        let entries = <K::Item as Tabular>::columns()
            .iter()
            .map(|c| (c, visible.contains(&c.id)))
            .collect();
        self.modal = Some(Modal::Columns(ColumnChooser { entries, cursor: 0 }));
    }

    fn cycle_rows(&mut self) {
        let Some(page) = &self.page else {
            return;
        };
        let current = page.pagination.rows;
        let next = PAGINATOR_CHOICES
            .iter()
            .position(|&r| r == current)
            .map_or(PAGINATOR_CHOICES[0], |i| {
                PAGINATOR_CHOICES[(i + 1) % PAGINATOR_CHOICES.len()]
            });
        self.run_view(ViewOp::Rows(next));
    }

    fn sort_on_cursor(&mut self) {
        let Some(column) = self
            .page
            .as_ref()
            .and_then(|p| p.columns.get(self.sort_cursor))
        else {
            return;
        };
        if column.sortable {
            self.run_view(ViewOp::Sort(column.id));
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let rows = self.page.as_ref().map_or(0, |p| p.rows.len());
        if rows == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(rows - 1);
        self.table_state.select(Some(next));
    }

    // ── Modal keys ───────────────────────────────────────────────────

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        match modal {
            Modal::Wizard(wizard) => match wizard.handle_key(key) {
                WizardKey::Handled => {}
                WizardKey::Close => self.modal = None,
                WizardKey::Submit => self.submit_wizard(),
            },
            Modal::Menu(menu) => match key.code {
                KeyCode::Esc => self.modal = None,
                KeyCode::Char('j') | KeyCode::Down => {
                    menu.cursor = (menu.cursor + 1).min(menu.items.len().saturating_sub(1));
                }
                KeyCode::Char('k') | KeyCode::Up => menu.cursor = menu.cursor.saturating_sub(1),
                KeyCode::Enter => {
                    let action = menu.items.get(menu.cursor).copied();
                    if let (Some(action), Some(Modal::Menu(menu))) = (action, self.modal.take()) {
                        self.perform(action, menu.target);
                    }
                }
                _ => {}
            },
            Modal::Columns(chooser) => match key.code {
                KeyCode::Esc => self.modal = None,
                KeyCode::Char('j') | KeyCode::Down => {
                    chooser.cursor =
                        (chooser.cursor + 1).min(chooser.entries.len().saturating_sub(1));
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    chooser.cursor = chooser.cursor.saturating_sub(1);
                }
                KeyCode::Char(' ') => {
                    if let Some(entry) = chooser.entries.get_mut(chooser.cursor) {
                        entry.1 = !entry.1;
                    }
                }
                KeyCode::Enter => {
                    let columns = chooser
                        .entries
                        .iter()
                        .filter(|(_, shown)| *shown)
                        .map(|(c, _)| c.id.to_owned())
                        .collect();
                    self.modal = None;
                    self.run_view(ViewOp::Columns(columns));
                }
                _ => {}
            },
        }
    }

    // ── Render ───────────────────────────────────────────────────────

    fn render_table(&self, frame: &mut Frame, area: Rect, page: &Snapshot<K::Item>) {
        let checkboxes = K::CHECKBOXES;
        let mut header_cells = Vec::with_capacity(page.columns.len() + 1);
        if checkboxes {
            header_cells.push(Cell::from(" ").style(theme::table_header()));
        }
        for (i, column) in page.columns.iter().enumerate() {
            let sorted = page.sort.as_ref().filter(|s| s.property == column.id);
            let title = match sorted {
                Some(s) if s.ascending => format!("{} ▲", column.title),
                Some(_) => format!("{} ▼", column.title),
                None => column.title.to_owned(),
            };
            let style = if i == self.sort_cursor || sorted.is_some() {
                theme::table_header_sorted()
            } else {
                theme::table_header()
            };
            header_cells.push(Cell::from(title).style(style));
        }

        let selected_idx = self.table_state.selected().unwrap_or(0);
        let rows: Vec<Row> = page
            .rows
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let checked = item.key().is_some_and(|k| page.selected.contains(k));
                let mut cells = Vec::with_capacity(page.columns.len() + 1);
                if checkboxes {
                    cells.push(Cell::from(if checked { "☑" } else { "☐" }));
                }
                cells.extend(page.columns.iter().map(|c| Cell::from(item.cell(c.id))));
                let style = if i == selected_idx && self.focused {
                    theme::table_selected()
                } else if checked {
                    theme::row_checked()
                } else {
                    theme::table_row()
                };
                Row::new(cells).style(style)
            })
            .collect();

        let mut widths = Vec::with_capacity(page.columns.len() + 1);
        if checkboxes {
            widths.push(Constraint::Length(2));
        }
        widths.extend(page.columns.iter().map(|_| Constraint::Fill(1)));

        let table = Table::new(rows, widths)
            .header(Row::new(header_cells))
            .row_highlight_style(Style::default().bg(theme::BG_HIGHLIGHT));
        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, page: &Snapshot<K::Item>) {
        let p = page.pagination;
        let mut spans = Vec::new();
        if self.loading {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!(
                " Showing {} (page {} of {})",
                p.range_label(),
                p.page + 1,
                p.page_count().max(1)
            ),
            theme::key_hint(),
        ));
        spans.push(Span::styled(format!("  {} rows", p.rows), theme::key_hint()));
        if !page.selected.is_empty() {
            spans.push(Span::styled(
                format!("  {} selected", page.selected.len()),
                theme::row_checked(),
            ));
        }
        if !self.keyword.is_empty() {
            spans.push(Span::styled(
                format!("  filter \"{}\"", self.keyword),
                Style::default().fg(theme::CORAL),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);

        if self.loading {
            let throbber = Throbber::default().throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            let spot = Rect::new(area.x, area.y, 1.min(area.width), area.height.min(1));
            frame.render_stateful_widget(throbber, spot, &mut self.throbber.clone());
        }
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect) {
        match &self.modal {
            Some(Modal::Wizard(wizard)) => wizard.render(frame, area),
            Some(Modal::Menu(menu)) => {
                let height = u16::try_from(menu.items.len()).unwrap_or(u16::MAX).saturating_add(4);
                let inner = panel::render_panel(frame, panel::centered(area, 40, height), &menu.title);
                let lines: Vec<Line> = menu
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, action)| {
                        if i == menu.cursor {
                            Line::from(Span::styled(format!("▸ {}", action.label()), theme::table_selected()))
                        } else {
                            Line::from(Span::styled(format!("  {}", action.label()), theme::table_row()))
                        }
                    })
                    .collect();
                frame.render_widget(Paragraph::new(lines), inner);
            }
            Some(Modal::Columns(chooser)) => {
                let height = u16::try_from(chooser.entries.len())
                    .unwrap_or(u16::MAX)
                    .saturating_add(4);
                let inner = panel::render_panel(frame, panel::centered(area, 44, height), "Columns");
                let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
                let lines: Vec<Line> = chooser
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, (column, shown))| {
                        let mark = if *shown { "[x]" } else { "[ ]" };
                        let style = if i == chooser.cursor {
                            theme::table_selected()
                        } else {
                            theme::table_row()
                        };
                        Line::from(Span::styled(format!(" {mark} {}", column.title), style))
                    })
                    .collect();
                frame.render_widget(Paragraph::new(lines), layout[0]);
                frame.render_widget(
                    Paragraph::new(Span::styled(" Space toggle  Enter apply  Esc cancel", theme::key_hint())),
                    layout[1],
                );
            }
            None => {}
        }
    }
}

impl<K> Component for DirectoryScreen<K>
where
    K: DirectoryKind,
    Console: EntityService<K::Item>,
{
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::End => self.move_selection(isize::MAX),
            KeyCode::Right | KeyCode::Char(']') => self.run_view(ViewOp::NextPage),
            KeyCode::Left | KeyCode::Char('[') => self.run_view(ViewOp::PrevPage),
            KeyCode::Char('g') => self.run_view(ViewOp::Goto(0)),
            KeyCode::Char('G') => self.run_view(ViewOp::Refresh(RefreshMode::LastPage)),
            KeyCode::Char('<') => self.sort_cursor = self.sort_cursor.saturating_sub(1),
            KeyCode::Char('>') => {
                let columns = self.page.as_ref().map_or(0, |p| p.columns.len());
                self.sort_cursor = (self.sort_cursor + 1).min(columns.saturating_sub(1));
            }
            KeyCode::Char('s') => self.sort_on_cursor(),
            KeyCode::Char('r') => self.cycle_rows(),
            KeyCode::Char('R') => self.run_view(ViewOp::Refresh(RefreshMode::Keep)),
            KeyCode::Char('v') => self.open_columns(),
            KeyCode::Char(' ') if K::CHECKBOXES => {
                if let Some(key) = self.selected_row().and_then(|r| r.key().map(str::to_owned)) {
                    self.run_view(ViewOp::Toggle(key));
                }
            }
            KeyCode::Char('a') if K::CHECKBOXES => self.run_view(ViewOp::ToggleAll),
            KeyCode::Char('b') if K::CHECKBOXES => self.open_batch_menu(),
            KeyCode::Char('n') => self.create(),
            KeyCode::Enter | KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('c') => self.row_action(ActionType::Clone),
            KeyCode::Char('d') => self.row_action(ActionType::Delete),
            KeyCode::Char('x') => self.open_row_menu(),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.drain_inbox();
                if self.loading {
                    self.throbber.calc_next();
                }
                if let Some(Modal::Wizard(wizard)) = self.modal.as_mut() {
                    wizard.tick();
                }
            }
            Action::Connected(console) => {
                let provider = self.kind.provider(console, self.keyword());
                let view = console
                    .directory(Self::entity_kind(), provider)
                    .with_checkboxes(K::CHECKBOXES);
                self.view = Some(Arc::new(Mutex::new(view)));
                self.console = Some(console.clone());
                self.loaded = false;
                if self.focused {
                    self.run_view(ViewOp::Refresh(RefreshMode::Keep));
                }
            }
            Action::Disconnected(_) => {
                self.console = None;
                self.view = None;
                self.modal = None;
                self.pending = None;
                self.loading = false;
            }
            Action::SearchSubmit(keyword) if self.focused => {
                self.keyword = keyword.trim().to_owned();
                if let Some(console) = &self.console {
                    let provider = self.kind.provider(console, self.keyword());
                    debug!(kind = %Self::entity_kind(), keyword = %self.keyword, "directory filter");
                    self.run_view(ViewOp::Provider(provider));
                }
            }
            Action::Confirmed(id) if *id == self.id => match self.pending.take() {
                Some(Pending::Delete(row)) => self.delete(row),
                Some(Pending::Batch(action, keys)) => self.run_batch(action, keys),
                None => {}
            },
            Action::ConfirmNo => self.pending = None,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let kind = Self::entity_kind();
        let title = match &self.page {
            Some(page) => format!(" {} ({}) ", kind.title(), page.pagination.total),
            None => format!(" {} ", kind.title()),
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        match &self.page {
            Some(page) => {
                self.render_table(frame, layout[0], page);
                self.render_footer(frame, layout[1], page);
            }
            None => {
                let text = if self.console.is_some() {
                    " Loading..."
                } else {
                    " Not connected"
                };
                frame.render_widget(Paragraph::new(Span::styled(text, theme::key_hint())), layout[0]);
            }
        }

        self.render_modal(frame, area);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused && !self.loaded && !self.loading {
            self.run_view(ViewOp::Refresh(RefreshMode::Keep));
        }
    }

    fn captures_keys(&self) -> bool {
        self.modal.is_some()
    }

    fn hints(&self) -> &'static str {
        if K::CHECKBOXES {
            "n new  e edit  c clone  d delete  x actions  Space select  b batch  s sort  r rows  v columns"
        } else {
            "n new  e edit  c clone  d delete  x actions  s sort  r rows  v columns"
        }
    }
}
