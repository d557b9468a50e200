//! Wizard modal: steps of an entity form over a directory screen.
//!
//! The modal only edits the working copy. Submitting is left to the owning
//! screen, which runs the finish on the console and hands the outcome back
//! through [`WizardModal::finished`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tui_input::{Input, InputRequest};

use idcon_core::wizard::{Field, FieldKind};
use idcon_core::{FieldValue, Form, Mode, Wizard};

use crate::theme;
use crate::widgets::panel;

/// What the owning screen should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardKey {
    Handled,
    Close,
    Submit,
}

pub struct WizardModal<T> {
    wizard: Wizard<T>,
    /// Index into the visible fields of the current step.
    focus: usize,
    input: Input,
    field_error: Option<String>,
    submitting: bool,
    throbber: ThrobberState,
}

impl<T: Form> WizardModal<T> {
    pub fn new(wizard: Wizard<T>) -> Self {
        let mut modal = Self {
            wizard,
            focus: 0,
            input: Input::default(),
            field_error: None,
            submitting: false,
            throbber: ThrobberState::default(),
        };
        modal.load_input();
        modal
    }

    pub fn wizard(&self) -> &Wizard<T> {
        &self.wizard
    }

    pub fn submitting(&self) -> bool {
        self.submitting
    }

    /// Commit pending input and hand out a copy to submit. `None` when the
    /// focused field rejects its input or the wizard is read-only.
    pub fn begin_submit(&mut self) -> Option<Wizard<T>> {
        if self.wizard.mode() == Mode::ReadOnly || self.submitting || !self.commit() {
            return None;
        }
        self.submitting = true;
        Some(self.wizard.clone())
    }

    /// The submit did not close the wizard; keep the operator's edits
    /// and show the error of `submitted`.
    pub fn finished(&mut self, submitted: Wizard<T>) {
        self.submitting = false;
        self.wizard = submitted;
        self.clamp_focus();
        self.load_input();
    }

    pub fn tick(&mut self) {
        if self.submitting {
            self.throbber.calc_next();
        }
    }

    // ── Focus and input ──────────────────────────────────────────────

    fn focused_field(&self) -> Option<&'static Field> {
        self.wizard.fields().get(self.focus).copied()
    }

    /// Fields cycled with arrow keys rather than typed.
    fn cycles(&self, field: &Field) -> bool {
        match field.kind {
            FieldKind::Flag | FieldKind::Choice(_) => true,
            FieldKind::Lookup(_) => self.wizard.choices(field).is_some_and(|c| !c.is_empty()),
            _ => false,
        }
    }

    fn load_input(&mut self) {
        let value = match self.focused_field() {
            Some(field) if !self.cycles(field) => self.wizard.value(field.id).as_text(),
            _ => String::new(),
        };
        self.input = Input::new(value);
    }

    /// Store the typed text into the working copy; false keeps focus on
    /// the field and shows why.
    fn commit(&mut self) -> bool {
        let Some(field) = self.focused_field() else {
            return true;
        };
        if self.cycles(field) || !self.wizard.editable(field) {
            return true;
        }
        let typed = self.input.value().to_owned();
        if self.wizard.value(field.id).as_text() == typed.trim() {
            return true;
        }
        match self.wizard.set(field.id, FieldValue::text(typed)) {
            Ok(()) => {
                self.field_error = None;
                true
            }
            Err(e) => {
                self.field_error = Some(e.to_string());
                false
            }
        }
    }

    fn clamp_focus(&mut self) {
        let count = self.wizard.fields().len();
        self.focus = self.focus.min(count.saturating_sub(1));
    }

    fn move_focus(&mut self, forward: bool) {
        if !self.commit() {
            return;
        }
        let count = self.wizard.fields().len();
        if count == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
        self.load_input();
    }

    fn change_step(&mut self, forward: bool) -> bool {
        if !self.commit() {
            return false;
        }
        let moved = if forward {
            self.wizard.next()
        } else {
            self.wizard.previous()
        };
        if moved {
            self.focus = 0;
            self.load_input();
        }
        moved
    }

    fn cycle(&mut self, field: &Field, forward: bool) {
        if !self.wizard.editable(field) {
            return;
        }
        let next = match field.kind {
            FieldKind::Flag => FieldValue::Flag(!self.wizard.value(field.id).as_flag()),
            _ => {
                let Some(choices) = self.wizard.choices(field) else {
                    return;
                };
                if choices.is_empty() {
                    return;
                }
                let current = self.wizard.value(field.id).as_text();
                let next = match choices.iter().position(|c| *c == current) {
                    Some(i) if forward => (i + 1) % choices.len(),
                    Some(i) => (i + choices.len() - 1) % choices.len(),
                    None => 0,
                };
                FieldValue::text(choices[next].clone())
            }
        };
        // A discriminant may show or hide fields.
        match self.wizard.set(field.id, next) {
            Ok(()) => {
                self.field_error = None;
                self.clamp_focus();
                self.load_input();
            }
            Err(e) => self.field_error = Some(e.to_string()),
        }
    }

    // ── Keys ─────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> WizardKey {
        if self.submitting {
            return WizardKey::Handled;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return WizardKey::Close,
            KeyCode::Char('s') if ctrl => return WizardKey::Submit,
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::PageDown => {
                self.change_step(true);
            }
            KeyCode::PageUp => {
                self.change_step(false);
            }
            KeyCode::Enter => {
                if self.wizard.is_last_step() {
                    return WizardKey::Submit;
                }
                self.change_step(true);
            }
            _ => self.edit_key(key),
        }
        WizardKey::Handled
    }

    fn edit_key(&mut self, key: KeyEvent) {
        let Some(field) = self.focused_field() else {
            return;
        };

        if self.cycles(field) {
            match key.code {
                KeyCode::Left => self.cycle(field, false),
                KeyCode::Right | KeyCode::Char(' ') => self.cycle(field, true),
                _ => {}
            }
            return;
        }
        if !self.wizard.editable(field) {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return,
        };
        self.field_error = None;
        self.input.handle(request);
    }

    // ── Render ───────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let fields = self.wizard.fields();
        let height = u16::try_from(fields.len() * 2).unwrap_or(u16::MAX).saturating_add(9);
        let panel_area = panel::centered(area, 76, height.max(14));
        let inner = panel::render_panel(frame, panel_area, &self.wizard.title());

        let layout = Layout::vertical([
            Constraint::Length(1), // steps
            Constraint::Length(1),
            Constraint::Min(1),    // fields
            Constraint::Length(2), // error
            Constraint::Length(1), // hints
        ])
        .split(inner);

        self.render_steps(frame, layout[0]);
        self.render_fields(frame, layout[2], &fields);

        if self.submitting {
            let throbber = Throbber::default()
                .label(" Saving...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, layout[3], &mut self.throbber.clone());
        } else if let Some(error) = self.field_error.as_deref().or(self.wizard.error()) {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {error}"), theme::error_text()))
                    .wrap(Wrap { trim: true }),
                layout[3],
            );
        }

        let hints = if self.wizard.mode() == Mode::ReadOnly {
            "Tab field  PgUp/PgDn step  Esc close"
        } else if self.wizard.is_last_step() {
            "Tab field  ←/→ choose  PgUp back  Enter save  Esc cancel"
        } else {
            "Tab field  ←/→ choose  Enter next  PgUp back  Ctrl+S save  Esc cancel"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hints, theme::key_hint())).alignment(Alignment::Center),
            layout[4],
        );
    }

    fn render_steps(&self, frame: &mut Frame, area: Rect) {
        let steps = self.wizard.visible_steps();
        let current = self.wizard.step_index();
        let mut spans = Vec::with_capacity(steps.len() * 2);
        for (i, step) in steps.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" > ", Style::default().fg(theme::BORDER_GRAY)));
            }
            let style = if i == current {
                Style::default()
                    .fg(theme::ELECTRIC_PURPLE)
                    .add_modifier(Modifier::BOLD)
            } else if i < current {
                Style::default().fg(theme::SUCCESS_GREEN)
            } else {
                Style::default().fg(theme::BORDER_GRAY)
            };
            spans.push(Span::styled(format!("{} {}", i + 1, step.title), style));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            area,
        );
    }

    fn render_fields(&self, frame: &mut Frame, area: Rect, fields: &[&'static Field]) {
        let label_width = fields
            .iter()
            .map(|f| f.label.chars().count())
            .max()
            .unwrap_or(0)
            + 3;

        let mut lines = Vec::with_capacity(fields.len() * 2);
        for (i, field) in fields.iter().enumerate() {
            let active = i == self.focus;
            let marker = if field.required { "*" } else { " " };
            let label_style = if active {
                Style::default().fg(theme::NEON_CYAN).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::DIM_WHITE)
            };
            let value_style = if !self.wizard.editable(field) {
                Style::default().fg(theme::BORDER_GRAY)
            } else if active {
                Style::default().fg(theme::ELECTRIC_YELLOW)
            } else {
                Style::default().fg(theme::NEON_CYAN)
            };

            lines.push(Line::from(vec![
                Span::styled(if active { "▸" } else { " " }, label_style),
                Span::styled(
                    format!("{:<label_width$}", format!("{}{marker}", field.label)),
                    label_style,
                ),
                Span::styled(self.display_value(field, active), value_style),
            ]));

            if active {
                if let Some(hint) = self.choice_hint(field) {
                    lines.push(Line::from(Span::styled(
                        format!("  {:label_width$}{hint}", ""),
                        theme::key_hint(),
                    )));
                    continue;
                }
            }
            lines.push(Line::from(""));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn display_value(&self, field: &Field, active: bool) -> String {
        match field.kind {
            FieldKind::Flag => {
                let on = self.wizard.value(field.id).as_flag();
                if on { "[x]".into() } else { "[ ]".into() }
            }
            _ if self.cycles(field) => {
                let value = self.wizard.value(field.id).as_text();
                let shown = if value.is_empty() { "(none)" } else { &value };
                if active {
                    format!("◂ {shown} ▸")
                } else {
                    shown.to_owned()
                }
            }
            _ => {
                let text = if active {
                    self.input.value().to_owned()
                } else {
                    self.wizard.value(field.id).as_text()
                };
                let text = if field.kind == FieldKind::Secret {
                    "\u{25CF}".repeat(text.chars().count())
                } else {
                    text
                };
                if active && self.wizard.editable(field) {
                    let cursor = self.input.visual_cursor();
                    let (head, tail) = split_at_char(&text, cursor);
                    format!("{head}\u{2588}{tail}")
                } else {
                    text
                }
            }
        }
    }

    /// Loaded choices of a free-text lookup list, as a reminder.
    fn choice_hint(&self, field: &Field) -> Option<String> {
        if self.cycles(field) {
            return None;
        }
        let choices = self.wizard.choices(field)?;
        if choices.is_empty() {
            return None;
        }
        let mut hint = choices.join(", ");
        if hint.chars().count() > 60 {
            hint = hint.chars().take(57).collect::<String>() + "...";
        }
        Some(format!("one of: {hint}"))
    }
}

fn split_at_char(text: &str, chars: usize) -> (&str, &str) {
    let idx = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i);
    text.split_at(idx)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use idcon_core::{Entity, Role, User};
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            kind: KeyEventKind::Press,
            ..KeyEvent::new(code, KeyModifiers::NONE)
        }
    }

    fn type_text(modal: &mut WizardModal<Role>, text: &str) {
        for c in text.chars() {
            modal.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typed_text_is_committed_on_submit() {
        let mut modal = WizardModal::new(Wizard::create(Role::default()));
        type_text(&mut modal, "auditor");

        let submitted = modal.begin_submit().unwrap();
        assert_eq!(submitted.working().name(), "auditor");
        assert!(modal.submitting());

        // Keys are ignored while the submit runs.
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), WizardKey::Handled);
    }

    #[test]
    fn failed_submit_keeps_edits_and_error() {
        let mut modal = WizardModal::new(Wizard::create(Role::default()));
        type_text(&mut modal, "auditor");
        let submitted = modal.begin_submit().unwrap();

        modal.finished(submitted);
        assert!(!modal.submitting());
        assert_eq!(modal.wizard().working().name(), "auditor");
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), WizardKey::Close);
    }

    #[test]
    fn read_only_wizard_never_submits() {
        let role = Role {
            key: Some("admin".into()),
            ..Role::default()
        };
        let mut modal = WizardModal::new(Wizard::read_only(role));
        assert!(modal.begin_submit().is_none());
    }

    #[test]
    fn enter_submits_only_on_last_step() {
        let mut modal = WizardModal::new(Wizard::create(User::default()));
        let steps = modal.wizard().visible_steps().len();
        assert!(steps > 1);

        for _ in 1..steps {
            assert_eq!(modal.handle_key(key(KeyCode::Enter)), WizardKey::Handled);
        }
        assert!(modal.wizard().is_last_step());
        assert_eq!(modal.handle_key(key(KeyCode::Enter)), WizardKey::Submit);
    }

    #[test]
    fn cursor_splits_on_char_boundaries() {
        assert_eq!(split_at_char("héllo", 2), ("hé", "llo"));
        assert_eq!(split_at_char("abc", 9), ("abc", ""));
    }
}
