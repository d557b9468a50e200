//! A screen made of several directories behind sub-tabs.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::component::Component;
use crate::widgets::sub_tabs;

pub struct TabbedScreen {
    tabs: Vec<(&'static str, Box<dyn Component>)>,
    active: usize,
    focused: bool,
}

impl TabbedScreen {
    pub fn new(tabs: Vec<(&'static str, Box<dyn Component>)>) -> Self {
        Self {
            tabs,
            active: 0,
            focused: false,
        }
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn Component>> {
        self.tabs.get_mut(self.active).map(|(_, tab)| tab)
    }

    fn switch(&mut self, forward: bool) {
        let count = self.tabs.len();
        if count < 2 {
            return;
        }
        let focused = self.focused;
        if let Some(tab) = self.active_mut() {
            tab.set_focused(false);
        }
        self.active = if forward {
            (self.active + 1) % count
        } else {
            (self.active + count - 1) % count
        };
        if let Some(tab) = self.active_mut() {
            tab.set_focused(focused);
        }
    }
}

impl Component for TabbedScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        for (_, tab) in &mut self.tabs {
            tab.init(action_tx.clone())?;
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let captured = self.tabs.get(self.active).is_some_and(|(_, t)| t.captures_keys());
        if !captured {
            match key.code {
                KeyCode::Char('t') => {
                    self.switch(true);
                    return Ok(None);
                }
                KeyCode::Char('T') => {
                    self.switch(false);
                    return Ok(None);
                }
                _ => {}
            }
        }
        match self.active_mut() {
            Some(tab) => tab.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            // Every tab keeps its own state in step.
            Action::Tick | Action::Connected(_) | Action::Disconnected(_) => {
                for (_, tab) in &mut self.tabs {
                    tab.update(action)?;
                }
                Ok(None)
            }
            _ => match self.active_mut() {
                Some(tab) => tab.update(action),
                None => Ok(None),
            },
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(area);
        let labels: Vec<&str> = self.tabs.iter().map(|(label, _)| *label).collect();
        frame.render_widget(
            Paragraph::new(sub_tabs::render_sub_tabs(&labels, self.active)),
            layout[0],
        );
        if let Some((_, tab)) = self.tabs.get(self.active) {
            tab.render(frame, layout[1]);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if let Some(tab) = self.active_mut() {
            tab.set_focused(focused);
        }
    }

    fn captures_keys(&self) -> bool {
        self.tabs.get(self.active).is_some_and(|(_, t)| t.captures_keys())
    }

    fn hints(&self) -> &'static str {
        self.tabs.get(self.active).map_or("", |(_, t)| t.hints())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[derive(Default)]
    struct Probe {
        focused: bool,
    }

    impl Component for Probe {
        fn render(&self, _frame: &mut Frame, _area: Rect) {}

        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }

        fn hints(&self) -> &'static str {
            if self.focused { "focused" } else { "idle" }
        }
    }

    #[test]
    fn t_moves_focus_to_next_tab() {
        let mut screen = TabbedScreen::new(vec![
            ("A", Box::new(Probe::default())),
            ("B", Box::new(Probe::default())),
        ]);
        screen.set_focused(true);
        assert_eq!(screen.hints(), "focused");

        screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(screen.active, 1);
        assert_eq!(screen.hints(), "focused");
        assert!(matches!(screen.tabs[0].1.hints(), "idle"));
    }
}
