//! SearchBox component — debounced station search with a results dropdown.
//!
//! Typing schedules a search 200ms out; every keystroke pushes the deadline.
//! The query is lowercased and trimmed, then substring-matched against
//! station names in list order.  Enter activates the first result; clicking
//! a result row activates that result.  Activation reveals the station,
//! flashes it briefly, clears the query, and hides the dropdown.  Clicking
//! elsewhere hides the dropdown without touching the match highlights.

use std::time::{Duration, Instant};

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use wavebox_core::player::Station;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_search, C_MATCH, C_MUTED, C_PANEL_BORDER, C_SEARCH_BG},
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);
const MAX_RESULT_ROWS: u16 = 8;

pub struct SearchBox {
    input: Input,
    pub active: bool,
    /// Pending debounced search, if any.
    search_due: Option<Instant>,
    /// Station indices of the current results, list order.
    pub results: Vec<usize>,
    pub results_visible: bool,
    last_area: Rect,
    results_area: Rect,
}

impl SearchBox {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            active: false,
            search_due: None,
            results: Vec::new(),
            results_visible: false,
            last_area: Rect::default(),
            results_area: Rect::default(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Activation or an explicit clear: drop the query and the dropdown.
    fn reset(&mut self) {
        self.input = Input::default();
        self.search_due = None;
        self.results.clear();
        self.results_visible = false;
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        point_in(self.last_area, column, row)
            || (self.results_visible && point_in(self.results_area, column, row))
    }

    fn run_search(&mut self, state: &AppState) -> Vec<Action> {
        let query = self.input.value().to_string();
        let matches = search_stations(&query, &state.player.stations);
        self.results = matches.clone();
        self.results_visible = !query.trim().is_empty();
        vec![Action::SearchMatches(matches)]
    }
}

impl Component for SearchBox {
    fn id(&self) -> ComponentId {
        ComponentId::SearchBox
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.active {
            return vec![];
        }
        match key.code {
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    self.deactivate();
                } else {
                    self.reset();
                    return vec![Action::SearchMatches(Vec::new())];
                }
            }
            KeyCode::Enter => {
                // A debounce still pending runs now, so Enter acts on what
                // was just typed rather than on stale results.
                let mut actions = Vec::new();
                if self.search_due.take().is_some() {
                    actions.extend(self.run_search(state));
                }
                if let Some(&first) = self.results.first() {
                    self.reset();
                    actions.push(Action::ActivateResult(first));
                }
                return actions;
            }
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                self.search_due = Some(Instant::now() + SEARCH_DEBOUNCE);
            }
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if point_in(self.last_area, event.column, event.row) {
                self.activate();
                return vec![Action::FocusPane(ComponentId::SearchBox)];
            }
            if self.results_visible && point_in(self.results_area, event.column, event.row) {
                let row = (event.row - self.results_area.y).saturating_sub(1) as usize;
                if let Some(&idx) = self.results.get(row) {
                    self.reset();
                    return vec![Action::ActivateResult(idx)];
                }
            }
        }
        vec![]
    }

    fn tick(&mut self, state: &AppState) -> Vec<Action> {
        if self.search_due.map_or(false, |t| Instant::now() >= t) {
            self.search_due = None;
            return self.run_search(state);
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            // Click landed outside the search surfaces: hide the dropdown but
            // keep query and match highlights.
            Action::DismissResults => self.results_visible = false,
            Action::ActivateResult(_) => self.deactivate(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.last_area = area;
        let value = self.input.value();
        let scroll = self.input.visual_scroll(area.width.saturating_sub(4) as usize);

        let display = if value.is_empty() && !focused {
            Span::styled("⌕ search stations", Style::default().fg(C_MUTED))
        } else {
            Span::styled(format!("⌕ {}", &value[scroll..]), style_search())
        };
        frame.render_widget(
            Paragraph::new(Line::from(display)).style(Style::default().bg(C_SEARCH_BG)),
            area,
        );

        if self.active {
            let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
        }

        // Dropdown under the input, floating over the station list.
        if self.results_visible {
            let height = (self.results.len() as u16).min(MAX_RESULT_ROWS) + 2;
            let dropdown = Rect {
                x: area.x,
                y: area.y + 1,
                width: area.width,
                height,
            };
            self.results_area = dropdown;
            frame.render_widget(Clear, dropdown);

            let items: Vec<ListItem> = self
                .results
                .iter()
                .take(MAX_RESULT_ROWS as usize)
                .filter_map(|&idx| state.player.stations.get(idx))
                .map(|s| ListItem::new(Span::styled(s.name.clone(), Style::default().fg(C_MATCH))))
                .collect();
            let list = if items.is_empty() {
                List::new(vec![ListItem::new(Span::styled(
                    "no matches",
                    Style::default().fg(C_MUTED),
                ))])
            } else {
                List::new(items)
            };
            frame.render_widget(
                list.block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER)),
                ),
                dropdown,
            );
        } else {
            self.results_area = Rect::default();
        }
    }
}

impl Default for SearchBox {
    fn default() -> Self {
        Self::new()
    }
}

fn point_in(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height
}

/// Case-insensitive substring match over station names, in list order.
/// Whitespace-only queries match nothing.
pub fn search_stations(query: &str, stations: &[Station]) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    stations
        .iter()
        .enumerate()
        .filter(|(_, s)| s.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(names: &[&str]) -> Vec<Station> {
        names
            .iter()
            .map(|n| Station {
                id: n.to_string(),
                name: n.to_string(),
                url: format!("http://stream.example/{n}"),
                ..Station::default()
            })
            .collect()
    }

    #[test]
    fn matches_are_case_insensitive_and_in_list_order() {
        let stations = stations(&["Smooth Jazz", "News 24", "Jazz FM"]);
        assert_eq!(search_stations("jazz", &stations), vec![0, 2]);
        assert_eq!(search_stations("JAZZ", &stations), vec![0, 2]);
    }

    #[test]
    fn query_is_trimmed() {
        let stations = stations(&["Jazz FM"]);
        assert_eq!(search_stations("  jazz  ", &stations), vec![0]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let stations = stations(&["Jazz FM"]);
        assert!(search_stations("", &stations).is_empty());
        assert!(search_stations("   ", &stations).is_empty());
    }

    #[test]
    fn no_match_is_empty() {
        let stations = stations(&["Jazz FM"]);
        assert!(search_stations("classical", &stations).is_empty());
    }

    #[test]
    fn enter_before_the_debounce_fires_searches_immediately() {
        use wavebox_core::player::PlayerState;

        let state = AppState::new(PlayerState {
            stations: stations(&["Smooth Jazz", "News 24", "Jazz FM"]),
            ..PlayerState::default()
        });
        let mut search = SearchBox::new();
        search.activate();
        for ch in "jazz".chars() {
            search.handle_key(KeyEvent::from(KeyCode::Char(ch)), &state);
        }

        // The 200ms debounce has not fired yet; Enter must not wait for it.
        let actions = search.handle_key(KeyEvent::from(KeyCode::Enter), &state);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::SearchMatches(m) if *m == vec![0, 2])));
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::ActivateResult(0))));
        assert!(search.input.value().is_empty());
    }
}
