//! StationList component — the main pane.
//!
//! Row decoration, in priority order: search-activation flash, playback
//! marker, search match, pointer trail.  At most one station carries a live
//! playback marker; an error marker can outlive the session that caused it.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use wavebox_core::player::{PlaybackStatus, Station, StationMarker};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        C_ERROR, C_FLASH, C_LOADING, C_MATCH, C_MUTED, C_PAUSED, C_PLAYING, C_PRIMARY,
        C_SECONDARY, C_SELECTION_BG, C_TRAIL_BG,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

pub struct StationList {
    pub list: ScrollableList<Station>,
    last_area: Rect,
}

impl StationList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            last_area: Rect::default(),
        }
    }

    /// Update items from player state.
    pub fn sync_stations(&mut self, state: &AppState) {
        self.list.set_items(state.player.stations.clone());
    }

    /// Rows area inside the pane border.
    fn inner(&self) -> Rect {
        let a = self.last_area;
        Rect {
            x: a.x.saturating_add(1),
            y: a.y.saturating_add(1),
            width: a.width.saturating_sub(2),
            height: a.height.saturating_sub(2),
        }
    }

    /// Station index under an absolute screen position, if any.
    pub fn station_at(&self, column: u16, row: u16) -> Option<usize> {
        let inner = self.inner();
        if column < inner.x
            || column >= inner.x + inner.width
            || row < inner.y
            || row >= inner.y + inner.height
        {
            return None;
        }
        self.list.index_at((row - inner.y) as usize)
    }

    fn marker_span(marker: Option<StationMarker>) -> Span<'static> {
        match marker {
            Some(StationMarker::Playing) => Span::styled("▶ ", Style::default().fg(C_PLAYING)),
            Some(StationMarker::Loading) => Span::styled("… ", Style::default().fg(C_LOADING)),
            Some(StationMarker::Paused) => Span::styled("⏸ ", Style::default().fg(C_PAUSED)),
            Some(StationMarker::Error) => Span::styled("✗ ", Style::default().fg(C_ERROR)),
            None => Span::raw("  "),
        }
    }
}

impl Component for StationList {
    fn id(&self) -> ComponentId {
        ComponentId::StationList
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(1),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => {
                if !self.list.is_empty() {
                    return vec![Action::Play(self.list.selected)];
                }
            }
            KeyCode::Char('y') => {
                if let Some(station) = self.list.selected_item() {
                    return vec![Action::CopyToClipboard(station.url.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(3),
            MouseEventKind::ScrollDown => self.list.select_down(3),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(idx) = self.station_at(event.column, event.row) {
                    self.list.set_selected(idx);
                    return vec![Action::Play(idx)];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::ActivateResult(idx) => self.list.set_selected(*idx),
            Action::JumpToCurrent => {
                if let Some(idx) = state.player.current_station {
                    self.list.set_selected(idx);
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.last_area = area;

        let badge = match state.player.playback_status {
            PlaybackStatus::Playing => Some(Badge {
                text: "LIVE",
                color: C_PLAYING,
            }),
            PlaybackStatus::Loading => Some(Badge {
                text: "…",
                color: C_LOADING,
            }),
            PlaybackStatus::Paused => Some(Badge {
                text: "PAUSED",
                color: C_PAUSED,
            }),
            PlaybackStatus::Error => Some(Badge {
                text: "ERR",
                color: C_ERROR,
            }),
            PlaybackStatus::Idle => None,
        };

        let title = format!(" stations ({}) ", self.list.len());
        let block = pane_chrome(&title, focused, badge);
        let inner_height = area.height.saturating_sub(2) as usize;
        self.list.ensure_visible(inner_height);

        let name_width = area.width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = self
            .list
            .visible_items(inner_height)
            .into_iter()
            .map(|(idx, station)| {
                let marker = state.player.marker_for(idx);
                let is_match = state.search_matches.contains(&idx);
                let flashed = state.flash_station(idx);
                let trailed = state.trail_active.contains(&idx);

                let name_style = if flashed {
                    Style::default().fg(C_FLASH).add_modifier(Modifier::BOLD)
                } else if matches!(marker, Some(StationMarker::Playing)) {
                    Style::default().fg(C_PLAYING)
                } else if matches!(marker, Some(StationMarker::Error)) {
                    Style::default().fg(C_ERROR)
                } else if is_match {
                    Style::default().fg(C_MATCH)
                } else {
                    Style::default().fg(C_PRIMARY)
                };

                let mut spans = vec![
                    Self::marker_span(marker),
                    Span::styled(truncate_to_width(&station.name, name_width), name_style),
                ];
                if is_match {
                    spans.push(Span::styled(" ◆", Style::default().fg(C_MATCH)));
                }
                if !station.description.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", truncate_to_width(&station.description, name_width / 2)),
                        Style::default().fg(C_SECONDARY),
                    ));
                }

                let mut row_style = Style::default();
                if trailed {
                    row_style = row_style.bg(C_TRAIL_BG);
                }
                if idx == self.list.selected {
                    row_style = row_style.bg(C_SELECTION_BG);
                }
                ListItem::new(Line::from(spans)).style(row_style)
            })
            .collect();

        if items.is_empty() {
            let empty = ratatui::widgets::Paragraph::new(Span::styled(
                " no stations configured ",
                Style::default().fg(C_MUTED),
            ))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        frame.render_widget(List::new(items).block(block), area);
    }
}

/// Cut a string to at most `max` terminal columns.
fn truncate_to_width(s: &str, max: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_column_width() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("hello", 10), "hello");
        // Wide CJK chars count double.
        assert_eq!(truncate_to_width("日本語", 4), "日本");
    }
}
