//! Controls component — bottom bar with play/pause, stop, and the volume
//! slider.  Volume changes apply to the live stream immediately and persist
//! across runs.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use wavebox_core::player::PlaybackStatus;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_focused_border, style_unfocused_border, C_BG_PULSE, C_ERROR, C_LOADING, C_MUTED,
        C_PAUSED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_VOLUME_FILL,
    },
};

const VOLUME_STEP: f32 = 0.05;
const SLIDER_WIDTH: u16 = 20;

pub struct Controls {
    play_btn: Rect,
    stop_btn: Rect,
    volume_track: Rect,
}

impl Controls {
    pub fn new() -> Self {
        Self {
            play_btn: Rect::default(),
            stop_btn: Rect::default(),
            volume_track: Rect::default(),
        }
    }

    fn volume_from_column(&self, column: u16) -> Option<f32> {
        let track = self.volume_track;
        if track.width == 0 || column < track.x || column >= track.x + track.width {
            return None;
        }
        Some((column - track.x) as f32 / (track.width - 1).max(1) as f32)
    }

    fn hit(rect: Rect, column: u16, row: u16) -> bool {
        column >= rect.x
            && column < rect.x + rect.width
            && row >= rect.y
            && row < rect.y + rect.height
    }
}

impl Component for Controls {
    fn id(&self) -> ComponentId {
        ComponentId::Controls
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Char(' ') => vec![Action::TogglePause],
            KeyCode::Char('s') => vec![Action::Stop],
            KeyCode::Left | KeyCode::Char('-') => {
                vec![Action::Volume((state.player.volume - VOLUME_STEP).max(0.0))]
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                vec![Action::Volume((state.player.volume + VOLUME_STEP).min(1.0))]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if Self::hit(self.play_btn, event.column, event.row) {
                    return vec![Action::TogglePause];
                }
                if Self::hit(self.stop_btn, event.column, event.row) {
                    return vec![Action::Stop];
                }
                if let Some(v) = self.volume_from_column(event.column) {
                    if Self::hit(self.volume_track, event.column, event.row) {
                        return vec![Action::Volume(v)];
                    }
                }
            }
            // Dragging along the track keeps adjusting.
            MouseEventKind::Drag(MouseButton::Left) => {
                if event.row >= self.volume_track.y
                    && event.row < self.volume_track.y + self.volume_track.height
                {
                    if let Some(v) = self.volume_from_column(event.column) {
                        return vec![Action::Volume(v)];
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        if state.pulse_on {
            block = block.style(Style::default().bg(C_BG_PULSE));
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let paused_or_idle = matches!(
            state.player.playback_status,
            PlaybackStatus::Idle | PlaybackStatus::Paused | PlaybackStatus::Error
        );
        let play_icon = if paused_or_idle { "▶" } else { "⏸" };

        let volume_pct = (state.player.volume * 100.0).round() as u16;
        let filled = (state.player.volume * (SLIDER_WIDTH - 1) as f32).round() as u16;
        let slider: String = (0..SLIDER_WIDTH)
            .map(|i| if i <= filled { '▮' } else { '▯' })
            .collect();

        let (status_text, status_color) = match state.player.playback_status {
            PlaybackStatus::Idle => ("idle".to_string(), C_MUTED),
            PlaybackStatus::Loading => (
                format!("loading {}", state.player.current_station_name().unwrap_or("?")),
                C_LOADING,
            ),
            PlaybackStatus::Playing => (
                state
                    .player
                    .current_station_name()
                    .unwrap_or("?")
                    .to_string(),
                C_PLAYING,
            ),
            PlaybackStatus::Paused => (
                format!("paused {}", state.player.current_station_name().unwrap_or("?")),
                C_PAUSED,
            ),
            PlaybackStatus::Error => ("stream failed".to_string(), C_ERROR),
        };

        let y = inner.y;
        self.play_btn = Rect {
            x: inner.x + 1,
            y,
            width: 3,
            height: 1,
        };
        self.stop_btn = Rect {
            x: inner.x + 5,
            y,
            width: 3,
            height: 1,
        };
        self.volume_track = Rect {
            x: inner.x + 14,
            y,
            width: SLIDER_WIDTH,
            height: 1,
        };

        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", play_icon),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(" ⏹ ", Style::default().fg(C_PRIMARY)),
            Span::styled("  vol ", Style::default().fg(C_SECONDARY)),
            Span::styled(slider, Style::default().fg(C_VOLUME_FILL)),
            Span::styled(format!(" {:>3}%  ", volume_pct), Style::default().fg(C_SECONDARY)),
            Span::styled(status_text, Style::default().fg(status_color)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_maps_track_columns_to_unit_range() {
        let mut controls = Controls::new();
        controls.volume_track = Rect {
            x: 10,
            y: 0,
            width: SLIDER_WIDTH,
            height: 1,
        };
        assert_eq!(controls.volume_from_column(10), Some(0.0));
        assert_eq!(controls.volume_from_column(10 + SLIDER_WIDTH - 1), Some(1.0));
        assert!(controls.volume_from_column(9).is_none());
        assert!(controls.volume_from_column(10 + SLIDER_WIDTH).is_none());
        let mid = controls.volume_from_column(10 + (SLIDER_WIDTH - 1) / 2).unwrap();
        assert!((0.4..=0.6).contains(&mid));
    }
}
