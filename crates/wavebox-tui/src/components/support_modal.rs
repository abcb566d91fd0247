//! SupportModal component — centered popup with donation methods.
//!
//! Two views: the method list, and a per-method detail with fixed contact
//! data and a copy shortcut.  Esc (or a click outside the popup) walks back
//! out; copying surfaces success or failure through the toast layer.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MATCH, C_MUTED, C_PANEL_BORDER_FOCUSED, C_PRIMARY, C_SECONDARY},
};

/// A fixed donation channel with the string worth copying.
struct Method {
    label: &'static str,
    lines: &'static [&'static str],
    copy_payload: &'static str,
}

const METHODS: [Method; 2] = [
    Method {
        label: "bank transfer",
        lines: &[
            "recipient  Wavebox Radio",
            "IBAN       DE02 1203 0000 0000 2020 51",
            "reference  keep the music on",
        ],
        copy_payload: "DE02120300000000202051",
    },
    Method {
        label: "online wallet",
        lines: &[
            "wallet     wavebox.tips",
            "account    4100 1177 5533 9902",
        ],
        copy_payload: "4100117755339902",
    },
];

enum View {
    Methods,
    Detail(usize),
}

pub struct SupportModal {
    pub visible: bool,
    view: View,
    selected: usize,
    popup: Rect,
}

impl SupportModal {
    pub fn new() -> Self {
        Self {
            visible: false,
            view: View::Methods,
            selected: 0,
            popup: Rect::default(),
        }
    }

    pub fn open(&mut self) {
        self.visible = true;
        self.view = View::Methods;
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        let p = self.popup;
        self.visible
            && column >= p.x
            && column < p.x + p.width
            && row >= p.y
            && row < p.y + p.height
    }
}

impl Component for SupportModal {
    fn id(&self) -> ComponentId {
        ComponentId::SupportModal
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.visible {
            return vec![];
        }
        match &self.view {
            View::Methods => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return vec![Action::CloseSupport],
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = self.selected.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.selected = (self.selected + 1).min(METHODS.len() - 1);
                }
                KeyCode::Enter => self.view = View::Detail(self.selected),
                KeyCode::Char('1') => self.view = View::Detail(0),
                KeyCode::Char('2') => self.view = View::Detail(1),
                _ => {}
            },
            View::Detail(n) => match key.code {
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                    self.view = View::Methods;
                }
                KeyCode::Char('c') | KeyCode::Enter => {
                    return vec![Action::CopyToClipboard(METHODS[*n].copy_payload.to_string())];
                }
                _ => {}
            },
        }
        // Consume all other keys while the modal is open.
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !self.visible {
            return vec![];
        }
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if !self.contains(event.column, event.row) {
                return vec![Action::CloseSupport];
            }
            if let View::Methods = self.view {
                // Method rows start two rows below the border (header + blank).
                let row = event.row.saturating_sub(self.popup.y + 3) as usize;
                if row < METHODS.len() && event.row >= self.popup.y + 3 {
                    self.selected = row;
                    self.view = View::Detail(row);
                }
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenSupport => self.open(),
            Action::CloseSupport => self.close(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        if !self.visible {
            return;
        }
        let popup = centered_rect(44, 12, area);
        self.popup = popup;

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
            .title(Span::styled(
                " support the stream ",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let lines: Vec<Line> = match &self.view {
            View::Methods => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        " if wavebox keeps you company, chip in:",
                        Style::default().fg(C_SECONDARY),
                    )),
                    Line::from(""),
                ];
                for (n, method) in METHODS.iter().enumerate() {
                    let style = if n == self.selected {
                        Style::default().fg(C_MATCH).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(C_PRIMARY)
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {}. ", n + 1), Style::default().fg(C_MUTED)),
                        Span::styled(method.label, style),
                    ]));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    " enter/1/2 details   esc close",
                    Style::default().fg(C_MUTED),
                )));
                lines
            }
            View::Detail(n) => {
                let method = &METHODS[*n];
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!(" {}", method.label),
                        Style::default().fg(C_MATCH).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                ];
                for detail in method.lines {
                    lines.push(Line::from(Span::styled(
                        format!("  {detail}"),
                        Style::default().fg(C_PRIMARY),
                    )));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    " c copy   b back   esc back",
                    Style::default().fg(C_MUTED),
                )));
                lines
            }
        };

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for SupportModal {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size centered rect clamped to the containing area.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .split(vertical[1]);
    horizontal[1]
}
