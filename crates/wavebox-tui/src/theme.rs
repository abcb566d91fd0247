//! Color palette and style constants for the wavebox TUI.

use ratatui::style::{Color, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(16, 16, 26);
/// Background tint while a stream is audible (ambient pulse).
pub const C_BG_PULSE: Color = Color::Rgb(22, 24, 40);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_PAUSED: Color = Color::Rgb(140, 160, 255);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_SEARCH_BG: Color = Color::Rgb(20, 20, 32);
pub const C_SEARCH_FG: Color = Color::Rgb(255, 200, 80);
pub const C_MATCH: Color = Color::Rgb(76, 175, 80);
/// Momentary flash on a station activated from search results.
pub const C_FLASH: Color = Color::Rgb(255, 87, 34);
pub const C_TRAIL_BG: Color = Color::Rgb(46, 38, 66);
pub const C_PARTICLE: Color = Color::Rgb(150, 130, 220);
pub const C_PARTICLE_DIM: Color = Color::Rgb(60, 54, 90);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_VOLUME_FILL: Color = Color::Rgb(120, 100, 200);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_search() -> Style {
    Style::default().fg(C_SEARCH_FG).bg(C_SEARCH_BG)
}
