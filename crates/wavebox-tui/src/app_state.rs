//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for player state, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::time::Instant;

use wavebox_core::player::PlayerState;

/// How long a station flashes after being activated from search results.
pub const SEARCH_FLASH: std::time::Duration = std::time::Duration::from_secs(1);

pub struct AppState {
    /// Latest snapshot from the player core.
    pub player: PlayerState,
    /// Station indices matching the live search query, in station-list order.
    pub search_matches: Vec<usize>,
    /// Station briefly flashed after search activation, with its revert deadline.
    pub search_flash: Option<(usize, Instant)>,
    /// Stations currently carrying a pointer-trail highlight.
    pub trail_active: Vec<usize>,
    /// Ambient pulse is on while a stream is audible.
    pub pulse_on: bool,
}

impl AppState {
    pub fn new(player: PlayerState) -> Self {
        Self {
            player,
            search_matches: Vec::new(),
            search_flash: None,
            trail_active: Vec::new(),
            pulse_on: false,
        }
    }

    pub fn flash_station(&self, idx: usize) -> bool {
        self.search_flash.map_or(false, |(i, _)| i == idx)
    }
}
