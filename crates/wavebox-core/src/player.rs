use serde::{Deserialize, Serialize};

/// A named, URL-addressed audio stream the user can select.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Station {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    /// Short description / blurb
    #[serde(default)]
    pub description: String,
}

/// Status of the single global playback slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / explicitly stopped
    Loading, // media handle spawned, waiting for can-play
    Playing, // can-play arrived, audio flowing
    Paused,  // explicitly paused
    Error,   // load failed (stream error or rejected play)
}

/// Commands accepted by the player core.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Select a station by registry index. Selecting the current station
    /// toggles pause instead of reloading.
    Select { station_idx: usize },
    TogglePause,
    Stop,
    Volume { value: f32 },
}

/// Visual marker a station row can carry. Derived from `PlayerState`; the
/// structure guarantees at most one station carries Loading/Playing/Paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationMarker {
    Loading,
    Playing,
    Paused,
    Error,
}

/// Full snapshot of the player.  `rev` is a monotonically increasing counter
/// incremented on every state change; the UI uses it to detect staleness.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerState {
    #[serde(default)]
    pub rev: u64,
    pub stations: Vec<Station>,
    /// Station currently bound to the playback slot (loading/playing/paused).
    pub current_station: Option<usize>,
    /// Station still carrying the error marker.  Cleared on a new selection,
    /// preserved across stop.
    pub error_station: Option<usize>,
    /// Volume in [0.0, 1.0]; applied to the media handle on every load.
    pub volume: f32,
    pub is_paused: bool,
    pub playback_status: PlaybackStatus,
}

impl PlayerState {
    /// The marker a given station row should render, if any.
    pub fn marker_for(&self, idx: usize) -> Option<StationMarker> {
        if self.current_station == Some(idx) {
            match self.playback_status {
                PlaybackStatus::Loading => return Some(StationMarker::Loading),
                PlaybackStatus::Playing => return Some(StationMarker::Playing),
                PlaybackStatus::Paused => return Some(StationMarker::Paused),
                PlaybackStatus::Error => return Some(StationMarker::Error),
                PlaybackStatus::Idle => {}
            }
        }
        if self.error_station == Some(idx) {
            return Some(StationMarker::Error);
        }
        None
    }

    /// Name of the station bound to the playback slot.
    pub fn current_station_name(&self) -> Option<&str> {
        self.current_station
            .and_then(|i| self.stations.get(i))
            .map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(n: usize) -> PlayerState {
        PlayerState {
            stations: (0..n)
                .map(|i| Station {
                    id: format!("s{i}"),
                    name: format!("Station {i}"),
                    url: format!("http://example.com/{i}"),
                    ..Station::default()
                })
                .collect(),
            ..PlayerState::default()
        }
    }

    #[test]
    fn at_most_one_station_carries_a_live_marker() {
        let mut state = state_with(3);
        state.current_station = Some(1);
        state.playback_status = PlaybackStatus::Playing;

        let marked: Vec<usize> = (0..3)
            .filter(|&i| {
                matches!(
                    state.marker_for(i),
                    Some(StationMarker::Playing | StationMarker::Loading)
                )
            })
            .collect();
        assert_eq!(marked, vec![1]);
    }

    #[test]
    fn error_marker_survives_without_current_station() {
        let mut state = state_with(2);
        state.error_station = Some(0);
        state.playback_status = PlaybackStatus::Idle;
        assert_eq!(state.marker_for(0), Some(StationMarker::Error));
        assert_eq!(state.marker_for(1), None);
    }

    #[test]
    fn current_station_error_shadows_the_retained_marker() {
        let mut state = state_with(2);
        state.current_station = Some(1);
        state.error_station = Some(1);
        state.playback_status = PlaybackStatus::Error;
        assert_eq!(state.marker_for(1), Some(StationMarker::Error));
    }
}
