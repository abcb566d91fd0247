use crate::player::{PlaybackStatus, PlayerState, Station};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The slice of state worth keeping across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    pub last_station_idx: Option<usize>,
    pub volume: f32,
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            last_station_idx: None,
            volume: 0.5,
        }
    }
}

/// Single shared snapshot of the player.  The player core is the only writer;
/// the UI fetches clones after every `StateUpdated` broadcast.
pub struct StateManager {
    state: Arc<RwLock<PlayerState>>,
    state_file: PathBuf,
    /// Station index persisted by the previous run, for initial selection.
    initial_station: Option<usize>,
    /// Most recent selection this run; survives stop so the next run can
    /// start from it.
    last_selected: std::sync::Mutex<Option<usize>>,
}

impl StateManager {
    pub fn new(state_file: PathBuf, stations: Vec<Station>) -> Self {
        let persistent = Self::load_persistent(&state_file);
        let initial_station = persistent
            .last_station_idx
            .filter(|&idx| idx < stations.len());

        let state = PlayerState {
            rev: 1,
            stations,
            current_station: None,
            error_station: None,
            volume: persistent.volume,
            is_paused: false,
            playback_status: PlaybackStatus::Idle,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            state_file,
            initial_station,
            last_selected: std::sync::Mutex::new(initial_station),
        }
    }

    pub async fn get_state(&self) -> PlayerState {
        self.state.read().await.clone()
    }

    /// Station selected when the previous run ended, if it still exists.
    pub fn initial_station(&self) -> Option<usize> {
        self.initial_station
    }

    /// A new selection: clear every station's marker (error included), bind
    /// the slot to `idx`, and enter Loading.
    pub async fn set_loading(&self, idx: usize) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.current_station = Some(idx);
            state.error_station = None;
            state.is_paused = false;
            state.playback_status = PlaybackStatus::Loading;
            state.rev += 1;
        }
        if let Ok(mut last) = self.last_selected.lock() {
            *last = Some(idx);
        }
        self.save().await
    }

    /// Status change on the current slot.  Entering Error pins the marker to
    /// the current station so it survives a later stop.
    pub async fn set_status(&self, status: PlaybackStatus) {
        let mut state = self.state.write().await;
        if status == PlaybackStatus::Error {
            state.error_station = state.current_station;
        }
        state.is_paused = status == PlaybackStatus::Paused;
        state.playback_status = status;
        state.rev += 1;
    }

    /// Explicit stop: release the slot, keep the error marker where it was.
    pub async fn set_stopped(&self) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.current_station = None;
            state.is_paused = false;
            state.playback_status = PlaybackStatus::Idle;
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.volume = volume.clamp(0.0, 1.0);
            state.rev += 1;
        }
        self.save().await
    }

    async fn save(&self) -> anyhow::Result<()> {
        let state = self.state.read().await;
        let last_selected = self.last_selected.lock().map(|l| *l).unwrap_or(None);
        let persistent = PersistentState {
            last_station_idx: state.current_station.or(last_selected),
            volume: state.volume,
        };

        if let Some(parent) = self.state_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&persistent)?;
        tokio::fs::write(&self.state_file, json).await?;
        Ok(())
    }

    fn load_persistent(state_file: &PathBuf) -> PersistentState {
        if let Ok(content) = std::fs::read_to_string(state_file) {
            if let Ok(persistent) = serde_json::from_str::<PersistentState>(&content) {
                return persistent;
            }
        }
        PersistentState::default()
    }
}

// ── station loaders ───────────────────────────────────────────────────────────

pub fn parse_m3u_from_str(content: &str) -> anyhow::Result<Vec<Station>> {
    let mut stations = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            if let Some(comma_idx) = rest.find(',') {
                pending_name = Some(rest[comma_idx + 1..].trim().to_string());
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let url = line.to_string();
        let name = pending_name.take().unwrap_or_else(|| url.clone());

        stations.push(Station {
            id: name.clone(),
            name,
            url,
            ..Station::default()
        });
    }

    Ok(stations)
}

pub fn load_stations_from_m3u(path: &std::path::Path) -> anyhow::Result<Vec<Station>> {
    let content = std::fs::read_to_string(path)?;
    parse_m3u_from_str(&content)
}

/// Intermediate struct matching the TOML `[[station]]` table.  Kept separate
/// from `Station` so the file schema can diverge from the in-memory struct.
#[derive(Debug, serde::Deserialize)]
struct TomlStationFile {
    station: Vec<TomlStation>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlStation {
    #[serde(default)]
    id: String,
    name: String,
    url: String,
    #[serde(default)]
    description: String,
}

pub fn load_stations_from_toml(path: &std::path::Path) -> anyhow::Result<Vec<Station>> {
    let content = std::fs::read_to_string(path)?;
    parse_stations_from_toml_str(&content)
}

pub fn parse_stations_from_toml_str(content: &str) -> anyhow::Result<Vec<Station>> {
    let file: TomlStationFile = toml::from_str(content)?;
    let stations = file
        .station
        .into_iter()
        .map(|s| Station {
            id: if s.id.is_empty() { s.name.clone() } else { s.id },
            name: s.name,
            url: s.url,
            description: s.description,
        })
        .collect();
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(n: usize) -> Vec<Station> {
        (0..n)
            .map(|i| Station {
                id: format!("s{i}"),
                name: format!("Station {i}"),
                url: format!("http://example.com/{i}"),
                ..Station::default()
            })
            .collect()
    }

    fn temp_state_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wavebox-test-{}-{}.json", tag, std::process::id()))
    }

    #[tokio::test]
    async fn loading_clears_the_error_marker() {
        let mgr = StateManager::new(temp_state_file("load"), stations(3));
        mgr.set_loading(0).await.unwrap();
        mgr.set_status(PlaybackStatus::Error).await;
        assert_eq!(mgr.get_state().await.error_station, Some(0));

        mgr.set_loading(1).await.unwrap();
        let state = mgr.get_state().await;
        assert_eq!(state.error_station, None);
        assert_eq!(state.current_station, Some(1));
        assert_eq!(state.playback_status, PlaybackStatus::Loading);
        assert!(!state.is_paused);
    }

    #[tokio::test]
    async fn stop_preserves_the_error_marker() {
        let mgr = StateManager::new(temp_state_file("stop"), stations(3));
        mgr.set_loading(2).await.unwrap();
        mgr.set_status(PlaybackStatus::Error).await;
        mgr.set_stopped().await.unwrap();

        let state = mgr.get_state().await;
        assert_eq!(state.current_station, None);
        assert_eq!(state.playback_status, PlaybackStatus::Idle);
        assert_eq!(state.error_station, Some(2));
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let mgr = StateManager::new(temp_state_file("vol"), stations(1));
        mgr.set_volume(1.7).await.unwrap();
        assert_eq!(mgr.get_state().await.volume, 1.0);
        mgr.set_volume(-0.3).await.unwrap();
        assert_eq!(mgr.get_state().await.volume, 0.0);
    }

    #[test]
    fn parse_m3u_names_and_urls() {
        let m3u = "#EXTM3U\n#EXTINF:-1,Jazz FM\nhttp://stream.example/jazz\n#EXTINF:-1,Smooth Jazz\nhttp://stream.example/smooth\n";
        let stations = parse_m3u_from_str(m3u).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Jazz FM");
        assert_eq!(stations[1].url, "http://stream.example/smooth");
    }

    #[test]
    fn parse_toml_defaults_id_to_name() {
        let toml = r#"
[[station]]
name = "Jazz FM"
url = "http://stream.example/jazz"

[[station]]
id = "smooth"
name = "Smooth Jazz"
url = "http://stream.example/smooth"
description = "late night"
"#;
        let stations = parse_stations_from_toml_str(toml).unwrap();
        assert_eq!(stations[0].id, "Jazz FM");
        assert_eq!(stations[1].id, "smooth");
        assert_eq!(stations[1].description, "late night");
    }
}
