//! PlayerCore — owns playback sessions and is the single writer of player state.
//!
//! The core runs as one task receiving [`PlayerEvent`]s over mpsc.  Commands
//! come from the UI; media signals come from spawned media resources.  Every
//! state change bumps the state revision and broadcasts `StateUpdated`.
//!
//! Staleness guard: each selection gets a fresh monotonically increasing
//! token.  Media signals carry the token of the resource that produced them,
//! and the core drops any signal whose token differs from the live session's.
//! Signals from superseded resources are therefore inert by construction, no
//! matter how delivery interleaves with new selections.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use wavebox_core::config::Config;
use wavebox_core::player::{Command, PlaybackStatus, Station};
use wavebox_core::state::{self, StateManager};

use crate::media::{LoadRequest, MediaBackend, MediaEvent, MediaHandle, MediaSignal, RejectReason};
use crate::BroadcastMessage;

/// Everything the core's event loop reacts to.
#[derive(Debug)]
pub enum PlayerEvent {
    Command(Command),
    Media(MediaEvent),
    Shutdown,
}

/// One live station selection: a spawned media resource plus the flags the
/// core needs to interpret its signals.
struct PlaybackSession {
    station_idx: usize,
    handle: MediaHandle,
    is_paused: bool,
    /// CanPlay arrived; the resource is producing (or holding) audio.
    ready: bool,
}

/// Remembered across stop so a pause-toggle from idle can resume.
struct LastStationMemo {
    station_idx: usize,
}

pub struct PlayerCore<B: MediaBackend> {
    state_manager: Arc<StateManager>,
    backend: B,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    session: Option<PlaybackSession>,
    last_station: Option<LastStationMemo>,
    next_token: u64,
    media_tx: mpsc::Sender<MediaEvent>,
    /// Taken by `run()`; None afterwards.
    media_rx: Option<mpsc::Receiver<MediaEvent>>,
}

impl<B: MediaBackend> PlayerCore<B> {
    pub fn new(
        state_manager: Arc<StateManager>,
        backend: B,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> Self {
        let (media_tx, media_rx) = mpsc::channel(64);
        Self {
            state_manager,
            backend,
            broadcast_tx,
            session: None,
            last_station: None,
            next_token: 1,
            media_tx,
            media_rx: Some(media_rx),
        }
    }

    pub async fn run(mut self, mut event_rx: mpsc::Receiver<PlayerEvent>) {
        let mut media_rx = match self.media_rx.take() {
            Some(rx) => rx,
            None => return,
        };
        info!("player core started");
        loop {
            tokio::select! {
                event = event_rx.recv() => match event {
                    Some(PlayerEvent::Command(cmd)) => {
                        if let Err(e) = self.handle_command(cmd).await {
                            warn!("command failed: {}", e);
                        }
                    }
                    Some(PlayerEvent::Media(evt)) => self.handle_media(evt).await,
                    Some(PlayerEvent::Shutdown) | None => break,
                },
                Some(evt) = media_rx.recv() => self.handle_media(evt).await,
            }
        }
        if let Some(session) = self.session.take() {
            session.handle.set_pause(true);
            session.handle.detach();
        }
        info!("player core stopped");
    }

    fn notify(&self) {
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
    }

    async fn handle_command(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Select { station_idx } => {
                // Re-selecting the current station toggles pause instead of
                // restarting the stream.
                if self
                    .session
                    .as_ref()
                    .map_or(false, |s| s.station_idx == station_idx)
                {
                    return self.toggle_pause().await;
                }
                self.play_station(station_idx).await
            }
            Command::TogglePause => self.toggle_pause().await,
            Command::Stop => self.stop().await,
            Command::Volume { value } => {
                self.state_manager.set_volume(value).await?;
                if let Some(session) = &self.session {
                    session.handle.set_volume(value.clamp(0.0, 1.0));
                }
                self.notify();
                Ok(())
            }
        }
    }

    async fn play_station(&mut self, station_idx: usize) -> anyhow::Result<()> {
        let state = self.state_manager.get_state().await;
        let Some(station) = state.stations.get(station_idx).cloned() else {
            warn!("select: no station at index {}", station_idx);
            return Ok(());
        };

        // Pause then detach the previous resource so no two streams are
        // audible at once, even for the instant before teardown completes.
        if let Some(old) = self.session.take() {
            old.handle.set_pause(true);
            old.handle.detach();
        }

        let token = self.next_token;
        self.next_token += 1;

        info!("select: {} ({}) token={}", station.name, station.url, token);
        self.state_manager.set_loading(station_idx).await?;
        self.last_station = Some(LastStationMemo { station_idx });

        let handle = self.backend.spawn(
            LoadRequest {
                url: station.url,
                volume: state.volume,
                token,
            },
            self.media_tx.clone(),
        );
        self.session = Some(PlaybackSession {
            station_idx,
            handle,
            is_paused: false,
            ready: false,
        });

        self.notify();
        Ok(())
    }

    async fn toggle_pause(&mut self) -> anyhow::Result<()> {
        let Some(session) = &mut self.session else {
            // Nothing live: a pause-toggle resumes the last stopped station,
            // exactly as if it had been selected fresh.
            if let Some(memo) = self.last_station.take() {
                return self.play_station(memo.station_idx).await;
            }
            return Ok(());
        };

        session.is_paused = !session.is_paused;
        session.handle.set_pause(session.is_paused);
        let status = if session.is_paused {
            PlaybackStatus::Paused
        } else if session.ready {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Loading
        };
        self.state_manager.set_status(status).await;
        self.notify();
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(session) = self.session.take() {
            info!("stop: station_idx={}", session.station_idx);
            session.handle.set_pause(true);
            session.handle.detach();
        }
        // last_station survives: pause-toggle from idle resumes it.
        self.state_manager.set_stopped().await?;
        self.notify();
        Ok(())
    }

    async fn handle_media(&mut self, evt: MediaEvent) {
        let Some(session) = &mut self.session else {
            debug!("media signal with no session, token={}", evt.token);
            return;
        };
        if evt.token != session.handle.token() {
            debug!(
                "stale media signal, token={} live={}",
                evt.token,
                session.handle.token()
            );
            return;
        }

        match evt.signal {
            MediaSignal::CanPlay => {
                session.ready = true;
                if !session.is_paused {
                    self.state_manager.set_status(PlaybackStatus::Playing).await;
                }
                self.notify();
            }
            MediaSignal::Rejected(RejectReason::Superseded) => {
                // A detach raced our own session bookkeeping; nothing to do.
                debug!("live session reported superseded, token={}", evt.token);
            }
            MediaSignal::Error(msg) | MediaSignal::Rejected(RejectReason::Refused(msg)) => {
                warn!("playback failed, token={}: {}", evt.token, msg);
                if let Some(failed) = self.session.take() {
                    failed.handle.detach();
                }
                self.state_manager.set_status(PlaybackStatus::Error).await;
                self.notify();
            }
        }
    }
}

// ── station sources ───────────────────────────────────────────────────────────

const BUILTIN_STATIONS: &str = include_str!("../stations.toml");

/// Resolve the station list: local TOML file first, then the configured m3u
/// source (file path or URL), then the built-in list.
pub async fn load_stations(config: &Config) -> Vec<Station> {
    let toml_path = &config.stations.stations_toml;
    if toml_path.exists() {
        match state::load_stations_from_toml(toml_path) {
            Ok(stations) if !stations.is_empty() => {
                info!("loaded {} stations from {:?}", stations.len(), toml_path);
                return stations;
            }
            Ok(_) => warn!("station file {:?} is empty", toml_path),
            Err(e) => warn!("failed to parse {:?}: {}", toml_path, e),
        }
    }

    let m3u = config.stations.m3u_url.trim();
    if !m3u.is_empty() {
        match load_stations_from_m3u_source(m3u).await {
            Ok(stations) if !stations.is_empty() => {
                info!("loaded {} stations from {}", stations.len(), m3u);
                return stations;
            }
            Ok(_) => warn!("m3u source {} yielded no stations", m3u),
            Err(e) => warn!("failed to load m3u {}: {}", m3u, e),
        }
    }

    info!("using built-in station list");
    state::parse_stations_from_toml_str(BUILTIN_STATIONS).unwrap_or_default()
}

async fn load_stations_from_m3u_source(source: &str) -> anyhow::Result<Vec<Station>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let content = reqwest::get(source).await?.error_for_status()?.text().await?;
        state::parse_m3u_from_str(&content)
    } else {
        state::load_stations_from_m3u(std::path::Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wavebox_core::player::StationMarker;

    /// Scripted backend: records every spawn and lets tests deliver signals
    /// with whatever token and timing they choose.
    #[derive(Clone, Default)]
    struct ScriptedBackend {
        spawns: Arc<Mutex<Vec<SpawnRecord>>>,
    }

    struct SpawnRecord {
        url: String,
        token: u64,
        ctl_rx: mpsc::UnboundedReceiver<crate::media::MediaCtl>,
    }

    impl MediaBackend for ScriptedBackend {
        fn spawn(&mut self, req: LoadRequest, _events: mpsc::Sender<MediaEvent>) -> MediaHandle {
            let (ctl_tx, ctl_rx) = mpsc::unbounded_channel();
            self.spawns.lock().unwrap().push(SpawnRecord {
                url: req.url,
                token: req.token,
                ctl_rx,
            });
            MediaHandle::new(req.token, ctl_tx)
        }
    }

    impl ScriptedBackend {
        fn spawn_count(&self) -> usize {
            self.spawns.lock().unwrap().len()
        }

        fn last_token(&self) -> u64 {
            self.spawns.lock().unwrap().last().unwrap().token
        }

        /// Drain control messages sent to the nth spawned resource.
        fn ctl_log(&self, n: usize) -> Vec<crate::media::MediaCtl> {
            let mut spawns = self.spawns.lock().unwrap();
            let mut out = Vec::new();
            while let Ok(msg) = spawns[n].ctl_rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn stations(n: usize) -> Vec<Station> {
        (0..n)
            .map(|i| Station {
                id: format!("s{i}"),
                name: format!("Station {i}"),
                url: format!("http://stream.example/{i}"),
                ..Station::default()
            })
            .collect()
    }

    fn core_with(n: usize) -> (PlayerCore<ScriptedBackend>, ScriptedBackend, Arc<StateManager>) {
        // One state file per test so concurrently running tests never read
        // each other's persisted volume or last station.
        static SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let state_file = std::env::temp_dir().join(format!(
            "wavebox-core-test-{}-{seq}.json",
            std::process::id()
        ));
        let manager = Arc::new(StateManager::new(state_file, stations(n)));
        let backend = ScriptedBackend::default();
        let (broadcast_tx, _) = broadcast::channel(16);
        let core = PlayerCore::new(manager.clone(), backend.clone(), broadcast_tx);
        (core, backend, manager)
    }

    fn can_play(token: u64) -> MediaEvent {
        MediaEvent {
            token,
            signal: MediaSignal::CanPlay,
        }
    }

    fn stream_error(token: u64) -> MediaEvent {
        MediaEvent {
            token,
            signal: MediaSignal::Error("stream ended: error".into()),
        }
    }

    #[tokio::test]
    async fn select_then_can_play_reaches_playing() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 1 }).await.unwrap();

        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Loading);
        assert_eq!(state.current_station, Some(1));
        assert_eq!(backend.spawn_count(), 1);

        core.handle_media(can_play(backend.last_token())).await;
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn at_most_one_live_resource_across_rapid_selection() {
        let (mut core, backend, _manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        core.handle_command(Command::Select { station_idx: 1 }).await.unwrap();
        core.handle_command(Command::Select { station_idx: 2 }).await.unwrap();

        assert_eq!(backend.spawn_count(), 3);
        // Every superseded resource was paused then detached.
        for n in 0..2 {
            let log = backend.ctl_log(n);
            assert!(
                matches!(log[0], crate::media::MediaCtl::SetPause(true)),
                "resource {n} was not paused before teardown"
            );
            assert!(matches!(log[1], crate::media::MediaCtl::Detach));
        }
        assert!(backend.ctl_log(2).is_empty());
    }

    #[tokio::test]
    async fn stale_can_play_is_inert() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        let old_token = backend.last_token();
        core.handle_command(Command::Select { station_idx: 1 }).await.unwrap();

        // The superseded resource buffers late; its signal must change nothing.
        core.handle_media(can_play(old_token)).await;
        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Loading);
        assert_eq!(state.current_station, Some(1));
    }

    #[tokio::test]
    async fn stale_error_is_inert() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        let old_token = backend.last_token();
        core.handle_command(Command::Select { station_idx: 1 }).await.unwrap();
        core.handle_media(can_play(backend.last_token())).await;

        core.handle_media(stream_error(old_token)).await;
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn reselect_toggles_pause_without_new_resource() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        core.handle_media(can_play(backend.last_token())).await;

        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        assert_eq!(backend.spawn_count(), 1);
        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Paused);
        assert!(state.is_paused);

        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        assert_eq!(backend.spawn_count(), 1);
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn pause_while_loading_defers_playing_until_ready() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        core.handle_command(Command::TogglePause).await.unwrap();
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Paused
        );

        // CanPlay during pause must not unpause.
        core.handle_media(can_play(backend.last_token())).await;
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Paused
        );

        core.handle_command(Command::TogglePause).await.unwrap();
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Playing
        );
    }

    #[tokio::test]
    async fn stop_then_pause_toggle_resumes_last_station() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 2 }).await.unwrap();
        core.handle_media(can_play(backend.last_token())).await;
        core.handle_command(Command::Stop).await.unwrap();

        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Idle);
        assert_eq!(state.current_station, None);

        // Resume spawns a fresh resource for the remembered station.
        core.handle_command(Command::TogglePause).await.unwrap();
        assert_eq!(backend.spawn_count(), 2);
        let state = manager.get_state().await;
        assert_eq!(state.current_station, Some(2));
        assert_eq!(state.playback_status, PlaybackStatus::Loading);
        assert_eq!(
            backend.spawns.lock().unwrap()[1].url,
            "http://stream.example/2"
        );
    }

    #[tokio::test]
    async fn pause_toggle_from_cold_idle_is_a_no_op() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::TogglePause).await.unwrap();
        assert_eq!(backend.spawn_count(), 0);
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Idle
        );
    }

    #[tokio::test]
    async fn error_marks_station_and_survives_stop() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 1 }).await.unwrap();
        core.handle_media(stream_error(backend.last_token())).await;

        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Error);
        assert_eq!(state.marker_for(1), Some(StationMarker::Error));

        core.handle_command(Command::Stop).await.unwrap();
        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Idle);
        assert_eq!(state.marker_for(1), Some(StationMarker::Error));

        // A new selection clears the marker.
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        let state = manager.get_state().await;
        assert_eq!(state.marker_for(1), None);
        assert_eq!(state.marker_for(0), Some(StationMarker::Loading));
    }

    #[tokio::test]
    async fn superseded_rejection_from_live_token_is_swallowed() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        core.handle_media(MediaEvent {
            token: backend.last_token(),
            signal: MediaSignal::Rejected(RejectReason::Superseded),
        })
        .await;
        assert_eq!(
            manager.get_state().await.playback_status,
            PlaybackStatus::Loading
        );
    }

    #[tokio::test]
    async fn volume_reaches_live_resource_and_state() {
        let (mut core, backend, manager) = core_with(3);
        core.handle_command(Command::Select { station_idx: 0 }).await.unwrap();
        core.handle_command(Command::Volume { value: 0.8 }).await.unwrap();

        assert_eq!(manager.get_state().await.volume, 0.8);
        let log = backend.ctl_log(0);
        assert!(log
            .iter()
            .any(|m| matches!(m, crate::media::MediaCtl::SetVolume(v) if (*v - 0.8).abs() < 1e-6)));
    }
}
