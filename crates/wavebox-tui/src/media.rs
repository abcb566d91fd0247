//! Media backend contract + mpv-backed implementation.
//!
//! One media resource per station selection.  `MediaBackend::spawn` starts a
//! fresh resource for a URL and returns a [`MediaHandle`]; the resource reports
//! back through [`MediaEvent`]s tagged with the selection token it was spawned
//! under.  The player core compares that token against its live session and
//! discards anything stale, so a superseded resource can keep emitting until
//! its process winds down without corrupting state.
//!
//! The mpv implementation drives one mpv process per handle over JSON IPC:
//!
//! ```text
//!   MpvBackend::spawn()
//!         │
//!         └── io task  ← spawns mpv, connects to the per-token socket, then
//!                         ├── socket lines: core-idle / end-file → MediaEvent
//!                         └── MediaCtl (pause / volume / detach) → set_property
//! ```
//!
//! Platform notes:
//! - Unix:    Unix domain sockets
//! - Windows: Named pipes  \\.\pipe\<name>

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wavebox_core::platform;

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

/// Why a load request never reached playback.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RejectReason {
    /// The resource was detached before it became audible.  Expected during
    /// rapid re-selection; never surfaced to the user.
    #[error("superseded by a newer selection")]
    Superseded,
    /// The play request itself was refused (no binary, spawn failure).
    #[error("{0}")]
    Refused(String),
}

#[derive(Debug, Clone)]
pub enum MediaSignal {
    /// Enough of the stream is buffered that audio is (or would be) audible.
    CanPlay,
    /// The stream failed after loading started.
    Error(String),
    /// The load never started or was abandoned.
    Rejected(RejectReason),
}

/// A signal from a media resource, tagged with the selection token captured
/// when the resource was spawned.
#[derive(Debug, Clone)]
pub struct MediaEvent {
    pub token: u64,
    pub signal: MediaSignal,
}

/// Fire-and-forget control messages for a live media resource.
#[derive(Debug, Clone)]
pub enum MediaCtl {
    SetPause(bool),
    SetVolume(f32),
    /// Tear the resource down.  A resource that has not reached CanPlay yet
    /// reports `Rejected(Superseded)` on its way out.
    Detach,
}

/// Everything needed to start a media resource.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub url: String,
    pub volume: f32,
    pub token: u64,
}

/// Control side of one spawned media resource.
pub struct MediaHandle {
    token: u64,
    ctl: mpsc::UnboundedSender<MediaCtl>,
}

impl MediaHandle {
    pub fn new(token: u64, ctl: mpsc::UnboundedSender<MediaCtl>) -> Self {
        Self { token, ctl }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn set_pause(&self, paused: bool) {
        let _ = self.ctl.send(MediaCtl::SetPause(paused));
    }

    pub fn set_volume(&self, volume: f32) {
        let _ = self.ctl.send(MediaCtl::SetVolume(volume));
    }

    pub fn detach(&self) {
        let _ = self.ctl.send(MediaCtl::Detach);
    }
}

/// Spawns media resources.  The player core is generic over this so tests can
/// substitute a scripted implementation.
pub trait MediaBackend {
    fn spawn(&mut self, req: LoadRequest, events: mpsc::Sender<MediaEvent>) -> MediaHandle;
}

// ── mpv backend ───────────────────────────────────────────────────────────────

const OBS_CORE_IDLE: u64 = 1;

pub struct MpvBackend;

impl MpvBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for MpvBackend {
    fn spawn(&mut self, req: LoadRequest, events: mpsc::Sender<MediaEvent>) -> MediaHandle {
        let (ctl_tx, ctl_rx) = mpsc::unbounded_channel();
        let token = req.token;
        tokio::spawn(async move {
            let tx = events.clone();
            if let Err(e) = run_mpv(req, ctl_rx, events).await {
                warn!("mpv: spawn failed: {}", e);
                let _ = tx
                    .send(MediaEvent {
                        token,
                        signal: MediaSignal::Rejected(RejectReason::Refused(e.to_string())),
                    })
                    .await;
            }
        });
        MediaHandle::new(token, ctl_tx)
    }
}

/// Spawn mpv for one URL, connect to its per-token IPC socket, and run the IO
/// loop until the stream ends or the handle is detached.
async fn run_mpv(
    req: LoadRequest,
    ctl_rx: mpsc::UnboundedReceiver<MediaCtl>,
    events: mpsc::Sender<MediaEvent>,
) -> anyhow::Result<()> {
    let mpv_binary = platform::find_mpv_binary()
        .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

    let vol_arg = format!(
        "--volume={}",
        (req.volume * 100.0).clamp(0.0, 100.0).round() as i64
    );

    // Per-selection socket so a superseded process and its successor never
    // collide on the same IPC path.
    #[cfg(unix)]
    {
        let socket_path = std::path::PathBuf::from(platform::mpv_socket_path(req.token));
        let _ = tokio::fs::remove_file(&socket_path).await;

        info!("mpv: spawning for url={} token={}", req.url, req.token);
        let mut child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--quiet")
            .arg(&vol_arg)
            .arg(platform::mpv_socket_arg(req.token))
            .arg(&req.url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        // Wait for the socket to appear.
        let mut found = false;
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if socket_path.exists() {
                found = true;
                break;
            }
        }
        if !found {
            let _ = child.kill().await;
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        io_loop(req.token, stream, child, ctl_rx, events).await;
        let _ = tokio::fs::remove_file(&socket_path).await;
        Ok(())
    }

    #[cfg(windows)]
    {
        info!("mpv: spawning for url={} token={}", req.url, req.token);
        let mut child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--quiet")
            .arg(&vol_arg)
            .arg(platform::mpv_socket_arg(req.token))
            .arg(&req.url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        let pipe_path = format!(r"\\.\pipe\{}", platform::mpv_socket_path(req.token));
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                io_loop(req.token, client, child, ctl_rx, events).await;
                return Ok(());
            }
        }
        let _ = child.kill().await;
        anyhow::bail!("mpv named pipe did not appear")
    }
}

/// Single IO task: multiplexes socket lines against control messages.
async fn io_loop<S>(
    token: u64,
    stream: S,
    mut child: tokio::process::Child,
    mut ctl_rx: mpsc::UnboundedReceiver<MediaCtl>,
    events: mpsc::Sender<MediaEvent>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let reader = BufReader::new(read_half);

    let observe = format!(
        "{}\n",
        json!({ "command": ["observe_property", OBS_CORE_IDLE, "core-idle"], "request_id": 0 })
    );
    if write_half.write_all(observe.as_bytes()).await.is_err() {
        warn!("mpv: failed to register core-idle observer, token={}", token);
    }

    let mut can_play_sent = false;
    let mut detached = false;
    // next_line() is cancellation safe, so losing a select race never drops
    // buffered socket data.
    let mut lines = reader.lines();

    let ended: Option<String> = loop {
        tokio::select! {
            ctl = ctl_rx.recv() => match ctl {
                Some(MediaCtl::SetPause(paused)) => {
                    send_command(&mut write_half, json!(["set_property", "pause", paused])).await;
                }
                Some(MediaCtl::SetVolume(volume)) => {
                    let pct = (volume * 100.0).clamp(0.0, 100.0);
                    send_command(&mut write_half, json!(["set_property", "volume", pct])).await;
                }
                // Handle dropped or explicitly detached: this resource is done.
                Some(MediaCtl::Detach) | None => {
                    detached = true;
                    break None;
                }
            },
            read = lines.next_line() => match read {
                Ok(None) => break Some("mpv closed the IPC connection".to_string()),
                Err(e) => break Some(format!("mpv IPC read error: {}", e)),
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let val: Value = match serde_json::from_str(trimmed) {
                        Ok(v) => v,
                        Err(e) => {
                            debug!("mpv: invalid json '{}': {}", trimmed, e);
                            continue;
                        }
                    };
                    match classify(&val) {
                        Some(MpvNote::Audible) if !can_play_sent => {
                            can_play_sent = true;
                            let _ = events
                                .send(MediaEvent { token, signal: MediaSignal::CanPlay })
                                .await;
                        }
                        Some(MpvNote::EndFile(reason)) => {
                            break Some(format!("stream ended: {}", reason));
                        }
                        _ => {}
                    }
                }
            },
        }
    };

    let _ = child.kill().await;

    if detached {
        debug!("mpv: detached, token={}", token);
        if !can_play_sent {
            let _ = events
                .send(MediaEvent {
                    token,
                    signal: MediaSignal::Rejected(RejectReason::Superseded),
                })
                .await;
        }
        return;
    }

    if let Some(reason) = ended {
        warn!("mpv: token={} {}", token, reason);
        let _ = events
            .send(MediaEvent {
                token,
                signal: MediaSignal::Error(reason),
            })
            .await;
    }
}

enum MpvNote {
    /// core-idle flipped to false: the decoder is producing audio.
    Audible,
    EndFile(String),
}

fn classify(val: &Value) -> Option<MpvNote> {
    match val.get("event")?.as_str()? {
        "property-change" => {
            if val.get("id")?.as_u64()? == OBS_CORE_IDLE && !val.get("data")?.as_bool()? {
                Some(MpvNote::Audible)
            } else {
                None
            }
        }
        "end-file" => {
            let reason = val
                .get("reason")
                .and_then(|r| r.as_str())
                .unwrap_or("unknown")
                .to_string();
            // "stop" / "quit" arrive when we kill the process ourselves.
            if reason == "stop" || reason == "quit" {
                None
            } else {
                Some(MpvNote::EndFile(reason))
            }
        }
        _ => None,
    }
}

async fn send_command<W: AsyncWrite + Unpin>(writer: &mut W, command: Value) {
    let mut raw = json!({ "command": command, "request_id": 0 }).to_string();
    raw.push('\n');
    if let Err(e) = writer.write_all(raw.as_bytes()).await {
        warn!("mpv: write error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_idle_false_is_audible() {
        let val = json!({ "event": "property-change", "id": 1, "data": false });
        assert!(matches!(classify(&val), Some(MpvNote::Audible)));
    }

    #[test]
    fn core_idle_true_is_ignored() {
        let val = json!({ "event": "property-change", "id": 1, "data": true });
        assert!(classify(&val).is_none());
    }

    #[test]
    fn end_file_error_is_reported_but_stop_is_not() {
        let err = json!({ "event": "end-file", "reason": "error" });
        assert!(matches!(classify(&err), Some(MpvNote::EndFile(r)) if r == "error"));

        let stop = json!({ "event": "end-file", "reason": "stop" });
        assert!(classify(&stop).is_none());
    }
}
