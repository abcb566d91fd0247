mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod effects;
mod focus;
mod media;
mod theme;
mod trail;
mod widgets;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use wavebox_core::{config::Config, platform, state::StateManager};

/// What the PlayerCore broadcasts to UI listeners.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The player state changed; receivers should fetch from StateManager.
    StateUpdated,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("wavebox.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress
    // noisy connection-level DEBUG from HTTP client internals.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("wavebox log: {}", log_path.display());

    tracing::info!("wavebox starting…");

    // ── Load config + stations ───────────────────────────────────────────────
    let config = Config::load().unwrap_or_default();
    let stations = core::load_stations(&config).await;

    let had_saved_state = config.player.state_file.exists();
    let state_manager = Arc::new(StateManager::new(
        config.player.state_file.clone(),
        stations,
    ));
    if !had_saved_state {
        state_manager
            .set_volume(config.player.default_volume)
            .await?;
    }

    // ── Broadcast channel (PlayerCore → TUI) ─────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(64);

    // ── PlayerEvent channel (TUI → PlayerCore) ───────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::PlayerEvent>(64);

    // ── Build + spawn PlayerCore ─────────────────────────────────────────────
    let player_core = core::PlayerCore::new(
        state_manager.clone(),
        media::MpvBackend::new(),
        broadcast_tx.clone(),
    );
    tokio::spawn(player_core.run(event_rx));

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let initial = state_manager.get_state().await;
    let app = app::App::new(initial, state_manager, event_tx);
    app.run(broadcast_rx).await?;

    Ok(())
}
