//! App — component orchestration and the main event loop.
//!
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (terminal events, player broadcasts).
//! - Components translate raw input into `Action`s; `dispatch` applies them
//!   and forwards them to every component so cross-pane reactions work.
//! - Effects are reconciled, not toggled: every state update derives the
//!   desired on/off from the playback status and applies it idempotently.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use wavebox_core::player::{Command, PlaybackStatus, PlayerState};
use wavebox_core::state::StateManager;

use crate::action::{Action, ComponentId};
use crate::app_state::{AppState, SEARCH_FLASH};
use crate::component::Component;
use crate::components::{
    controls::Controls, search_box::SearchBox, station_list::StationList,
    support_modal::SupportModal,
};
use crate::core::PlayerEvent;
use crate::effects::{AmbientPulse, ParticleField};
use crate::focus::FocusRing;
use crate::theme::{C_BG, C_BG_PULSE, C_MUTED, C_PRIMARY};
use crate::trail::TrailTracker;
use crate::widgets::toast::ToastManager;
use crate::BroadcastMessage;

enum AppMessage {
    Event(Event),
    StateUpdated(PlayerState),
}

#[derive(Default, Clone, Copy)]
struct PaneAreas {
    header: Rect,
    search: Rect,
    stations: Rect,
    controls: Rect,
}

pub struct App {
    state: AppState,
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<PlayerEvent>,

    station_list: StationList,
    search_box: SearchBox,
    controls: Controls,
    support_modal: SupportModal,

    focus: FocusRing,
    toast: ToastManager,
    particles: ParticleField,
    pulse: AmbientPulse,
    trail: TrailTracker,

    areas: PaneAreas,
    should_quit: bool,
}

impl App {
    pub fn new(
        initial: PlayerState,
        state_manager: Arc<StateManager>,
        event_tx: mpsc::Sender<PlayerEvent>,
    ) -> Self {
        let state = AppState::new(initial);
        let mut station_list = StationList::new();
        station_list.sync_stations(&state);
        if let Some(idx) = state_manager.initial_station() {
            station_list.list.set_selected(idx);
        }

        Self {
            state,
            state_manager,
            event_tx,
            station_list,
            search_box: SearchBox::new(),
            controls: Controls::new(),
            support_modal: SupportModal::new(),
            focus: FocusRing::new(vec![
                ComponentId::StationList,
                ComponentId::SearchBox,
                ComponentId::Controls,
            ]),
            toast: ToastManager::new(),
            particles: ParticleField::new(),
            pulse: AmbientPulse::new(),
            trail: TrailTracker::new(),
            areas: PaneAreas::default(),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (PlayerCore → AppMessage) ─────
        let bc_tx = tx.clone();
        let bc_state_manager = self.state_manager.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(BroadcastMessage::StateUpdated) => {
                        let state = bc_state_manager.get_state().await;
                        if bc_tx.send(AppMessage::StateUpdated(state)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        // Drives debounce deadlines, trail decay, particle spawning, flash
        // expiry; 100ms keeps the slowest of those feeling immediate.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                    // Drain whatever queued up so rapid input collapses into
                    // one redraw.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next).await;
                    }
                }

                _ = ui_tick.tick() => {
                    self.on_ui_tick().await;
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    self.toast.tick();
                    needs_redraw = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        let _ = self.event_tx.send(PlayerEvent::Shutdown).await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    async fn on_ui_tick(&mut self) {
        let now = Instant::now();
        self.particles.tick(now);
        self.trail.tick(now);
        self.state.trail_active = self.trail.active(now);

        if let Some((_, deadline)) = self.state.search_flash {
            if now >= deadline {
                self.state.search_flash = None;
            }
        }

        let mut actions = Vec::new();
        actions.extend(self.search_box.tick(&self.state));
        actions.extend(self.station_list.tick(&self.state));
        actions.extend(self.controls.tick(&self.state));
        actions.extend(self.support_modal.tick(&self.state));
        for action in actions {
            self.dispatch(action).await;
        }
    }

    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    self.handle_key(key).await;
                    true
                }
                Event::Mouse(mouse) => {
                    self.handle_mouse(mouse).await;
                    true
                }
                Event::Resize(_, _) => true,
                _ => false,
            },
            AppMessage::StateUpdated(player) => {
                self.state.player = player;
                self.station_list.sync_stations(&self.state);
                self.reconcile_effects();
                true
            }
        }
    }

    /// Derive effect switches from the snapshot.  Setters are idempotent, so
    /// repeated updates with the same status are free.
    fn reconcile_effects(&mut self) {
        let audible = self.state.player.playback_status == PlaybackStatus::Playing;
        self.particles.set_running(audible);
        self.pulse.set(audible);
        self.state.pulse_on = self.pulse.is_on();
    }

    // ── Input routing ─────────────────────────────────────────────────────────

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Modal swallows everything while open.
        if self.support_modal.visible {
            let actions = self.support_modal.handle_key(key, &self.state);
            for action in actions {
                self.dispatch(action).await;
            }
            return;
        }

        // Live text entry gets the keystrokes.
        if self.search_box.active {
            let actions = self.search_box.handle_key(key, &self.state);
            for action in actions {
                self.dispatch(action).await;
            }
            return;
        }

        // Global keys.
        let global = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char(' ') => Some(Action::TogglePause),
            KeyCode::Char('s') => Some(Action::Stop),
            KeyCode::Char('-') => Some(Action::Volume(
                (self.state.player.volume - 0.05).max(0.0),
            )),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Volume(
                (self.state.player.volume + 0.05).min(1.0),
            )),
            KeyCode::Char('/') => {
                self.search_box.activate();
                Some(Action::FocusPane(ComponentId::SearchBox))
            }
            KeyCode::Char('$') => Some(Action::OpenSupport),
            KeyCode::Char('c') => Some(Action::JumpToCurrent),
            KeyCode::Tab => Some(Action::FocusNext),
            KeyCode::BackTab => Some(Action::FocusPrev),
            _ => None,
        };
        if let Some(action) = global {
            self.dispatch(action).await;
            return;
        }

        let actions = match self.focus.current() {
            Some(ComponentId::StationList) => self.station_list.handle_key(key, &self.state),
            Some(ComponentId::SearchBox) => self.search_box.handle_key(key, &self.state),
            Some(ComponentId::Controls) => self.controls.handle_key(key, &self.state),
            _ => Vec::new(),
        };
        for action in actions {
            self.dispatch(action).await;
        }
    }

    async fn handle_mouse(&mut self, mouse: MouseEvent) {
        // Pointer movement feeds the trail regardless of what it is over;
        // moves and button-drags go through the same path.
        if matches!(
            mouse.kind,
            MouseEventKind::Moved | MouseEventKind::Drag(_)
        ) {
            let rows: Vec<usize> = self
                .station_list
                .station_at(mouse.column, mouse.row)
                .into_iter()
                .collect();
            let now = Instant::now();
            self.trail.on_pointer_move(now, &rows);
            self.state.trail_active = self.trail.active(now);
        }

        if self.support_modal.visible {
            let actions = self.support_modal.handle_mouse(mouse, self.areas.header, &self.state);
            for action in actions {
                self.dispatch(action).await;
            }
            return;
        }

        let mut actions = Vec::new();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.search_box.contains(mouse.column, mouse.row) {
                    actions.extend(self.search_box.handle_mouse(mouse, self.areas.search, &self.state));
                } else {
                    // Click outside the search surfaces hides the dropdown but
                    // leaves the query and highlights alone.
                    if self.search_box.results_visible {
                        actions.push(Action::DismissResults);
                    }
                    actions.extend(self.station_list.handle_mouse(
                        mouse,
                        self.areas.stations,
                        &self.state,
                    ));
                    actions.extend(self.controls.handle_mouse(mouse, self.areas.controls, &self.state));
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                actions.extend(self.controls.handle_mouse(mouse, self.areas.controls, &self.state));
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                if point_in(self.areas.stations, mouse.column, mouse.row) {
                    actions.extend(self.station_list.handle_mouse(
                        mouse,
                        self.areas.stations,
                        &self.state,
                    ));
                }
            }
            _ => {}
        }
        for action in actions {
            self.dispatch(action).await;
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        match &action {
            Action::Play(idx) => {
                self.send_command(Command::Select { station_idx: *idx }).await;
            }
            Action::TogglePause => self.send_command(Command::TogglePause).await,
            Action::Stop => self.send_command(Command::Stop).await,
            Action::Volume(v) => self.send_command(Command::Volume { value: *v }).await,

            Action::SearchMatches(matches) => {
                self.state.search_matches = matches.clone();
            }
            Action::ActivateResult(idx) => {
                // The flash reverts to the plain match highlight when it
                // expires; the other matches keep theirs throughout.
                self.state.search_flash = Some((*idx, Instant::now() + SEARCH_FLASH));
                self.focus.set(ComponentId::StationList);
            }
            Action::OpenSupport | Action::CloseSupport => {}
            Action::DismissResults => {}
            Action::JumpToCurrent => {}

            Action::CopyToClipboard(text) => {
                self.copy_to_clipboard(text);
                return;
            }
            Action::FocusNext => {
                self.focus.next();
                return;
            }
            Action::FocusPrev => {
                self.focus.prev();
                return;
            }
            Action::FocusPane(id) => {
                self.focus.set(*id);
                return;
            }
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::Noop => return,
        }

        // Forward to every component; collect follow-up actions.
        let mut follow_ups = Vec::new();
        follow_ups.extend(self.station_list.on_action(&action, &self.state));
        follow_ups.extend(self.search_box.on_action(&action, &self.state));
        follow_ups.extend(self.controls.on_action(&action, &self.state));
        follow_ups.extend(self.support_modal.on_action(&action, &self.state));
        for follow_up in follow_ups {
            Box::pin(self.dispatch(follow_up)).await;
        }
    }

    async fn send_command(&mut self, cmd: Command) {
        if self
            .event_tx
            .send(PlayerEvent::Command(cmd.clone()))
            .await
            .is_err()
        {
            warn!("player core gone, dropping {:?}", cmd);
            self.toast.error("player core is not running");
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string())) {
            Ok(()) => self.toast.success("copied to clipboard"),
            Err(e) => {
                warn!("clipboard copy failed: {}", e);
                self.toast.error(format!("copy failed: {}", e));
            }
        }
    }

    // ── Render ────────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let bg = if self.state.pulse_on { C_BG_PULSE } else { C_BG };
        frame.render_widget(Block::default().style(Style::default().bg(bg)), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);
        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(32)])
            .split(rows[0]);

        self.areas = PaneAreas {
            header: area,
            search: header[1],
            stations: rows[1],
            controls: rows[2],
        };

        // Particles drift behind the panes.
        self.particles.draw(frame, rows[1], Instant::now());

        let title = Line::from(vec![
            Span::styled(
                " wavebox ",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "q quit  / search  space pause  s stop  $ support",
                Style::default().fg(C_MUTED),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), header[0]);

        self.station_list.draw(
            frame,
            rows[1],
            self.focus.is_focused(ComponentId::StationList),
            &self.state,
        );
        self.controls.draw(
            frame,
            rows[2],
            self.focus.is_focused(ComponentId::Controls),
            &self.state,
        );
        // Drawn after the list so the results dropdown floats above it.
        self.search_box.draw(
            frame,
            header[1],
            self.focus.is_focused(ComponentId::SearchBox),
            &self.state,
        );
        self.support_modal.draw(frame, area, false, &self.state);
        self.toast.draw(frame, area);
    }
}

fn point_in(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavebox_core::player::Station;

    async fn app_with(n: usize) -> App {
        let stations: Vec<Station> = (0..n)
            .map(|i| Station {
                id: format!("s{i}"),
                name: format!("Station {i}"),
                url: format!("http://stream.example/{i}"),
                ..Station::default()
            })
            .collect();
        let state_file = std::env::temp_dir().join(format!(
            "wavebox-app-test-{}-{n}.json",
            std::process::id()
        ));
        let manager = Arc::new(StateManager::new(state_file, stations));
        let initial = manager.get_state().await;
        let (event_tx, _event_rx) = mpsc::channel(8);
        App::new(initial, manager, event_tx)
    }

    #[tokio::test]
    async fn activating_a_result_keeps_all_match_highlights() {
        let mut app = app_with(3).await;
        app.state.search_matches = vec![0, 1];

        app.dispatch(Action::ActivateResult(0)).await;

        // The activated station flashes; every match keeps its highlight so
        // the flash can revert to it.
        assert!(app.state.flash_station(0));
        assert_eq!(app.state.search_matches, vec![0, 1]);
        assert!(app.focus.is_focused(ComponentId::StationList));
    }
}
