//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    StationList,
    SearchBox,
    Controls,
    SupportModal,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play(usize), // select station by index (same index toggles pause)
    Stop,
    TogglePause,
    Volume(f32),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    JumpToCurrent,

    // ── Search ───────────────────────────────────────────────────────────────
    /// Debounced query result: station indices matching the live query.
    SearchMatches(Vec<usize>),
    /// A search result was activated (Enter or click on a result row).
    ActivateResult(usize),
    DismissResults,

    // ── Support modal ────────────────────────────────────────────────────────
    OpenSupport,
    CloseSupport,

    // ── UI ───────────────────────────────────────────────────────────────────
    CopyToClipboard(String),
    Quit,
    Noop,
}
