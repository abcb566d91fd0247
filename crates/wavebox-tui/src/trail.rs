//! Pointer-trail tracking over the station list.
//!
//! Fast pointer movement (consecutive move events closer together than the
//! threshold) counts as a drag.  Rows passed during a drag light up and fade
//! on a fixed per-row schedule; the drag state itself clears after a short
//! quiet period with no movement.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Two moves closer together than this count as fast movement.
pub const FAST_MOVE_THRESHOLD: Duration = Duration::from_millis(30);
/// How long a row stays lit after being passed.
pub const TRAIL_DECAY: Duration = Duration::from_millis(300);
/// Drag state clears after this long without movement.
pub const DRAG_QUIET_PERIOD: Duration = Duration::from_millis(200);

pub struct TrailTracker {
    last_move: Option<Instant>,
    drag_until: Option<Instant>,
    /// Station index → highlight expiry.
    highlights: HashMap<usize, Instant>,
}

impl TrailTracker {
    pub fn new() -> Self {
        Self {
            last_move: None,
            drag_until: None,
            highlights: HashMap::new(),
        }
    }

    /// Feed one pointer-move event with the station rows under the pointer.
    /// Returns true when the move qualified as part of a drag.
    pub fn on_pointer_move(&mut self, now: Instant, rows: &[usize]) -> bool {
        let fast = self
            .last_move
            .map_or(false, |t| now.duration_since(t) < FAST_MOVE_THRESHOLD);
        self.last_move = Some(now);

        if fast {
            self.drag_until = Some(now + DRAG_QUIET_PERIOD);
            for &idx in rows {
                // Each row expires on its original schedule; passing over it
                // again does not extend the highlight.  A row lights anew
                // only once it has faded.
                let expiry = self.highlights.entry(idx).or_insert(now + TRAIL_DECAY);
                if *expiry <= now {
                    *expiry = now + TRAIL_DECAY;
                }
            }
        }
        fast
    }

    pub fn is_dragging(&self, now: Instant) -> bool {
        self.drag_until.map_or(false, |t| t > now)
    }

    /// Expire old highlights and stale drag state. Call each tick.
    pub fn tick(&mut self, now: Instant) {
        self.highlights.retain(|_, expiry| *expiry > now);
        if self.drag_until.map_or(false, |t| t <= now) {
            self.drag_until = None;
        }
    }

    /// Station indices currently lit, in ascending order.
    pub fn active(&self, now: Instant) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .highlights
            .iter()
            .filter(|(_, expiry)| **expiry > now)
            .map(|(idx, _)| *idx)
            .collect();
        rows.sort_unstable();
        rows
    }
}

impl Default for TrailTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn slow_movement_never_becomes_a_drag() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        assert!(!trail.on_pointer_move(t0, &[0]));
        assert!(!trail.on_pointer_move(t0 + ms(50), &[1]));
        assert!(trail.active(t0 + ms(60)).is_empty());
        assert!(!trail.is_dragging(t0 + ms(60)));
    }

    #[test]
    fn fast_movement_lights_rows_under_pointer() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[0]);
        assert!(trail.on_pointer_move(t0 + ms(10), &[1, 2]));
        assert_eq!(trail.active(t0 + ms(11)), vec![1, 2]);
        assert!(trail.is_dragging(t0 + ms(11)));
    }

    #[test]
    fn each_row_fades_on_its_own_schedule() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[9]);
        trail.on_pointer_move(t0 + ms(10), &[1]);
        trail.on_pointer_move(t0 + ms(140), &[]);
        trail.on_pointer_move(t0 + ms(150), &[5]);

        // Row 1 lit at t+10 expires at t+310; row 5 lit at t+150 holds on.
        let mut now = t0 + ms(320);
        trail.tick(now);
        assert_eq!(trail.active(now), vec![5]);

        now = t0 + ms(460);
        trail.tick(now);
        assert!(trail.active(now).is_empty());
    }

    #[test]
    fn drag_state_clears_after_quiet_period() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[0]);
        trail.on_pointer_move(t0 + ms(10), &[0]);
        assert!(trail.is_dragging(t0 + ms(100)));
        assert!(!trail.is_dragging(t0 + ms(250)));
    }

    #[test]
    fn re_passing_a_lit_row_keeps_its_original_expiry() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[2]);
        // Lit at t+10; sweeping back over it must not push the expiry out.
        trail.on_pointer_move(t0 + ms(10), &[2]);
        trail.on_pointer_move(t0 + ms(20), &[2]);
        trail.on_pointer_move(t0 + ms(30), &[2]);

        assert_eq!(trail.active(t0 + ms(305)), vec![2]);
        assert!(trail.active(t0 + ms(315)).is_empty());
    }

    #[test]
    fn a_faded_row_can_light_again() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[2]);
        trail.on_pointer_move(t0 + ms(10), &[2]);
        trail.tick(t0 + ms(320));
        assert!(trail.active(t0 + ms(320)).is_empty());

        trail.on_pointer_move(t0 + ms(400), &[2]);
        trail.on_pointer_move(t0 + ms(410), &[2]);
        assert_eq!(trail.active(t0 + ms(420)), vec![2]);
    }

    #[test]
    fn further_movement_does_not_extend_an_existing_highlight() {
        let t0 = Instant::now();
        let mut trail = TrailTracker::new();
        trail.on_pointer_move(t0, &[0]);
        trail.on_pointer_move(t0 + ms(10), &[3]);
        // Sweeping over other rows leaves row 3's expiry alone.
        trail.on_pointer_move(t0 + ms(20), &[4]);
        trail.on_pointer_move(t0 + ms(190), &[]);
        trail.on_pointer_move(t0 + ms(200), &[5]);

        let now = t0 + ms(325);
        trail.tick(now);
        assert_eq!(trail.active(now), vec![5]);
    }
}
