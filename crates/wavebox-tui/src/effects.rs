//! Playback-reactive visuals: rising particles and the ambient pulse.
//!
//! Both effects are switched by reconciliation: the App derives the desired
//! on/off from the latest playback status on every state update and calls
//! the setters, which are idempotent.  Turning the particle field off stops
//! spawning and deactivates in-flight particles, but each particle still
//! lives out its fixed lifetime before removal.

use std::time::{Duration, Instant};

use rand::Rng;
use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_PARTICLE, C_PARTICLE_DIM};

pub const SPAWN_PERIOD: Duration = Duration::from_millis(500);
pub const PARTICLE_LIFETIME: Duration = Duration::from_secs(8);

struct Particle {
    /// Horizontal position as a fraction of the render width.
    x: f32,
    spawned: Instant,
    /// Time before the particle starts rising.
    delay: Duration,
    /// Time it takes to travel bottom to top.
    rise: Duration,
    active: bool,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    running: bool,
    last_spawn: Option<Instant>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            running: false,
            last_spawn: None,
        }
    }

    /// Idempotent on/off switch.
    pub fn set_running(&mut self, on: bool) {
        if on == self.running {
            return;
        }
        self.running = on;
        if on {
            self.last_spawn = None;
        } else {
            for p in &mut self.particles {
                p.active = false;
            }
        }
    }

    /// Spawn on schedule and retire particles past their lifetime.
    pub fn tick(&mut self, now: Instant) {
        self.particles
            .retain(|p| now.duration_since(p.spawned) < PARTICLE_LIFETIME);

        if !self.running {
            return;
        }
        let due = self
            .last_spawn
            .map_or(true, |t| now.duration_since(t) >= SPAWN_PERIOD);
        if due {
            self.spawn(now);
            self.last_spawn = Some(now);
        }
    }

    fn spawn(&mut self, now: Instant) {
        let mut rng = rand::thread_rng();
        self.particles.push(Particle {
            x: rng.gen::<f32>(),
            spawned: now,
            delay: Duration::from_millis(rng.gen_range(0..2000)),
            rise: Duration::from_millis(rng.gen_range(4000..8000)),
            active: true,
        });
    }

    /// Render each particle at its interpolated height.  Inactive particles
    /// keep drifting in a dimmed color until they expire.
    pub fn draw(&self, frame: &mut Frame, area: Rect, now: Instant) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        for p in &self.particles {
            let age = now.duration_since(p.spawned);
            let Some(airborne) = age.checked_sub(p.delay) else {
                continue;
            };
            let progress = (airborne.as_secs_f32() / p.rise.as_secs_f32()).min(1.0);
            let row = area.y + area.height - 1 - (progress * (area.height - 1) as f32) as u16;
            let col = area.x + (p.x * (area.width - 1) as f32) as u16;
            let color = if p.active { C_PARTICLE } else { C_PARTICLE_DIM };
            let cell = Rect {
                x: col,
                y: row,
                width: 1,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Span::styled("•", Style::default().fg(color))),
                cell,
            );
        }
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    #[cfg(test)]
    fn count(&self) -> usize {
        self.particles.len()
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-UI background tint while audio is audible.
pub struct AmbientPulse {
    on: bool,
}

impl AmbientPulse {
    pub fn new() -> Self {
        Self { on: false }
    }

    /// Idempotent on/off switch.
    pub fn set(&mut self, on: bool) {
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for AmbientPulse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn spawns_on_the_period_while_running() {
        let t0 = Instant::now();
        let mut field = ParticleField::new();
        field.set_running(true);

        field.tick(t0);
        assert_eq!(field.count(), 1);
        // Within the period: no new spawn.
        field.tick(t0 + Duration::from_millis(300));
        assert_eq!(field.count(), 1);
        field.tick(t0 + Duration::from_millis(500));
        assert_eq!(field.count(), 2);
    }

    #[test]
    fn switch_is_idempotent() {
        let t0 = Instant::now();
        let mut field = ParticleField::new();
        field.set_running(true);
        field.tick(t0);

        // A second "on" must not reset the spawn schedule.
        field.set_running(true);
        field.tick(t0 + Duration::from_millis(100));
        assert_eq!(field.count(), 1);

        field.set_running(false);
        field.set_running(false);
        assert_eq!(field.active_count(), 0);
        assert_eq!(field.count(), 1);
    }

    #[test]
    fn off_keeps_in_flight_particles_until_lifetime() {
        let t0 = Instant::now();
        let mut field = ParticleField::new();
        field.set_running(true);
        field.tick(t0);
        field.set_running(false);

        field.tick(t0 + secs(7));
        assert_eq!(field.count(), 1);
        assert_eq!(field.active_count(), 0);

        field.tick(t0 + secs(8));
        assert_eq!(field.count(), 0);
    }

    #[test]
    fn no_spawns_while_stopped() {
        let t0 = Instant::now();
        let mut field = ParticleField::new();
        field.tick(t0);
        field.tick(t0 + secs(5));
        assert_eq!(field.count(), 0);
    }
}
