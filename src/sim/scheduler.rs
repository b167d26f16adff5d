//! Spawn checks and timed expiries
//!
//! Three independent interval timers drive the weather, power-up and parkour
//! rolls. Active weather and power-up windows are cleared by deferred resets
//! tagged with the session generation that scheduled them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, GameState};
use crate::tuning::Tuning;

/// Accumulates frame time and fires once per interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub interval: f32,
    pub elapsed: f32,
}

impl SpawnTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Add `dt`; returns true (and restarts) once the interval is reached
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Which window a deferred reset clears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    Weather,
    PowerUp,
}

/// One-shot reset due at a point in play time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeferredReset {
    pub due_ms: f64,
    pub expiry: Expiry,
    pub generation: u64,
}

/// Periodic spawn checks plus pending expiries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    pub weather: SpawnTimer,
    pub power_up: SpawnTimer,
    pub parkour: SpawnTimer,
    /// Milliseconds spent in the playing phase
    play_ms: f64,
    pending: Vec<DeferredReset>,
}

impl Scheduler {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            weather: SpawnTimer::new(tuning.weather_check_secs),
            power_up: SpawnTimer::new(tuning.power_up_check_secs),
            parkour: SpawnTimer::new(tuning.parkour_check_secs),
            play_ms: 0.0,
            pending: Vec::new(),
        }
    }

    /// Advance by one frame
    ///
    /// Does nothing outside the playing phase. Due expiries fire before the
    /// spawn checks so a window can end and re-roll within the same frame.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        state: &mut GameState,
        rng: &mut R,
        dt: f32,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if state.phase != GamePhase::Playing {
            return events;
        }

        self.play_ms += dt as f64 * 1000.0;
        self.fire_due(state, &mut events);

        if self.weather.advance(dt) {
            if let Some(event) = state.check_weather_event(rng) {
                self.schedule(Expiry::Weather, state.weather.duration_ms, state.generation);
                events.push(event);
            }
        }

        if self.power_up.advance(dt) {
            if let Some(event) = state.check_power_up_spawn(rng) {
                self.schedule(Expiry::PowerUp, state.power_up.duration_ms, state.generation);
                events.push(event);
            }
        }

        if self.parkour.advance(dt) {
            if let Some(event) = state.check_parkour_spawn(rng) {
                events.push(event);
            }
        }

        events
    }

    /// Queue a reset `delay_ms` of play time from now
    pub fn schedule(&mut self, expiry: Expiry, delay_ms: u32, generation: u64) {
        self.pending.push(DeferredReset {
            due_ms: self.play_ms + delay_ms as f64,
            expiry,
            generation,
        });
    }

    fn fire_due(&mut self, state: &mut GameState, events: &mut Vec<GameEvent>) {
        let now = self.play_ms;
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.iter().copied().partition(|r| r.due_ms <= now);
        self.pending = waiting;

        for reset in due {
            let event = match reset.expiry {
                Expiry::Weather => state.expire_weather(reset.generation),
                Expiry::PowerUp => state.expire_power_up(reset.generation),
            };
            match event {
                Some(event) => events.push(event),
                None => log::debug!("Dropped stale {:?} reset (gen {})", reset.expiry, reset.generation),
            }
        }
    }

    /// Restart all interval timers and drop pending resets
    pub fn reset(&mut self) {
        self.weather.reset();
        self.power_up.reset();
        self.parkour.reset();
        self.pending.clear();
    }

    pub fn pending(&self) -> &[DeferredReset] {
        &self.pending
    }

    pub fn play_ms(&self) -> f64 {
        self.play_ms
    }
}
