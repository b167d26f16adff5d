//! Game state and event sub-states
//!
//! Everything the renderer reads lives here. Fields are public for reading;
//! mutation goes through the named actions in `actions.rs`.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::course::treasure_field;
use crate::consts::*;
use crate::ledger::EventLedger;
use crate::tuning::Tuning;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Intro / difficulty selection
    Tutorial,
    /// Exploring the map and opening chests
    Playing,
    /// Game is paused
    Paused,
    /// All chests on the level found
    LevelComplete,
    /// Run ended
    GameOver,
    /// Inside a parkour challenge
    Parkour,
}

/// Weather outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Rain,
    Sunny,
    Cloudy,
}

impl WeatherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherKind::Rain => "rain",
            WeatherKind::Sunny => "sunny",
            WeatherKind::Cloudy => "cloudy",
        }
    }
}

/// Timed weather window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub active: bool,
    #[serde(rename = "type")]
    pub kind: WeatherKind,
    pub probability: f64,
    pub duration_ms: u32,
}

impl WeatherEvent {
    /// Inactive sentinel: sunny, zero probability, zero duration
    pub fn inactive() -> Self {
        Self {
            active: false,
            kind: WeatherKind::Sunny,
            probability: 0.0,
            duration_ms: 0,
        }
    }
}

impl Default for WeatherEvent {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Power-up types (only `Speed` spawns today)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Speed,
    Score,
    Luck,
}

impl PowerUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Speed => "speed",
            PowerUpKind::Score => "score",
            PowerUpKind::Luck => "luck",
        }
    }
}

/// Timed power-up window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpSpawn {
    pub active: bool,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub probability: f64,
    pub duration_ms: u32,
}

impl PowerUpSpawn {
    pub fn inactive() -> Self {
        Self {
            active: false,
            kind: PowerUpKind::Speed,
            probability: 0.0,
            duration_ms: 0,
        }
    }

    /// Whether the player currently moves at boosted speed
    pub fn speed_boost(&self) -> bool {
        self.active && self.kind == PowerUpKind::Speed
    }
}

impl Default for PowerUpSpawn {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Parkour challenge progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkourState {
    pub available: bool,
    /// Next tier to play (1..=3)
    pub current_level: u32,
    /// Tiers finished this session (only grows)
    pub completed: BTreeSet<u32>,
    /// Odds of the roll that made the challenge available
    pub probability: f64,
}

impl Default for ParkourState {
    fn default() -> Self {
        Self {
            available: false,
            current_level: 1,
            completed: BTreeSet::new(),
            probability: 0.0,
        }
    }
}

/// A chest on the current level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureRecord {
    pub id: String,
    pub position: Vec3,
    pub probability: f64,
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    LevelStarted { level: u32 },
    LevelComplete { level: u32, score: u64 },
    DifficultySet { level: u32 },
    TreasureHover { id: String },
    TreasureCollected { id: String, points: u64 },
    TreasureMissed { id: String },
    WeatherStarted { kind: WeatherKind, probability: f64 },
    WeatherEnded,
    PowerUpStarted { kind: PowerUpKind, probability: f64 },
    PowerUpEnded,
    ParkourAvailable { tier: u32, probability: f64 },
    ParkourStarted { tier: u32 },
    ParkourCompleted { tier: u32, map_size: f32 },
    ParkourFailed { tier: u32 },
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    /// Difficulty level (1..=3)
    pub current_level: u32,
    pub score: u64,
    /// Chests generated for the current level
    pub treasures: Vec<TreasureRecord>,
    /// Ids found on the current level, in collection order
    pub treasures_found: Vec<String>,
    /// Map edge length
    pub map_size: f32,
    pub weather: WeatherEvent,
    pub power_up: PowerUpSpawn,
    pub parkour: ParkourState,
    /// Chests found across the session
    pub total_treasures_collected: u64,
    pub ledger: EventLedger,
    /// Bumped on every session reset; stale deferred work compares against it
    pub generation: u64,
    /// Epoch milliseconds used for ledger timestamps
    pub clock_ms: u64,
    /// Sub-millisecond remainder of clock advancement
    #[serde(skip)]
    clock_frac_ms: f64,
    #[serde(skip)]
    pub(crate) tuning: Tuning,
}

impl GameState {
    /// Fresh state in the tutorial phase, clock starting at `start_ms`
    pub fn new(tuning: Tuning, start_ms: u64) -> Self {
        let mut state = Self {
            phase: GamePhase::Tutorial,
            current_level: 1,
            score: 0,
            treasures: Vec::new(),
            treasures_found: Vec::new(),
            map_size: BASE_MAP_SIZE,
            weather: WeatherEvent::inactive(),
            power_up: PowerUpSpawn::inactive(),
            parkour: ParkourState::default(),
            total_treasures_collected: 0,
            ledger: EventLedger::with_capacity(tuning.ledger_capacity),
            generation: 0,
            clock_ms: start_ms,
            clock_frac_ms: 0.0,
            tuning,
        };
        state.generate_treasures();
        state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Advance the ledger clock by a frame delta
    pub fn advance_clock(&mut self, dt: f32) {
        let total = self.clock_frac_ms + dt.max(0.0) as f64 * 1000.0;
        let whole = total.floor();
        self.clock_ms += whole as u64;
        self.clock_frac_ms = total - whole;
    }

    /// Rebuild the chest layout for the current level
    pub(crate) fn generate_treasures(&mut self) {
        let probabilities = self.tuning.treasure_probabilities(self.current_level).to_vec();
        self.treasures = treasure_field(&probabilities);
    }

    /// Chests needed to finish the level
    pub fn required_treasures(&self) -> usize {
        self.treasures.len()
    }

    /// Fraction of chests found (0..=1)
    pub fn level_progress(&self) -> f32 {
        let required = self.required_treasures();
        if required == 0 {
            return 0.0;
        }
        (self.treasures_found.len() as f32 / required as f32).min(1.0)
    }

    pub fn is_found(&self, id: &str) -> bool {
        self.treasures_found.iter().any(|found| found == id)
    }

    pub fn treasure(&self, id: &str) -> Option<&TreasureRecord> {
        self.treasures.iter().find(|t| t.id == id)
    }

    /// Chests still waiting to be opened
    pub fn remaining_treasures(&self) -> impl Iterator<Item = &TreasureRecord> {
        self.treasures.iter().filter(|t| !self.is_found(&t.id))
    }

    /// Append to the ledger at the current clock
    pub(crate) fn log_event(&mut self, kind: impl Into<String>, probability: f64, success: bool) {
        let now = self.clock_ms;
        self.ledger.record(kind, probability, success, now);
    }

    /// Clear per-session progress and bump the generation
    pub(crate) fn reset_session(&mut self) {
        self.score = 0;
        self.treasures_found.clear();
        self.total_treasures_collected = 0;
        self.map_size = BASE_MAP_SIZE;
        self.weather = WeatherEvent::inactive();
        self.power_up = PowerUpSpawn::inactive();
        self.parkour = ParkourState::default();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(Tuning::default(), 1_000);
        assert_eq!(state.phase, GamePhase::Tutorial);
        assert_eq!(state.current_level, 1);
        assert_eq!(state.map_size, BASE_MAP_SIZE);
        assert_eq!(state.required_treasures(), 5);
        assert!(!state.weather.active);
        assert_eq!(state.weather.probability, 0.0);
        assert_eq!(state.power_up.duration_ms, 0);
        assert_eq!(state.parkour.current_level, 1);
    }

    #[test]
    fn test_clock_keeps_fractions() {
        let mut state = GameState::new(Tuning::default(), 0);
        for _ in 0..60 {
            state.advance_clock(1.0 / 60.0);
        }
        assert!((999..=1000).contains(&state.clock_ms));
    }

    #[test]
    fn test_level_progress() {
        let mut state = GameState::new(Tuning::default(), 0);
        assert_eq!(state.level_progress(), 0.0);
        state.treasures_found.push("treasure-0".into());
        state.treasures_found.push("treasure-3".into());
        assert!((state.level_progress() - 0.4).abs() < 1e-6);
        assert_eq!(state.remaining_treasures().count(), 3);
    }

    #[test]
    fn test_snapshot_field_names() {
        let state = GameState::new(Tuning::default(), 0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "tutorial");
        assert_eq!(json["weather"]["type"], "sunny");
        assert_eq!(json["power_up"]["type"], "speed");
    }
}
