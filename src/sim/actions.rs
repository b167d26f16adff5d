//! Named state transitions
//!
//! The only code that mutates [`GameState`]. Each action checks its
//! preconditions first and returns an error without touching state when they
//! fail, so every call is a total function over the current state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, GameState, PowerUpKind, PowerUpSpawn, WeatherEvent};
use crate::consts::*;
use crate::error::ActionError;
use crate::prob::{roll_probability, sample_categorical};

/// Intent sent by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    StartGame { difficulty: u32 },
    StartTutorial,
    PauseGame,
    ResumeGame,
    CollectTreasure { id: String, probability: f64 },
    CompleteLevel,
    NextLevel,
    RestartLevel,
    SetDifficulty { level: u32 },
    StartParkour,
    CompleteParkour,
    FailParkour,
}

impl GameState {
    /// Apply an action, returning the event it produced
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        action: &Action,
        rng: &mut R,
    ) -> Result<GameEvent, ActionError> {
        match action {
            Action::StartGame { difficulty } => self.start_game(*difficulty),
            Action::StartTutorial => self.start_tutorial(),
            Action::PauseGame => self.pause_game(),
            Action::ResumeGame => self.resume_game(),
            Action::CollectTreasure { id, probability } => {
                self.collect_treasure(id, *probability, rng)
            }
            Action::CompleteLevel => self.complete_level(),
            Action::NextLevel => self.next_level(),
            Action::RestartLevel => self.restart_level(),
            Action::SetDifficulty { level } => self.set_difficulty(*level),
            Action::StartParkour => self.start_parkour(),
            Action::CompleteParkour => self.complete_parkour(),
            Action::FailParkour => self.fail_parkour(),
        }
    }

    fn require_phase(&self, action: &'static str, allowed: &[GamePhase]) -> Result<(), ActionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ActionError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    fn set_phase(&mut self, to: GamePhase) -> GameEvent {
        let from = self.phase;
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", from, to);
        GameEvent::PhaseChanged { from, to }
    }

    /// Begin a fresh session at `difficulty`
    pub fn start_game(&mut self, difficulty: u32) -> Result<GameEvent, ActionError> {
        self.require_phase("start_game", &[GamePhase::Tutorial, GamePhase::GameOver])?;
        check_level(difficulty)?;

        log::info!("Starting game at level {}", difficulty);
        self.reset_session();
        self.ledger.clear();
        self.current_level = difficulty;
        self.generate_treasures();
        self.phase = GamePhase::Playing;
        Ok(GameEvent::LevelStarted { level: difficulty })
    }

    /// Return to the tutorial screen (main menu / play again)
    pub fn start_tutorial(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase(
            "start_tutorial",
            &[GamePhase::LevelComplete, GamePhase::Paused, GamePhase::GameOver],
        )?;

        log::info!("Starting tutorial");
        self.reset_session();
        self.current_level = 1;
        self.generate_treasures();
        Ok(self.set_phase(GamePhase::Tutorial))
    }

    pub fn pause_game(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("pause_game", &[GamePhase::Playing])?;
        Ok(self.set_phase(GamePhase::Paused))
    }

    pub fn resume_game(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("resume_game", &[GamePhase::Paused])?;
        Ok(self.set_phase(GamePhase::Playing))
    }

    /// Roll once to open a chest
    ///
    /// On success the id is recorded and `round(100 / p)` points are added;
    /// either way the attempt lands in the ledger. Already-found ids are
    /// rejected before rolling.
    pub fn collect_treasure<R: Rng + ?Sized>(
        &mut self,
        id: &str,
        probability: f64,
        rng: &mut R,
    ) -> Result<GameEvent, ActionError> {
        self.require_phase("collect_treasure", &[GamePhase::Playing])?;
        if self.is_found(id) {
            return Err(ActionError::AlreadyCollected { id: id.to_string() });
        }
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(ActionError::InvalidProbability { value: probability });
        }

        let success = roll_probability(rng, probability);
        log::info!(
            "Treasure {}: {:.3} = {}",
            id,
            probability,
            if success { "SUCCESS" } else { "FAIL" }
        );
        self.log_event(format!("treasure_{}", id), probability, success);

        if !success {
            return Ok(GameEvent::TreasureMissed { id: id.to_string() });
        }

        let points = (100.0 / probability).round() as u64;
        self.treasures_found.push(id.to_string());
        self.score += points;
        self.total_treasures_collected += 1;
        Ok(GameEvent::TreasureCollected {
            id: id.to_string(),
            points,
        })
    }

    /// Finish the level once every chest is found
    pub fn complete_level(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("complete_level", &[GamePhase::Playing])?;
        let found = self.treasures_found.len();
        let required = self.required_treasures();
        if found < required {
            return Err(ActionError::LevelIncomplete { found, required });
        }

        log::info!("Level {} complete with score {}", self.current_level, self.score);
        self.phase = GamePhase::LevelComplete;
        Ok(GameEvent::LevelComplete {
            level: self.current_level,
            score: self.score,
        })
    }

    /// Advance to the next difficulty level
    pub fn next_level(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("next_level", &[GamePhase::LevelComplete])?;
        check_level(self.current_level + 1)?;

        self.current_level += 1;
        self.treasures_found.clear();
        self.generate_treasures();
        self.phase = GamePhase::Playing;
        log::info!("Advancing to level {}", self.current_level);
        Ok(GameEvent::LevelStarted {
            level: self.current_level,
        })
    }

    /// Replay the current level (score is kept)
    pub fn restart_level(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("restart_level", &[GamePhase::LevelComplete, GamePhase::Playing])?;

        self.treasures_found.clear();
        self.generate_treasures();
        self.phase = GamePhase::Playing;
        Ok(GameEvent::LevelStarted {
            level: self.current_level,
        })
    }

    /// Pick the starting level on the selection screen
    pub fn set_difficulty(&mut self, level: u32) -> Result<GameEvent, ActionError> {
        self.require_phase("set_difficulty", &[GamePhase::Tutorial])?;
        check_level(level)?;

        self.current_level = level;
        self.generate_treasures();
        Ok(GameEvent::DifficultySet { level })
    }

    /// Categorical weather roll; no-op while weather is active
    pub fn check_weather_event<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GameEvent> {
        if self.weather.active {
            return None;
        }

        let roll: f64 = rng.random();
        let (kind, probability) = {
            let buckets = &self.tuning.weather_weights;
            let kind = *sample_categorical(buckets, roll)?;
            let probability = buckets
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, w)| *w)
                .unwrap_or(0.0);
            (kind, probability)
        };

        log::info!("Weather event: {} ({:.0}%)", kind.as_str(), probability * 100.0);
        self.weather = WeatherEvent {
            active: true,
            kind,
            probability,
            duration_ms: self.tuning.weather_duration_ms,
        };
        self.log_event(format!("weather_{}", kind.as_str()), probability, true);
        Some(GameEvent::WeatherStarted { kind, probability })
    }

    /// Bernoulli power-up roll against the level table
    pub fn check_power_up_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GameEvent> {
        if self.power_up.active {
            return None;
        }

        let probability = self.tuning.power_up_probability(self.current_level);
        if !roll_probability(rng, probability) {
            return None;
        }

        let kind = PowerUpKind::Speed;
        log::info!("Power-up spawned! ({:.0}%)", probability * 100.0);
        self.power_up = PowerUpSpawn {
            active: true,
            kind,
            probability,
            duration_ms: self.tuning.power_up_duration_ms,
        };
        self.log_event(format!("powerup_{}", kind.as_str()), probability, true);
        Some(GameEvent::PowerUpStarted { kind, probability })
    }

    /// Bernoulli parkour roll, gated on chests found
    pub fn check_parkour_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GameEvent> {
        if self.parkour.available || self.treasures_found.len() < PARKOUR_MIN_TREASURES {
            return None;
        }

        let probability = self.tuning.parkour_probability(self.current_level);
        if !roll_probability(rng, probability) {
            return None;
        }

        let tier = self.parkour.current_level.min(MAX_LEVEL);
        log::info!("Parkour challenge spawned! ({:.0}%)", probability * 100.0);
        self.parkour.available = true;
        self.parkour.current_level = tier;
        self.parkour.probability = probability;
        self.log_event(
            format!("parkour_spawn_level_{}", self.current_level),
            probability,
            true,
        );
        Some(GameEvent::ParkourAvailable { tier, probability })
    }

    /// Deferred weather reset; ignored when scheduled by an older session
    pub fn expire_weather(&mut self, generation: u64) -> Option<GameEvent> {
        if generation != self.generation || !self.weather.active {
            return None;
        }
        self.weather = WeatherEvent::inactive();
        Some(GameEvent::WeatherEnded)
    }

    /// Deferred power-up reset; ignored when scheduled by an older session
    pub fn expire_power_up(&mut self, generation: u64) -> Option<GameEvent> {
        if generation != self.generation || !self.power_up.active {
            return None;
        }
        self.power_up = PowerUpSpawn::inactive();
        Some(GameEvent::PowerUpEnded)
    }

    /// Enter the available parkour challenge
    pub fn start_parkour(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("start_parkour", &[GamePhase::Playing])?;
        if !self.parkour.available {
            return Err(ActionError::ParkourUnavailable);
        }

        log::info!("Starting parkour challenge {}", self.parkour.current_level);
        self.parkour.available = false;
        self.phase = GamePhase::Parkour;
        Ok(GameEvent::ParkourStarted {
            tier: self.parkour.current_level,
        })
    }

    /// Reward a finished challenge: bigger map, bonus, next tier
    pub fn complete_parkour(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("complete_parkour", &[GamePhase::Parkour])?;

        let tier = self.parkour.current_level;
        self.map_size += MAP_GROWTH;
        self.score += PARKOUR_BONUS;
        self.parkour.completed.insert(tier);
        self.parkour.current_level = (tier + 1).min(MAX_LEVEL);
        self.parkour.available = false;
        self.parkour.probability = 0.0;
        self.log_event(format!("parkour_complete_level_{}", tier), 1.0, true);
        self.phase = GamePhase::Playing;

        log::info!("Parkour completed! Map expanded to {}x{}", self.map_size, self.map_size);
        Ok(GameEvent::ParkourCompleted {
            tier,
            map_size: self.map_size,
        })
    }

    /// Leave the challenge without reward
    pub fn fail_parkour(&mut self) -> Result<GameEvent, ActionError> {
        self.require_phase("fail_parkour", &[GamePhase::Parkour])?;

        log::info!("Parkour failed, returning to main game");
        self.parkour.available = false;
        self.parkour.probability = 0.0;
        self.phase = GamePhase::Playing;
        Ok(GameEvent::ParkourFailed {
            tier: self.parkour.current_level,
        })
    }
}

fn check_level(level: u32) -> Result<(), ActionError> {
    if (1..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(ActionError::LevelOutOfRange {
            level,
            max: MAX_LEVEL,
        })
    }
}
