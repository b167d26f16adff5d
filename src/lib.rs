//! Probability Quest - a treasure hunt that teaches probability
//!
//! Core modules:
//! - `prob`: Pure probability helpers (formatting, rolls, combined events)
//! - `ledger`: Record of every probability outcome in a session
//! - `sim`: Game state machine, spawn scheduler, proximity triggers, movement
//! - `tuning`: Data-driven level and spawn tables
//! - `web`: wasm-bindgen facade for the browser renderer

pub mod error;
pub mod ledger;
pub mod prob;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{ActionError, TuningError};
pub use ledger::{EventLedger, LedgerEntry};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Highest difficulty level / parkour tier
    pub const MAX_LEVEL: u32 = 3;

    /// Starting map edge length (units)
    pub const BASE_MAP_SIZE: f32 = 30.0;
    /// Map growth per completed parkour challenge
    pub const MAP_GROWTH: f32 = 20.0;

    /// Bonus for finishing a parkour challenge
    pub const PARKOUR_BONUS: u64 = 500;
    /// Treasures that must be found before parkour can spawn
    pub const PARKOUR_MIN_TREASURES: usize = 3;

    /// Spawn check intervals (seconds of play time)
    pub const WEATHER_CHECK_SECS: f32 = 5.0;
    pub const POWER_UP_CHECK_SECS: f32 = 3.0;
    pub const PARKOUR_CHECK_SECS: f32 = 7.0;

    /// Active window lengths (milliseconds)
    pub const WEATHER_DURATION_MS: u32 = 5000;
    pub const POWER_UP_DURATION_MS: u32 = 8000;

    /// Proximity radii
    pub const HOVER_RADIUS: f32 = 3.0;
    pub const TRIGGER_RADIUS: f32 = 2.0;
    pub const PORTAL_RADIUS: f32 = 3.0;
    pub const FINISH_RADIUS: f32 = 3.0;
    /// Time the player must stay on the finish platform
    pub const FINISH_HOLD_SECS: f32 = 1.0;

    /// Player movement
    pub const MOVE_SPEED: f32 = 5.0;
    pub const BOOSTED_MOVE_SPEED: f32 = 8.0;
    pub const GRAVITY: f32 = 30.0;
    pub const JUMP_IMPULSE: f32 = 12.0;
    pub const GROUND_Y: f32 = 1.0;

    /// Largest frame delta the simulation accepts (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Fixed simulation timestep used by the hosts (seconds)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum simulation steps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Current wall-clock time in epoch milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn epoch_ms() -> u64 {
    js_sys::Date::now() as u64
}
