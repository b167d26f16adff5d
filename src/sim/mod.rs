//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed, tuning and inputs a
//! session plays out identically:
//! - Seeded RNG only (owned by the session)
//! - Every state change goes through a named action
//! - No rendering or platform dependencies

pub mod actions;
pub mod collision;
pub mod course;
pub mod movement;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod tick;

pub use actions::Action;
pub use collision::{HoldStatus, HoldTimer, ProximityEvent, ProximityTarget, ProximityTracker, in_finish_zone};
pub use course::{Bounds, Course, Platform, PLAYER_SPAWN, PORTAL_POSITION, treasure_field};
pub use movement::{Player, Terrain};
pub use scheduler::{DeferredReset, Expiry, Scheduler, SpawnTimer};
pub use session::{PORTAL_ID, Session, Snapshot};
pub use state::{
    GameEvent, GamePhase, GameState, ParkourState, PowerUpKind, PowerUpSpawn, TreasureRecord,
    WeatherEvent, WeatherKind,
};
pub use tick::{TickInput, tick};
