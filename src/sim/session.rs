//! A running game: state plus everything that lives between frames
//!
//! The session owns the RNG, the scheduler, the player body and the proximity
//! trackers. Actions go through [`Session::dispatch`], which applies the world
//! side effects each transition implies (respawns, loading a course, dropping
//! stale timers).

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::actions::Action;
use super::collision::{HoldTimer, ProximityTarget, ProximityTracker};
use super::course::{Course, PLAYER_SPAWN, PORTAL_POSITION};
use super::movement::{Player, Terrain};
use super::scheduler::Scheduler;
use super::state::{GameEvent, GameState};
use crate::consts::*;
use crate::error::ActionError;
use crate::ledger::RecentStats;
use crate::prob::EventAnalysis;
use crate::tuning::Tuning;

/// Proximity id of the parkour portal
pub const PORTAL_ID: &str = "portal";

pub struct Session {
    pub(crate) state: GameState,
    pub(crate) scheduler: Scheduler,
    pub(crate) player: Player,
    pub(crate) proximity: ProximityTracker,
    pub(crate) finish_hold: HoldTimer,
    pub(crate) course: Option<Course>,
    /// Seconds since the current course was loaded
    pub(crate) course_time: f32,
    pub(crate) rng: Pcg32,
    /// Autopilot: chest it is backing away from
    pub(crate) retreat_from: Option<Vec3>,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(seed: u64, tuning: Tuning, start_ms: u64) -> Self {
        let scheduler = Scheduler::new(&tuning);
        Self {
            state: GameState::new(tuning, start_ms),
            scheduler,
            player: Player::spawn(PLAYER_SPAWN),
            proximity: ProximityTracker::new(),
            finish_hold: HoldTimer::new(FINISH_HOLD_SECS),
            course: None,
            course_time: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            retreat_from: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Apply an action and its side effects
    ///
    /// Rejected actions are logged and leave the session untouched.
    pub fn dispatch(&mut self, action: &Action) -> Result<(), ActionError> {
        let generation = self.state.generation;
        let event = match self.state.apply(action, &mut self.rng) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("Ignored {:?}: {}", action, err);
                return Err(err);
            }
        };

        if self.state.generation != generation {
            self.scheduler.reset();
            self.leave_course();
        }

        match &event {
            GameEvent::LevelStarted { .. } => self.respawn(),
            GameEvent::ParkourStarted { tier } => self.enter_course(*tier),
            GameEvent::ParkourCompleted { .. } | GameEvent::ParkourFailed { .. } => {
                self.leave_course()
            }
            _ => {}
        }

        self.events.push(event);
        Ok(())
    }

    pub(crate) fn push_events(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.events.extend(events);
    }

    /// Take everything that happened since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn respawn(&mut self) {
        self.player = Player::spawn(PLAYER_SPAWN);
        self.proximity.reset();
        self.retreat_from = None;
    }

    fn enter_course(&mut self, tier: u32) {
        let course = Course::for_tier(tier);
        self.player = Player::spawn(course.spawn);
        self.course = Some(course);
        self.course_time = 0.0;
        self.finish_hold.reset();
        self.proximity.reset();
    }

    fn leave_course(&mut self) {
        self.course = None;
        self.course_time = 0.0;
        self.finish_hold.reset();
        self.respawn();
    }

    /// Walkable surfaces for the current phase
    pub fn terrain(&self) -> Terrain<'_> {
        match &self.course {
            Some(course) => Terrain {
                platforms: &course.platforms,
                time: self.course_time,
                bounds: course.bounds,
            },
            None => Terrain::open(self.state.map_size),
        }
    }

    pub fn move_speed(&self) -> f32 {
        if self.state.power_up.speed_boost() {
            BOOSTED_MOVE_SPEED
        } else {
            MOVE_SPEED
        }
    }

    /// Unopened chests plus the portal while a challenge is on offer
    pub fn proximity_targets(&self) -> Vec<ProximityTarget> {
        let mut targets: Vec<ProximityTarget> = self
            .state
            .remaining_treasures()
            .map(|t| ProximityTarget::new(t.id.clone(), t.position, HOVER_RADIUS, TRIGGER_RADIUS))
            .collect();
        if self.state.parkour.available {
            targets.push(ProximityTarget::new(
                PORTAL_ID,
                PORTAL_POSITION,
                PORTAL_RADIUS,
                PORTAL_RADIUS,
            ));
        }
        targets
    }

    /// Finish platform center at the current course time
    pub fn finish_position(&self) -> Option<Vec3> {
        let course = self.course.as_ref()?;
        course.finish().map(|p| p.position_at(self.course_time))
    }

    pub fn analysis(&self) -> EventAnalysis {
        self.state.ledger.analyze()
    }

    pub fn recent_stats(&self) -> RecentStats {
        self.state.ledger.recent_stats()
    }

    /// Everything the renderer draws this frame
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: &self.state,
            player: &self.player,
            course: self.course.as_ref(),
            course_time: self.course_time,
            hovered: self.proximity.hovered().collect(),
            portal: self.state.parkour.available.then_some(PORTAL_POSITION),
            finish_progress: self.finish_hold.progress(),
            level_progress: self.state.level_progress(),
            recent: self.recent_stats(),
        }
    }
}

/// Serializable view of a session
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub state: &'a GameState,
    pub player: &'a Player,
    pub course: Option<&'a Course>,
    pub course_time: f32,
    pub hovered: Vec<&'a str>,
    pub portal: Option<Vec3>,
    pub finish_progress: f32,
    pub level_progress: f32,
    pub recent: RecentStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;

    fn session() -> Session {
        Session::new(7, Tuning::default(), 0)
    }

    #[test]
    fn test_dispatch_queues_events() {
        let mut s = session();
        s.dispatch(&Action::StartGame { difficulty: 2 }).unwrap();
        assert_eq!(s.drain_events(), vec![GameEvent::LevelStarted { level: 2 }]);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_rejected_action_is_noop() {
        let mut s = session();
        let before = serde_json::to_value(s.snapshot()).unwrap();
        assert!(s.dispatch(&Action::ResumeGame).is_err());
        assert!(s.drain_events().is_empty());
        assert_eq!(serde_json::to_value(s.snapshot()).unwrap(), before);
    }

    #[test]
    fn test_parkour_loads_and_unloads_course() {
        let mut s = session();
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.state.parkour.available = true;
        assert!(s.proximity_targets().iter().any(|t| t.id == PORTAL_ID));

        s.dispatch(&Action::StartParkour).unwrap();
        assert_eq!(s.state.phase, GamePhase::Parkour);
        assert_eq!(s.course().map(|c| c.platforms.len()), Some(5));
        assert!(s.finish_position().is_some());

        s.dispatch(&Action::FailParkour).unwrap();
        assert!(s.course().is_none());
        assert_eq!(s.player().position, PLAYER_SPAWN);
    }

    #[test]
    fn test_new_session_drops_pending_expiries() {
        let mut s = session();
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        let generation = s.state.generation;
        s.scheduler.schedule(crate::sim::scheduler::Expiry::Weather, 5000, generation);
        s.dispatch(&Action::PauseGame).unwrap();
        s.dispatch(&Action::StartTutorial).unwrap();
        assert!(s.scheduler().pending().is_empty());
    }

    #[test]
    fn test_speed_follows_power_up() {
        let mut s = session();
        assert_eq!(s.move_speed(), MOVE_SPEED);
        s.state.power_up.active = true;
        assert_eq!(s.move_speed(), BOOSTED_MOVE_SPEED);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let s = session();
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["state"]["phase"], "tutorial");
        assert!(json["course"].is_null());
        assert!(json["portal"].is_null());
        assert_eq!(json["recent"]["total_events"], 0);
    }
}
