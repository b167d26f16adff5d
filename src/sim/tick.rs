//! Per-frame simulation step
//!
//! Order within one frame: pause toggle, clock, spawn timers and checks,
//! movement, proximity triggers, then phase transitions. Everything a trigger
//! does goes through [`Session::dispatch`].

use glam::{Vec2, Vec3};

use super::actions::Action;
use super::collision::{HoldStatus, ProximityEvent, in_finish_zone, within};
use super::course::PORTAL_POSITION;
use super::movement::Terrain;
use super::session::{PORTAL_ID, Session};
use super::state::{GameEvent, GamePhase};
use crate::consts::*;

/// Autopilot abandons a course after this long
const AUTOPILOT_GIVE_UP_SECS: f32 = 20.0;

/// Held keys for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Abandon a parkour challenge
    pub interact: bool,
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the player walks itself around
    pub autopilot: bool,
}

impl TickInput {
    /// Unpack a key bitmask (forward, back, left, right, interact, jump, pause, autopilot from bit 0)
    pub fn from_bits(bits: u32) -> Self {
        let bit = |n: u32| bits & (1 << n) != 0;
        Self {
            forward: bit(0),
            back: bit(1),
            left: bit(2),
            right: bit(3),
            interact: bit(4),
            jump: bit(5),
            pause: bit(6),
            autopilot: bit(7),
        }
    }

    /// Raw key axis (x: right positive, y: back positive)
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| pos as i8 as f32 - neg as i8 as f32;
        Vec2::new(axis(self.left, self.right), axis(self.forward, self.back))
    }

    fn steer_toward(&mut self, from: Vec3, to: Vec3) {
        const DEADZONE: f32 = 0.1;
        let dx = to.x - from.x;
        let dz = to.z - from.z;
        self.right = dx > DEADZONE;
        self.left = dx < -DEADZONE;
        self.back = dz > DEADZONE;
        self.forward = dz < -DEADZONE;
    }
}

/// Advance the session by one frame
pub fn tick(session: &mut Session, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    if input.pause {
        match session.state.phase {
            GamePhase::Playing => {
                session.dispatch(&Action::PauseGame).ok();
                return;
            }
            GamePhase::Paused => {
                session.dispatch(&Action::ResumeGame).ok();
            }
            _ => {}
        }
    }

    session.state.advance_clock(dt);

    let mut input = input.clone();
    if input.autopilot {
        autopilot(session, &mut input);
    }

    match session.state.phase {
        GamePhase::Playing => tick_playing(session, &input, dt),
        GamePhase::Parkour => tick_parkour(session, &input, dt),
        _ => {}
    }
}

fn tick_playing(session: &mut Session, input: &TickInput, dt: f32) {
    let events = session
        .scheduler
        .advance(&mut session.state, &mut session.rng, dt);
    session.push_events(events);

    let speed = session.move_speed();
    let terrain = Terrain::open(session.state.map_size);
    session
        .player
        .step(input.direction(), input.jump, speed, dt, &terrain);

    let targets = session.proximity_targets();
    let hits = session.proximity.resolve(session.player.position, &targets);
    for hit in hits {
        match hit {
            ProximityEvent::HoverEnter(id) if id != PORTAL_ID => {
                session.push_events([GameEvent::TreasureHover { id }]);
            }
            ProximityEvent::Trigger(id) if id == PORTAL_ID => {
                session.dispatch(&Action::StartParkour).ok();
            }
            ProximityEvent::Trigger(id) => {
                if let Some(probability) = session.state.treasure(&id).map(|t| t.probability) {
                    session.dispatch(&Action::CollectTreasure { id, probability }).ok();
                }
            }
            _ => {}
        }
        if session.state.phase != GamePhase::Playing {
            return;
        }
    }

    let required = session.state.required_treasures();
    if required > 0 && session.state.treasures_found.len() >= required {
        session.dispatch(&Action::CompleteLevel).ok();
    }
}

fn tick_parkour(session: &mut Session, input: &TickInput, dt: f32) {
    if input.interact {
        session.dispatch(&Action::FailParkour).ok();
        return;
    }

    session.course_time += dt;
    let speed = session.move_speed();
    if let Some(course) = session.course.as_ref() {
        let terrain = Terrain {
            platforms: &course.platforms,
            time: session.course_time,
            bounds: course.bounds,
        };
        session
            .player
            .step(input.direction(), input.jump, speed, dt, &terrain);
    }

    let inside = session
        .finish_position()
        .is_some_and(|finish| in_finish_zone(session.player.position, finish, FINISH_RADIUS));
    if session.finish_hold.update(inside, dt) == HoldStatus::Complete {
        session.dispatch(&Action::CompleteParkour).ok();
    }
}

/// Fill in keys for demo mode
fn autopilot(session: &mut Session, input: &mut TickInput) {
    let pos = session.player.position;
    match session.state.phase {
        GamePhase::Playing => {
            // A chest that refused to open only re-arms once we leave its hover radius
            if let Some(from) = session.retreat_from {
                if within(pos, from, HOVER_RADIUS + 0.5) {
                    input.steer_toward(pos, pos + (pos - from));
                    return;
                }
                session.retreat_from = None;
            }

            if let Some(missed) = session
                .state
                .remaining_treasures()
                .find(|t| within(pos, t.position, TRIGGER_RADIUS))
            {
                session.retreat_from = Some(missed.position);
                input.steer_toward(pos, pos + (pos - missed.position));
                return;
            }

            let target = if session.state.parkour.available {
                Some(PORTAL_POSITION)
            } else {
                session
                    .state
                    .remaining_treasures()
                    .map(|t| t.position)
                    .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)))
            };
            if let Some(target) = target {
                input.steer_toward(pos, target);
            }
        }
        GamePhase::Parkour => {
            if session.course_time > AUTOPILOT_GIVE_UP_SECS {
                input.interact = true;
                return;
            }
            let Some(course) = session.course.as_ref() else {
                return;
            };
            let t = session.course_time;
            let next = course
                .platforms
                .iter()
                .find(|p| p.top() > pos.y + 0.5)
                .or_else(|| course.finish());
            if let Some(platform) = next {
                let center = platform.position_at(t);
                input.steer_toward(pos, center);
                let gap = Vec2::new(center.x - pos.x, center.z - pos.z).length();
                input.jump = !session.player.airborne && platform.top() > pos.y && gap < 3.0;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::movement::Player;
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn sure_thing() -> Tuning {
        let mut tuning = Tuning::default();
        for level in &mut tuning.levels {
            level.treasure_probabilities = vec![1.0; 5];
            level.parkour_probability = 0.0;
        }
        tuning
    }

    fn run(session: &mut Session, input: &TickInput, frames: usize) {
        for _ in 0..frames {
            tick(session, input, DT);
        }
    }

    #[test]
    fn test_from_bits() {
        let input = TickInput::from_bits(0b0010_0101);
        assert!(input.forward && input.left && input.jump);
        assert!(!input.back && !input.right && !input.pause);
        assert_eq!(input.direction(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_pause_toggle_freezes_timers() {
        let mut s = Session::new(1, Tuning::default(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        run(&mut s, &TickInput::default(), 60);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut s, &pause, DT);
        assert_eq!(s.state().phase, GamePhase::Paused);

        let elapsed = s.scheduler().weather.elapsed;
        run(&mut s, &TickInput::default(), 600);
        assert_eq!(s.scheduler().weather.elapsed, elapsed);

        tick(&mut s, &pause, DT);
        assert_eq!(s.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_walk_into_chest_collects() {
        let mut s = Session::new(1, sure_thing(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.drain_events();

        // Chest 4 sits straight behind the spawn at z = 8
        let back = TickInput {
            back: true,
            ..Default::default()
        };
        run(&mut s, &back, 90);
        assert!(s.state().is_found("treasure-4"));
        assert_eq!(s.state().score, 100);

        let events = s.drain_events();
        assert!(events.contains(&GameEvent::TreasureHover {
            id: "treasure-4".into()
        }));
        assert!(events.contains(&GameEvent::TreasureCollected {
            id: "treasure-4".into(),
            points: 100
        }));
    }

    #[test]
    fn test_failed_chest_does_not_refire_while_standing() {
        let mut tuning = sure_thing();
        tuning.levels[0].treasure_probabilities[4] = 1e-9;
        let mut s = Session::new(1, tuning, 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.player = Player::spawn(Vec3::new(0.0, GROUND_Y, 7.5));

        run(&mut s, &TickInput::default(), 120);
        let attempts = s.state().ledger.of_kind("treasure_").count();
        assert_eq!(attempts, 1);
        assert!(!s.state().is_found("treasure-4"));
    }

    #[test]
    fn test_autopilot_clears_level() {
        let mut s = Session::new(9, sure_thing(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        let auto = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..60 * 60 {
            tick(&mut s, &auto, DT);
            if s.state().phase == GamePhase::LevelComplete {
                break;
            }
        }
        assert_eq!(s.state().phase, GamePhase::LevelComplete);
        assert_eq!(s.state().treasures_found.len(), 5);
        assert_eq!(s.state().score, 500);
    }

    #[test]
    fn test_finish_hold_completes_parkour() {
        let mut s = Session::new(1, Tuning::default(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.state.parkour.available = true;
        s.dispatch(&Action::StartParkour).unwrap();

        let finish = s.course().and_then(|c| c.finish()).copied().unwrap();
        s.player = Player::spawn(Vec3::new(finish.center.x, finish.top(), finish.center.z));

        run(&mut s, &TickInput::default(), 30);
        assert_eq!(s.state().phase, GamePhase::Parkour);
        run(&mut s, &TickInput::default(), 40);
        assert_eq!(s.state().phase, GamePhase::Playing);
        assert_eq!(s.state().map_size, BASE_MAP_SIZE + MAP_GROWTH);
        assert_eq!(s.state().score, PARKOUR_BONUS);
        assert!(s.course().is_none());
    }

    #[test]
    fn test_interact_abandons_parkour() {
        let mut s = Session::new(1, Tuning::default(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.state.parkour.available = true;
        s.dispatch(&Action::StartParkour).unwrap();

        let interact = TickInput {
            interact: true,
            ..Default::default()
        };
        tick(&mut s, &interact, DT);
        assert_eq!(s.state().phase, GamePhase::Playing);
        assert!(s.state().parkour.completed.is_empty());
        assert!(s.drain_events().contains(&GameEvent::ParkourFailed { tier: 1 }));
    }

    #[test]
    fn test_portal_starts_parkour() {
        let mut s = Session::new(1, Tuning::default(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        s.state.parkour.available = true;
        let forward = TickInput {
            forward: true,
            ..Default::default()
        };
        run(&mut s, &forward, 120);
        assert_eq!(s.state().phase, GamePhase::Parkour);
        assert!(s.course().is_some());
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut s = Session::new(1, Tuning::default(), 0);
        s.dispatch(&Action::StartGame { difficulty: 1 }).unwrap();
        let right = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut s, &right, 5.0);
        assert!((s.player().position.x - MOVE_SPEED * MAX_FRAME_DT).abs() < 1e-5);
    }
}
