//! Player movement: walking, jumping, gravity and platform landing
//!
//! Horizontal velocity is set directly from the held direction keys each
//! frame (no acceleration). Vertical motion integrates gravity while airborne.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::course::{Bounds, Platform};
use crate::consts::*;

/// How close the feet must be to a platform top to count as standing on it
const SUPPORT_EPSILON: f32 = 0.1;

/// What the player can stand on this frame
#[derive(Debug, Clone, Copy)]
pub struct Terrain<'a> {
    pub platforms: &'a [Platform],
    /// Course time, for moving platforms
    pub time: f32,
    pub bounds: Bounds,
}

impl<'a> Terrain<'a> {
    /// Flat square map with no platforms
    pub fn open(map_size: f32) -> Self {
        Self {
            platforms: &[],
            time: 0.0,
            bounds: Bounds::square(map_size),
        }
    }

    /// Highest platform top under `pos` crossed while moving from `from_y` down to `to_y`
    fn landing(&self, pos: Vec3, from_y: f32, to_y: f32) -> Option<f32> {
        self.platforms
            .iter()
            .filter(|p| p.covers(pos, self.time))
            .map(Platform::top)
            .filter(|&top| top <= from_y + SUPPORT_EPSILON && top >= to_y)
            .reduce(f32::max)
    }

    /// Platform the feet are resting on, if any
    fn support(&self, pos: Vec3) -> Option<&'a Platform> {
        self.platforms
            .iter()
            .find(|p| p.covers(pos, self.time) && (pos.y - p.top()).abs() <= SUPPORT_EPSILON)
    }
}

/// Player body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Feet position
    pub position: Vec3,
    pub vertical_velocity: f32,
    pub airborne: bool,
}

impl Player {
    pub fn spawn(position: Vec3) -> Self {
        Self {
            position,
            vertical_velocity: 0.0,
            airborne: false,
        }
    }

    /// Advance one frame
    ///
    /// `direction` is the raw key axis (x: right positive, y: back positive);
    /// it is not normalized, so diagonals are faster.
    pub fn step(&mut self, direction: Vec2, jump: bool, speed: f32, dt: f32, terrain: &Terrain) {
        if jump && !self.airborne {
            self.vertical_velocity = JUMP_IMPULSE;
            self.airborne = true;
        }

        if self.airborne {
            self.vertical_velocity -= GRAVITY * dt;
            let next_y = self.position.y + self.vertical_velocity * dt;

            let landing = if self.vertical_velocity <= 0.0 {
                terrain.landing(self.position, self.position.y, next_y)
            } else {
                None
            };

            match landing {
                Some(top) => self.land(top),
                None if next_y <= GROUND_Y => self.land(GROUND_Y),
                None => self.position.y = next_y,
            }
        } else if self.position.y > GROUND_Y + SUPPORT_EPSILON {
            match terrain.support(self.position) {
                Some(platform) => {
                    // Ride moving platforms
                    let dt_prev = (terrain.time - dt).max(0.0);
                    let shift = platform.position_at(terrain.time) - platform.position_at(dt_prev);
                    self.position.x += shift.x;
                }
                None => {
                    self.airborne = true;
                    self.vertical_velocity = 0.0;
                }
            }
        }

        self.position.x += direction.x * speed * dt;
        self.position.z += direction.y * speed * dt;
        self.position = terrain.bounds.clamp(self.position);
    }

    fn land(&mut self, y: f32) {
        self.position.y = y;
        self.vertical_velocity = 0.0;
        self.airborne = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::course::Course;

    const DT: f32 = 1.0 / 60.0;

    fn settle(player: &mut Player, terrain: &Terrain, max_frames: usize) {
        for _ in 0..max_frames {
            player.step(Vec2::ZERO, false, MOVE_SPEED, DT, terrain);
            if !player.airborne {
                return;
            }
        }
    }

    #[test]
    fn test_walk_speed() {
        let terrain = Terrain::open(BASE_MAP_SIZE);
        let mut player = Player::spawn(Vec3::new(0.0, GROUND_Y, 0.0));
        player.step(Vec2::new(0.0, -1.0), false, MOVE_SPEED, 1.0, &terrain);
        assert_eq!(player.position, Vec3::new(0.0, GROUND_Y, -5.0));
        player.step(Vec2::new(1.0, 0.0), false, BOOSTED_MOVE_SPEED, 0.5, &terrain);
        assert_eq!(player.position.x, 4.0);
    }

    #[test]
    fn test_clamped_to_map() {
        let terrain = Terrain::open(BASE_MAP_SIZE);
        let mut player = Player::spawn(Vec3::new(0.0, GROUND_Y, 0.0));
        for _ in 0..100 {
            player.step(Vec2::new(1.0, 1.0), false, MOVE_SPEED, 0.1, &terrain);
        }
        assert_eq!(player.position.x, 15.0);
        assert_eq!(player.position.z, 15.0);
    }

    #[test]
    fn test_jump_returns_to_ground() {
        let terrain = Terrain::open(BASE_MAP_SIZE);
        let mut player = Player::spawn(Vec3::new(0.0, GROUND_Y, 0.0));
        player.step(Vec2::ZERO, true, MOVE_SPEED, DT, &terrain);
        assert!(player.airborne);

        let mut apex = player.position.y;
        for _ in 0..120 {
            player.step(Vec2::ZERO, false, MOVE_SPEED, DT, &terrain);
            apex = apex.max(player.position.y);
        }
        assert!(!player.airborne);
        assert_eq!(player.position.y, GROUND_Y);
        // v^2 / 2g = 2.4 above the ground
        assert!((apex - (GROUND_Y + 2.4)).abs() < 0.25);
    }

    #[test]
    fn test_jump_onto_platform_from_below() {
        let course = Course::for_tier(1);
        let terrain = Terrain {
            platforms: &course.platforms,
            time: 0.0,
            bounds: course.bounds,
        };
        let mut player = Player::spawn(Vec3::new(0.0, GROUND_Y, -5.0));
        player.step(Vec2::ZERO, true, MOVE_SPEED, DT, &terrain);
        settle(&mut player, &terrain, 200);
        assert!(!player.airborne);
        assert_eq!(player.position.y, course.platforms[0].top());

        // Standing still on it is stable
        for _ in 0..30 {
            player.step(Vec2::ZERO, false, MOVE_SPEED, DT, &terrain);
        }
        assert!(!player.airborne);
        assert_eq!(player.position.y, course.platforms[0].top());
    }

    #[test]
    fn test_walk_off_platform_falls() {
        let course = Course::for_tier(1);
        let terrain = Terrain {
            platforms: &course.platforms,
            time: 0.0,
            bounds: course.bounds,
        };
        let top = course.platforms[0].top();
        let mut player = Player::spawn(Vec3::new(0.0, top, -5.0));
        for _ in 0..30 {
            player.step(Vec2::new(1.0, 0.0), false, MOVE_SPEED, DT, &terrain);
        }
        assert!(player.position.x > 1.0);
        settle(&mut player, &terrain, 200);
        assert_eq!(player.position.y, GROUND_Y);
    }

    #[test]
    fn test_rides_moving_platform() {
        let course = Course::for_tier(2);
        let mover = course.platforms[2];
        let mut player = Player::spawn(Vec3::new(mover.center.x, mover.top(), mover.center.z));
        let mut t = 0.0;
        for _ in 0..10 {
            t += DT;
            let terrain = Terrain {
                platforms: &course.platforms,
                time: t,
                bounds: course.bounds,
            };
            player.step(Vec2::ZERO, false, MOVE_SPEED, DT, &terrain);
        }
        assert!(!player.airborne);
        assert!((player.position.x - mover.position_at(t).x).abs() < 1e-3);
    }
}
