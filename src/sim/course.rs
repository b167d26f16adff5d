//! Level layouts: treasure chests on the main map and parkour courses

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::TreasureRecord;
use crate::consts::GROUND_Y;

/// Chest positions on the ground plane (x, z), in id order
pub const TREASURE_SPOTS: [(f32, f32); 5] = [(5.0, 5.0), (-5.0, 5.0), (5.0, -5.0), (-5.0, -5.0), (0.0, 8.0)];
/// Chest resting height
const TREASURE_Y: f32 = 0.5;

/// Where the player starts on the main map and in a course
pub const PLAYER_SPAWN: Vec3 = Vec3::new(0.0, GROUND_Y, 0.0);
/// Parkour portal, shown while a challenge is available
pub const PORTAL_POSITION: Vec3 = Vec3::new(0.0, GROUND_Y, -10.0);

/// Base height of the first parkour platform
const COURSE_BASE_Y: f32 = 2.0;

/// Generate the chests for a level from its probability table
///
/// Ids are `treasure-<index>`; the layout is fixed so ids map to the same spot
/// on every level.
pub fn treasure_field(probabilities: &[f64]) -> Vec<TreasureRecord> {
    TREASURE_SPOTS
        .iter()
        .zip(probabilities)
        .enumerate()
        .map(|(i, (&(x, z), &probability))| TreasureRecord {
            id: format!("treasure-{}", i),
            position: Vec3::new(x, TREASURE_Y, z),
            probability,
        })
        .collect()
}

/// Axis-aligned ground-plane bounds (x, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Square centered on the origin with edge `size`
    pub fn square(size: f32) -> Self {
        let half = size / 2.0;
        Self {
            min: Vec2::splat(-half),
            max: Vec2::splat(half),
        }
    }

    pub fn clamp(&self, pos: Vec3) -> Vec3 {
        Vec3::new(
            pos.x.clamp(self.min.x, self.max.x),
            pos.y,
            pos.z.clamp(self.min.y, self.max.y),
        )
    }
}

/// A box the player can land on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Center at rest
    pub center: Vec3,
    pub size: Vec3,
    pub is_finish: bool,
    /// Horizontal oscillation amplitude for moving platforms
    pub move_range: Option<f32>,
}

impl Platform {
    fn fixed(x: f32, y: f32, z: f32, edge: f32) -> Self {
        Self {
            center: Vec3::new(x, y, z),
            size: Vec3::new(edge, 0.5, edge),
            is_finish: false,
            move_range: None,
        }
    }

    fn moving(x: f32, y: f32, z: f32, edge: f32, range: f32) -> Self {
        Self {
            move_range: Some(range),
            ..Self::fixed(x, y, z, edge)
        }
    }

    fn finish(x: f32, y: f32, z: f32) -> Self {
        Self {
            is_finish: true,
            ..Self::fixed(x, y, z, 3.0)
        }
    }

    /// Center at course time `t` (moving platforms swing along x)
    pub fn position_at(&self, t: f32) -> Vec3 {
        match self.move_range {
            Some(range) => self.center + Vec3::X * (t * 2.0).sin() * range,
            None => self.center,
        }
    }

    /// Height of the walkable surface
    pub fn top(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }

    /// Whether (x, z) is over the platform at time `t`
    pub fn covers(&self, pos: Vec3, t: f32) -> bool {
        let c = self.position_at(t);
        (pos.x - c.x).abs() <= self.size.x / 2.0 && (pos.z - c.z).abs() <= self.size.z / 2.0
    }
}

/// A parkour challenge layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub tier: u32,
    pub platforms: Vec<Platform>,
    pub spawn: Vec3,
    pub bounds: Bounds,
}

impl Course {
    /// Layout for a tier; tiers above 3 reuse the hardest course
    pub fn for_tier(tier: u32) -> Self {
        let y = COURSE_BASE_Y;
        let platforms = match tier {
            0 | 1 => vec![
                Platform::fixed(0.0, y, -5.0, 2.0),
                Platform::fixed(0.0, y + 1.0, -10.0, 2.0),
                Platform::fixed(3.0, y + 2.0, -15.0, 2.0),
                Platform::fixed(0.0, y + 3.0, -20.0, 2.0),
                Platform::finish(0.0, y + 4.0, -25.0),
            ],
            2 => vec![
                Platform::fixed(0.0, y, -5.0, 2.0),
                Platform::fixed(-4.0, y + 1.0, -10.0, 2.0),
                Platform::moving(4.0, y + 2.0, -15.0, 2.0, 2.0),
                Platform::fixed(-3.0, y + 3.0, -20.0, 2.0),
                Platform::moving(0.0, y + 4.0, -25.0, 2.0, 1.5),
                Platform::finish(0.0, y + 5.0, -30.0),
            ],
            _ => vec![
                Platform::fixed(0.0, y, -5.0, 1.5),
                Platform::moving(-5.0, y + 1.0, -10.0, 1.5, 3.0),
                Platform::fixed(5.0, y + 2.0, -15.0, 1.5),
                Platform::moving(0.0, y + 3.0, -20.0, 1.5, 2.0),
                Platform::moving(-6.0, y + 4.0, -25.0, 1.5, 2.5),
                Platform::fixed(6.0, y + 5.0, -30.0, 1.5),
                Platform::finish(0.0, y + 6.0, -35.0),
            ],
        };

        Self {
            tier: tier.max(1),
            platforms,
            spawn: PLAYER_SPAWN,
            bounds: Bounds {
                min: Vec2::new(-15.0, -40.0),
                max: Vec2::new(15.0, 10.0),
            },
        }
    }

    /// The goal platform
    pub fn finish(&self) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.is_finish)
    }
}
