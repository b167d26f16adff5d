//! Proximity triggers between the player and world targets
//!
//! Everything here is distance based: a wide hover radius for highlighting and
//! a tighter trigger radius that fires an action once per approach. The finish
//! platform uses a hold timer so a single frame of overlap never completes a
//! course.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Something the player can walk up to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityTarget {
    pub id: String,
    pub position: Vec3,
    pub hover_radius: f32,
    pub trigger_radius: f32,
}

impl ProximityTarget {
    pub fn new(id: impl Into<String>, position: Vec3, hover_radius: f32, trigger_radius: f32) -> Self {
        Self {
            id: id.into(),
            position,
            hover_radius,
            trigger_radius: trigger_radius.min(hover_radius),
        }
    }
}

/// Transitions reported by [`ProximityTracker::resolve`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProximityEvent {
    HoverEnter(String),
    HoverExit(String),
    Trigger(String),
}

/// Strict less-than, matching the hover and trigger checks
#[inline]
pub fn within(entity: Vec3, target: Vec3, radius: f32) -> bool {
    entity.distance_squared(target) < radius * radius
}

/// Edge detector over a set of targets
///
/// A target triggers once when the entity enters its trigger radius and
/// re-arms only after the entity leaves the hover radius, so hovering on the
/// trigger boundary cannot fire it twice.
#[derive(Debug, Clone, Default)]
pub struct ProximityTracker {
    hovered: BTreeSet<String>,
    armed_out: BTreeSet<String>,
}

impl ProximityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one entity position against every target
    ///
    /// Targets missing from `targets` (collected chests, a closed portal) are
    /// forgotten; a hovered one reports `HoverExit`.
    pub fn resolve(&mut self, entity: Vec3, targets: &[ProximityTarget]) -> Vec<ProximityEvent> {
        let mut events = Vec::new();

        let live: BTreeSet<&str> = targets.iter().map(|t| t.id.as_str()).collect();
        let gone: Vec<String> = self
            .hovered
            .iter()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        for id in gone {
            self.hovered.remove(&id);
            events.push(ProximityEvent::HoverExit(id));
        }
        self.armed_out.retain(|id| live.contains(id.as_str()));

        for target in targets {
            let hover = within(entity, target.position, target.hover_radius);
            let trigger = within(entity, target.position, target.trigger_radius);

            if hover {
                if self.hovered.insert(target.id.clone()) {
                    events.push(ProximityEvent::HoverEnter(target.id.clone()));
                }
            } else {
                if self.hovered.remove(&target.id) {
                    events.push(ProximityEvent::HoverExit(target.id.clone()));
                }
                self.armed_out.remove(&target.id);
            }

            if trigger && self.armed_out.insert(target.id.clone()) {
                events.push(ProximityEvent::Trigger(target.id.clone()));
            }
        }

        events
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.contains(id)
    }

    pub fn hovered(&self) -> impl Iterator<Item = &str> {
        self.hovered.iter().map(String::as_str)
    }

    /// Forget all hover and trigger state (new level, new course)
    pub fn reset(&mut self) {
        self.hovered.clear();
        self.armed_out.clear();
    }
}

/// Result of one [`HoldTimer::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldStatus {
    Outside,
    /// Fraction of the required hold reached so far
    Holding(f32),
    /// Hold completed this update
    Complete,
}

/// Debounced sustained-proximity timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldTimer {
    /// Seconds the entity must stay inside
    pub required: f32,
    held: f32,
    fired: bool,
}

impl HoldTimer {
    pub fn new(required: f32) -> Self {
        Self {
            required,
            held: 0.0,
            fired: false,
        }
    }

    /// Accumulate while inside; leaving resets to zero
    ///
    /// Reports `Complete` once per hold. Stay inside after completion and it
    /// keeps reporting progress 1.0 without firing again.
    pub fn update(&mut self, inside: bool, dt: f32) -> HoldStatus {
        if !inside {
            self.held = 0.0;
            self.fired = false;
            return HoldStatus::Outside;
        }

        self.held += dt;
        if self.held >= self.required && !self.fired {
            self.fired = true;
            return HoldStatus::Complete;
        }
        HoldStatus::Holding(self.progress())
    }

    pub fn progress(&self) -> f32 {
        if self.required <= 0.0 {
            return 1.0;
        }
        (self.held / self.required).min(1.0)
    }

    pub fn held(&self) -> f32 {
        self.held
    }

    pub fn reset(&mut self) {
        self.held = 0.0;
        self.fired = false;
    }
}

/// Near the finish and not below its surface
pub fn in_finish_zone(entity: Vec3, finish: Vec3, radius: f32) -> bool {
    within(entity, finish, radius) && entity.y > finish.y - 1.0
}
