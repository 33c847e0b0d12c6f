// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Common body state shared by every entity kind
//!
//! Every simulated entity carries a [`Body`]: position, orientation,
//! velocity, health, life-cycle state and bounding extents. Kind-specific
//! state is layered on top by the types in [`crate::bodies`].

use crate::ecs::AliveState;
use crate::math::{Angle, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Hit points of an entity
///
/// `current` never drops below zero; reaching zero kills the entity.
///
/// # Examples
///
/// ```
/// use naval_sim::ecs::components::Health;
///
/// let mut h = Health::new(10.0);
/// h.apply_damage(25.0);
/// assert_eq!(h.current(), 0.0);
/// assert!(h.is_depleted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f64,
    max: f64,
}

impl Health {
    /// Full health with the given maximum
    ///
    /// # Panics
    ///
    /// Panics if `max` is negative, NaN, or infinite
    pub fn new(max: f64) -> Self {
        assert!(max >= 0.0 && max.is_finite(), "Health must be non-negative and finite");
        Health { current: max, max }
    }

    /// Create health from stored values, rejecting invalid ones
    pub fn try_from_parts(current: f64, max: f64) -> Option<Self> {
        if max.is_finite() && current.is_finite() && max >= 0.0 && (0.0..=max).contains(&current) {
            Some(Health { current, max })
        } else {
            None
        }
    }

    /// Remaining hit points
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Maximum hit points
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Fraction of health lost, `[0, 1]`
    pub fn damage_fraction(&self) -> f64 {
        if self.max > 0.0 {
            1.0 - self.current / self.max
        } else {
            1.0
        }
    }

    /// Subtract damage, clamping at zero
    ///
    /// Non-finite or negative damage is ignored.
    pub fn apply_damage(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.current = (self.current - amount).max(0.0);
        }
    }

    /// Check whether all hit points are gone
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Bounding extents of a body in its local frame (meters)
///
/// The box spans `length` along the local forward axis, `width` across and
/// from `-draught` below to `height` above the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    /// Size along the local forward axis
    pub length: f64,
    /// Size across the local forward axis
    pub width: f64,
    /// Extent above the origin
    pub height: f64,
    /// Extent below the origin
    pub draught: f64,
}

impl Extents {
    /// Create extents
    pub fn new(length: f64, width: f64, height: f64, draught: f64) -> Self {
        Extents {
            length,
            width,
            height,
            draught,
        }
    }

    /// Small cube used for projectiles
    pub fn cube(size: f64) -> Self {
        Extents::new(size, size, size * 0.5, size * 0.5)
    }

    /// Radius of the horizontal bounding circle
    pub fn horizontal_radius(&self) -> f64 {
        0.5 * (self.length * self.length + self.width * self.width).sqrt()
    }
}

/// State common to every simulated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World-space position
    pub position: Vector3,
    /// World-space orientation
    pub orientation: Quaternion,
    /// World-space velocity (m/s)
    pub velocity: Vector3,
    /// Hit points
    pub health: Health,
    /// Bounding extents
    pub extents: Extents,
    alive: AliveState,
}

impl Body {
    /// Create an alive body at `position` facing `heading`
    pub fn new(position: Vector3, heading: Angle, extents: Extents, hitpoints: f64) -> Self {
        Body {
            position,
            orientation: Quaternion::from_heading(heading),
            velocity: Vector3::zero(),
            health: Health::new(hitpoints),
            extents,
            alive: AliveState::Alive,
        }
    }

    /// Life-cycle state
    pub fn alive_state(&self) -> AliveState {
        self.alive
    }

    /// Check whether the entity is alive
    pub fn is_alive(&self) -> bool {
        self.alive == AliveState::Alive
    }

    /// Check whether the entity is dead but not yet defunct
    pub fn is_dead(&self) -> bool {
        self.alive == AliveState::Dead
    }

    /// Check whether the entity awaits eviction
    pub fn is_defunct(&self) -> bool {
        self.alive == AliveState::Defunct
    }

    /// Transition alive -> dead; no effect in later states
    pub fn kill(&mut self) {
        if self.alive == AliveState::Alive {
            self.alive = AliveState::Dead;
        }
    }

    /// Transition to defunct; monotonic, never revives
    pub fn mark_defunct(&mut self) {
        self.alive = AliveState::Defunct;
    }

    /// Restore a saved life-cycle state (persistence only)
    pub(crate) fn set_alive_state(&mut self, state: AliveState) {
        self.alive = state;
    }

    /// Apply damage and kill the body when health is depleted
    ///
    /// Returns true if this call killed the body.
    pub fn damage(&mut self, amount: f64) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health.apply_damage(amount);
        if self.health.is_depleted() {
            self.kill();
            true
        } else {
            false
        }
    }

    /// Heading of the local forward axis
    pub fn heading(&self) -> Angle {
        self.orientation.heading()
    }

    /// Depth below the sea surface (positive when submerged)
    pub fn depth(&self) -> f64 {
        -self.position.z
    }

    /// Horizontal speed (m/s)
    pub fn speed(&self) -> f64 {
        self.velocity.xy().length()
    }

    /// Check that position, orientation and velocity are finite
    pub fn is_valid(&self) -> bool {
        self.position.is_valid() && self.orientation.is_valid() && self.velocity.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body::new(Vector3::zero(), Angle::new(0.0), Extents::new(100.0, 10.0, 8.0, 5.0), 10.0)
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let mut h = Health::new(5.0);
        h.apply_damage(3.0);
        assert_eq!(h.current(), 2.0);
        h.apply_damage(f64::NAN);
        h.apply_damage(-4.0);
        assert_eq!(h.current(), 2.0);
        h.apply_damage(100.0);
        assert_eq!(h.current(), 0.0);
    }

    #[test]
    #[should_panic(expected = "Health must be non-negative and finite")]
    fn test_health_negative_panics() {
        Health::new(-1.0);
    }

    #[test]
    fn test_body_life_cycle_is_monotonic() {
        let mut b = body();
        assert!(b.is_alive());
        assert!(b.damage(20.0));
        assert!(b.is_dead());
        assert!(!b.damage(20.0));
        b.mark_defunct();
        b.kill();
        assert!(b.is_defunct());
    }

    #[test]
    fn test_health_try_from_parts() {
        assert!(Health::try_from_parts(5.0, 10.0).is_some());
        assert!(Health::try_from_parts(-1.0, 10.0).is_none());
        assert!(Health::try_from_parts(11.0, 10.0).is_none());
        assert!(Health::try_from_parts(f64::NAN, 10.0).is_none());
    }

    #[test]
    fn test_depth() {
        let mut b = body();
        b.position.z = -30.0;
        assert_eq!(b.depth(), 30.0);
    }
}
