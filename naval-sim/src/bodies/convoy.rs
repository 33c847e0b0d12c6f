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
//! Convoys: a reference point moving along waypoints
//!
//! The convoy itself has no hull. Its member ships are separate entities
//! that receive the convoy course in the serial phase of each tick.

use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::ecs::Entity;
use crate::math::{Angle, Quaternion, Vector2};
use std::collections::VecDeque;

/// Distance at which a waypoint counts as reached (m)
pub const WAYPOINT_RADIUS: f64 = 50.0;

/// A convoy
#[derive(Debug, Clone, PartialEq)]
pub struct Convoy {
    /// Reference point and course
    pub body: Body,
    speed: f64,
    waypoints: VecDeque<Vector2>,
    merchants: Vec<Entity>,
    escorts: Vec<Entity>,
}

impl Convoy {
    /// Create a convoy at `position` sailing along `heading` at `speed` m/s
    pub fn new(position: Vector2, heading: Angle, speed: f64) -> Self {
        let mut body = Body::new(position.xy0(0.0), heading, Extents::cube(1.0), 1.0);
        body.velocity = heading.direction().xy0(0.0) * speed;
        Convoy {
            body,
            speed: speed.max(0.0),
            waypoints: VecDeque::new(),
            merchants: Vec::new(),
            escorts: Vec::new(),
        }
    }

    /// Convoy speed (m/s)
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Append a waypoint
    pub fn add_waypoint(&mut self, point: Vector2) {
        self.waypoints.push_back(point);
    }

    /// Remaining waypoints in order
    pub fn waypoints(&self) -> impl Iterator<Item = &Vector2> + '_ {
        self.waypoints.iter()
    }

    /// Add a merchant
    pub fn add_merchant(&mut self, ship: Entity) {
        self.merchants.push(ship);
    }

    /// Add an escort
    pub fn add_escort(&mut self, ship: Entity) {
        self.escorts.push(ship);
    }

    /// Merchant ships
    pub fn merchants(&self) -> &[Entity] {
        &self.merchants
    }

    /// Escort ships
    pub fn escorts(&self) -> &[Entity] {
        &self.escorts
    }

    /// All member ships, merchants first
    pub fn members(&self) -> impl Iterator<Item = Entity> + '_ {
        self.merchants.iter().chain(self.escorts.iter()).copied()
    }

    /// Drop members for which `keep` returns false
    pub fn retain_members<F>(&mut self, mut keep: F)
    where
        F: FnMut(Entity) -> bool,
    {
        self.merchants.retain(|&e| keep(e));
        self.escorts.retain(|&e| keep(e));
    }

    /// Check if the convoy has no members left
    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty() && self.escorts.is_empty()
    }

    pub(crate) fn restore_route(&mut self, speed: f64, waypoints: Vec<Vector2>) {
        self.speed = speed.max(0.0);
        self.waypoints = waypoints.into();
    }
}

impl Simulatable for Convoy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn integrate(&mut self, ctx: &TickContext) {
        if !self.body.is_alive() {
            self.body.mark_defunct();
            return;
        }
        let position = self.body.position.xy();
        while let Some(&next) = self.waypoints.front() {
            if next.distance(position) > WAYPOINT_RADIUS {
                break;
            }
            self.waypoints.pop_front();
        }
        let heading = match self.waypoints.front() {
            Some(&next) => Angle::from_direction(next - position),
            None => self.body.heading(),
        };
        let velocity = heading.direction() * self.speed;
        self.body.position = (position + velocity * ctx.dt).xy0(0.0);
        self.body.velocity = velocity.xy0(0.0);
        self.body.orientation = Quaternion::from_heading(heading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityKind;

    #[test]
    fn test_follows_waypoints() {
        let mut convoy = Convoy::new(Vector2::zero(), Angle::new(0.0), 5.0);
        convoy.add_waypoint(Vector2::new(0.0, 1_000.0));
        convoy.add_waypoint(Vector2::new(1_000.0, 1_000.0));
        let ctx = TickContext::new(0.0, 1.0);
        for _ in 0..200 {
            convoy.integrate(&ctx);
        }
        assert_eq!(convoy.waypoints().count(), 1);
        assert!((convoy.body.heading().value() - 90.0).abs() < 1.0);
        assert!(convoy.body.position.x > 0.0);
        assert_eq!(convoy.body.position.z, 0.0);
    }

    #[test]
    fn test_straight_without_waypoints() {
        let mut convoy = Convoy::new(Vector2::zero(), Angle::new(90.0), 4.0);
        convoy.integrate(&TickContext::new(0.0, 10.0));
        assert!((convoy.body.position.x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_members() {
        let mut convoy = Convoy::new(Vector2::zero(), Angle::new(0.0), 4.0);
        let a = Entity::new(EntityKind::Ship, 0, 0);
        let b = Entity::new(EntityKind::Ship, 1, 0);
        convoy.add_merchant(a);
        convoy.add_escort(b);
        assert_eq!(convoy.members().collect::<Vec<_>>(), vec![a, b]);
        convoy.retain_members(|e| e != a);
        assert!(convoy.merchants().is_empty());
        assert!(!convoy.is_empty());
        convoy.retain_members(|_| false);
        assert!(convoy.is_empty());
    }
}
