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
//! Depth charges

use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Impact, Simulatable, TickContext};
use crate::ecs::Entity;
use crate::math::{Angle, Vector3};

/// Radius beyond which an explosion does no damage (m)
pub const LETHAL_RADIUS: f64 = 40.0;

/// Damage of an explosion at zero distance
pub const EXPLOSION_STRENGTH: f64 = 2.0;

/// Sinking speed in water (m/s)
const SINK_SPEED: f64 = 3.0;

/// Decay rate of the throw velocity in water (1/s)
const WATER_DRAG: f64 = 0.5;

/// Explosion damage factor at `distance`, 1 at the center and 0 beyond
/// [`LETHAL_RADIUS`]
pub fn explosion_falloff(distance: f64) -> f64 {
    let f = ((LETHAL_RADIUS - distance) / LETHAL_RADIUS).max(0.0);
    f * f
}

/// A sinking depth charge
#[derive(Debug, Clone, PartialEq)]
pub struct DepthCharge {
    /// Shared physical state
    pub body: Body,
    explode_depth: f64,
    /// Vessel that dropped the charge
    pub parent: Option<Entity>,
    detonation: Option<Vector3>,
    struck: Option<Entity>,
}

impl DepthCharge {
    /// Drop a charge at `position` set to go off at `explode_depth`
    pub fn new(position: Vector3, velocity: Vector3, explode_depth: f64) -> Self {
        let mut body = Body::new(position, Angle::new(0.0), Extents::new(0.8, 0.8, 0.4, 0.4), 1.0);
        body.velocity = velocity;
        DepthCharge {
            body,
            explode_depth: explode_depth.max(0.0),
            parent: None,
            detonation: None,
            struck: None,
        }
    }

    /// Depth the pistol is set to (m)
    pub fn explode_depth(&self) -> f64 {
        self.explode_depth
    }

    /// Hull struck directly, if any
    pub fn struck(&self) -> Option<Entity> {
        self.struck
    }

    /// Collect a pending detonation point; returns each detonation once
    pub(crate) fn take_detonation(&mut self) -> Option<Vector3> {
        self.detonation.take()
    }

    fn detonate(&mut self) {
        if self.body.is_alive() {
            self.detonation = Some(self.body.position);
            self.body.kill();
        }
    }
}

impl Simulatable for DepthCharge {
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
        let dt = ctx.dt;
        let decay = (-WATER_DRAG * dt).exp();
        let horizontal = self.body.velocity.xy() * decay;
        self.body.position += (horizontal * dt).xy0(-SINK_SPEED * dt);
        self.body.velocity = horizontal.xy0(-SINK_SPEED);
        if self.body.depth() >= self.explode_depth {
            self.detonate();
        }
    }

    fn on_collision(&mut self, impact: &Impact) {
        self.struck = Some(impact.other);
        self.detonate();
        self.detonation = Some(impact.point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityKind;

    #[test]
    fn test_falloff() {
        assert_eq!(explosion_falloff(0.0), 1.0);
        assert_eq!(explosion_falloff(20.0), 0.25);
        assert_eq!(explosion_falloff(LETHAL_RADIUS), 0.0);
        assert_eq!(explosion_falloff(500.0), 0.0);
    }

    #[test]
    fn test_detonates_at_depth_once() {
        let mut dc = DepthCharge::new(Vector3::zero(), Vector3::new(5.0, 0.0, 0.0), 30.0);
        let ctx = TickContext::new(0.0, 0.5);
        let mut steps = 0;
        while dc.body.is_alive() {
            dc.integrate(&ctx);
            steps += 1;
        }
        assert_eq!(steps, 20);
        let point = dc.take_detonation().unwrap();
        assert!((point.z + 30.0).abs() < 1e-9);
        assert!(point.x > 0.0);
        assert_eq!(dc.take_detonation(), None);
        dc.integrate(&ctx);
        assert!(dc.body.is_defunct());
    }

    #[test]
    fn test_contact_detonation() {
        let mut dc = DepthCharge::new(Vector3::zero(), Vector3::zero(), 100.0);
        let sub = Entity::new(EntityKind::Submarine, 0, 0);
        dc.on_collision(&Impact {
            other: sub,
            point: Vector3::new(1.0, 2.0, -3.0),
            strength: 0.0,
        });
        assert!(dc.body.is_dead());
        assert_eq!(dc.struck(), Some(sub));
        assert_eq!(dc.take_detonation(), Some(Vector3::new(1.0, 2.0, -3.0)));
    }
}
