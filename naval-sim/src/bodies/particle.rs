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
//! Cosmetic particles: smoke, explosion debris and spray
//!
//! Particles never collide and keep animating after the run ended.

use crate::bodies::gun_shell::GRAVITY;
use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::integration::{cubic_drag, velocity_verlet, KinematicState};
use crate::math::{Angle, Vector3};
use serde::{Deserialize, Serialize};

/// Particle flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    /// Rising, wind-driven smoke puff
    Smoke,
    /// Short-lived explosion debris
    Explosion,
    /// Spray droplets falling back into the sea
    Spray,
}

impl ParticleKind {
    /// Total life in seconds
    pub fn lifetime(&self) -> f64 {
        match self {
            ParticleKind::Smoke => 20.0,
            ParticleKind::Explosion => 2.0,
            ParticleKind::Spray => 3.0,
        }
    }

    /// Drag factor per unit mass (cubic)
    fn drag(&self) -> f64 {
        match self {
            ParticleKind::Smoke => 0.5,
            ParticleKind::Explosion => 0.01,
            ParticleKind::Spray => 0.02,
        }
    }

    /// Net vertical acceleration before drag (m/s²)
    fn lift(&self) -> f64 {
        match self {
            ParticleKind::Smoke => 0.5,
            ParticleKind::Explosion | ParticleKind::Spray => -GRAVITY,
        }
    }
}

/// A cosmetic particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position and motion
    pub body: Body,
    kind: ParticleKind,
    life: f64,
}

impl Particle {
    /// Create a particle with full remaining life
    pub fn new(kind: ParticleKind, position: Vector3, velocity: Vector3) -> Self {
        let mut body = Body::new(position, Angle::new(0.0), Extents::cube(1.0), 1.0);
        body.velocity = velocity;
        Particle {
            body,
            kind,
            life: 1.0,
        }
    }

    /// Particle flavor
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    /// Remaining life in `[0, 1]`
    pub fn life(&self) -> f64 {
        self.life
    }

    pub(crate) fn set_life(&mut self, life: f64) {
        self.life = life.clamp(0.0, 1.0);
    }

    fn acceleration(&self, velocity: Vector3, wind: Vector3) -> Vector3 {
        let drag = self.kind.drag();
        let relative = velocity - wind;
        Vector3::new(
            cubic_drag(relative.x, drag),
            cubic_drag(relative.y, drag),
            cubic_drag(relative.z, drag) + self.kind.lift(),
        )
    }
}

impl Simulatable for Particle {
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
        // smoke drifts with the wind, heavy particles barely notice it
        let wind = match self.kind {
            ParticleKind::Smoke => ctx.wind.xy0(0.0),
            _ => Vector3::zero(),
        };
        let state = KinematicState::new(self.body.position, self.body.velocity);
        let next = velocity_verlet(state, ctx.dt, |s| self.acceleration(s.velocity, wind));
        self.body.position = next.position;
        self.body.velocity = next.velocity;

        self.life -= ctx.dt / self.kind.lifetime();
        let sunk = self.kind != ParticleKind::Smoke && self.body.position.z < 0.0;
        if self.life <= 0.0 || sunk {
            self.life = self.life.max(0.0);
            self.body.kill();
        }
    }
}
