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
//! Gun shells on a closed-form ballistic trajectory
//!
//! Air resistance slows the shell exponentially:
//!
//! ```text
//! speed(t) = v0 * e^(-k*t/v0)
//! d(t)     = cos(a) * v0²/k * (1 - e^(-k*t/v0))   horizontal distance
//! z(t)     = z0 + sin(a) * t * speed(t) - g*t²/2  height
//! ```
//!
//! with `k` = [`AIR_RESISTANCE`] and `g` = [`GRAVITY`]. Evaluating the
//! trajectory in closed form keeps the shell exact under any timestep.

use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Impact, Simulatable, TickContext};
use crate::ecs::Entity;
use crate::math::{Angle, Quaternion, Vector2, Vector3};

/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.806;

/// Air resistance coefficient `k` (m/s²)
pub const AIR_RESISTANCE: f64 = 2.0;

/// Default muzzle velocity (m/s)
pub const DEFAULT_MUZZLE_VELOCITY: f64 = 400.0;

/// Damage of a shell hit
pub const SHELL_DAMAGE: f64 = 0.1;

/// Drift per second of flight per m/s of wind
const WIND_DRIFT: f64 = 0.05;

/// Closed-form trajectory of a shell fired from height `z0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ballistics {
    /// Muzzle velocity (m/s)
    pub v0: f64,
    /// Elevation angle
    pub elevation: Angle,
    /// Launch height (m)
    pub z0: f64,
}

impl Ballistics {
    /// Create a trajectory
    pub fn new(v0: f64, elevation: Angle, z0: f64) -> Self {
        Ballistics { v0, elevation, z0 }
    }

    /// Speed along the trajectory after `t` seconds
    pub fn speed(&self, t: f64) -> f64 {
        self.v0 * (-AIR_RESISTANCE * t / self.v0).exp()
    }

    /// Horizontal distance flown after `t` seconds
    pub fn horizontal_distance(&self, t: f64) -> f64 {
        self.elevation.cos() * self.v0 * self.v0 / AIR_RESISTANCE
            * (1.0 - (-AIR_RESISTANCE * t / self.v0).exp())
    }

    /// Height after `t` seconds
    pub fn height(&self, t: f64) -> f64 {
        self.z0 + self.elevation.sin() * t * self.speed(t) - 0.5 * GRAVITY * t * t
    }

    /// Horizontal speed after `t` seconds
    pub fn horizontal_speed(&self, t: f64) -> f64 {
        self.elevation.cos() * self.speed(t)
    }

    /// Vertical speed after `t` seconds
    pub fn vertical_speed(&self, t: f64) -> f64 {
        self.elevation.sin() * self.speed(t) * (1.0 - AIR_RESISTANCE * t / self.v0) - GRAVITY * t
    }

    /// Flight time until the shell reaches the sea surface
    ///
    /// Returns 0 for a shell that starts at or below the surface without
    /// climbing.
    pub fn time_of_flight(&self) -> f64 {
        if self.height(1e-9) <= 0.0 {
            return 0.0;
        }
        let mut hi = 1.0;
        for _ in 0..64 {
            if self.height(hi) <= 0.0 {
                break;
            }
            hi *= 2.0;
        }
        let mut lo = 0.0;
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if self.height(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    }

    /// Horizontal distance at impact
    pub fn range(&self) -> f64 {
        self.horizontal_distance(self.time_of_flight())
    }
}

/// A shell in flight
#[derive(Debug, Clone, PartialEq)]
pub struct GunShell {
    /// Shared physical state
    pub body: Body,
    ballistics: Ballistics,
    origin: Vector2,
    direction: Angle,
    age: f64,
    drift: Vector2,
    /// Vessel that fired the shell
    pub parent: Option<Entity>,
    previous_position: Vector3,
    splash: Option<Vector3>,
    hit: bool,
}

impl GunShell {
    /// Fire a shell from `position` towards `direction`
    pub fn new(position: Vector3, direction: Angle, elevation: Angle, v0: f64) -> Self {
        let ballistics = Ballistics::new(v0, elevation, position.z);
        let mut body = Body::new(position, direction, Extents::cube(0.2), 1.0);
        body.velocity = (direction.direction() * ballistics.horizontal_speed(0.0)).xy0(ballistics.vertical_speed(0.0));
        GunShell {
            body,
            ballistics,
            origin: position.xy(),
            direction,
            age: 0.0,
            drift: Vector2::zero(),
            parent: None,
            previous_position: position,
            splash: None,
            hit: false,
        }
    }

    /// Trajectory parameters
    pub fn ballistics(&self) -> &Ballistics {
        &self.ballistics
    }

    /// Firing direction
    pub fn direction(&self) -> Angle {
        self.direction
    }

    /// Launch point on the sea surface plane
    pub fn origin(&self) -> Vector2 {
        self.origin
    }

    /// Seconds since firing
    pub fn age(&self) -> f64 {
        self.age
    }

    /// Check if the shell struck a hull
    pub fn has_hit(&self) -> bool {
        self.hit
    }

    /// Path segment covered during the last tick
    pub fn swept_segment(&self) -> (Vector3, Vector3) {
        (self.previous_position, self.body.position)
    }

    /// Whether the shell reached the water this tick and the impact is
    /// not collected yet
    pub(crate) fn is_landing(&self) -> bool {
        self.splash.is_some()
    }

    /// Collect a pending water impact; returns each impact once
    pub(crate) fn take_splash(&mut self) -> Option<Vector3> {
        self.splash.take()
    }

    pub(crate) fn restore(&mut self, origin: Vector2, age: f64, drift: Vector2) {
        self.origin = origin;
        self.age = age.max(0.0);
        self.drift = drift;
        self.place(self.age);
        self.previous_position = self.body.position;
    }

    /// Accumulated wind drift (m)
    pub fn drift(&self) -> Vector2 {
        self.drift
    }

    fn place(&mut self, t: f64) {
        let b = self.ballistics;
        let dir = self.direction.direction();
        let horizontal = self.origin + dir * b.horizontal_distance(t) + self.drift;
        self.body.position = horizontal.xy0(b.height(t));
        self.body.velocity = (dir * b.horizontal_speed(t)).xy0(b.vertical_speed(t));
        let pitch = Angle::from_rad(b.vertical_speed(t).atan2(b.horizontal_speed(t)));
        self.body.orientation =
            Quaternion::from_heading(self.direction) * Quaternion::rot(pitch.value_pm180(), 1.0, 0.0, 0.0);
    }
}

impl Simulatable for GunShell {
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
        self.previous_position = self.body.position;
        self.drift = self.drift + ctx.wind * (WIND_DRIFT * ctx.dt);

        let flight = self.ballistics.time_of_flight();
        let t = self.age + ctx.dt;
        if t >= flight {
            self.age = flight;
            self.place(flight);
            self.body.position.z = 0.0;
            self.splash = Some(self.body.position);
            self.body.kill();
        } else {
            self.age = t;
            self.place(t);
        }
    }

    fn on_collision(&mut self, _impact: &Impact) {
        self.hit = true;
        self.splash = None;
        self.body.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_decays() {
        let b = Ballistics::new(400.0, Angle::new(5.0), 0.0);
        assert_eq!(b.speed(0.0), 400.0);
        assert!(b.speed(10.0) < 400.0);
        assert!((b.speed(200.0) - 400.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_time_of_flight_root() {
        let b = Ballistics::new(400.0, Angle::new(5.0), 0.0);
        let t = b.time_of_flight();
        assert!(t > 0.0);
        assert!(b.height(t).abs() < 1e-6);
        assert!(b.height(t * 0.99) > 0.0);
    }

    #[test]
    fn test_flat_shot_from_surface() {
        let b = Ballistics::new(400.0, Angle::new(0.0), 0.0);
        assert_eq!(b.time_of_flight(), 0.0);
        let elevated = Ballistics::new(400.0, Angle::new(0.0), 10.0);
        assert!(elevated.time_of_flight() > 1.0);
    }

    #[test]
    fn test_shell_splashes_at_range() {
        let mut shell = GunShell::new(Vector3::zero(), Angle::new(90.0), Angle::new(5.0), 400.0);
        let range = shell.ballistics().range();
        let ctx = TickContext::new(0.0, 0.25);
        while shell.body.is_alive() {
            shell.integrate(&ctx);
        }
        let splash = shell.take_splash().unwrap();
        assert!((splash.x - range).abs() < 1e-6 * range);
        assert_eq!(splash.z, 0.0);
        assert!(!shell.has_hit());
        shell.integrate(&ctx);
        assert!(shell.body.is_defunct());
    }

    #[test]
    fn test_hit_cancels_splash() {
        let mut shell = GunShell::new(Vector3::zero(), Angle::new(0.0), Angle::new(5.0), 400.0);
        shell.integrate(&TickContext::new(0.0, 0.1));
        shell.on_collision(&Impact {
            other: Entity::new(crate::ecs::EntityKind::Ship, 0, 0),
            point: shell.body.position,
            strength: 0.0,
        });
        assert!(shell.has_hit());
        assert_eq!(shell.take_splash(), None);
    }
}
