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
//! Airplanes: three degree of freedom flight model
//!
//! The local frame has +y forward, +z up and +x to starboard. Thrust acts
//! along local y, wing lift along local z proportional to the square of the
//! forward speed, gravity along world -z, and signed cubic drag on each
//! local velocity component with separate factors. Pitch and roll controls
//! rotate the frame at fixed rates.

use crate::bodies::gun_shell::GRAVITY;
use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::integration::{cubic_drag, velocity_verlet, KinematicState};
use crate::math::{Angle, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Flight parameters of an airplane type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirplaneSpec {
    /// Mass (kg)
    pub mass: f64,
    /// Engine thrust (N)
    pub thrust: f64,
    /// Lift per (m/s)² of forward speed (N)
    pub lift_factor: f64,
    /// Drag along local y (N per (m/s)³)
    pub drag_factor: f64,
    /// Drag along local x
    pub antislide_factor: f64,
    /// Drag along local z
    pub antilift_factor: f64,
    /// Pitch rate at full control (deg/s)
    pub pitch_rate: f64,
    /// Roll rate at full control (deg/s)
    pub roll_rate: f64,
}

impl Default for AirplaneSpec {
    /// Patrol biplane cruising at 60 m/s
    fn default() -> Self {
        let mass = 3_500.0;
        let cruise = 60.0;
        let thrust = 10_000.0;
        let drag = thrust / (cruise * cruise * cruise);
        AirplaneSpec {
            mass,
            thrust,
            lift_factor: mass * GRAVITY / (cruise * cruise),
            drag_factor: drag,
            antislide_factor: 10.0 * drag,
            antilift_factor: 20.0 * drag,
            pitch_rate: 10.0,
            roll_rate: 30.0,
        }
    }
}

/// An airplane
#[derive(Debug, Clone, PartialEq)]
pub struct Airplane {
    /// Shared physical state
    pub body: Body,
    spec: AirplaneSpec,
    roll_factor: f64,
    pitch_factor: f64,
}

impl Airplane {
    /// Create an airplane in level flight at `speed` along `heading`
    pub fn new(spec: AirplaneSpec, position: Vector3, heading: Angle, speed: f64) -> Self {
        let mut body = Body::new(position, heading, Extents::new(11.0, 14.0, 2.0, 1.5), 0.3);
        body.velocity = heading.direction().xy0(0.0) * speed;
        Airplane {
            body,
            spec,
            roll_factor: 0.0,
            pitch_factor: 0.0,
        }
    }

    /// Flight parameters
    pub fn spec(&self) -> &AirplaneSpec {
        &self.spec
    }

    /// Roll control in `[-1, 1]`
    pub fn roll_factor(&self) -> f64 {
        self.roll_factor
    }

    /// Pitch control in `[-1, 1]`
    pub fn pitch_factor(&self) -> f64 {
        self.pitch_factor
    }

    /// Roll to port
    pub fn roll_left(&mut self) {
        self.roll_factor = -1.0;
    }

    /// Roll to starboard
    pub fn roll_right(&mut self) {
        self.roll_factor = 1.0;
    }

    /// Stop rolling
    pub fn roll_zero(&mut self) {
        self.roll_factor = 0.0;
    }

    /// Nose down
    pub fn pitch_down(&mut self) {
        self.pitch_factor = -1.0;
    }

    /// Nose up
    pub fn pitch_up(&mut self) {
        self.pitch_factor = 1.0;
    }

    /// Stop pitching
    pub fn pitch_zero(&mut self) {
        self.pitch_factor = 0.0;
    }

    pub(crate) fn restore(&mut self, roll_factor: f64, pitch_factor: f64) {
        self.roll_factor = roll_factor.clamp(-1.0, 1.0);
        self.pitch_factor = pitch_factor.clamp(-1.0, 1.0);
    }

    /// Forward speed in the local frame (m/s)
    pub fn airspeed(&self) -> f64 {
        self.body.orientation.conj().rotate(self.body.velocity).y
    }

    fn acceleration(&self, velocity: Vector3) -> Vector3 {
        let s = &self.spec;
        let rotation = self.body.orientation;
        let local = rotation.conj().rotate(velocity);
        let loc_y = rotation.rotate(Vector3::new(0.0, 1.0, 0.0));
        let loc_z = rotation.rotate(Vector3::new(0.0, 0.0, 1.0));

        let thrust = loc_y * s.thrust;
        let lift = loc_z * (local.y * local.y * s.lift_factor);
        let gravity = Vector3::new(0.0, 0.0, -s.mass * GRAVITY);
        let friction = rotation.rotate(Vector3::new(
            cubic_drag(local.x, s.antislide_factor),
            cubic_drag(local.y, s.drag_factor),
            cubic_drag(local.z, s.antilift_factor),
        ));
        (thrust + lift + gravity + friction) * (1.0 / s.mass)
    }
}

impl Simulatable for Airplane {
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
        let state = KinematicState::new(self.body.position, self.body.velocity);
        let next = velocity_verlet(state, dt, |s| self.acceleration(s.velocity));
        self.body.position = next.position;
        self.body.velocity = next.velocity;

        let pitch = Quaternion::rot(self.pitch_factor * self.spec.pitch_rate * dt, 1.0, 0.0, 0.0);
        let roll = Quaternion::rot(self.roll_factor * self.spec.roll_rate * dt, 0.0, 1.0, 0.0);
        self.body.orientation = (self.body.orientation * (pitch * roll)).normalized();

        if self.body.position.z <= 0.0 {
            log::debug!("airplane crashed into the sea");
            self.body.position.z = 0.0;
            self.body.kill();
        }
    }

    fn is_contact(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> Airplane {
        Airplane::new(AirplaneSpec::default(), Vector3::new(0.0, 0.0, 500.0), Angle::new(0.0), 60.0)
    }

    fn fly(p: &mut Airplane, seconds: f64) {
        let ctx = TickContext::new(0.0, 0.05);
        for _ in 0..(seconds / 0.05).round() as usize {
            p.integrate(&ctx);
        }
    }

    #[test]
    fn test_level_flight_is_trimmed() {
        let mut p = plane();
        fly(&mut p, 10.0);
        assert!((p.body.position.z - 500.0).abs() < 1e-6);
        assert!((p.airspeed() - 60.0).abs() < 1e-6);
        assert!((p.body.position.y - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_up_climbs() {
        let mut p = plane();
        p.pitch_up();
        fly(&mut p, 2.0);
        p.pitch_zero();
        fly(&mut p, 5.0);
        assert!(p.body.position.z > 500.0);
        assert!((p.body.orientation.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_roll_turns() {
        let mut p = plane();
        p.roll_right();
        fly(&mut p, 1.0);
        p.roll_zero();
        fly(&mut p, 10.0);
        assert!(p.body.position.x > 0.0);
    }

    #[test]
    fn test_crash_kills_then_defunct() {
        let mut p = plane();
        p.pitch_down();
        let ctx = TickContext::new(0.0, 0.05);
        let mut steps = 0;
        while p.body.is_alive() {
            p.integrate(&ctx);
            steps += 1;
            assert!(steps < 20_000);
        }
        assert_eq!(p.body.position.z, 0.0);
        p.integrate(&ctx);
        assert!(p.body.is_defunct());
    }
}
