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
//! Surface/submerged hull dynamics shared by ships and submarines
//!
//! Forces are resolved in the hull frame: thrust along the heading, signed
//! cubic drag on the forward, lateral and vertical velocity components,
//! a small wind push on surfaced hulls, plus an externally supplied
//! vertical acceleration (buoyancy and dive planes for submarines).
//! The rudder turns the hull at a rate proportional to forward speed and
//! the velocity vector turns with it.

use crate::ecs::components::Body;
use crate::ecs::system::TickContext;
use crate::integration::{
    apply_hourly_rate, consumption_rate, cubic_drag, velocity_verlet, KinematicState, KNOTS_TO_MS,
};
use crate::math::{signum0, Angle, Quaternion, Vector2, Vector3};
use std::collections::VecDeque;

/// Lateral and vertical drag relative to forward drag
const CROSS_DRAG: f64 = 5.0;

/// Wind acceleration per m/s of wind on a surfaced hull (1/s)
const WINDAGE: f64 = 1e-4;

/// Vertical speed of a sinking hull (m/s)
const SINK_SPEED: f64 = 0.3;

/// Rudder deflection per degree of heading error for the course autopilot
const AUTOPILOT_GAIN: f64 = 0.1;

/// Static propulsion and drag parameters of a hull class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullSpec {
    /// Displacement (kg)
    pub mass: f64,
    /// Maximum speed (m/s)
    pub max_speed: f64,
    /// Acceleration from rest at full throttle (m/s²)
    pub max_accel: f64,
    /// Turn rate at full rudder and full speed (deg/s)
    pub turn_rate: f64,
    /// Radiated noise at full speed (dB)
    pub noise: f64,
    /// Fuel model coefficient `a` (fraction per hour)
    pub fuel_a: f64,
    /// Fuel model coefficient `t` (knots)
    pub fuel_t: f64,
}

impl HullSpec {
    /// Cubic drag factor that makes `max_speed` the terminal speed of
    /// full thrust
    pub fn drag_factor(&self) -> f64 {
        self.mass * self.max_accel / self.max_speed.powi(3)
    }
}

/// Conditions for one propulsion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Propulsion {
    /// Speed reached at full throttle under the current engine (m/s)
    pub max_speed: f64,
    /// Whether the engine delivers thrust
    pub powered: bool,
    /// Whether the diesel engine burns fuel
    pub burns_fuel: bool,
    /// Whether the hull is on the surface (wind acts)
    pub surfaced: bool,
    /// Net vertical acceleration besides drag (m/s²)
    pub vertical_accel: f64,
}

/// Dynamic state of a hull
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    /// Shared physical state
    pub body: Body,
    spec: HullSpec,
    throttle: f64,
    rudder: f64,
    target_heading: Option<Angle>,
    fuel_level: f64,
    trail: VecDeque<Vector2>,
    sink_recorded: bool,
}

impl Hull {
    /// Create a stopped hull with full tanks
    pub fn new(body: Body, spec: HullSpec) -> Self {
        Hull {
            body,
            spec,
            throttle: 0.0,
            rudder: 0.0,
            target_heading: None,
            fuel_level: 1.0,
            trail: VecDeque::new(),
            sink_recorded: false,
        }
    }

    /// Class parameters
    pub fn spec(&self) -> &HullSpec {
        &self.spec
    }

    /// Throttle in `[-0.5, 1]`, fraction of maximum speed
    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    /// Set the throttle; values are clamped to `[-0.5, 1]`
    pub fn set_throttle(&mut self, throttle: f64) {
        if throttle.is_finite() {
            self.throttle = throttle.clamp(-0.5, 1.0);
        }
    }

    /// Rudder in `[-1, 1]`, positive turns to starboard
    pub fn rudder(&self) -> f64 {
        self.rudder
    }

    /// Set the rudder directly, cancelling any course autopilot
    pub fn set_rudder(&mut self, rudder: f64) {
        if rudder.is_finite() {
            self.rudder = rudder.clamp(-1.0, 1.0);
            self.target_heading = None;
        }
    }

    /// Steer towards `heading` with the course autopilot
    pub fn head_to(&mut self, heading: Angle) {
        self.target_heading = Some(heading);
    }

    /// Course held by the autopilot
    pub fn target_heading(&self) -> Option<Angle> {
        self.target_heading
    }

    /// Fuel level in `[0, 1]`
    pub fn fuel_level(&self) -> f64 {
        self.fuel_level
    }

    /// Recorded positions, oldest first
    pub fn trail(&self) -> impl Iterator<Item = &Vector2> + '_ {
        self.trail.iter()
    }

    /// Commanded speed (m/s)
    pub fn throttle_speed(&self, max_speed: f64) -> f64 {
        self.throttle * max_speed
    }

    /// Radiated noise at the current speed (dB)
    pub fn noise_level(&self) -> f64 {
        let fraction = (self.body.speed() / self.spec.max_speed).max(0.05);
        self.spec.noise + 20.0 * fraction.log10()
    }

    /// Whether the sinking was already recorded
    pub(crate) fn sink_recorded(&self) -> bool {
        self.sink_recorded
    }

    pub(crate) fn set_sink_recorded(&mut self) {
        self.sink_recorded = true;
    }

    /// Restore persisted control state
    pub(crate) fn restore(
        &mut self,
        throttle: f64,
        rudder: f64,
        target_heading: Option<Angle>,
        fuel_level: f64,
        sink_recorded: bool,
    ) {
        self.throttle = throttle.clamp(-0.5, 1.0);
        self.rudder = rudder.clamp(-1.0, 1.0);
        self.target_heading = target_heading;
        self.fuel_level = fuel_level.clamp(0.0, 1.0);
        self.sink_recorded = sink_recorded;
    }

    /// Advance the hull under its own power
    pub(crate) fn advance(&mut self, ctx: &TickContext, prop: Propulsion) {
        let dt = ctx.dt;
        let spec = self.spec;
        let heading = self.body.heading();

        if let Some(target) = self.target_heading {
            self.rudder = (heading.diff_to(target) * AUTOPILOT_GAIN).clamp(-1.0, 1.0);
        }

        let forward_speed = self.body.velocity.xy().dot(heading.direction());
        let speed_fraction = (forward_speed.abs() / spec.max_speed).min(1.0);
        let turn = self.rudder * spec.turn_rate * speed_fraction * signum0(forward_speed) * dt;
        let turn_rot = Quaternion::from_heading(Angle::new(turn));
        let new_heading = heading + Angle::new(turn);
        let velocity = turn_rot.rotate(self.body.velocity);

        let forward = new_heading.direction();
        let right = Vector2::new(forward.y, -forward.x);
        let k = spec.drag_factor();
        let powered = prop.powered && self.fuel_level > 0.0;
        let thrust = if powered {
            k * (self.throttle * prop.max_speed).powi(3)
        } else {
            0.0
        };
        let wind = if prop.surfaced {
            ctx.wind * WINDAGE
        } else {
            Vector2::zero()
        };
        let mass = spec.mass;

        let state = KinematicState::new(self.body.position, velocity);
        let next = velocity_verlet(state, dt, |s| {
            let horizontal = s.velocity.xy();
            let u = horizontal.dot(forward);
            let w = horizontal.dot(right);
            let a_forward = (thrust + cubic_drag(u, k)) / mass;
            let a_lateral = cubic_drag(w, k * CROSS_DRAG) / mass;
            let a_vertical = prop.vertical_accel + cubic_drag(s.velocity.z, k * CROSS_DRAG) / mass;
            (forward * a_forward + right * a_lateral + wind).xy0(a_vertical)
        });

        self.body.position = next.position;
        self.body.velocity = next.velocity;
        self.body.orientation = Quaternion::from_heading(new_heading);

        if powered && prop.burns_fuel {
            let knots = self.throttle_speed(prop.max_speed) / KNOTS_TO_MS;
            let rate = consumption_rate(spec.fuel_a, spec.fuel_t, knots);
            self.fuel_level = apply_hourly_rate(self.fuel_level, rate, dt);
        }

        self.record_trail(ctx);
    }

    /// Let a dead hull go down; marks it defunct once fully submerged
    pub(crate) fn sink(&mut self, ctx: &TickContext) {
        let dt = ctx.dt;
        let k = self.spec.drag_factor();
        let mass = self.spec.mass;
        let state = KinematicState::new(self.body.position, self.body.velocity.xy().xy0(0.0));
        let next = velocity_verlet(state, dt, |s| {
            Vector3::new(
                cubic_drag(s.velocity.x, k * CROSS_DRAG) / mass,
                cubic_drag(s.velocity.y, k * CROSS_DRAG) / mass,
                0.0,
            )
        });
        self.body.position = next.position;
        self.body.position.z -= SINK_SPEED * dt;
        self.body.velocity = next.velocity.xy().xy0(-SINK_SPEED);

        let e = self.body.extents;
        if self.body.depth() > e.height + e.draught + 10.0 {
            self.body.mark_defunct();
        }
    }

    fn record_trail(&mut self, ctx: &TickContext) {
        if !ctx.record_trail || ctx.trail_length == 0 {
            return;
        }
        self.trail.push_back(self.body.position.xy());
        while self.trail.len() > ctx.trail_length {
            self.trail.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Extents;

    fn spec() -> HullSpec {
        HullSpec {
            mass: 5.0e6,
            max_speed: 8.0,
            max_accel: 0.1,
            turn_rate: 2.0,
            noise: 120.0,
            fuel_a: 0.01,
            fuel_t: 8.0,
        }
    }

    fn hull() -> Hull {
        let body = Body::new(Vector3::zero(), Angle::new(0.0), Extents::new(100.0, 12.0, 10.0, 6.0), 1.0);
        Hull::new(body, spec())
    }

    fn surface() -> Propulsion {
        Propulsion {
            max_speed: 8.0,
            powered: true,
            burns_fuel: true,
            surfaced: true,
            vertical_accel: 0.0,
        }
    }

    fn run(h: &mut Hull, seconds: f64, dt: f64) {
        let ctx = TickContext::new(0.0, dt);
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            h.advance(&ctx, surface());
        }
    }

    #[test]
    fn test_reaches_commanded_speed() {
        let mut h = hull();
        h.set_throttle(0.5);
        run(&mut h, 1200.0, 0.1);
        assert!((h.body.speed() - 4.0).abs() < 0.05, "speed {}", h.body.speed());
        assert!(h.body.position.y > 0.0);
        assert!(h.body.position.x.abs() < 1e-6);
        assert!(h.fuel_level() < 1.0);
    }

    #[test]
    fn test_rudder_turns_to_starboard() {
        let mut h = hull();
        h.set_throttle(1.0);
        run(&mut h, 300.0, 0.1);
        h.set_rudder(1.0);
        run(&mut h, 10.0, 0.1);
        let heading = h.body.heading().value_pm180();
        assert!(heading > 5.0, "heading {}", heading);
        assert!(h.body.velocity.x > 0.0);
    }

    #[test]
    fn test_autopilot_settles_on_course() {
        let mut h = hull();
        h.set_throttle(1.0);
        h.head_to(Angle::new(90.0));
        run(&mut h, 600.0, 0.1);
        assert!(h.body.heading().diff_to(Angle::new(90.0)).abs() < 1.0);
        h.set_rudder(0.0);
        assert_eq!(h.target_heading(), None);
    }

    #[test]
    fn test_no_thrust_without_fuel() {
        let mut h = hull();
        h.restore(1.0, 0.0, None, 0.0, false);
        run(&mut h, 60.0, 0.1);
        assert_eq!(h.body.speed(), 0.0);
    }

    #[test]
    fn test_sinking_becomes_defunct() {
        let mut h = hull();
        h.body.kill();
        let ctx = TickContext::new(0.0, 1.0);
        let mut steps = 0;
        while !h.body.is_defunct() {
            h.sink(&ctx);
            steps += 1;
            assert!(steps < 1000);
        }
        assert!(steps > 1);
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut h = hull();
        h.set_throttle(1.0);
        let mut ctx = TickContext::new(0.0, 1.0);
        ctx.record_trail = true;
        ctx.trail_length = 3;
        for _ in 0..10 {
            h.advance(&ctx, surface());
        }
        assert_eq!(h.trail().count(), 3);
        let last = h.trail().last().copied().unwrap_or_default();
        assert_eq!(last, h.body.position.xy());
    }
}
