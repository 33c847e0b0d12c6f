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
//! Numerical integration helpers for the physics bodies
//!
//! # Integrators
//!
//! - **Velocity Verlet** ([`velocity_verlet`]): used for hulls, airplanes
//!   and particles, whose forces depend on velocity through drag.
//! - **Closed form**: gun shells are evaluated analytically and need no
//!   stepping (see [`crate::bodies::gun_shell`]).
//!
//! # Timestep Guidelines
//!
//! Cubic drag is stiff at high speed. The scheduler splits compressed
//! deltas into substeps of at most `SimConfig::max_substep` seconds.

mod verlet;

pub use verlet::{velocity_verlet, KinematicState};

/// Meters per second in one knot
pub const KNOTS_TO_MS: f64 = 0.514_444;

/// Signed cubic drag force opposing the velocity component `v`
///
/// `v³` keeps the sign of `v`, so the result always opposes motion.
pub fn cubic_drag(v: f64, factor: f64) -> f64 {
    -factor * v * v * v
}

/// Hourly consumption of an exponential fuel/battery model
///
/// `rate = a * (e^(throttle_speed / t) - 1)` where `throttle_speed` is the
/// commanded speed in knots. Returns 0 for non-positive `t`.
pub fn consumption_rate(a: f64, t: f64, throttle_speed: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    a * ((throttle_speed.abs() / t).exp() - 1.0)
}

/// Apply an hourly rate to a level for `dt` seconds, clamped to `[0, 1]`
pub fn apply_hourly_rate(level: f64, rate_per_hour: f64, dt: f64) -> f64 {
    let next = level - rate_per_hour * dt / 3600.0;
    if next.is_finite() {
        next.clamp(0.0, 1.0)
    } else {
        level
    }
}

/// Validate a timestep, returning a warning message for risky values
///
/// Extremely small timesteps lose precision, large ones destabilize the
/// cubic drag terms.
pub fn validate_timestep(dt: f64) -> Result<(), String> {
    if dt <= 0.0 || !dt.is_finite() {
        return Err(format!("Invalid timestep: {}. Must be positive and finite.", dt));
    }
    if dt < 1e-9 {
        return Err(format!("Warning: Timestep {} is extremely small and may cause precision loss.", dt));
    }
    if dt > 5.0 {
        return Err(format!("Warning: Timestep {} is large and may cause instability.", dt));
    }
    Ok(())
}
