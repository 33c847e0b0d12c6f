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
//! Velocity Verlet step for bodies with velocity-dependent forces
//!
//! The velocity Verlet method updates position and velocity as follows:
//!
//! ```text
//! x(t + dt) = x(t) + v(t)*dt + 0.5*a(t)*dt²
//! v(t + dt) = v(t) + 0.5*(a(t) + a(t + dt))*dt
//! ```
//!
//! Hydrodynamic and aerodynamic drag depend on velocity, so `a(t + dt)` is
//! evaluated at the new position with the explicitly predicted velocity
//! `v(t) + a(t)*dt`.
//!
//! # References
//!
//! - Swope, W. C., Andersen, H. C., Berens, P. H., & Wilson, K. R. (1982).
//!   The Journal of Chemical Physics, 76(1), 637-649.

use crate::math::Vector3;

/// Position and velocity of a point mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    /// World-space position
    pub position: Vector3,
    /// World-space velocity
    pub velocity: Vector3,
}

impl KinematicState {
    /// Create a new state
    pub fn new(position: Vector3, velocity: Vector3) -> Self {
        KinematicState { position, velocity }
    }

    /// Check if position and velocity are finite
    pub fn is_valid(&self) -> bool {
        self.position.is_valid() && self.velocity.is_valid()
    }
}

/// Advance `state` by `dt` under the acceleration field `accel`
///
/// Returns the input state unchanged if any intermediate acceleration is
/// non-finite, so callers never commit NaN or infinite values.
pub fn velocity_verlet<F>(state: KinematicState, dt: f64, accel: F) -> KinematicState
where
    F: Fn(&KinematicState) -> Vector3,
{
    let a0 = accel(&state);
    if !a0.is_valid() {
        log::warn!("non-finite acceleration in Verlet step, state kept");
        return state;
    }

    let position = state.position + state.velocity * dt + a0 * (0.5 * dt * dt);
    let predicted = KinematicState::new(position, state.velocity + a0 * dt);

    let a1 = accel(&predicted);
    if !a1.is_valid() {
        log::warn!("non-finite acceleration in Verlet step, state kept");
        return state;
    }

    let next = KinematicState::new(position, state.velocity + (a0 + a1) * (0.5 * dt));
    if next.is_valid() {
        next
    } else {
        state
    }
}
