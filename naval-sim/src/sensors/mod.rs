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
//! Perception queries: visual, passive and active sonar, radar
//!
//! Every query except [`sonar::ping_asdic`] takes `&World` and is pure, so
//! repeated queries between two ticks return identical results. Pings
//! append to the world's ping list and are pruned once older than
//! [`PING_REMAIN_TIME`].

pub mod radar;
pub mod sonar;
pub mod visual;

pub use radar::radar_contacts;
pub use sonar::{acoustic_target, listen, passive_contacts, ping_asdic, NoiseSpectrum, SonarContact, SonarReading};
pub use visual::{can_see, visible_objects, visual_range};

use crate::math::{Angle, Vector2};
use serde::{Deserialize, Serialize};

/// Seconds a ping stays in the ping list
pub const PING_REMAIN_TIME: f64 = 1.0;

/// Detectability factor of a submerged body in `(0, 1]`
///
/// 1 at the surface, halved at 100 m.
pub fn depth_factor(depth: f64) -> f64 {
    1.0 / (1.0 + depth.max(0.0) / 100.0)
}

/// An active sonar emission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    /// Emitter position
    pub position: Vector2,
    /// Center of the cone
    pub direction: Angle,
    /// Emission time
    pub time: f64,
    /// Cone range (m)
    pub range: f64,
    /// Cone half-angle
    pub angle: Angle,
}

impl Ping {
    /// Check if the ping outlived [`PING_REMAIN_TIME`] at `now`
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.time > PING_REMAIN_TIME
    }
}
