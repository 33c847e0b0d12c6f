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
//! Torpedoes: straight runners, pattern runners and acoustic homing

use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Impact, Simulatable, TickContext};
use crate::ecs::Entity;
use crate::integration::KNOTS_TO_MS;
use crate::math::{signum0, Angle, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Distance a torpedo must run before its pistol is armed (m)
pub const ARMING_DISTANCE: f64 = 250.0;

/// Turn rate of a running torpedo (deg/s)
const TURN_RATE: f64 = 3.0;

/// Depth change rate towards the set running depth (m/s)
const DEPTH_RATE: f64 = 1.0;

/// Seeker half-angle of acoustic torpedoes (deg)
pub const SEEKER_ANGLE: f64 = 30.0;

/// Seeker range of acoustic torpedoes (m)
pub const SEEKER_RANGE: f64 = 1_000.0;

/// Torpedo model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TorpedoType {
    /// Steam driven, fast, leaves a wake
    #[default]
    G7a,
    /// Electric, wakeless
    G7e,
    /// Electric with acoustic homing
    G7esT5,
}

impl TorpedoType {
    /// Running speed (m/s)
    pub fn speed(&self) -> f64 {
        match self {
            TorpedoType::G7a => 44.0 * KNOTS_TO_MS,
            TorpedoType::G7e => 30.0 * KNOTS_TO_MS,
            TorpedoType::G7esT5 => 24.0 * KNOTS_TO_MS,
        }
    }

    /// Maximum run length (m)
    pub fn range(&self) -> f64 {
        match self {
            TorpedoType::G7a => 5_000.0,
            TorpedoType::G7e => 5_000.0,
            TorpedoType::G7esT5 => 5_700.0,
        }
    }

    /// Damage dealt on a hit
    pub fn warhead(&self) -> f64 {
        match self {
            TorpedoType::G7esT5 => 0.95,
            _ => 1.0,
        }
    }

    /// Whether the torpedo steers towards its target acoustically
    pub fn is_homing(&self) -> bool {
        matches!(self, TorpedoType::G7esT5)
    }
}

/// Side of the first pattern turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Turn to port
    Left,
    /// Turn to starboard
    #[default]
    Right,
}

impl TurnDirection {
    fn sign(&self) -> f64 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }
}

/// Search figure after the primary run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchPattern {
    /// Alternating 180 degree turns every secondary leg
    #[default]
    Ladder,
    /// Continuous turn
    Circle,
}

/// Pattern run (FAT) settings
///
/// A primary range of zero makes a straight runner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TorpedoPattern {
    /// Straight run before the pattern starts (m)
    pub primary_range: f64,
    /// Length of each ladder leg (m)
    pub secondary_range: f64,
    /// Side of the first turn
    pub initial_turn: TurnDirection,
    /// Figure run after the primary range
    pub search: SearchPattern,
}

impl TorpedoPattern {
    /// Straight run
    pub fn straight() -> Self {
        Self::default()
    }

    /// Ladder pattern
    pub fn ladder(primary_range: f64, secondary_range: f64, initial_turn: TurnDirection) -> Self {
        TorpedoPattern {
            primary_range,
            secondary_range,
            initial_turn,
            search: SearchPattern::Ladder,
        }
    }

    fn is_straight(&self) -> bool {
        self.primary_range <= 0.0
    }
}

/// A running torpedo
#[derive(Debug, Clone, PartialEq)]
pub struct Torpedo {
    /// Shared physical state
    pub body: Body,
    torpedo_type: TorpedoType,
    pattern: TorpedoPattern,
    /// Target for acoustic homing, reassigned by the world when lost
    pub target: Option<Entity>,
    /// Launching vessel
    pub parent: Option<Entity>,
    base_heading: Angle,
    run_depth: f64,
    run_length: f64,
    previous_position: Vector3,
}

impl Torpedo {
    /// Launch a torpedo at `position` running along `heading`
    pub fn new(
        torpedo_type: TorpedoType,
        position: Vector3,
        heading: Angle,
        run_depth: f64,
        pattern: TorpedoPattern,
    ) -> Self {
        let mut body = Body::new(position, heading, Extents::new(7.2, 0.53, 0.27, 0.27), 1.0);
        body.velocity = heading.direction().xy0(0.0) * torpedo_type.speed();
        Torpedo {
            body,
            torpedo_type,
            pattern,
            target: None,
            parent: None,
            base_heading: heading,
            run_depth: run_depth.max(0.0),
            run_length: 0.0,
            previous_position: position,
        }
    }

    /// Torpedo model
    pub fn torpedo_type(&self) -> TorpedoType {
        self.torpedo_type
    }

    /// Pattern settings
    pub fn pattern(&self) -> &TorpedoPattern {
        &self.pattern
    }

    /// Distance run so far (m)
    pub fn run_length(&self) -> f64 {
        self.run_length
    }

    /// Set running depth (m)
    pub fn run_depth(&self) -> f64 {
        self.run_depth
    }

    /// Heading at launch
    pub fn base_heading(&self) -> Angle {
        self.base_heading
    }

    /// Whether the pistol is armed
    pub fn is_armed(&self) -> bool {
        self.run_length >= ARMING_DISTANCE
    }

    /// Path segment covered during the last tick
    pub fn swept_segment(&self) -> (Vector3, Vector3) {
        (self.previous_position, self.body.position)
    }

    pub(crate) fn restore(&mut self, base_heading: Angle, run_length: f64) {
        self.base_heading = base_heading;
        self.run_length = run_length.max(0.0);
        self.previous_position = self.body.position;
    }

    fn desired_heading(&self, ctx: &TickContext) -> Angle {
        let heading = self.body.heading();
        if self.torpedo_type.is_homing() {
            if let Some(target) = self.target.and_then(|t| ctx.position_of(t)) {
                let offset = target - self.body.position;
                let bearing = Angle::from_direction(offset.xy());
                if offset.xy().length() <= SEEKER_RANGE
                    && heading.diff_to(bearing).abs() <= SEEKER_ANGLE
                {
                    return bearing;
                }
            }
        }
        if self.pattern.is_straight() || self.run_length < self.pattern.primary_range {
            return self.base_heading;
        }
        match self.pattern.search {
            SearchPattern::Circle => heading + Angle::new(90.0 * self.pattern.initial_turn.sign()),
            SearchPattern::Ladder => {
                if self.pattern.secondary_range <= 0.0 {
                    return self.base_heading;
                }
                let legs = ((self.run_length - self.pattern.primary_range)
                    / self.pattern.secondary_range) as u64;
                if legs % 2 == 0 {
                    self.base_heading + Angle::new(180.0)
                } else {
                    self.base_heading
                }
            }
        }
    }

    /// Side to turn when the desired heading is straight behind
    fn turn_side(&self) -> f64 {
        let legs = if self.pattern.secondary_range > 0.0 {
            ((self.run_length - self.pattern.primary_range).max(0.0) / self.pattern.secondary_range) as u64
        } else {
            0
        };
        let side = self.pattern.initial_turn.sign();
        if legs % 2 == 0 {
            side
        } else {
            -side
        }
    }
}

impl Simulatable for Torpedo {
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
        self.previous_position = self.body.position;

        let heading = self.body.heading();
        let desired = self.desired_heading(ctx);
        let mut delta = heading.diff_to(desired);
        if delta.abs() > 179.9 {
            delta = delta.abs() * self.turn_side();
        }
        let max_turn = TURN_RATE * dt;
        let turn = signum0(delta) * delta.abs().min(max_turn);
        let new_heading = heading + Angle::new(turn);

        let speed = self.torpedo_type.speed();
        let target_z = -self.run_depth;
        let dz = (target_z - self.body.position.z).clamp(-DEPTH_RATE * dt, DEPTH_RATE * dt);
        let vz = if dt > 0.0 { dz / dt } else { 0.0 };
        self.body.velocity = (new_heading.direction() * speed).xy0(vz);
        self.body.position += new_heading.direction().xy0(0.0) * (speed * dt);
        self.body.position.z += dz;
        self.body.orientation = Quaternion::from_heading(new_heading);

        self.run_length += speed * dt;
        if self.run_length >= self.torpedo_type.range() {
            log::debug!("torpedo ran out after {:.0} m", self.run_length);
            self.body.kill();
        }
    }

    fn on_collision(&mut self, _impact: &Impact) {
        self.body.kill();
    }
}
