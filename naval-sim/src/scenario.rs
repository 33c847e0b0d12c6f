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
//! Custom mission setup
//!
//! [`create_custom_mission`] builds a world with a convoy, its escorts and
//! the player's submarine placed around it. Placement is randomized from
//! the configured seed, so equal configurations give equal worlds.

use crate::bodies::{Convoy, Ship, ShipClass, ShipRole, Submarine, SubmarineType};
use crate::config::{ScenarioConfig, SimConfig};
use crate::ecs::Entity;
use crate::environment::Environment;
use crate::error::ConfigError;
use crate::math::{Angle, Vector2, Vector3};
use crate::world::World;

/// Merchant columns of a convoy
const COLUMNS: usize = 4;
/// Lateral spacing between convoy columns (m)
const COLUMN_SPACING: f64 = 400.0;
/// Spacing between ships of a column (m)
const ROW_SPACING: f64 = 600.0;
/// Distance of the escort screen from the convoy center (m)
const ESCORT_RADIUS: f64 = 1_500.0;
/// Distance between convoy waypoints (m)
const LEG_LENGTH: f64 = 20_000.0;
/// Waypoints planned ahead of the convoy
const LEGS: usize = 5;

/// Maximum value for 53-bit mantissa (2^53) used in float conversion
const F64_MANTISSA_MAX: f64 = 9007199254740992.0;

/// Linear congruential generator (Knuth MMIX constants)
///
/// Small and deterministic across platforms; placement quality is all
/// that is asked of it.
#[derive(Debug, Clone)]
pub struct ScenarioRng {
    state: u64,
}

impl ScenarioRng {
    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        ScenarioRng { state: seed }
    }

    /// Next raw value
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform value in `[0, 1)` from the upper 53 bits
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / F64_MANTISSA_MAX
    }

    /// Uniform value in `[min, max)`
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Uniform index in `0..n`; `n` must be positive
    pub fn index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

/// Pick a class of `role` at random
fn pick_class(rng: &mut ScenarioRng, role: ShipRole) -> Result<&'static ShipClass, ConfigError> {
    let classes: Vec<&'static ShipClass> = ShipClass::with_role(role).collect();
    if classes.is_empty() {
        return Err(ConfigError::UnknownShipType(format!("{:?}", role)));
    }
    Ok(classes[rng.index(classes.len())])
}

/// Position relative to the convoy center, `right` to starboard of the
/// course and `ahead` along it
fn relative(center: Vector2, course: Angle, right: f64, ahead: f64) -> Vector2 {
    let fwd = course.direction();
    let starboard = Vector2::new(fwd.y, -fwd.x);
    center + starboard * right + fwd * ahead
}

/// Build a custom mission
///
/// The convoy sails from the origin on a random course; the player's
/// submarine starts surfaced 8 to 12 km away, heading for it.
pub fn create_custom_mission(scenario: &ScenarioConfig, config: SimConfig) -> Result<World, ConfigError> {
    let hour = scenario.start_hour()?;
    let sub_type = SubmarineType::from_name(&scenario.submarine_type)?;
    let mut world = World::new(config)?;
    let mut rng = ScenarioRng::new(scenario.seed);

    world.set_time(scenario.date.with_time(hour, 0, 0).to_time());
    let wind = Angle::new(rng.range(0.0, 360.0));
    world.set_environment(Environment::new(scenario.weather, wind));
    world.set_player_info(scenario.player.clone());

    let course = Angle::new(rng.range(0.0, 360.0));
    let speed = rng.range(3.0, 5.0);
    let center = Vector2::zero();

    let mut merchants: Vec<Entity> = Vec::new();
    for i in 0..scenario.convoy_size.merchants() {
        let class = pick_class(&mut rng, ShipRole::Merchant)?;
        let column = (i % COLUMNS) as f64 - (COLUMNS as f64 - 1.0) * 0.5;
        let row = (i / COLUMNS) as f64;
        let jitter = Vector2::new(rng.range(-50.0, 50.0), rng.range(-50.0, 50.0));
        let pos = relative(center, course, column * COLUMN_SPACING, -row * ROW_SPACING) + jitter;
        merchants.push(world.spawn_ship(Ship::new(class, pos.xy0(0.0), course)));
    }

    let mut escorts: Vec<Entity> = Vec::new();
    let escort_count = scenario.escort_size.escorts();
    for i in 0..escort_count {
        let class = pick_class(&mut rng, ShipRole::Escort)?;
        let bearing = course + Angle::new(360.0 * i as f64 / escort_count as f64);
        let pos = center + bearing.direction() * ESCORT_RADIUS;
        escorts.push(world.spawn_ship(Ship::new(class, pos.xy0(0.0), course)));
    }

    if !merchants.is_empty() || !escorts.is_empty() {
        let mut convoy = Convoy::new(center, course, speed);
        for leg in 1..=LEGS {
            convoy.add_waypoint(center + course.direction() * (LEG_LENGTH * leg as f64));
        }
        merchants.iter().for_each(|&m| convoy.add_merchant(m));
        escorts.iter().for_each(|&e| convoy.add_escort(e));
        world.spawn_convoy(convoy);
    }

    let bearing = Angle::new(rng.range(0.0, 360.0));
    let distance = rng.range(8_000.0, 12_000.0);
    let sub_pos = center + bearing.direction() * distance;
    let heading = Angle::from_direction(center - sub_pos);
    let player = world.spawn_submarine(Submarine::new(sub_type, Vector3::new(sub_pos.x, sub_pos.y, 0.0), heading));
    world.restore_player(Some(player));

    world.add_logbook_entry(format!(
        "Patrol start: convoy of {} ships, {} escorts, bearing {:.0}",
        merchants.len(),
        escorts.len(),
        heading.value()
    ));
    log::info!(
        "custom mission: {} merchants, {} escorts, seed {}",
        merchants.len(),
        escorts.len(),
        scenario.seed
    );
    Ok(world)
}
