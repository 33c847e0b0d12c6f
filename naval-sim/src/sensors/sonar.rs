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
//! Passive and active sonar
//!
//! Passive listening sums the radiated noise of every hull in the power
//! domain. Each contribution is attenuated by spherical spreading, by the
//! emitter's depth and by the listener's directional gain, and split into
//! frequency bands with band-dependent absorption.

use crate::bodies::submarine::SUBMERGED_DEPTH;
use crate::bodies::torpedo::{SEEKER_ANGLE, SEEKER_RANGE};
use crate::bodies::ShipRole;
use crate::ecs::{Entity, EntityKind};
use crate::error::SimError;
use crate::math::{Angle, Vector3};
use crate::sensors::{depth_factor, Ping};
use crate::world::World;

/// Number of frequency bands in a [`NoiseSpectrum`]
pub const BANDS: usize = 4;

/// Absorption per band (dB/km), lowest band first
const BAND_ABSORPTION: [f64; BANDS] = [0.01, 0.05, 0.2, 1.0];

/// Signal excess over the sea noise needed for a passive contact (dB)
pub const DETECTION_THRESHOLD: f64 = 30.0;

/// Signal excess over the sea noise a torpedo seeker locks on to (dB)
pub const SEEKER_THRESHOLD: f64 = 10.0;

/// Received noise per frequency band (dB), lowest band first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSpectrum {
    /// Level of each band
    pub bands: [f64; BANDS],
}

/// Result of listening in one direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SonarReading {
    /// Aggregate received level (dB)
    pub strength: f64,
    /// Band breakdown
    pub spectrum: NoiseSpectrum,
}

/// A hull heard by passive sonar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SonarContact {
    /// The emitter
    pub entity: Entity,
    /// Bearing from the listener
    pub bearing: Angle,
    /// Received level (dB)
    pub strength: f64,
}

struct Emitter {
    entity: Entity,
    position: Vector3,
    level: f64,
    band_offsets: [f64; BANDS],
}

fn to_power(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

fn to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

fn emitters(world: &World, skip: Option<Entity>) -> Vec<Emitter> {
    let registry = world.registry();
    let mut out = Vec::new();
    for (entity, ship) in registry.ships().iter() {
        if Some(entity) == skip || !ship.hull.body.is_alive() {
            continue;
        }
        let band_offsets = match ship.class().role {
            ShipRole::Merchant => [0.0, -4.0, -10.0, -18.0],
            ShipRole::Escort | ShipRole::Warship => [-4.0, -2.0, -6.0, -12.0],
        };
        out.push(Emitter {
            entity,
            position: ship.hull.body.position,
            level: ship.hull.noise_level(),
            band_offsets,
        });
    }
    for (entity, sub) in registry.submarines().iter() {
        if Some(entity) == skip || !sub.hull.body.is_alive() {
            continue;
        }
        let band_offsets = if sub.is_electric() {
            [-8.0, -6.0, -9.0, -12.0]
        } else {
            [-2.0, -3.0, -8.0, -14.0]
        };
        out.push(Emitter {
            entity,
            position: sub.hull.body.position,
            level: sub.noise_level(),
            band_offsets,
        });
    }
    out
}

/// Level arriving at `at` from an emitter, before directional gain
fn received_level(emitter: &Emitter, at: Vector3) -> f64 {
    let distance = emitter.position.distance(at).max(1.0);
    let spreading = 20.0 * distance.log10();
    let depth_loss = -20.0 * depth_factor(-emitter.position.z).log10();
    emitter.level - spreading - depth_loss
}

/// Gain of a hydrophone pointed along `listening` for sound from `bearing`
fn directional_gain(listening: Angle, bearing: Angle) -> f64 {
    let cardioid = 0.5 * (1.0 + listening.diff_to(bearing).to_radians().cos());
    10.0 * cardioid.max(0.01).log10()
}

fn listener_position(world: &World, listener: Entity) -> Option<Vector3> {
    let body = world.registry().body(listener)?;
    if !body.is_alive() {
        return None;
    }
    if let Some(sub) = world.registry().submarine(listener) {
        if !sub.can_listen() {
            return None;
        }
    }
    Some(body.position)
}

/// Listen along `direction`
///
/// Returns `None` if the listener is gone, dead, or its hydrophones are
/// wrecked. The sea noise of the current weather is the floor of every
/// band.
pub fn listen(world: &World, listener: Entity, direction: Angle) -> Option<SonarReading> {
    let at = listener_position(world, listener)?;
    let floor = to_power(world.environment().weather.sea_noise());
    let mut total = floor;
    let mut bands = [floor; BANDS];

    for emitter in emitters(world, Some(listener)) {
        let bearing = Angle::from_direction((emitter.position - at).xy());
        let level = received_level(&emitter, at) + directional_gain(direction, bearing);
        total += to_power(level);
        let km = emitter.position.distance(at) / 1000.0;
        for (i, band) in bands.iter_mut().enumerate() {
            *band += to_power(level + emitter.band_offsets[i] - BAND_ABSORPTION[i] * km);
        }
    }

    Some(SonarReading {
        strength: to_db(total),
        spectrum: NoiseSpectrum {
            bands: bands.map(to_db),
        },
    })
}

/// Hulls loud enough to stand out from the sea noise, in registry order
pub fn passive_contacts(world: &World, listener: Entity) -> Vec<SonarContact> {
    let Some(at) = listener_position(world, listener) else {
        return Vec::new();
    };
    let floor = world.environment().weather.sea_noise();
    emitters(world, Some(listener))
        .into_iter()
        .filter_map(|emitter| {
            let strength = received_level(&emitter, at);
            (strength - floor >= DETECTION_THRESHOLD).then(|| SonarContact {
                entity: emitter.entity,
                bearing: Angle::from_direction((emitter.position - at).xy()),
                strength,
            })
        })
        .collect()
}

/// Loudest hull inside the seeker cone of a homing torpedo
///
/// The seeker listens along the torpedo's heading out to [`SEEKER_RANGE`]
/// and [`SEEKER_ANGLE`] either side. The launching vessel is never chosen.
/// Returns `None` if the torpedo is gone, dead or not a homing model, or if
/// no hull rises [`SEEKER_THRESHOLD`] above the sea noise.
pub fn acoustic_target(world: &World, torpedo: Entity) -> Option<Entity> {
    let seeker = world.registry().torpedo(torpedo)?;
    if !seeker.body.is_alive() || !seeker.torpedo_type().is_homing() {
        return None;
    }
    let at = seeker.body.position;
    let heading = seeker.body.heading();
    let floor = world.environment().weather.sea_noise();

    emitters(world, seeker.parent)
        .into_iter()
        .filter_map(|emitter| {
            let offset = (emitter.position - at).xy();
            let bearing = Angle::from_direction(offset);
            if offset.length() > SEEKER_RANGE || heading.diff_to(bearing).abs() > SEEKER_ANGLE {
                return None;
            }
            let level = received_level(&emitter, at) + directional_gain(heading, bearing);
            (level - floor >= SEEKER_THRESHOLD).then_some((emitter.entity, level))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// Emit an active sonar ping from `observer`
///
/// The cone points along `direction`, or the observer's heading if `None`.
/// Submerged submarines inside the cone are returned as positions; deep
/// boats are only found at shorter range. The ping is recorded either way.
pub fn ping_asdic(world: &mut World, observer: Entity, direction: Option<Angle>) -> Result<Vec<Vector3>, SimError> {
    let body = world.registry().body(observer).ok_or(SimError::NotFound(observer))?;
    if !body.is_alive() {
        return Err(SimError::Rejected(format!("{} cannot ping, it is destroyed", observer)));
    }
    let origin = body.position;
    let direction = direction.unwrap_or_else(|| body.heading());
    let range = world.config().asdic_range;
    let half_angle = world.config().asdic_angle;

    let mut contacts = Vec::new();
    world.registry().for_each(EntityKind::Submarine, |entity, sub| {
        let target = sub.body();
        if entity == observer || !target.is_alive() || target.depth() <= SUBMERGED_DEPTH {
            return;
        }
        let offset = (target.position - origin).xy();
        let effective = range * (0.5 + 0.5 * depth_factor(target.depth()));
        if offset.length() > effective {
            return;
        }
        let bearing = Angle::from_direction(offset);
        if direction.diff_to(bearing).abs() <= half_angle {
            contacts.push(target.position);
        }
    });

    let time = world.time();
    world.record_ping(Ping {
        position: origin.xy(),
        direction,
        time,
        range,
        angle: Angle::new(half_angle),
    });
    log::debug!("{} pinged towards {:.0}, {} contacts", observer, direction.value(), contacts.len());
    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{Ship, Submarine, Torpedo, TorpedoPattern, TorpedoType};
    use crate::config::SimConfig;

    fn world() -> World {
        World::new(SimConfig::default().with_workers(1)).unwrap()
    }

    fn merchant(w: &mut World, x: f64, y: f64) -> Entity {
        let mut ship = Ship::from_class_name("largemerchant", Vector3::new(x, y, 0.0), Angle::new(0.0)).unwrap();
        ship.hull.set_throttle(1.0);
        ship.hull.body.velocity = Vector3::new(0.0, 6.0, 0.0);
        w.spawn_ship(ship)
    }

    #[test]
    fn test_deep_submarine_is_quieter() {
        let mut strengths = Vec::new();
        for depth in [0.0, 200.0] {
            let mut w = world();
            let listener = merchant(&mut w, 0.0, 0.0);
            w.spawn_submarine(
                Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 1_000.0, -depth), Angle::new(0.0)).unwrap(),
            );
            strengths.push(listen(&w, listener, Angle::new(0.0)).unwrap().strength);
        }
        assert!(strengths[1] <= strengths[0]);
    }

    #[test]
    fn test_listening_direction_matters() {
        let mut w = world();
        let listener = w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 0.0, -20.0), Angle::new(0.0)).unwrap(),
        );
        merchant(&mut w, 0.0, 3_000.0);
        let towards = listen(&w, listener, Angle::new(0.0)).unwrap();
        let away = listen(&w, listener, Angle::new(180.0)).unwrap();
        assert!(towards.strength > away.strength);
        // high frequencies are absorbed more
        assert!(towards.spectrum.bands[0] > towards.spectrum.bands[3]);
    }

    #[test]
    fn test_passive_contacts_idempotent() {
        let mut w = world();
        let listener = w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 0.0, -20.0), Angle::new(0.0)).unwrap(),
        );
        let near = merchant(&mut w, 0.0, 2_000.0);
        let first = passive_contacts(&w, listener);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].entity, near);
        assert!(first[0].bearing.value().abs() < 1e-9);
        assert_eq!(passive_contacts(&w, listener), first);
        assert_eq!(listen(&w, listener, Angle::new(0.0)), listen(&w, listener, Angle::new(0.0)));
    }

    #[test]
    fn test_acoustic_target_picks_loudest_in_cone() {
        let mut w = world();
        let parent = w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 600.0, -20.0), Angle::new(0.0)).unwrap(),
        );
        let quiet = w.spawn_ship(
            Ship::from_class_name("largemerchant", Vector3::new(50.0, 500.0, 0.0), Angle::new(0.0)).unwrap(),
        );
        let loud = merchant(&mut w, -50.0, 400.0);
        // behind the seeker
        merchant(&mut w, 0.0, -300.0);
        // out of range
        merchant(&mut w, 0.0, 3_000.0);
        let mut t5 = Torpedo::new(TorpedoType::G7esT5, Vector3::new(0.0, 0.0, -3.0), Angle::new(0.0), 3.0, TorpedoPattern::straight());
        t5.parent = Some(parent);
        let t5 = w.spawn_torpedo(t5);
        assert_eq!(acoustic_target(&w, t5), Some(loud));

        w.registry_mut().body_mut(loud).unwrap().kill();
        assert_eq!(acoustic_target(&w, t5), Some(quiet));
        w.registry_mut().body_mut(quiet).unwrap().kill();
        assert_eq!(acoustic_target(&w, t5), None);
    }

    #[test]
    fn test_acoustic_target_needs_homing_torpedo() {
        let mut w = world();
        merchant(&mut w, 0.0, 400.0);
        let straight = w.spawn_torpedo(Torpedo::new(
            TorpedoType::G7e,
            Vector3::zero(),
            Angle::new(0.0),
            3.0,
            TorpedoPattern::straight(),
        ));
        assert_eq!(acoustic_target(&w, straight), None);
        let ghost = Entity::new(EntityKind::Torpedo, 3, 0);
        assert_eq!(acoustic_target(&w, ghost), None);
    }

    #[test]
    fn test_asdic_cone_and_ping_record() {
        let mut w = world();
        let escort = w.spawn_ship(
            Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap(),
        );
        w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 800.0, -40.0), Angle::new(0.0)).unwrap(),
        );
        w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(800.0, 0.0, -40.0), Angle::new(0.0)).unwrap(),
        );
        let ahead = ping_asdic(&mut w, escort, None).unwrap();
        assert_eq!(ahead.len(), 1);
        assert!((ahead[0].y - 800.0).abs() < 1e-9);

        let empty = ping_asdic(&mut w, escort, Some(Angle::new(180.0))).unwrap();
        assert!(empty.is_empty());
        assert_eq!(w.pings().len(), 2);
        assert_eq!(w.journal().len(), 2);
    }

    #[test]
    fn test_asdic_missing_observer() {
        let mut w = world();
        let ghost = Entity::new(EntityKind::Ship, 7, 0);
        assert_eq!(ping_asdic(&mut w, ghost, None), Err(SimError::NotFound(ghost)));
    }
}
