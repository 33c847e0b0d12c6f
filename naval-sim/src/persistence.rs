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
//! Save and restore
//!
//! A save is one JSON document with sections in a fixed order: header,
//! globals, one section per entity kind, then the cross-reference
//! section. Cross references are written as save indices: ships are
//! numbered from 1 in registry order, then submarines, then convoys.
//! Index 0 means "no reference", which is also what a reference to an
//! entity outside the indexed kinds degrades to.
//!
//! Loading is atomic. The document is parsed and every entity is
//! instantiated with empty references into a fresh [`World`]; a second
//! pass resolves the stored indices. Any error discards the partial
//! world.
//!
//! Jobs are callbacks and are not saved; hull trails are cosmetic and
//! restart empty.

use crate::bodies::submarine::DamageablePart;
use crate::bodies::{
    Airplane, AirplaneSpec, Convoy, DepthCharge, DiveControl, GunShell, Hull, Particle, ParticleKind, Ship,
    StoredTorpedo, Submarine, Torpedo, TorpedoPattern, TorpedoType, WaterSplash,
};
use crate::config::SimConfig;
use crate::ecs::components::{Body, Health};
use crate::ecs::system::Simulatable;
use crate::ecs::{AliveState, Entity, EntityKind};
use crate::environment::Environment;
use crate::error::PersistenceError;
use crate::journal::{Journal, Logbook, PlayerInfo, SinkRecord};
use crate::math::{Angle, Vector2};
use crate::sensors::Ping;
use crate::time::GameDate;
use crate::world::{RunState, World};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the save format this build writes
pub const FORMAT_VERSION: &str = "1.0.0";

/// Save header, readable without loading the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Save format version (semver)
    pub version: String,
    /// Player-supplied description
    pub description: String,
    /// Simulation date at the time of saving
    pub save_date: GameDate,
}

#[derive(Serialize, Deserialize)]
struct Globals {
    time: f64,
    environment: Environment,
    run_state: RunState,
    player_info: PlayerInfo,
    pings: Vec<Ping>,
    sunken_ships: Vec<SinkRecord>,
    journal: Journal,
    logbook: Logbook,
}

#[derive(Serialize, Deserialize)]
struct HullState {
    throttle: f64,
    rudder: f64,
    target_heading: Option<Angle>,
    fuel_level: f64,
    sink_recorded: bool,
}

impl HullState {
    fn of(hull: &Hull) -> Self {
        HullState {
            throttle: hull.throttle(),
            rudder: hull.rudder(),
            target_heading: hull.target_heading(),
            fuel_level: hull.fuel_level(),
            sink_recorded: hull.sink_recorded(),
        }
    }

    fn apply(&self, hull: &mut Hull) {
        hull.restore(
            self.throttle,
            self.rudder,
            self.target_heading,
            self.fuel_level,
            self.sink_recorded,
        );
    }

    fn scalars(&self) -> [f64; 3] {
        [self.throttle, self.rudder, self.fuel_level]
    }
}

#[derive(Serialize, Deserialize)]
struct ShipRecord {
    class: String,
    body: Body,
    hull: HullState,
}

#[derive(Serialize, Deserialize)]
struct SubmarineRecord {
    type_name: String,
    body: Body,
    hull: HullState,
    dive: DiveControl,
    scope_up: bool,
    snorkel_up: bool,
    battery_level: f64,
    torpedoes: Vec<StoredTorpedo>,
    parts: Vec<DamageablePart>,
}

#[derive(Serialize, Deserialize)]
struct AirplaneRecord {
    spec: AirplaneSpec,
    body: Body,
    roll_factor: f64,
    pitch_factor: f64,
}

#[derive(Serialize, Deserialize)]
struct TorpedoRecord {
    torpedo_type: TorpedoType,
    pattern: TorpedoPattern,
    body: Body,
    base_heading: Angle,
    run_depth: f64,
    run_length: f64,
}

#[derive(Serialize, Deserialize)]
struct DepthChargeRecord {
    body: Body,
    explode_depth: f64,
}

#[derive(Serialize, Deserialize)]
struct GunShellRecord {
    body: Body,
    v0: f64,
    elevation: Angle,
    z0: f64,
    direction: Angle,
    origin: Vector2,
    age: f64,
    drift: Vector2,
}

#[derive(Serialize, Deserialize)]
struct WaterSplashRecord {
    body: Body,
    age: f64,
}

#[derive(Serialize, Deserialize)]
struct ConvoyRecord {
    body: Body,
    speed: f64,
    waypoints: Vec<Vector2>,
}

#[derive(Serialize, Deserialize)]
struct ParticleRecord {
    kind: ParticleKind,
    body: Body,
    life: f64,
}

/// Save indices of every cross reference, one entry per record of the
/// referencing section
#[derive(Serialize, Deserialize, Default)]
struct References {
    player: u32,
    ship_convoys: Vec<u32>,
    torpedo_targets: Vec<u32>,
    torpedo_parents: Vec<u32>,
    depth_charge_parents: Vec<u32>,
    gun_shell_parents: Vec<u32>,
    convoy_merchants: Vec<Vec<u32>>,
    convoy_escorts: Vec<Vec<u32>>,
}

#[derive(Serialize, Deserialize)]
struct SaveDocument {
    header: SaveHeader,
    globals: Globals,
    ships: Vec<ShipRecord>,
    submarines: Vec<SubmarineRecord>,
    airplanes: Vec<AirplaneRecord>,
    torpedoes: Vec<TorpedoRecord>,
    depth_charges: Vec<DepthChargeRecord>,
    gun_shells: Vec<GunShellRecord>,
    water_splashes: Vec<WaterSplashRecord>,
    convoys: Vec<ConvoyRecord>,
    particles: Vec<ParticleRecord>,
    references: References,
}

#[derive(Deserialize)]
struct HeaderOnly {
    header: SaveHeader,
}

/// Entity to save index mapping for one save operation
struct SaveIndex {
    map: HashMap<Entity, u32>,
}

impl SaveIndex {
    fn build(world: &World) -> Self {
        let registry = world.registry();
        let indexed = registry
            .ships()
            .entities()
            .chain(registry.submarines().entities())
            .chain(registry.convoys().entities())
            .filter(|&e| registry.body(e).map_or(false, |b| !b.is_defunct()));
        let map = indexed.zip(1u32..).collect();
        SaveIndex { map }
    }

    fn of(&self, entity: Option<Entity>) -> u32 {
        entity.and_then(|e| self.map.get(&e).copied()).unwrap_or(0)
    }
}

/// Save index to entity mapping for one load operation
struct LoadIndex {
    slots: Vec<Entity>,
}

impl LoadIndex {
    fn resolve(&self, index: u32, what: &'static str, kinds: &[EntityKind]) -> Result<Option<Entity>, PersistenceError> {
        if index == 0 {
            return Ok(None);
        }
        match self.slots.get(index as usize - 1) {
            Some(&e) if kinds.contains(&e.kind()) => Ok(Some(e)),
            _ => Err(PersistenceError::DanglingReference { what, index }),
        }
    }
}

const HULLS: &[EntityKind] = &[EntityKind::Ship, EntityKind::Submarine];

fn live<'a, T: Simulatable + 'a>(
    iter: impl Iterator<Item = (Entity, &'a T)>,
) -> impl Iterator<Item = (Entity, &'a T)> {
    iter.filter(|(_, item)| !item.body().is_defunct())
}

/// Serialize the world
///
/// Fails only if the player is an entity kind without a save index.
pub fn save(world: &World, description: &str) -> Result<String, PersistenceError> {
    if let Some(player) = world.player() {
        if !HULLS.contains(&player.kind()) {
            return Err(PersistenceError::UnsupportedPlayer(player.kind()));
        }
    }
    let index = SaveIndex::build(world);
    let registry = world.registry();
    let mut refs = References {
        player: index.of(world.player()),
        ..References::default()
    };

    let ships = live(registry.ships().iter())
        .map(|(_, s)| {
            refs.ship_convoys.push(index.of(s.convoy));
            ShipRecord {
                class: s.class().name.to_string(),
                body: s.hull.body.clone(),
                hull: HullState::of(&s.hull),
            }
        })
        .collect();
    let submarines = live(registry.submarines().iter())
        .map(|(_, s)| SubmarineRecord {
            type_name: s.sub_type().name.to_string(),
            body: s.hull.body.clone(),
            hull: HullState::of(&s.hull),
            dive: s.dive_control(),
            scope_up: s.is_scope_up(),
            snorkel_up: s.is_snorkel_up(),
            battery_level: s.battery_level(),
            torpedoes: s.torpedoes().to_vec(),
            parts: s.parts().to_vec(),
        })
        .collect();
    let airplanes = live(registry.airplanes().iter())
        .map(|(_, a)| AirplaneRecord {
            spec: *a.spec(),
            body: a.body.clone(),
            roll_factor: a.roll_factor(),
            pitch_factor: a.pitch_factor(),
        })
        .collect();
    let torpedoes = live(registry.torpedoes().iter())
        .map(|(_, t)| {
            refs.torpedo_targets.push(index.of(t.target));
            refs.torpedo_parents.push(index.of(t.parent));
            TorpedoRecord {
                torpedo_type: t.torpedo_type(),
                pattern: *t.pattern(),
                body: t.body.clone(),
                base_heading: t.base_heading(),
                run_depth: t.run_depth(),
                run_length: t.run_length(),
            }
        })
        .collect();
    let depth_charges = live(registry.depth_charges().iter())
        .map(|(_, d)| {
            refs.depth_charge_parents.push(index.of(d.parent));
            DepthChargeRecord {
                body: d.body.clone(),
                explode_depth: d.explode_depth(),
            }
        })
        .collect();
    let gun_shells = live(registry.gun_shells().iter())
        .map(|(_, g)| {
            refs.gun_shell_parents.push(index.of(g.parent));
            let b = g.ballistics();
            GunShellRecord {
                body: g.body.clone(),
                v0: b.v0,
                elevation: b.elevation,
                z0: b.z0,
                direction: g.direction(),
                origin: g.origin(),
                age: g.age(),
                drift: g.drift(),
            }
        })
        .collect();
    let water_splashes = live(registry.water_splashes().iter())
        .map(|(_, w)| WaterSplashRecord {
            body: w.body.clone(),
            age: w.age(),
        })
        .collect();
    let convoys = live(registry.convoys().iter())
        .map(|(_, c)| {
            refs.convoy_merchants.push(c.merchants().iter().map(|&m| index.of(Some(m))).collect());
            refs.convoy_escorts.push(c.escorts().iter().map(|&m| index.of(Some(m))).collect());
            ConvoyRecord {
                body: c.body.clone(),
                speed: c.speed(),
                waypoints: c.waypoints().copied().collect(),
            }
        })
        .collect();
    let particles = live(registry.particles().iter())
        .map(|(_, p)| ParticleRecord {
            kind: p.kind(),
            body: p.body.clone(),
            life: p.life(),
        })
        .collect();

    let document = SaveDocument {
        header: SaveHeader {
            version: FORMAT_VERSION.to_string(),
            description: description.to_string(),
            save_date: world.date(),
        },
        globals: Globals {
            time: world.time(),
            environment: *world.environment(),
            run_state: world.run_state(),
            player_info: world.player_info().clone(),
            pings: world.pings().to_vec(),
            sunken_ships: world.sunken_ships().to_vec(),
            journal: world.journal().clone(),
            logbook: world.logbook().clone(),
        },
        ships,
        submarines,
        airplanes,
        torpedoes,
        depth_charges,
        gun_shells,
        water_splashes,
        convoys,
        particles,
        references: refs,
    };
    let json = serde_json::to_string_pretty(&document)?;
    log::info!("saved world at t={:.1} ({} bytes)", world.time(), json.len());
    Ok(json)
}

/// Read only the header of a save
pub fn read_description(json: &str) -> Result<SaveHeader, PersistenceError> {
    let doc: HeaderOnly = serde_json::from_str(json)?;
    Ok(doc.header)
}

/// Check that a save written with `found` can be loaded by this build
///
/// Majors must match; a file from a newer minor release is rejected.
fn check_version(found: &str) -> Result<(), PersistenceError> {
    let found_ver = Version::parse(found)?;
    let ours = Version::parse(FORMAT_VERSION)?;
    let compatible = if ours.major != 0 {
        found_ver.major == ours.major && found_ver.minor <= ours.minor
    } else {
        found_ver.major == 0 && found_ver.minor == ours.minor
    };
    if compatible {
        Ok(())
    } else {
        Err(PersistenceError::IncompatibleVersion {
            found: found.to_string(),
            expected: FORMAT_VERSION.to_string(),
        })
    }
}

fn invalid(kind: EntityKind, index: usize, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::InvalidRecord {
        kind,
        index,
        reason: reason.into(),
    }
}

fn check_body(kind: EntityKind, index: usize, body: &Body) -> Result<(), PersistenceError> {
    if !body.is_valid() {
        return Err(invalid(kind, index, "non-finite position, orientation or velocity"));
    }
    let h = body.health;
    if Health::try_from_parts(h.current(), h.max()).is_none() {
        return Err(invalid(kind, index, format!("health {} of {}", h.current(), h.max())));
    }
    if body.alive_state() == AliveState::Defunct {
        return Err(invalid(kind, index, "defunct entity"));
    }
    Ok(())
}

fn check_finite(kind: EntityKind, index: usize, values: &[f64]) -> Result<(), PersistenceError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(invalid(kind, index, "non-finite value"))
    }
}

fn check_len<T>(refs: &[T], records: usize, kind: EntityKind) -> Result<(), PersistenceError> {
    if refs.len() == records {
        Ok(())
    } else {
        Err(invalid(
            kind,
            refs.len().min(records),
            format!("{} references for {} records", refs.len(), records),
        ))
    }
}

/// Rebuild a world from a save
///
/// `config` is the engine configuration of the new session; it is not
/// part of the save.
pub fn load(json: &str, config: SimConfig) -> Result<World, PersistenceError> {
    let doc: SaveDocument = serde_json::from_str(json)?;
    check_version(&doc.header.version)?;
    let refs = &doc.references;
    check_len(&refs.ship_convoys, doc.ships.len(), EntityKind::Ship)?;
    check_len(&refs.torpedo_targets, doc.torpedoes.len(), EntityKind::Torpedo)?;
    check_len(&refs.torpedo_parents, doc.torpedoes.len(), EntityKind::Torpedo)?;
    check_len(&refs.depth_charge_parents, doc.depth_charges.len(), EntityKind::DepthCharge)?;
    check_len(&refs.gun_shell_parents, doc.gun_shells.len(), EntityKind::GunShell)?;
    check_len(&refs.convoy_merchants, doc.convoys.len(), EntityKind::Convoy)?;
    check_len(&refs.convoy_escorts, doc.convoys.len(), EntityKind::Convoy)?;

    let mut world = World::new(config)?;
    let g = doc.globals;
    if !g.time.is_finite() {
        return Err(PersistenceError::Json(serde::de::Error::custom("non-finite simulation time")));
    }
    world.set_time(g.time);
    world.set_environment(g.environment);
    world.set_player_info(g.player_info);
    world.restore_history(g.pings, g.sunken_ships, g.journal, g.logbook);

    // pass 1: instantiate with empty references
    let mut ships = Vec::with_capacity(doc.ships.len());
    for (i, r) in doc.ships.into_iter().enumerate() {
        check_body(EntityKind::Ship, i, &r.body)?;
        check_finite(EntityKind::Ship, i, &r.hull.scalars())?;
        let mut ship = Ship::from_class_name(&r.class, r.body.position, r.body.heading())?;
        ship.hull.body = r.body;
        r.hull.apply(&mut ship.hull);
        ships.push(world.spawn(ship));
    }

    let mut submarines = Vec::with_capacity(doc.submarines.len());
    for (i, r) in doc.submarines.into_iter().enumerate() {
        let kind = EntityKind::Submarine;
        check_body(kind, i, &r.body)?;
        check_finite(kind, i, &r.hull.scalars())?;
        let mut values = vec![r.battery_level];
        values.extend(r.parts.iter().map(|p| p.status));
        values.extend(r.torpedoes.iter().map(|t| t.remaining_time));
        values.push(match r.dive {
            DiveControl::Depth(d) | DiveControl::Rate(d) => d,
        });
        check_finite(kind, i, &values)?;
        let mut sub = Submarine::from_type_name(&r.type_name, r.body.position, r.body.heading())?;
        sub.hull.body = r.body;
        r.hull.apply(&mut sub.hull);
        sub.restore(r.dive, r.scope_up, r.snorkel_up, r.battery_level, r.torpedoes, r.parts)
            .map_err(|reason| invalid(kind, i, reason))?;
        submarines.push(world.spawn(sub));
    }

    for (i, r) in doc.airplanes.into_iter().enumerate() {
        let kind = EntityKind::Airplane;
        check_body(kind, i, &r.body)?;
        check_finite(kind, i, &[r.roll_factor, r.pitch_factor, r.spec.mass, r.spec.thrust])?;
        let mut plane = Airplane::new(r.spec, r.body.position, r.body.heading(), 0.0);
        plane.body = r.body;
        plane.restore(r.roll_factor, r.pitch_factor);
        world.spawn(plane);
    }

    let mut torpedoes = Vec::with_capacity(doc.torpedoes.len());
    for (i, r) in doc.torpedoes.into_iter().enumerate() {
        let kind = EntityKind::Torpedo;
        check_body(kind, i, &r.body)?;
        check_finite(
            kind,
            i,
            &[r.run_depth, r.run_length, r.pattern.primary_range, r.pattern.secondary_range],
        )?;
        let mut torpedo = Torpedo::new(r.torpedo_type, r.body.position, r.base_heading, r.run_depth, r.pattern);
        torpedo.body = r.body;
        torpedo.restore(r.base_heading, r.run_length);
        torpedoes.push(world.spawn(torpedo));
    }

    let mut depth_charges = Vec::with_capacity(doc.depth_charges.len());
    for (i, r) in doc.depth_charges.into_iter().enumerate() {
        check_body(EntityKind::DepthCharge, i, &r.body)?;
        check_finite(EntityKind::DepthCharge, i, &[r.explode_depth])?;
        let mut charge = DepthCharge::new(r.body.position, r.body.velocity, r.explode_depth);
        charge.body = r.body;
        depth_charges.push(world.spawn(charge));
    }

    let mut gun_shells = Vec::with_capacity(doc.gun_shells.len());
    for (i, r) in doc.gun_shells.into_iter().enumerate() {
        let kind = EntityKind::GunShell;
        check_body(kind, i, &r.body)?;
        check_finite(kind, i, &[r.v0, r.z0, r.age])?;
        if r.v0 <= 0.0 || !r.origin.is_valid() || !r.drift.is_valid() {
            return Err(invalid(kind, i, "invalid trajectory"));
        }
        let mut shell = GunShell::new(r.origin.xy0(r.z0), r.direction, r.elevation, r.v0);
        shell.restore(r.origin, r.age, r.drift);
        shell.body = r.body;
        gun_shells.push(world.spawn(shell));
    }

    for (i, r) in doc.water_splashes.into_iter().enumerate() {
        check_body(EntityKind::WaterSplash, i, &r.body)?;
        check_finite(EntityKind::WaterSplash, i, &[r.age])?;
        let mut splash = WaterSplash::new(r.body.position);
        splash.set_age(r.age);
        splash.body = r.body;
        world.spawn(splash);
    }

    let mut convoys = Vec::with_capacity(doc.convoys.len());
    for (i, r) in doc.convoys.into_iter().enumerate() {
        let kind = EntityKind::Convoy;
        check_body(kind, i, &r.body)?;
        check_finite(kind, i, &[r.speed])?;
        if !r.waypoints.iter().all(|w| w.is_valid()) {
            return Err(invalid(kind, i, "non-finite waypoint"));
        }
        let mut convoy = Convoy::new(r.body.position.xy(), r.body.heading(), r.speed);
        convoy.restore_route(r.speed, r.waypoints);
        convoy.body = r.body;
        convoys.push(world.spawn(convoy));
    }

    for (i, r) in doc.particles.into_iter().enumerate() {
        check_body(EntityKind::Particle, i, &r.body)?;
        check_finite(EntityKind::Particle, i, &[r.life])?;
        let mut particle = Particle::new(r.kind, r.body.position, r.body.velocity);
        particle.set_life(r.life);
        particle.body = r.body;
        world.spawn(particle);
    }

    // pass 2: resolve save indices
    let index = LoadIndex {
        slots: ships.iter().chain(&submarines).chain(&convoys).copied().collect(),
    };
    let player = index.resolve(refs.player, "player", HULLS)?;
    world.restore_player(player);

    for (&ship, &c) in ships.iter().zip(&refs.ship_convoys) {
        let convoy = index.resolve(c, "ship convoy", &[EntityKind::Convoy])?;
        if let Some(s) = world.registry_mut().ship_mut(ship) {
            s.convoy = convoy;
        }
    }
    for (i, &torpedo) in torpedoes.iter().enumerate() {
        let target = index.resolve(refs.torpedo_targets[i], "torpedo target", HULLS)?;
        let parent = index.resolve(refs.torpedo_parents[i], "torpedo parent", HULLS)?;
        if let Some(t) = world.registry_mut().torpedo_mut(torpedo) {
            t.target = target;
            t.parent = parent;
        }
    }
    for (&charge, &p) in depth_charges.iter().zip(&refs.depth_charge_parents) {
        let parent = index.resolve(p, "depth charge parent", HULLS)?;
        if let Some(d) = world.registry_mut().depth_charge_mut(charge) {
            d.parent = parent;
        }
    }
    for (&shell, &p) in gun_shells.iter().zip(&refs.gun_shell_parents) {
        let parent = index.resolve(p, "gun shell parent", HULLS)?;
        if let Some(s) = world.registry_mut().gun_shell_mut(shell) {
            s.parent = parent;
        }
    }
    for (i, &convoy) in convoys.iter().enumerate() {
        let mut merchants = Vec::new();
        for &m in &refs.convoy_merchants[i] {
            merchants.extend(index.resolve(m, "convoy merchant", &[EntityKind::Ship])?);
        }
        let mut escorts = Vec::new();
        for &m in &refs.convoy_escorts[i] {
            escorts.extend(index.resolve(m, "convoy escort", &[EntityKind::Ship])?);
        }
        if let Some(c) = world.registry_mut().convoy_mut(convoy) {
            merchants.into_iter().for_each(|m| c.add_merchant(m));
            escorts.into_iter().for_each(|e| c.add_escort(e));
        }
    }

    world.restore_run_state(g.run_state);
    log::info!(
        "loaded {:?} saved on {:?}: {} entities",
        doc.header.description,
        doc.header.save_date,
        world.registry().len()
    );
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use serde_json::Value;

    fn sample_world() -> World {
        let mut world = World::new(SimConfig::default().with_workers(1)).unwrap();
        world.set_time(1_000.0);
        let sub = world.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, -2_000.0, -20.0), Angle::new(15.0)).unwrap(),
        );
        let m = world.spawn_ship(Ship::from_class_name("largemerchant", Vector3::zero(), Angle::new(90.0)).unwrap());
        let mut convoy = Convoy::new(Vector2::zero(), Angle::new(90.0), 4.0);
        convoy.add_merchant(m);
        convoy.add_waypoint(Vector2::new(5_000.0, 0.0));
        world.spawn_convoy(convoy);
        let mut t = Torpedo::new(
            TorpedoType::G7e,
            Vector3::new(0.0, -1_900.0, -3.0),
            Angle::new(0.0),
            3.0,
            TorpedoPattern::straight(),
        );
        t.target = Some(m);
        t.parent = Some(sub);
        world.spawn_torpedo(t);
        world.set_player(sub).unwrap();
        world
    }

    #[test]
    fn test_header_readable_alone() {
        let json = save(&sample_world(), "patrol one").unwrap();
        let header = read_description(&json).unwrap();
        assert_eq!(header.description, "patrol one");
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.save_date, GameDate::from_time(1_000.0));
    }

    #[test]
    fn test_references_survive() {
        let json = save(&sample_world(), "").unwrap();
        let world = load(&json, SimConfig::default()).unwrap();
        let player = world.player().unwrap();
        assert_eq!(player.kind(), EntityKind::Submarine);
        let (_, torpedo) = world.registry().torpedoes().iter().next().unwrap();
        assert_eq!(torpedo.parent, Some(player));
        let (ship, merchant) = world.registry().ships().iter().next().unwrap();
        assert_eq!(torpedo.target, Some(ship));
        let (convoy_e, convoy) = world.registry().convoys().iter().next().unwrap();
        assert_eq!(merchant.convoy, Some(convoy_e));
        assert_eq!(convoy.merchants(), &[ship]);
        assert_eq!(convoy.waypoints().count(), 1);
    }

    #[test]
    fn test_incompatible_version() {
        let json = save(&sample_world(), "").unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        doc["header"]["version"] = Value::from("2.0.0");
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::IncompatibleVersion { .. }));
        doc["header"]["version"] = Value::from("one");
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::Version(_)));
    }

    #[test]
    fn test_dangling_index() {
        let json = save(&sample_world(), "").unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        doc["references"]["torpedo_targets"][0] = Value::from(42);
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::DanglingReference {
                what: "torpedo target",
                index: 42
            }
        ));
    }

    #[test]
    fn test_reference_kind_checked() {
        let json = save(&sample_world(), "").unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        // index 3 is the convoy
        doc["references"]["player"] = Value::from(3);
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::DanglingReference { what: "player", .. }));
    }

    #[test]
    fn test_invalid_health_rejected() {
        let json = save(&sample_world(), "").unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        doc["ships"][0]["body"]["health"]["current"] = Value::from(-5.0);
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::InvalidRecord {
                kind: EntityKind::Ship,
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_class_rejected() {
        let json = save(&sample_world(), "").unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        doc["ships"][0]["class"] = Value::from("dreadnought");
        let err = load(&doc.to_string(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::Config(_)));
    }

    #[test]
    fn test_truncated_document() {
        let json = save(&sample_world(), "").unwrap();
        let err = load(&json[..json.len() / 2], SimConfig::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }

    #[test]
    fn test_airplane_player_unsupported() {
        let mut world = World::new(SimConfig::default()).unwrap();
        let plane = world.spawn_airplane(Airplane::new(
            AirplaneSpec::default(),
            Vector3::new(0.0, 0.0, 300.0),
            Angle::new(0.0),
            60.0,
        ));
        world.set_player(plane).unwrap();
        assert!(matches!(
            save(&world, ""),
            Err(PersistenceError::UnsupportedPlayer(EntityKind::Airplane))
        ));
    }
}
