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
//! The simulated world
//!
//! [`World`] owns the entity registry and every global: simulation time,
//! environment, run state, player reference, pings, sinking history,
//! journal, logbook, jobs and pause bookkeeping.
//!
//! Ticks are driven by [`Scheduler`](crate::ecs::scheduler::Scheduler);
//! the serial phases of a tick live here because they mutate several
//! entities and globals at once. Sensor queries take `&World` and so can
//! only run between ticks.

use crate::bodies::depth_charge::{EXPLOSION_STRENGTH, LETHAL_RADIUS};
use crate::bodies::{
    Airplane, Convoy, DepthCharge, GunShell, Particle, ParticleKind, Ship, Submarine, Torpedo, WaterSplash,
};
use crate::collision::{check_collisions, Collision};
use crate::config::SimConfig;
use crate::ecs::registry::{EntityData, Registry};
use crate::ecs::scheduler::SerialReport;
use crate::ecs::system::TickContext;
use crate::ecs::{Entity, EntityKind};
use crate::environment::{self, Environment, Weather};
use crate::error::{ConfigError, SimError};
use crate::jobs::{self, Job, JobId, JobList};
use crate::journal::{score, EventKind, Journal, Logbook, PlayerInfo, SinkRecord};
use crate::math::{Angle, Vector3};
use crate::sensors::{self, Ping};
use crate::time::{Clock, FrameTimer, FreezeTimer, GameDate, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Overall state of the session
///
/// Leaves `Running` at most once; the terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Gameplay in progress
    #[default]
    Running,
    /// The player's vessel was destroyed
    PlayerKilled,
    /// Every contact was sunk
    MissionComplete,
    /// The player lost contact with the enemy
    ContactLost,
}

impl RunState {
    /// Check if gameplay entities still advance
    pub fn is_running(&self) -> bool {
        *self == RunState::Running
    }
}

/// World state of one session
pub struct World {
    registry: Registry,
    config: SimConfig,
    time: f64,
    last_trail_time: f64,
    environment: Environment,
    run_state: RunState,
    player: Option<Entity>,
    player_info: PlayerInfo,
    pings: Vec<Ping>,
    sunken_ships: Vec<SinkRecord>,
    journal: Journal,
    logbook: Logbook,
    jobs: JobList,
    freeze: FreezeTimer,
    clock: Arc<dyn Clock>,
    frame: FrameTimer,
    pending: Vec<EntityData>,
    nearest_contact: Option<f64>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("time", &self.time)
            .field("entities", &self.registry.len())
            .field("run_state", &self.run_state)
            .field("player", &self.player)
            .field("jobs", &self.jobs.len())
            .field("frozen", &self.freeze.is_frozen())
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create an empty world at 1939-01-01 00:00
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create an empty world measuring wall time with `clock`
    pub fn with_clock(config: SimConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let frame = FrameTimer::new(clock.now_ms());
        Ok(World {
            registry: Registry::new(),
            config,
            time: 0.0,
            last_trail_time: 0.0,
            environment: Environment::default(),
            run_state: RunState::Running,
            player: None,
            player_info: PlayerInfo::default(),
            pings: Vec::new(),
            sunken_ships: Vec::new(),
            journal: Journal::new(),
            logbook: Logbook::new(),
            jobs: JobList::new(),
            freeze: FreezeTimer::default(),
            clock,
            frame,
            pending: Vec::new(),
            nearest_contact: None,
        })
    }

    /// Entity registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable entity registry
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Engine configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Change the time compression factor
    pub fn set_time_compression(&mut self, factor: f64) -> Result<(), ConfigError> {
        let config = self.config.clone().with_time_compression(factor);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Simulation time (s since 1939-01-01 00:00)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Set the simulation time
    pub fn set_time(&mut self, time: f64) {
        if time.is_finite() {
            self.time = time;
            self.last_trail_time = time;
        }
    }

    /// Calendar date of the simulation time
    pub fn date(&self) -> GameDate {
        GameDate::from_time(self.time)
    }

    /// Check if it is daytime
    pub fn is_day_mode(&self) -> bool {
        environment::is_day_mode(self.time)
    }

    /// Weather and wind
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Replace weather and wind
    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    /// Change the weather, keeping the wind direction
    pub fn set_weather(&mut self, weather: Weather) {
        let heading = Angle::from_direction(self.environment.wind);
        self.environment = Environment::new(weather, heading);
    }

    /// Session state
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// End the session as won; ignored once the run state is terminal
    pub fn complete_mission(&mut self) {
        if self.run_state.is_running() {
            self.run_state = RunState::MissionComplete;
        }
    }

    pub(crate) fn restore_run_state(&mut self, state: RunState) {
        self.run_state = state;
    }

    /// The player's entity
    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Make `entity` the player's entity
    pub fn set_player(&mut self, entity: Entity) -> Result<(), SimError> {
        if !self.registry.contains(entity) {
            return Err(SimError::NotFound(entity));
        }
        self.player = Some(entity);
        Ok(())
    }

    pub(crate) fn restore_player(&mut self, player: Option<Entity>) {
        self.player = player;
    }

    /// Player career data
    pub fn player_info(&self) -> &PlayerInfo {
        &self.player_info
    }

    /// Replace the player career data
    pub fn set_player_info(&mut self, info: PlayerInfo) {
        self.player_info = info;
    }

    /// Active sonar pings younger than one second
    pub fn pings(&self) -> &[Ping] {
        &self.pings
    }

    pub(crate) fn record_ping(&mut self, ping: Ping) {
        self.journal.push(
            self.time,
            EventKind::PingFired {
                position: ping.position.xy0(0.0),
                direction: ping.direction,
            },
        );
        self.pings.push(ping);
    }

    pub(crate) fn restore_history(&mut self, pings: Vec<Ping>, sunken: Vec<SinkRecord>, journal: Journal, logbook: Logbook) {
        self.pings = pings;
        self.sunken_ships = sunken;
        self.journal = journal;
        self.logbook = logbook;
    }

    /// Vessels sunk so far, in order
    pub fn sunken_ships(&self) -> &[SinkRecord] {
        &self.sunken_ships
    }

    /// Total sunk tonnage
    pub fn score(&self) -> u64 {
        score(&self.sunken_ships)
    }

    /// Event journal
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Player logbook
    pub fn logbook(&self) -> &Logbook {
        &self.logbook
    }

    /// Write a logbook entry dated now
    pub fn add_logbook_entry(&mut self, text: impl Into<String>) {
        self.logbook.add(self.time, text);
    }

    /// Deliver a message to the player
    pub fn add_message(&mut self, text: impl Into<String>) {
        self.journal.push(self.time, EventKind::MessageReceived { text: text.into() });
    }

    /// Distance from the player to the nearest live contact after the
    /// last tick
    pub fn nearest_contact(&self) -> Option<f64> {
        self.nearest_contact
    }

    // ----- spawning -----

    /// Add an entity of any kind
    pub fn spawn(&mut self, data: impl Into<EntityData>) -> Entity {
        self.registry.spawn(data)
    }

    /// Add a ship
    pub fn spawn_ship(&mut self, ship: Ship) -> Entity {
        self.registry.spawn(ship)
    }

    /// Add a submarine
    pub fn spawn_submarine(&mut self, submarine: Submarine) -> Entity {
        self.registry.spawn(submarine)
    }

    /// Add an airplane
    pub fn spawn_airplane(&mut self, airplane: Airplane) -> Entity {
        self.registry.spawn(airplane)
    }

    /// Add a torpedo
    pub fn spawn_torpedo(&mut self, torpedo: Torpedo) -> Entity {
        self.registry.spawn(torpedo)
    }

    /// Add a depth charge
    pub fn spawn_depth_charge(&mut self, charge: DepthCharge) -> Entity {
        self.registry.spawn(charge)
    }

    /// Add a gun shell
    pub fn spawn_gun_shell(&mut self, shell: GunShell) -> Entity {
        self.registry.spawn(shell)
    }

    /// Add a water splash
    pub fn spawn_water_splash(&mut self, splash: WaterSplash) -> Entity {
        self.registry.spawn(splash)
    }

    /// Add a convoy; its members get their convoy reference set
    pub fn spawn_convoy(&mut self, convoy: Convoy) -> Entity {
        let members: Vec<Entity> = convoy.members().collect();
        let entity = self.registry.spawn(convoy);
        for member in members {
            if let Some(ship) = self.registry.ship_mut(member) {
                ship.convoy = Some(entity);
            }
        }
        entity
    }

    /// Add a particle
    pub fn spawn_particle(&mut self, particle: Particle) -> Entity {
        self.registry.spawn(particle)
    }

    // ----- jobs -----

    /// Register a periodic job
    pub fn register_job(&mut self, job: Box<dyn Job>) -> Result<JobId, SimError> {
        self.jobs.register(job, self.time)
    }

    /// Unregister a job; returns false if it was not registered
    pub fn unregister_job(&mut self, id: JobId) -> bool {
        self.jobs.unregister(id)
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut JobList {
        &mut self.jobs
    }

    pub(crate) fn run_due_jobs(&mut self) -> usize {
        jobs::run_due(self)
    }

    // ----- freeze -----

    /// Check if time is frozen
    pub fn is_frozen(&self) -> bool {
        self.freeze.is_frozen()
    }

    /// Suspend simulation, e.g. while a menu is open
    pub fn freeze(&mut self) {
        self.freeze.freeze(self.clock.now_ms());
    }

    /// Resume simulation
    pub fn unfreeze(&mut self) {
        self.freeze.unfreeze(self.clock.now_ms());
    }

    /// Wall seconds since the previous call, excluding frozen time
    ///
    /// Frame loops pass the result to
    /// [`Scheduler::simulate`](crate::ecs::scheduler::Scheduler::simulate).
    pub fn frame_delta(&mut self) -> f64 {
        let frozen = self.freeze.take_frozen_ms();
        self.frame.next_delta(self.clock.now_ms(), frozen)
    }

    // ----- tick phases -----

    /// Prune pings, steer convoys, aim seekers and snapshot the world for integration
    pub(crate) fn begin_tick(&mut self, dt: f64) -> TickContext {
        let now = self.time;
        self.pings.retain(|p| !p.is_expired(now));
        self.steer_convoys();
        self.acquire_torpedo_targets();

        let mut ctx = TickContext::new(self.time, dt);
        ctx.wind = self.environment.wind;
        ctx.trail_length = self.config.trail_length;
        ctx.record_trail = self.time + dt - self.last_trail_time >= self.config.trail_interval;
        ctx.player = self.player;
        ctx.player_position = self.player.and_then(|p| self.registry.body(p)).map(|b| b.position);

        let mut positions = HashMap::new();
        for kind in [EntityKind::Ship, EntityKind::Submarine] {
            self.registry.for_each(kind, |entity, item| {
                if item.is_alive() {
                    positions.insert(entity, item.body().position);
                }
            });
        }
        ctx.positions = positions;
        ctx
    }

    /// Homing torpedoes whose target is unset or gone listen for a new one
    fn acquire_torpedo_targets(&mut self) {
        let registry = &self.registry;
        let lost: Vec<Entity> = registry
            .torpedoes()
            .iter()
            .filter(|(_, t)| t.body.is_alive() && t.torpedo_type().is_homing())
            .filter(|(_, t)| !t.target.map_or(false, |target| registry.get(target).map_or(false, |x| x.is_alive())))
            .map(|(entity, _)| entity)
            .collect();
        let orders: Vec<(Entity, Option<Entity>)> = lost
            .into_iter()
            .map(|torpedo| (torpedo, sensors::acoustic_target(self, torpedo)))
            .collect();
        for (torpedo, target) in orders {
            if let Some(t) = self.registry.torpedo_mut(torpedo) {
                if let Some(found) = target {
                    log::debug!("{} acquired {}", torpedo, found);
                }
                t.target = target;
            }
        }
    }

    /// Member ships take the course and speed of their convoy
    fn steer_convoys(&mut self) {
        let orders: Vec<(Entity, Angle, f64)> = self
            .registry
            .convoys()
            .iter()
            .filter(|(_, c)| c.body.is_alive())
            .flat_map(|(_, c)| {
                let heading = c.body.heading();
                let speed = c.speed();
                c.members().map(move |m| (m, heading, speed))
            })
            .collect();
        for (member, heading, speed) in orders {
            if let Some(ship) = self.registry.ship_mut(member) {
                if ship.hull.body.is_alive() {
                    ship.hull.head_to(heading);
                    let max = ship.class().hull.max_speed;
                    ship.hull.set_throttle(speed / max);
                }
            }
        }
    }

    /// Serial phases after integration
    pub(crate) fn finish_tick(&mut self, ctx: &TickContext, nearest_contact: Option<f64>) -> SerialReport {
        self.time += ctx.dt;
        if ctx.record_trail {
            self.last_trail_time = self.time;
        }
        let mut events = Vec::new();

        let collisions = if self.run_state.is_running() {
            check_collisions(&mut self.registry)
        } else {
            Vec::new()
        };
        for collision in &collisions {
            self.collision_effects(collision, &mut events);
        }
        self.detonate_depth_charges(&mut events);
        self.land_shells(&mut events);
        self.record_sinkings(&mut events);

        for data in self.pending.drain(..) {
            self.registry.spawn(data);
        }
        let evicted = self.registry.evict_defunct().len();

        self.nearest_contact = nearest_contact;
        self.update_run_state(&mut events);

        let report = SerialReport {
            collisions: collisions.len(),
            evicted,
            events: events.len(),
        };
        for kind in events {
            self.journal.push(self.time, kind);
        }
        report
    }

    fn description_of(&self, entity: Entity) -> String {
        if let Some(ship) = self.registry.ship(entity) {
            ship.class().description.to_string()
        } else if let Some(sub) = self.registry.submarine(entity) {
            sub.sub_type().description.to_string()
        } else {
            format!("{}", entity)
        }
    }

    fn collision_effects(&mut self, collision: &Collision, events: &mut Vec<EventKind>) {
        match collision.striker.kind() {
            EntityKind::Torpedo => {
                events.push(EventKind::TorpedoHit {
                    target: self.description_of(collision.target),
                    position: collision.point,
                });
                let surface = collision.point.xy().xy0(0.0);
                self.pending.push(WaterSplash::new(surface).into());
                for i in 0..8 {
                    let dir = Angle::new(45.0 * i as f64).direction();
                    let velocity = (dir * 15.0).xy0(25.0);
                    self.pending.push(Particle::new(ParticleKind::Explosion, surface, velocity).into());
                }
                self.pending.push(Particle::new(ParticleKind::Smoke, surface, Vector3::new(0.0, 0.0, 2.0)).into());
            }
            EntityKind::GunShell => {
                events.push(EventKind::ShellImpact {
                    position: collision.point,
                    hit: true,
                });
            }
            _ => {}
        }
    }

    fn detonate_depth_charges(&mut self, events: &mut Vec<EventKind>) {
        let detonations: Vec<Vector3> = self
            .registry
            .depth_charges_mut()
            .iter_mut()
            .filter_map(|(_, c)| c.take_detonation())
            .collect();
        for point in detonations {
            events.push(EventKind::DepthChargeExploded { position: point });
            for (entity, sub) in self.registry.submarines_mut().iter_mut() {
                if !sub.hull.body.is_alive() {
                    continue;
                }
                if sub.hull.body.position.distance(point) <= LETHAL_RADIUS
                    && sub.depth_charge_explosion(point, EXPLOSION_STRENGTH)
                {
                    log::info!("{} destroyed by depth charge", entity);
                }
            }
            let surface = point.xy().xy0(0.0);
            self.pending.push(WaterSplash::new(surface).into());
            self.pending.push(Particle::new(ParticleKind::Spray, surface, Vector3::new(0.0, 0.0, 20.0)).into());
        }
    }

    fn land_shells(&mut self, events: &mut Vec<EventKind>) {
        let splashes: Vec<Vector3> = self
            .registry
            .gun_shells_mut()
            .iter_mut()
            .filter_map(|(_, s)| s.take_splash())
            .collect();
        for point in splashes {
            events.push(EventKind::ShellImpact {
                position: point,
                hit: false,
            });
            self.pending.push(WaterSplash::new(point).into());
        }
    }

    fn record_sinkings(&mut self, events: &mut Vec<EventKind>) {
        let date = self.date();
        let mut sunk = Vec::new();
        for (entity, ship) in self.registry.ships_mut().iter_mut() {
            if ship.hull.body.is_dead() && !ship.hull.sink_recorded() {
                ship.hull.set_sink_recorded();
                let class = ship.class();
                sunk.push((entity, class.description, class.name, class.tonnage));
            }
        }
        for (entity, sub) in self.registry.submarines_mut().iter_mut() {
            if sub.hull.body.is_dead() && !sub.hull.sink_recorded() {
                sub.hull.set_sink_recorded();
                let t = sub.sub_type();
                sunk.push((entity, t.description, t.name, t.tonnage));
            }
        }

        for (entity, description, class_name, tonnage) in sunk {
            log::info!("{} sank ({}, {} GRT)", entity, description, tonnage);
            events.push(EventKind::ShipSunk {
                description: description.to_string(),
                tonnage,
            });
            if Some(entity) == self.player {
                continue;
            }
            self.logbook.add(self.time, format!("Sunk {}, {} GRT", description, tonnage));
            self.sunken_ships.push(SinkRecord {
                date,
                description: description.to_string(),
                class_name: class_name.to_string(),
                tonnage,
            });
        }
    }

    fn update_run_state(&mut self, events: &mut Vec<EventKind>) {
        if !self.run_state.is_running() {
            return;
        }
        let Some(player) = self.player else {
            return;
        };
        let player_alive = self.registry.body(player).map_or(false, |b| b.is_alive());
        if !player_alive {
            log::info!("player {} destroyed", player);
            self.run_state = RunState::PlayerKilled;
            events.push(EventKind::PlayerKilled);
            return;
        }
        match self.nearest_contact {
            Some(d) if d > self.config.contact_lost_distance => {
                log::info!("contact lost at {:.0} m", d);
                self.run_state = RunState::ContactLost;
                events.push(EventKind::ContactLost);
            }
            None if !self.sunken_ships.is_empty() => {
                log::info!("no contacts left, mission complete");
                self.run_state = RunState::MissionComplete;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{TorpedoPattern, TorpedoType};
    use crate::ecs::scheduler::Scheduler;
    use crate::time::ManualClock;

    fn setup() -> (World, Scheduler) {
        let config = SimConfig::default().with_workers(1);
        (World::new(config.clone()).unwrap(), Scheduler::new(&config).unwrap())
    }

    fn ship(name: &str, x: f64, y: f64) -> Ship {
        Ship::from_class_name(name, Vector3::new(x, y, 0.0), Angle::new(0.0)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(World::new(SimConfig::default().with_max_substep(-1.0)).is_err());
    }

    #[test]
    fn test_set_player_requires_entity() {
        let (mut world, _) = setup();
        let ghost = Entity::new(EntityKind::Ship, 3, 0);
        assert_eq!(world.set_player(ghost), Err(SimError::NotFound(ghost)));
    }

    #[test]
    fn test_sinking_is_recorded_once_then_evicted() {
        let (mut world, scheduler) = setup();
        let player = world.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, -5_000.0, 0.0), Angle::new(0.0)).unwrap(),
        );
        world.set_player(player).unwrap();
        let target = world.spawn_ship(ship("smallmerchant", 0.0, 0.0));
        world.spawn_ship(ship("largemerchant", 3_000.0, 0.0));
        world.registry_mut().body_mut(target).unwrap().kill();

        scheduler.simulate(&mut world, 0.1).unwrap();
        assert_eq!(world.sunken_ships().len(), 1);
        assert_eq!(world.score(), 2_500);
        assert_eq!(world.logbook().len(), 1);

        // the wreck keeps sinking until it is gone
        for _ in 0..200 {
            scheduler.simulate(&mut world, 1.0).unwrap();
        }
        assert_eq!(world.sunken_ships().len(), 1);
        assert!(world.registry().get(target).is_none());
        let sunk_events = world
            .journal()
            .events()
            .iter()
            .filter(|e| matches!(e.kind, EventKind::ShipSunk { .. }))
            .count();
        assert_eq!(sunk_events, 1);
        assert_eq!(world.run_state(), RunState::Running);
    }

    #[test]
    fn test_mission_complete_when_no_contacts_left() {
        let (mut world, scheduler) = setup();
        let player = world.spawn_ship(ship("corvette", 0.0, -3_000.0));
        world.set_player(player).unwrap();
        let target = world.spawn_ship(ship("smallmerchant", 0.0, 0.0));
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert!(world.run_state().is_running());
        world.registry_mut().body_mut(target).unwrap().kill();
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert_eq!(world.run_state(), RunState::MissionComplete);
    }

    #[test]
    fn test_player_killed_is_terminal() {
        let (mut world, scheduler) = setup();
        let player = world.spawn_ship(ship("corvette", 0.0, 0.0));
        world.spawn_ship(ship("largemerchant", 0.0, 2_000.0));
        world.set_player(player).unwrap();
        world.registry_mut().body_mut(player).unwrap().kill();
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert_eq!(world.run_state(), RunState::PlayerKilled);
        world.complete_mission();
        assert_eq!(world.run_state(), RunState::PlayerKilled);
        assert!(world
            .journal()
            .events()
            .iter()
            .any(|e| e.kind == EventKind::PlayerKilled));
    }

    #[test]
    fn test_contact_lost() {
        let config = SimConfig::default().with_workers(1).with_contact_lost_distance(1_000.0);
        let mut world = World::new(config.clone()).unwrap();
        let scheduler = Scheduler::new(&config).unwrap();
        let player = world.spawn_ship(ship("corvette", 0.0, 0.0));
        world.spawn_ship(ship("largemerchant", 0.0, 5_000.0));
        world.set_player(player).unwrap();
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert!((world.nearest_contact().unwrap() - 5_000.0).abs() < 1.0);
        assert_eq!(world.run_state(), RunState::ContactLost);
    }

    #[test]
    fn test_gameplay_stops_but_cosmetics_animate() {
        let (mut world, scheduler) = setup();
        let player = world.spawn_ship(ship("corvette", 0.0, 0.0));
        world.set_player(player).unwrap();
        let mut moving = ship("largemerchant", 0.0, 2_000.0);
        moving.hull.body.velocity = Vector3::new(0.0, 5.0, 0.0);
        let moving = world.spawn_ship(moving);
        let splash = world.spawn_water_splash(WaterSplash::new(Vector3::zero()));
        world.registry_mut().body_mut(player).unwrap().kill();
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert!(!world.run_state().is_running());

        let before = world.registry().body(moving).unwrap().position;
        let age = world.registry().water_splash(splash).unwrap().age();
        scheduler.simulate(&mut world, 0.1).unwrap();
        assert_eq!(world.registry().body(moving).unwrap().position, before);
        assert!(world.registry().water_splash(splash).unwrap().age() > age);
    }

    #[test]
    fn test_shell_splash_spawned() {
        let (mut world, scheduler) = setup();
        let shell = GunShell::new(Vector3::new(0.0, 0.0, 5.0), Angle::new(90.0), Angle::new(5.0), 400.0);
        let flight = shell.ballistics().time_of_flight();
        world.spawn_gun_shell(shell);
        scheduler.simulate(&mut world, flight + 0.2).unwrap();
        assert_eq!(world.registry().gun_shells().len(), 0);
        assert_eq!(world.registry().water_splashes().len(), 1);
        assert!(world
            .journal()
            .events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::ShellImpact { hit: false, .. })));
    }

    #[test]
    fn test_depth_charge_damages_nearby_submarine() {
        let (mut world, scheduler) = setup();
        let sub = world.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(60.0, 0.0, -30.0), Angle::new(0.0)).unwrap(),
        );
        let far = world.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(500.0, 0.0, -30.0), Angle::new(0.0)).unwrap(),
        );
        world.spawn_depth_charge(DepthCharge::new(Vector3::new(40.0, 0.0, 0.0), Vector3::zero(), 30.0));
        scheduler.simulate(&mut world, 15.0).unwrap();
        let hp = |e| world.registry().body(e).unwrap().health.damage_fraction();
        assert!(hp(sub) > 0.0);
        assert_eq!(hp(far), 0.0);
        assert!(world
            .journal()
            .events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::DepthChargeExploded { .. })));
    }

    #[test]
    fn test_frame_delta_excludes_frozen_time() {
        let clock = Arc::new(ManualClock::new(0));
        let mut world = World::with_clock(SimConfig::default(), clock.clone()).unwrap();
        clock.advance(100);
        world.freeze();
        clock.advance(5_000);
        world.unfreeze();
        clock.advance(200);
        assert!((world.frame_delta() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_homing_torpedo_acquires_target_without_one() {
        let (mut world, scheduler) = setup();
        let mut merchant = ship("largemerchant", 250.0, 600.0);
        merchant.hull.body.velocity = Vector3::new(0.0, 5.0, 0.0);
        let merchant = world.spawn_ship(merchant);
        let torpedo = world.spawn_torpedo(Torpedo::new(
            TorpedoType::G7esT5,
            Vector3::new(0.0, 0.0, -3.0),
            Angle::new(0.0),
            3.0,
            TorpedoPattern::straight(),
        ));
        scheduler.simulate(&mut world, 1.0).unwrap();
        let t = world.registry().torpedo(torpedo).unwrap();
        assert_eq!(t.target, Some(merchant));
        // turning to starboard towards the merchant
        assert!(t.body.heading().value() > 0.0);
    }

    #[test]
    fn test_homing_torpedo_reacquires_lost_target() {
        let (mut world, scheduler) = setup();
        let first = world.spawn_ship(ship("largemerchant", 0.0, 600.0));
        let second = world.spawn_ship(ship("largemerchant", -200.0, 700.0));
        let mut t5 = Torpedo::new(TorpedoType::G7esT5, Vector3::new(0.0, 0.0, -3.0), Angle::new(0.0), 3.0, TorpedoPattern::straight());
        t5.target = Some(first);
        let torpedo = world.spawn_torpedo(t5);
        scheduler.simulate(&mut world, 0.5).unwrap();
        assert_eq!(world.registry().torpedo(torpedo).unwrap().target, Some(first));

        world.registry_mut().body_mut(first).unwrap().kill();
        scheduler.simulate(&mut world, 0.5).unwrap();
        assert_eq!(world.registry().torpedo(torpedo).unwrap().target, Some(second));

        // straight runners never pick a target
        let g7e = world.spawn_torpedo(Torpedo::new(
            TorpedoType::G7e,
            Vector3::new(0.0, 0.0, -3.0),
            Angle::new(0.0),
            3.0,
            TorpedoPattern::straight(),
        ));
        scheduler.simulate(&mut world, 0.5).unwrap();
        assert_eq!(world.registry().torpedo(g7e).unwrap().target, None);
    }

    #[test]
    fn test_convoy_steers_members() {
        let (mut world, scheduler) = setup();
        let member = world.spawn_ship(ship("mediummerchant", 0.0, 0.0));
        let mut convoy = Convoy::new(crate::math::Vector2::zero(), Angle::new(90.0), 3.0);
        convoy.add_merchant(member);
        let convoy = world.spawn_convoy(convoy);
        scheduler.simulate(&mut world, 0.1).unwrap();
        let s = world.registry().ship(member).unwrap();
        assert_eq!(s.convoy, Some(convoy));
        assert_eq!(s.hull.target_heading(), Some(Angle::new(90.0)));
        assert!(s.hull.throttle() > 0.0);
    }
}
