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
//! # Naval Sim
//!
//! World-simulation core of a real-time naval combat game: ships,
//! submarines, airplanes and their weapons advanced on a parallel
//! scheduler, with collisions, sensors and save games.
//!
//! ## Features
//!
//! - **Generational registry**: per-kind arenas with identities that never alias after eviction
//! - **Physics bodies**: hull dynamics, dive planes, closed-form shell ballistics, pattern-running torpedoes
//! - **Parallel ticks**: optional Rayon integration of entity partitions, serial collision and effects
//! - **Sensors**: visual range, passive and active sonar, radar
//! - **Persistence**: versioned JSON saves with cross references resolved in two passes
//!
//! ## Example
//!
//! ```rust
//! use naval_sim::bodies::{Ship, Submarine};
//! use naval_sim::config::SimConfig;
//! use naval_sim::ecs::scheduler::Scheduler;
//! use naval_sim::math::{Angle, Vector3};
//! use naval_sim::world::World;
//!
//! let config = SimConfig::default().with_workers(2);
//! let mut world = World::new(config.clone()).unwrap();
//! let scheduler = Scheduler::new(&config).unwrap();
//!
//! let sub = Submarine::from_type_name("typeVIIc", Vector3::new(0.0, -3_000.0, 0.0), Angle::new(0.0)).unwrap();
//! let player = world.spawn_submarine(sub);
//! world.set_player(player).unwrap();
//! let ship = Ship::from_class_name("largemerchant", Vector3::zero(), Angle::new(90.0)).unwrap();
//! world.spawn_ship(ship);
//!
//! let report = scheduler.simulate(&mut world, 1.0).unwrap();
//! assert_eq!(report.ticks, 10);
//! assert!(world.nearest_contact().is_some());
//! ```

#![warn(missing_docs)]

/// Vectors, angles and quaternions
pub mod math;

/// Error types
pub mod error;

/// Engine and scenario configuration
pub mod config;

/// Simulation time, calendar dates and wall clocks
pub mod time;

/// Weather, wind and daylight
pub mod environment;

/// Event journal, logbook and sink records
pub mod journal;

/// Numerical integration helpers
pub mod integration;

/// Entity storage and tick execution
pub mod ecs;

/// Per-kind physics bodies
pub mod bodies;

/// Collision detection and response
pub mod collision;

/// Visual, sonar and radar queries
pub mod sensors;

/// World state and serial tick phases
pub mod world;

/// Periodic callbacks
pub mod jobs;

/// Highscore list
pub mod highscore;

/// Player and AI commands
pub mod commands;

/// Save and restore
pub mod persistence;

/// Custom mission setup
pub mod scenario;

/// Network message shapes
pub mod network;

pub use ecs::{Entity, EntityKind};
pub use world::World;
