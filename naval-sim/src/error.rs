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
//! Error taxonomy for the simulation core
//!
//! Configuration errors fail world construction, persistence errors fail a
//! load atomically, and simulation errors reject a single operation without
//! touching the rest of the world.

use crate::ecs::{Entity, EntityKind};
use thiserror::Error;

/// Invalid scenario or simulation parameters
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Ship class name not in the catalog
    #[error("unknown ship type: {0}")]
    UnknownShipType(String),

    /// Submarine type name not in the catalog
    #[error("unknown submarine type: {0}")]
    UnknownSubmarineType(String),

    /// Time of day index outside `[0, 4)`
    #[error("time of day {0} out of range, expected 0..4")]
    TimeOfDayOutOfRange(u32),

    /// Worker count that cannot be honored
    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    /// Non-positive or non-finite timestep
    #[error("invalid timestep {0}: must be positive and finite")]
    InvalidTimestep(f64),

    /// Time compression below 1 or non-finite
    #[error("invalid time compression {0}: must be finite and >= 1")]
    InvalidTimeCompression(f64),

    /// Sensor or distance parameter that is not positive and finite
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Name of the parameter
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Environment variable with unparsable content
    #[error("invalid value for environment variable {var}: {value:?}")]
    InvalidEnvironment {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Malformed, truncated or incompatible save data
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// JSON syntax or shape error
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),

    /// Format version that cannot be parsed
    #[error("invalid save format version: {0}")]
    Version(#[from] semver::Error),

    /// Format version from an incompatible major release
    #[error("incompatible save format version {found}, expected {expected}")]
    IncompatibleVersion {
        /// Version found in the file
        found: String,
        /// Version this build writes
        expected: String,
    },

    /// Stored reference index that does not name a saved entity
    #[error("dangling {what} reference index {index}")]
    DanglingReference {
        /// Which reference section
        what: &'static str,
        /// The offending index
        index: u32,
    },

    /// Player entity of a kind that has no save index
    #[error("player of kind {0:?} cannot be saved")]
    UnsupportedPlayer(EntityKind),

    /// Entity record with invalid content
    #[error("invalid {kind:?} record #{index}: {reason}")]
    InvalidRecord {
        /// Kind of the record
        kind: EntityKind,
        /// Position of the record in its section
        index: usize,
        /// Description of the problem
        reason: String,
    },

    /// Configuration error while rebuilding catalog data
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Rejected simulation operation
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// The scheduler was asked to stop at the last tick boundary
    #[error("simulation aborted")]
    Aborted,

    /// Simulation was requested while time is frozen
    #[error("simulation time is frozen")]
    Frozen,

    /// Identity no longer (or never) present in the registry
    #[error("{0} not found")]
    NotFound(Entity),

    /// Command addressed to an entity that cannot execute it
    #[error("{entity} of kind {kind:?} cannot execute {command}")]
    WrongKind {
        /// Target of the command
        entity: Entity,
        /// Its kind
        kind: EntityKind,
        /// Command name
        command: &'static str,
    },

    /// Command accepted by the entity kind but not executable right now
    #[error("command rejected: {0}")]
    Rejected(String),
}

/// Malformed network message framing
#[derive(Debug, Error, PartialEq)]
pub enum NetError {
    /// Message shorter or longer than the fixed tag length
    #[error("message length {0}, expected {1}")]
    WrongLength(usize, usize),

    /// Tag text not in the message table
    #[error("unknown message tag {0:?}")]
    UnknownTag(String),

    /// Payload that is not UTF-8 text
    #[error("message payload is not valid UTF-8")]
    InvalidPayload,
}
