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
//! Entity identities
//!
//! Entities are lightweight generational handles into the registry. A handle
//! names its kind, a slot index within that kind's arena and the generation
//! of the slot. Eviction bumps the generation, so a handle captured before
//! eviction never aliases an entity spawned later into the same slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot index of an entity inside its kind's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Create a new EntityId from a raw slot index
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    /// Get the raw slot index
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of simulated entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Surface ship (merchant or warship)
    Ship,
    /// Submarine
    Submarine,
    /// Airplane
    Airplane,
    /// Torpedo
    Torpedo,
    /// Depth charge
    DepthCharge,
    /// Gun shell
    GunShell,
    /// Cosmetic water splash
    WaterSplash,
    /// Convoy reference point with member ships
    Convoy,
    /// Cosmetic particle
    Particle,
}

impl EntityKind {
    /// All kinds in registry iteration order
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Ship,
        EntityKind::Submarine,
        EntityKind::Airplane,
        EntityKind::Torpedo,
        EntityKind::DepthCharge,
        EntityKind::GunShell,
        EntityKind::WaterSplash,
        EntityKind::Convoy,
        EntityKind::Particle,
    ];

    /// Cosmetic kinds keep animating after the run state left `running`
    /// and never take part in collisions
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, EntityKind::WaterSplash | EntityKind::Particle)
    }
}

/// Entity handle with generational index support for safe references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    kind: EntityKind,
    id: EntityId,
    generation: u32,
}

impl Entity {
    /// Create a new entity handle
    pub fn new(kind: EntityKind, id: u32, generation: u32) -> Self {
        Entity {
            kind,
            id: EntityId::new(id),
            generation,
        }
    }

    /// Get the entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Get the slot ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the generation number
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({}, gen: {})", self.kind, self.id.0, self.generation)
    }
}

/// Life-cycle state of an entity
///
/// Transitions are monotonic: `Alive -> Dead -> Defunct`. A dead entity is
/// still visible for one more tick (death effects); a defunct one is ignored
/// by every core operation and evicted at the next tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AliveState {
    /// Normal operation
    #[default]
    Alive,
    /// Destroyed but still observable
    Dead,
    /// Awaiting eviction
    Defunct,
}
