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
//! Entity registry: one generational arena per kind
//!
//! The registry is the sole owner of every entity. Other entities refer to
//! each other through [`Entity`] identities, which degrade to "not found"
//! once their referent has been evicted.

use crate::bodies::{
    Airplane, Convoy, DepthCharge, GunShell, Particle, Ship, Submarine, Torpedo, WaterSplash,
};
use crate::ecs::arena::Arena;
use crate::ecs::components::Body;
use crate::ecs::system::Simulatable;
use crate::ecs::{Entity, EntityKind};

/// An entity value of any kind, ready to be spawned
#[derive(Debug, Clone)]
pub enum EntityData {
    /// Surface ship
    Ship(Ship),
    /// Submarine
    Submarine(Submarine),
    /// Airplane
    Airplane(Airplane),
    /// Torpedo
    Torpedo(Torpedo),
    /// Depth charge
    DepthCharge(DepthCharge),
    /// Gun shell
    GunShell(GunShell),
    /// Water splash
    WaterSplash(WaterSplash),
    /// Convoy
    Convoy(Convoy),
    /// Particle
    Particle(Particle),
}

impl EntityData {
    /// Kind of the wrapped value
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Ship(_) => EntityKind::Ship,
            EntityData::Submarine(_) => EntityKind::Submarine,
            EntityData::Airplane(_) => EntityKind::Airplane,
            EntityData::Torpedo(_) => EntityKind::Torpedo,
            EntityData::DepthCharge(_) => EntityKind::DepthCharge,
            EntityData::GunShell(_) => EntityKind::GunShell,
            EntityData::WaterSplash(_) => EntityKind::WaterSplash,
            EntityData::Convoy(_) => EntityKind::Convoy,
            EntityData::Particle(_) => EntityKind::Particle,
        }
    }
}

macro_rules! entity_data_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for EntityData {
                fn from(value: $variant) -> Self {
                    EntityData::$variant(value)
                }
            }
        )*
    };
}

entity_data_from!(Ship, Submarine, Airplane, Torpedo, DepthCharge, GunShell, WaterSplash, Convoy, Particle);

/// Expand `$body` once per kind with `$arena` bound to that kind's arena
macro_rules! with_arena {
    (@go [$($m:tt)*] $self:ident, $kind:expr, $arena:ident, $body:expr) => {
        match $kind {
            EntityKind::Ship => {
                let $arena = &$($m)* $self.ships;
                $body
            }
            EntityKind::Submarine => {
                let $arena = &$($m)* $self.submarines;
                $body
            }
            EntityKind::Airplane => {
                let $arena = &$($m)* $self.airplanes;
                $body
            }
            EntityKind::Torpedo => {
                let $arena = &$($m)* $self.torpedoes;
                $body
            }
            EntityKind::DepthCharge => {
                let $arena = &$($m)* $self.depth_charges;
                $body
            }
            EntityKind::GunShell => {
                let $arena = &$($m)* $self.gun_shells;
                $body
            }
            EntityKind::WaterSplash => {
                let $arena = &$($m)* $self.water_splashes;
                $body
            }
            EntityKind::Convoy => {
                let $arena = &$($m)* $self.convoys;
                $body
            }
            EntityKind::Particle => {
                let $arena = &$($m)* $self.particles;
                $body
            }
        }
    };
    (mut $self:ident, $kind:expr, |$arena:ident| $body:expr) => {
        with_arena!(@go [mut] $self, $kind, $arena, $body)
    };
    ($self:ident, $kind:expr, |$arena:ident| $body:expr) => {
        with_arena!(@go [] $self, $kind, $arena, $body)
    };
}

/// Typed accessors for one arena
macro_rules! typed_access {
    ($field:ident, $field_mut:ident, $get:ident, $get_mut:ident, $ty:ty) => {
        /// Arena holding this kind
        pub fn $field(&self) -> &Arena<$ty> {
            &self.$field
        }

        /// Mutable arena holding this kind
        pub fn $field_mut(&mut self) -> &mut Arena<$ty> {
            &mut self.$field
        }

        /// Look up an entity of this kind
        pub fn $get(&self, entity: Entity) -> Option<&$ty> {
            self.$field.get(entity)
        }

        /// Look up an entity of this kind mutably
        pub fn $get_mut(&mut self, entity: Entity) -> Option<&mut $ty> {
            self.$field.get_mut(entity)
        }
    };
}

/// Owner of every live entity, grouped by kind
#[derive(Debug, Clone)]
pub struct Registry {
    ships: Arena<Ship>,
    submarines: Arena<Submarine>,
    airplanes: Arena<Airplane>,
    torpedoes: Arena<Torpedo>,
    depth_charges: Arena<DepthCharge>,
    gun_shells: Arena<GunShell>,
    water_splashes: Arena<WaterSplash>,
    convoys: Arena<Convoy>,
    particles: Arena<Particle>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Registry {
            ships: Arena::new(EntityKind::Ship),
            submarines: Arena::new(EntityKind::Submarine),
            airplanes: Arena::new(EntityKind::Airplane),
            torpedoes: Arena::new(EntityKind::Torpedo),
            depth_charges: Arena::new(EntityKind::DepthCharge),
            gun_shells: Arena::new(EntityKind::GunShell),
            water_splashes: Arena::new(EntityKind::WaterSplash),
            convoys: Arena::new(EntityKind::Convoy),
            particles: Arena::new(EntityKind::Particle),
        }
    }

    /// Take ownership of an entity and return its identity
    pub fn spawn(&mut self, data: impl Into<EntityData>) -> Entity {
        match data.into() {
            EntityData::Ship(v) => self.ships.insert(v),
            EntityData::Submarine(v) => self.submarines.insert(v),
            EntityData::Airplane(v) => self.airplanes.insert(v),
            EntityData::Torpedo(v) => self.torpedoes.insert(v),
            EntityData::DepthCharge(v) => self.depth_charges.insert(v),
            EntityData::GunShell(v) => self.gun_shells.insert(v),
            EntityData::WaterSplash(v) => self.water_splashes.insert(v),
            EntityData::Convoy(v) => self.convoys.insert(v),
            EntityData::Particle(v) => self.particles.insert(v),
        }
    }

    /// Check whether the identity names a stored entity
    pub fn contains(&self, entity: Entity) -> bool {
        with_arena!(self, entity.kind(), |arena| arena.contains(entity))
    }

    /// Look up any entity through its simulation capability
    pub fn get(&self, entity: Entity) -> Option<&dyn Simulatable> {
        with_arena!(self, entity.kind(), |arena| arena
            .get(entity)
            .map(|v| v as &dyn Simulatable))
    }

    /// Look up any entity mutably through its simulation capability
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut dyn Simulatable> {
        with_arena!(mut self, entity.kind(), |arena| arena
            .get_mut(entity)
            .map(|v| v as &mut dyn Simulatable))
    }

    /// Shared body state of any entity
    pub fn body(&self, entity: Entity) -> Option<&Body> {
        self.get(entity).map(|v| v.body())
    }

    /// Mutable body state of any entity
    pub fn body_mut(&mut self, entity: Entity) -> Option<&mut Body> {
        self.get_mut(entity).map(|v| v.body_mut())
    }

    typed_access!(ships, ships_mut, ship, ship_mut, Ship);
    typed_access!(submarines, submarines_mut, submarine, submarine_mut, Submarine);
    typed_access!(airplanes, airplanes_mut, airplane, airplane_mut, Airplane);
    typed_access!(torpedoes, torpedoes_mut, torpedo, torpedo_mut, Torpedo);
    typed_access!(depth_charges, depth_charges_mut, depth_charge, depth_charge_mut, DepthCharge);
    typed_access!(gun_shells, gun_shells_mut, gun_shell, gun_shell_mut, GunShell);
    typed_access!(water_splashes, water_splashes_mut, water_splash, water_splash_mut, WaterSplash);
    typed_access!(convoys, convoys_mut, convoy, convoy_mut, Convoy);
    typed_access!(particles, particles_mut, particle, particle_mut, Particle);

    /// Visit every non-defunct entity of `kind` in registry order
    pub fn for_each<F>(&self, kind: EntityKind, mut f: F)
    where
        F: FnMut(Entity, &dyn Simulatable),
    {
        with_arena!(self, kind, |arena| {
            for (entity, value) in arena.iter() {
                if !value.body().is_defunct() {
                    f(entity, value);
                }
            }
        })
    }

    /// Number of stored entities of `kind`, including defunct ones
    pub fn len_of(&self, kind: EntityKind) -> usize {
        with_arena!(self, kind, |arena| arena.len())
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        EntityKind::ALL.iter().map(|&k| self.len_of(k)).sum()
    }

    /// Check if the registry holds no entity
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every non-defunct entity eligible for integration, in kind order
    ///
    /// With `gameplay == false` only cosmetic kinds are returned; this is
    /// used once the run state has left `running`.
    pub fn simulatables(&mut self, gameplay: bool) -> Vec<(Entity, &mut dyn Simulatable)> {
        let mut items: Vec<(Entity, &mut dyn Simulatable)> = Vec::with_capacity(self.len());

        macro_rules! collect {
            ($($arena:expr),*) => {
                $(
                    if gameplay || $arena.kind().is_cosmetic() {
                        for (entity, value) in $arena.iter_mut() {
                            if !value.body().is_defunct() {
                                items.push((entity, value as &mut dyn Simulatable));
                            }
                        }
                    }
                )*
            };
        }

        collect!(
            self.ships,
            self.submarines,
            self.airplanes,
            self.torpedoes,
            self.depth_charges,
            self.gun_shells,
            self.water_splashes,
            self.convoys,
            self.particles
        );
        items
    }

    /// Remove every defunct entity and return the evicted identities
    ///
    /// Convoys drop evicted members; a convoy left without members dies.
    pub fn evict_defunct(&mut self) -> Vec<Entity> {
        let mut evicted = Vec::new();
        evicted.extend(self.ships.evict(|v| v.body().is_defunct()));
        evicted.extend(self.submarines.evict(|v| v.body().is_defunct()));
        evicted.extend(self.airplanes.evict(|v| v.body().is_defunct()));
        evicted.extend(self.torpedoes.evict(|v| v.body().is_defunct()));
        evicted.extend(self.depth_charges.evict(|v| v.body().is_defunct()));
        evicted.extend(self.gun_shells.evict(|v| v.body().is_defunct()));
        evicted.extend(self.water_splashes.evict(|v| v.body().is_defunct()));
        evicted.extend(self.convoys.evict(|v| v.body().is_defunct()));
        evicted.extend(self.particles.evict(|v| v.body().is_defunct()));

        let ships = &self.ships;
        for (_, convoy) in self.convoys.iter_mut() {
            convoy.retain_members(|e| ships.contains(e));
            if convoy.is_empty() && convoy.body.is_alive() {
                convoy.body.kill();
            }
        }

        if !evicted.is_empty() {
            log::debug!("evicted {} defunct entities", evicted.len());
        }
        evicted
    }

    /// Remove every entity
    pub fn clear(&mut self) {
        self.ships.clear();
        self.submarines.clear();
        self.airplanes.clear();
        self.torpedoes.clear();
        self.depth_charges.clear();
        self.gun_shells.clear();
        self.water_splashes.clear();
        self.convoys.clear();
        self.particles.clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
