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
//! Per-kind simulation capability
//!
//! Every entity kind implements [`Simulatable`]. The scheduler drives
//! integration through this trait on worker threads, so an implementation
//! may only mutate its own state; everything it needs to know about other
//! entities comes from the read-only [`TickContext`] snapshot.

use crate::ecs::components::Body;
use crate::ecs::Entity;
use crate::math::{Vector2, Vector3};
use std::any::Any;
use std::collections::HashMap;

/// Read-only world snapshot shared by all workers during one tick
#[derive(Debug, Clone, Default)]
pub struct TickContext {
    /// Simulation time at the start of the tick (s since 1939-01-01)
    pub time: f64,
    /// Timestep of this tick (s)
    pub dt: f64,
    /// Wind over the sea surface (m/s)
    pub wind: Vector2,
    /// Whether ships and submarines append a trail sample this tick
    pub record_trail: bool,
    /// Maximum number of trail samples kept per hull
    pub trail_length: usize,
    /// The player entity, excluded from the nearest-contact reduction
    pub player: Option<Entity>,
    /// Position of the player entity, if any
    pub player_position: Option<Vector3>,
    /// Positions of alive ships and submarines at the start of the tick
    pub positions: HashMap<Entity, Vector3>,
}

impl TickContext {
    /// Create a context for a tick of length `dt` starting at `time`
    pub fn new(time: f64, dt: f64) -> Self {
        TickContext {
            time,
            dt,
            ..Default::default()
        }
    }

    /// Position of a hull at the start of the tick
    pub fn position_of(&self, entity: Entity) -> Option<Vector3> {
        self.positions.get(&entity).copied()
    }
}

/// Effect of a collision on one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// The other participant
    pub other: Entity,
    /// Estimated contact point
    pub point: Vector3,
    /// Damage dealt to the receiver
    pub strength: f64,
}

/// Whole-entity snapshot taken before an integration step
///
/// Implemented for every `Clone` entity type.
pub trait Rollback {
    /// Copy the complete entity state
    fn checkpoint(&self) -> Box<dyn Any + Send>;

    /// Restore a state taken by [`Rollback::checkpoint`] on the same type
    fn rollback(&mut self, saved: Box<dyn Any + Send>);
}

impl<T: Clone + Send + 'static> Rollback for T {
    fn checkpoint(&self) -> Box<dyn Any + Send> {
        Box::new(self.clone())
    }

    fn rollback(&mut self, saved: Box<dyn Any + Send>) {
        if let Ok(saved) = saved.downcast::<T>() {
            *self = *saved;
        }
    }
}

/// Capability shared by all simulated entity kinds
pub trait Simulatable: Send + Rollback {
    /// Shared physical state
    fn body(&self) -> &Body;

    /// Mutable shared physical state
    fn body_mut(&mut self) -> &mut Body;

    /// Advance the entity by `ctx.dt` seconds
    ///
    /// Called only for entities that are not defunct. A dead entity uses
    /// this call to finish its death (sinking, fading) and mark itself
    /// defunct.
    fn integrate(&mut self, ctx: &TickContext);

    /// Respond to a collision; the default applies the damage to the body
    fn on_collision(&mut self, impact: &Impact) {
        self.body_mut().damage(impact.strength);
    }

    /// Whether this entity counts as a contact for the nearest-contact
    /// reduction
    fn is_contact(&self) -> bool {
        false
    }

    /// Check if the entity is alive
    fn is_alive(&self) -> bool {
        self.body().is_alive()
    }
}

/// Integrate one entity, refusing to commit a non-finite state
///
/// A rejected step restores the whole entity, kind-specific state
/// included, and leaves it at rest. Life-cycle progress made during the
/// step is kept. Returns false if the entity was skipped or its result was
/// rejected.
pub fn integrate_checked(entity: Entity, item: &mut dyn Simulatable, ctx: &TickContext) -> bool {
    if item.body().is_defunct() {
        return false;
    }
    let before = item.checkpoint();
    item.integrate(ctx);
    if item.body().is_valid() {
        return true;
    }

    log::warn!("integration produced invalid state for {}, state reverted", entity);
    let alive = item.body().alive_state();
    item.rollback(before);
    let body = item.body_mut();
    body.velocity = Vector3::zero();
    // keep life-cycle progress made during the rejected step
    if alive > body.alive_state() {
        body.set_alive_state(alive);
    }
    false
}
