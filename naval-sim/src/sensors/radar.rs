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
//! Surface search radar

use crate::bodies::submarine::SUBMERGED_DEPTH;
use crate::ecs::{Entity, EntityKind};
use crate::world::World;

/// Surfaced ships and submarines within radar range of `observer`
///
/// A submerged submarine cannot use its radar and gets no contacts.
pub fn radar_contacts(world: &World, observer: Entity) -> Vec<Entity> {
    let registry = world.registry();
    let Some(from) = registry.body(observer) else {
        return Vec::new();
    };
    if !from.is_alive() || from.depth() > SUBMERGED_DEPTH {
        return Vec::new();
    }
    let origin = from.position.xy();
    let range = world.config().radar_range;

    let mut contacts = Vec::new();
    for kind in [EntityKind::Ship, EntityKind::Submarine] {
        registry.for_each(kind, |entity, item| {
            let body = item.body();
            if entity != observer
                && body.is_alive()
                && body.depth() <= SUBMERGED_DEPTH
                && body.position.xy().distance(origin) <= range
            {
                contacts.push(entity);
            }
        });
    }
    contacts
}
