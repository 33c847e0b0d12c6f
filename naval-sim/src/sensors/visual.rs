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
//! Visual detection
//!
//! Range scales with the weather and daylight dependent maximum view
//! distance and the target's silhouette. There is no occlusion.

use crate::bodies::submarine::SUBMERGED_DEPTH;
use crate::ecs::components::Extents;
use crate::ecs::{Entity, EntityKind};
use crate::world::World;

/// Silhouette area (m²) seen at the full view distance
const REFERENCE_SILHOUETTE: f64 = 100.0 * 15.0;

/// Fraction of the view distance at which a raised periscope is seen
const PERISCOPE_FACTOR: f64 = 0.05;

fn size_factor(extents: &Extents) -> f64 {
    (extents.length * (extents.height + 1.0) / REFERENCE_SILHOUETTE)
        .sqrt()
        .clamp(0.2, 1.5)
}

/// Distance at which `target` can be seen, or `None` if it is hidden
pub fn visual_range(world: &World, target: Entity) -> Option<f64> {
    let registry = world.registry();
    let body = registry.body(target)?;
    if body.is_defunct() {
        return None;
    }
    let base = world.environment().max_view_distance(world.time());
    match target.kind() {
        EntityKind::Ship => Some(base * size_factor(&body.extents)),
        EntityKind::Submarine => {
            let sub = registry.submarine(target)?;
            if body.depth() <= SUBMERGED_DEPTH {
                Some(base * size_factor(&body.extents) * 0.5)
            } else if sub.is_scope_up() && body.depth() <= sub.sub_type().periscope_depth {
                Some(base * PERISCOPE_FACTOR)
            } else {
                None
            }
        }
        EntityKind::Airplane => Some(base * 0.6),
        EntityKind::GunShell => Some(base * 0.1),
        EntityKind::WaterSplash => Some(base * 0.5),
        EntityKind::Particle => Some(base * 0.3),
        EntityKind::Torpedo | EntityKind::DepthCharge | EntityKind::Convoy => None,
    }
}

fn observer_has_eyes(world: &World, observer: Entity) -> bool {
    match world.registry().submarine(observer) {
        Some(sub) => !sub.is_submerged() || sub.can_see_through_periscope(),
        None => world.registry().body(observer).map_or(false, |b| !b.is_defunct()),
    }
}

/// Check if `observer` sees `target`
pub fn can_see(world: &World, observer: Entity, target: Entity) -> bool {
    if observer == target || !observer_has_eyes(world, observer) {
        return false;
    }
    let registry = world.registry();
    let (Some(from), Some(to)) = (registry.body(observer), registry.body(target)) else {
        return false;
    };
    let distance = from.position.xy().distance(to.position.xy());
    visual_range(world, target).map_or(false, |range| distance <= range)
}

/// Everything `observer` sees, in registry order
pub fn visible_objects(world: &World, observer: Entity) -> Vec<Entity> {
    let mut seen = Vec::new();
    if !observer_has_eyes(world, observer) {
        return seen;
    }
    let kinds = [
        EntityKind::Ship,
        EntityKind::Submarine,
        EntityKind::Airplane,
        EntityKind::GunShell,
        EntityKind::WaterSplash,
    ];
    for kind in kinds {
        world.registry().for_each(kind, |entity, _| {
            if can_see(world, observer, entity) {
                seen.push(entity);
            }
        });
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{Ship, Submarine};
    use crate::config::SimConfig;
    use crate::environment::{Environment, Weather};
    use crate::math::{Angle, Vector3};

    fn world() -> World {
        let mut world = World::new(SimConfig::default().with_workers(1)).unwrap();
        world.set_environment(Environment::new(Weather::Sunny, Angle::new(0.0)));
        world.set_time(crate::time::GameDate::new(1941, 6, 1).with_time(12, 0, 0).to_time());
        world
    }

    #[test]
    fn test_large_ship_seen_further_than_small() {
        let mut w = world();
        let big = w.spawn_ship(Ship::from_class_name("battleshipmalaya", Vector3::zero(), Angle::new(0.0)).unwrap());
        let small = w.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
        assert!(visual_range(&w, big).unwrap() > visual_range(&w, small).unwrap());
    }

    #[test]
    fn test_night_reduces_range() {
        let mut w = world();
        let ship = w.spawn_ship(Ship::from_class_name("largemerchant", Vector3::zero(), Angle::new(0.0)).unwrap());
        let day = visual_range(&w, ship).unwrap();
        w.set_time(crate::time::GameDate::new(1941, 6, 1).with_time(0, 0, 0).to_time());
        assert!(visual_range(&w, ship).unwrap() < day * 0.5);
    }

    #[test]
    fn test_submerged_submarine_hidden() {
        let mut w = world();
        let ship = w.spawn_ship(Ship::from_class_name("largemerchant", Vector3::zero(), Angle::new(0.0)).unwrap());
        let sub = w.spawn_submarine(
            Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 2_000.0, -50.0), Angle::new(0.0)).unwrap(),
        );
        assert!(visual_range(&w, sub).is_none());
        assert!(!can_see(&w, ship, sub));
        // a deep boat cannot see the surface either
        assert!(visible_objects(&w, sub).is_empty());
    }

    #[test]
    fn test_visible_objects_idempotent() {
        let mut w = world();
        let observer = w.spawn_ship(Ship::from_class_name("destroyertribal", Vector3::zero(), Angle::new(0.0)).unwrap());
        let near = w.spawn_ship(Ship::from_class_name("largemerchant", Vector3::new(0.0, 5_000.0, 0.0), Angle::new(0.0)).unwrap());
        w.spawn_ship(Ship::from_class_name("smallmerchant", Vector3::new(0.0, 200_000.0, 0.0), Angle::new(0.0)).unwrap());
        let first = visible_objects(&w, observer);
        assert_eq!(first, vec![near]);
        assert_eq!(visible_objects(&w, observer), first);
    }
}
