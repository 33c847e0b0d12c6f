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
//! Collision resolution seen through whole ticks

use naval_sim::bodies::{GunShell, Ship, Submarine, Torpedo, TorpedoPattern, TorpedoType};
use naval_sim::config::SimConfig;
use naval_sim::ecs::scheduler::Scheduler;
use naval_sim::ecs::Entity;
use naval_sim::journal::EventKind;
use naval_sim::math::{Angle, Vector3};
use naval_sim::world::World;

fn setup() -> (World, Scheduler) {
    let config = SimConfig::default().with_workers(2);
    (World::new(config.clone()).unwrap(), Scheduler::new(&config).unwrap())
}

fn corvette(world: &mut World, y: f64) -> Entity {
    world.spawn_ship(Ship::from_class_name("corvette", Vector3::new(0.0, y, 0.0), Angle::new(90.0)).unwrap())
}

fn damage(world: &World, e: Entity) -> f64 {
    world.registry().body(e).unwrap().health.damage_fraction()
}

#[test]
fn test_shell_hits_only_first_overlap_in_registry_order() {
    let (mut world, scheduler) = setup();
    // spawned first, but further along the shell's path
    let far = corvette(&mut world, 30.0);
    let near = corvette(&mut world, 12.0);
    // a flat shot crossing both hulls within one 0.1 s tick
    world.spawn_gun_shell(GunShell::new(Vector3::new(0.0, 0.0, 5.0), Angle::new(0.0), Angle::new(-1.0), 400.0));

    let report = scheduler.simulate(&mut world, 0.1).unwrap();
    assert_eq!(report.ticks, 1);
    assert_eq!(report.collisions, 1);
    assert!(damage(&world, far) > 0.0);
    assert_eq!(damage(&world, near), 0.0);
    assert_eq!(world.registry().gun_shells().len(), 0);
    let hits = world
        .journal()
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::ShellImpact { hit: true, .. }))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn test_ships_are_tested_before_submarines() {
    let (mut world, scheduler) = setup();
    let sub = world.spawn_submarine(
        Submarine::from_type_name("typeVIIc", Vector3::new(0.0, 12.0, 0.0), Angle::new(90.0)).unwrap(),
    );
    let ship = corvette(&mut world, 30.0);
    world.spawn_gun_shell(GunShell::new(Vector3::new(0.0, 0.0, 3.0), Angle::new(0.0), Angle::new(-1.0), 400.0));
    scheduler.simulate(&mut world, 0.1).unwrap();
    assert!(damage(&world, ship) > 0.0);
    assert_eq!(damage(&world, sub), 0.0);
}

#[test]
fn test_torpedo_sinks_merchant() {
    let (mut world, scheduler) = setup();
    let target = world.spawn_ship(Ship::from_class_name("smallmerchant", Vector3::zero(), Angle::new(90.0)).unwrap());
    let mut torpedo = Torpedo::new(
        TorpedoType::G7a,
        Vector3::new(0.0, -600.0, -3.0),
        Angle::new(0.0),
        3.0,
        TorpedoPattern::straight(),
    );
    torpedo.target = Some(target);
    world.spawn_torpedo(torpedo);

    for _ in 0..30 {
        scheduler.simulate(&mut world, 1.0).unwrap();
    }
    assert!(world.registry().torpedoes().is_empty());
    assert!(world
        .journal()
        .events()
        .iter()
        .any(|e| matches!(&e.kind, EventKind::TorpedoHit { target, .. } if target.contains("merchant"))));
    assert!(damage(&world, target) > 0.0);
}

#[test]
fn test_ramming_separates_and_damages_both() {
    let (mut world, scheduler) = setup();
    let mut a = Ship::from_class_name("corvette", Vector3::new(0.0, -4.0, 0.0), Angle::new(90.0)).unwrap();
    a.hull.body.velocity = Vector3::new(0.0, 4.0, 0.0);
    let mut b = Ship::from_class_name("corvette", Vector3::new(0.0, 4.0, 0.0), Angle::new(90.0)).unwrap();
    b.hull.body.velocity = Vector3::new(0.0, -4.0, 0.0);
    let a = world.spawn_ship(a);
    let b = world.spawn_ship(b);

    scheduler.simulate(&mut world, 0.1).unwrap();
    let pa = world.registry().body(a).unwrap().position;
    let pb = world.registry().body(b).unwrap().position;
    assert!(pb.y - pa.y >= 10.0 - 1e-9);
    assert!(damage(&world, a) > 0.0);
    assert_eq!(damage(&world, a), damage(&world, b));
}
