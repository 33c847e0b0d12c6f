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
//! Sensor queries over a running world

use naval_sim::bodies::{Ship, Submarine};
use naval_sim::config::SimConfig;
use naval_sim::ecs::scheduler::Scheduler;
use naval_sim::ecs::Entity;
use naval_sim::environment::{Environment, Weather};
use naval_sim::math::{Angle, Vector3};
use naval_sim::sensors::{
    listen, passive_contacts, ping_asdic, radar_contacts, visible_objects, visual_range, PING_REMAIN_TIME,
};
use naval_sim::world::World;

fn setup() -> (World, Scheduler) {
    let config = SimConfig::default().with_workers(1);
    (World::new(config.clone()).unwrap(), Scheduler::new(&config).unwrap())
}

fn merchant(world: &mut World, x: f64, y: f64) -> Entity {
    let mut ship = Ship::from_class_name("mediummerchant", Vector3::new(x, y, 0.0), Angle::new(0.0)).unwrap();
    ship.hull.set_throttle(1.0);
    ship.hull.body.velocity = Vector3::new(0.0, 5.0, 0.0);
    world.spawn_ship(ship)
}

fn sub_at(world: &mut World, y: f64, depth: f64) -> Entity {
    world.spawn_submarine(
        Submarine::from_type_name("typeVIIc", Vector3::new(0.0, y, -depth), Angle::new(0.0)).unwrap(),
    )
}

#[test]
fn test_queries_are_idempotent_between_ticks() {
    let (mut world, scheduler) = setup();
    world.set_time(12.0 * 3_600.0);
    let escort = world.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
    merchant(&mut world, 1_000.0, 3_000.0);
    merchant(&mut world, -2_000.0, 500.0);
    sub_at(&mut world, 4_000.0, 0.0);
    scheduler.simulate(&mut world, 2.0).unwrap();

    assert_eq!(visible_objects(&world, escort), visible_objects(&world, escort));
    assert_eq!(passive_contacts(&world, escort), passive_contacts(&world, escort));
    assert_eq!(radar_contacts(&world, escort), radar_contacts(&world, escort));
    assert_eq!(
        listen(&world, escort, Angle::new(30.0)),
        listen(&world, escort, Angle::new(30.0))
    );
    assert_eq!(radar_contacts(&world, escort).len(), 3);
}

#[test]
fn test_deep_submarine_is_harder_to_hear() {
    let mut strengths = Vec::new();
    for depth in [0.0, 50.0, 200.0] {
        let (mut world, _) = setup();
        let listener = merchant(&mut world, 0.0, 0.0);
        let sub = sub_at(&mut world, 1_500.0, depth);
        world
            .registry_mut()
            .submarine_mut(sub)
            .unwrap()
            .hull
            .set_throttle(0.5);
        strengths.push(listen(&world, listener, Angle::new(0.0)).unwrap().strength);
    }
    assert!(strengths[1] <= strengths[0]);
    assert!(strengths[2] <= strengths[1]);
}

#[test]
fn test_weather_limits_view() {
    let (mut world, _) = setup();
    world.set_time(12.0 * 3_600.0);
    let target = merchant(&mut world, 0.0, 0.0);
    world.set_environment(Environment::new(Weather::Sunny, Angle::new(0.0)));
    let clear = visual_range(&world, target).unwrap();
    world.set_environment(Environment::new(Weather::Storm, Angle::new(0.0)));
    let fog = visual_range(&world, target).unwrap();
    assert!(fog < clear);
}

#[test]
fn test_pings_expire() {
    let (mut world, scheduler) = setup();
    let escort = world.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
    sub_at(&mut world, 600.0, 60.0);
    let contacts = ping_asdic(&mut world, escort, None).unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(world.pings().len(), 1);

    scheduler.simulate(&mut world, PING_REMAIN_TIME * 0.5).unwrap();
    assert_eq!(world.pings().len(), 1);
    scheduler.simulate(&mut world, PING_REMAIN_TIME * 1.5).unwrap();
    assert!(world.pings().is_empty());
}

#[test]
fn test_destroyed_observer_cannot_ping() {
    let (mut world, _) = setup();
    let sub = sub_at(&mut world, 0.0, 30.0);
    world.registry_mut().body_mut(sub).unwrap().kill();
    assert!(ping_asdic(&mut world, sub, None).is_err());
}
