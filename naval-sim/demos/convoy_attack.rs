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
//! Convoy attack demo
//!
//! Generates a custom mission, closes on the nearest merchant and fires
//! a spread of torpedoes at it, then prints the journal and logbook.

use naval_sim::bodies::{ShipRole, TorpedoPattern};
use naval_sim::commands::{apply_command, Command};
use naval_sim::config::{GroupSize, ScenarioConfig, SimConfig};
use naval_sim::ecs::scheduler::Scheduler;
use naval_sim::ecs::{Entity, Simulatable};
use naval_sim::math::Angle;
use naval_sim::scenario::create_custom_mission;
use naval_sim::world::World;

fn nearest_merchant(world: &World, player: Entity) -> Option<Entity> {
    let origin = world.registry().body(player)?.position.xy();
    world
        .registry()
        .ships()
        .iter()
        .filter(|(_, ship)| ship.class().role == ShipRole::Merchant && ship.body().is_alive())
        .map(|(e, ship)| (e, ship.body().position.xy().distance(origin)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Naval Sim - Convoy Attack Demo");
    println!("==============================\n");

    let config = SimConfig::default().with_time_compression(8.0);
    let scenario = ScenarioConfig {
        convoy_size: GroupSize::Medium,
        escort_size: GroupSize::Small,
        ..ScenarioConfig::default()
    };
    let mut world = create_custom_mission(&scenario, config.clone())?;
    let scheduler = Scheduler::new(&config)?;
    println!(
        "Mission created: {} entities, {} workers ({})",
        world.registry().len(),
        scheduler.workers(),
        if scheduler.is_parallel() { "parallel" } else { "serial" }
    );

    let player = world.player().ok_or("mission has no player")?;
    let target = nearest_merchant(&world, player).ok_or("convoy has no merchants")?;
    println!("Player {} targeting {}", player, target);

    // Close to firing range on the surface
    apply_command(&mut world, player, Command::SetThrottle(1.0))?;
    for _ in 0..120 {
        let own = world.registry().body(player).ok_or("player lost")?.position.xy();
        let Some(aim) = world.registry().body(target).map(|b| b.position.xy()) else {
            break;
        };
        apply_command(&mut world, player, Command::HeadTo(Angle::from_direction(aim - own)))?;
        if own.distance(aim) < 1_500.0 {
            break;
        }
        scheduler.simulate(&mut world, 1.0)?;
    }

    println!("Firing at t = {:.0} s", world.time());
    for lead in [-2.0, 0.0, 2.0] {
        let fired = apply_command(
            &mut world,
            player,
            Command::FireTorpedo {
                tube: None,
                target: Some(target),
                lead_angle: Angle::new(lead),
                pattern: TorpedoPattern::straight(),
            },
        )?;
        if let Some(torpedo) = fired {
            println!("  torpedo {} away", torpedo);
        }
    }

    for _ in 0..60 {
        scheduler.simulate(&mut world, 1.0)?;
        if !world.run_state().is_running() {
            break;
        }
    }

    println!("\nJournal:");
    for event in world.journal().events() {
        println!("  [{:>9.1}] {:?}", event.time, event.kind);
    }
    println!("\nLogbook:");
    for entry in world.logbook().entries() {
        println!("  [{}] {}", entry.date, entry.text);
    }
    println!("\nRun state: {:?}, score {}", world.run_state(), world.score());
    Ok(())
}
