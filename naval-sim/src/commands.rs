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
//! Player and AI commands
//!
//! A [`Command`] mutates one entity synchronously. Weapon commands spawn
//! the projectile into the world and return its identity.

use crate::bodies::{DepthCharge, GunShell, TorpedoPattern};
use crate::ecs::{Entity, EntityKind};
use crate::error::SimError;
use crate::math::{Angle, Vector3};
use crate::world::World;

/// Height above the waterline shells leave the barrel at (m)
const GUN_HEIGHT: f64 = 4.0;

/// A command addressed to one entity
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Airplane: roll to port
    RollLeft,
    /// Airplane: roll to starboard
    RollRight,
    /// Airplane: stop rolling
    RollZero,
    /// Airplane: nose up
    PitchUp,
    /// Airplane: nose down
    PitchDown,
    /// Airplane: stop pitching
    PitchZero,
    /// Ship or submarine: throttle, clamped to [-0.5, 1]
    SetThrottle(f64),
    /// Ship or submarine: rudder in [-1, 1]
    SetRudder(f64),
    /// Ship or submarine: steer to a heading
    HeadTo(Angle),
    /// Submarine: hold a depth (m)
    DiveToDepth(f64),
    /// Submarine: raise the periscope
    PeriscopeUp,
    /// Submarine: lower the periscope
    PeriscopeDown,
    /// Submarine: raise or lower the snorkel
    Snorkel(bool),
    /// Submarine: launch a torpedo
    FireTorpedo {
        /// Storage slot of the tube; `None` picks the first loaded tube
        tube: Option<usize>,
        /// Homing target
        target: Option<Entity>,
        /// Angle added to the launch heading
        lead_angle: Angle,
        /// Pattern run settings
        pattern: TorpedoPattern,
    },
    /// Ship or surfaced submarine: fire the deck gun
    FireShell {
        /// Bearing of the shot
        direction: Angle,
        /// Barrel elevation
        elevation: Angle,
        /// Muzzle velocity (m/s)
        muzzle_velocity: f64,
    },
    /// Ship: roll a depth charge off the stern
    DropDepthCharge {
        /// Pistol depth (m)
        depth: f64,
    },
}

impl Command {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Command::RollLeft => "roll_left",
            Command::RollRight => "roll_right",
            Command::RollZero => "roll_zero",
            Command::PitchUp => "pitch_up",
            Command::PitchDown => "pitch_down",
            Command::PitchZero => "pitch_zero",
            Command::SetThrottle(_) => "set_throttle",
            Command::SetRudder(_) => "set_rudder",
            Command::HeadTo(_) => "head_to",
            Command::DiveToDepth(_) => "dive_to_depth",
            Command::PeriscopeUp => "periscope_up",
            Command::PeriscopeDown => "periscope_down",
            Command::Snorkel(_) => "snorkel",
            Command::FireTorpedo { .. } => "fire_torpedo",
            Command::FireShell { .. } => "fire_shell",
            Command::DropDepthCharge { .. } => "drop_depth_charge",
        }
    }
}

/// Apply `command` to `entity`
///
/// Returns the spawned projectile for weapon commands. Dead entities
/// reject every command.
pub fn apply_command(world: &mut World, entity: Entity, command: Command) -> Result<Option<Entity>, SimError> {
    let name = command.name();
    let result = dispatch(world, entity, command);
    if let Err(e) = &result {
        log::warn!("{} for {} rejected: {}", name, entity, e);
    }
    result
}

fn dispatch(world: &mut World, entity: Entity, command: Command) -> Result<Option<Entity>, SimError> {
    let body = world.registry().body(entity).ok_or(SimError::NotFound(entity))?.clone();
    if !body.is_alive() {
        return Err(SimError::Rejected(format!("{} is not alive", entity)));
    }
    let name = command.name();
    let wrong_kind = || SimError::WrongKind {
        entity,
        kind: entity.kind(),
        command: name,
    };

    match command {
        Command::RollLeft
        | Command::RollRight
        | Command::RollZero
        | Command::PitchUp
        | Command::PitchDown
        | Command::PitchZero => {
            let plane = world.registry_mut().airplane_mut(entity).ok_or_else(wrong_kind)?;
            match command {
                Command::RollLeft => plane.roll_left(),
                Command::RollRight => plane.roll_right(),
                Command::RollZero => plane.roll_zero(),
                Command::PitchUp => plane.pitch_up(),
                Command::PitchDown => plane.pitch_down(),
                _ => plane.pitch_zero(),
            }
            Ok(None)
        }
        Command::SetThrottle(_) | Command::SetRudder(_) | Command::HeadTo(_) => {
            let registry = world.registry_mut();
            let hull = match entity.kind() {
                EntityKind::Ship => registry.ship_mut(entity).map(|s| &mut s.hull),
                EntityKind::Submarine => registry.submarine_mut(entity).map(|s| &mut s.hull),
                _ => None,
            }
            .ok_or_else(wrong_kind)?;
            match command {
                Command::SetThrottle(t) => hull.set_throttle(t),
                Command::SetRudder(r) => hull.set_rudder(r),
                Command::HeadTo(h) => hull.head_to(h),
                _ => {}
            }
            Ok(None)
        }
        Command::DiveToDepth(_) | Command::PeriscopeUp | Command::PeriscopeDown | Command::Snorkel(_) => {
            let sub = world.registry_mut().submarine_mut(entity).ok_or_else(wrong_kind)?;
            match command {
                Command::DiveToDepth(d) => sub.dive_to_depth(d),
                Command::PeriscopeUp => {
                    if !sub.scope_up() {
                        return Err(SimError::Rejected("periscope is wrecked".into()));
                    }
                }
                Command::PeriscopeDown => sub.scope_down(),
                Command::Snorkel(up) => {
                    if !sub.set_snorkel_up(up) {
                        return Err(SimError::Rejected("snorkel cannot be raised here".into()));
                    }
                }
                _ => {}
            }
            Ok(None)
        }
        Command::FireTorpedo {
            tube,
            target,
            lead_angle,
            pattern,
        } => {
            let sub = world.registry_mut().submarine_mut(entity).ok_or_else(wrong_kind)?;
            let mut torpedo = sub.fire_torpedo(tube, target, lead_angle, pattern)?;
            torpedo.parent = Some(entity);
            let spawned = world.spawn_torpedo(torpedo);
            log::debug!("{} fired {}", entity, spawned);
            Ok(Some(spawned))
        }
        Command::FireShell {
            direction,
            elevation,
            muzzle_velocity,
        } => {
            if !(muzzle_velocity.is_finite() && muzzle_velocity > 0.0) {
                return Err(SimError::Rejected(format!("muzzle velocity {} not positive", muzzle_velocity)));
            }
            match entity.kind() {
                EntityKind::Ship => {}
                EntityKind::Submarine => {
                    let surfaced = world.registry().submarine(entity).map_or(false, |s| !s.is_submerged());
                    if !surfaced {
                        return Err(SimError::Rejected("deck gun unusable while submerged".into()));
                    }
                }
                _ => return Err(wrong_kind()),
            }
            let position = body.position.xy().xy0(GUN_HEIGHT);
            let mut shell = GunShell::new(position, direction, elevation, muzzle_velocity);
            shell.parent = Some(entity);
            Ok(Some(world.spawn_gun_shell(shell)))
        }
        Command::DropDepthCharge { depth } => {
            if entity.kind() != EntityKind::Ship {
                return Err(wrong_kind());
            }
            if !(depth.is_finite() && depth > 0.0) {
                return Err(SimError::Rejected(format!("pistol depth {} not positive", depth)));
            }
            let forward = body.heading().direction();
            let stern = body.position.xy() - forward * (body.extents.length * 0.5);
            let mut charge = DepthCharge::new(stern.xy0(0.0), Vector3::zero(), depth);
            charge.parent = Some(entity);
            Ok(Some(world.spawn_depth_charge(charge)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{Airplane, AirplaneSpec, Ship, Submarine, TubeStatus};
    use crate::config::SimConfig;

    fn world() -> World {
        World::new(SimConfig::default().with_workers(1)).unwrap()
    }

    fn sub(world: &mut World) -> Entity {
        world.spawn_submarine(Submarine::from_type_name("typeVIIc", Vector3::zero(), Angle::new(0.0)).unwrap())
    }

    #[test]
    fn test_missing_entity() {
        let mut w = world();
        let e = sub(&mut w);
        w.registry_mut().body_mut(e).unwrap().mark_defunct();
        w.registry_mut().evict_defunct();
        assert_eq!(apply_command(&mut w, e, Command::PeriscopeUp), Err(SimError::NotFound(e)));
    }

    #[test]
    fn test_wrong_kind() {
        let mut w = world();
        let ship = w.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
        let err = apply_command(&mut w, ship, Command::PeriscopeUp).unwrap_err();
        assert!(matches!(err, SimError::WrongKind { command: "periscope_up", .. }));
        let err = apply_command(&mut w, ship, Command::RollLeft).unwrap_err();
        assert!(matches!(err, SimError::WrongKind { .. }));
    }

    #[test]
    fn test_helm_commands() {
        let mut w = world();
        let s = sub(&mut w);
        apply_command(&mut w, s, Command::SetThrottle(0.5)).unwrap();
        apply_command(&mut w, s, Command::SetRudder(-2.0)).unwrap();
        apply_command(&mut w, s, Command::DiveToDepth(40.0)).unwrap();
        let sub = w.registry().submarine(s).unwrap();
        assert_eq!(sub.hull.throttle(), 0.5);
        assert_eq!(sub.hull.rudder(), -1.0);
        assert!(matches!(sub.dive_control(), crate::bodies::DiveControl::Depth(d) if d == 40.0));
    }

    #[test]
    fn test_reverse_throttle_limited_to_half() {
        let mut w = world();
        let ship = w.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
        apply_command(&mut w, ship, Command::SetThrottle(-1.0)).unwrap();
        assert_eq!(w.registry().ship(ship).unwrap().hull.throttle(), -0.5);
        apply_command(&mut w, ship, Command::SetThrottle(3.0)).unwrap();
        assert_eq!(w.registry().ship(ship).unwrap().hull.throttle(), 1.0);
    }

    #[test]
    fn test_airplane_controls() {
        let mut w = world();
        let plane = w.spawn_airplane(Airplane::new(
            AirplaneSpec::default(),
            Vector3::new(0.0, 0.0, 500.0),
            Angle::new(0.0),
            60.0,
        ));
        apply_command(&mut w, plane, Command::RollLeft).unwrap();
        apply_command(&mut w, plane, Command::PitchUp).unwrap();
        let a = w.registry().airplane(plane).unwrap();
        assert!(a.roll_factor() < 0.0);
        assert!(a.pitch_factor() > 0.0);
    }

    #[test]
    fn test_fire_torpedo_spawns_with_parent() {
        let mut w = world();
        let s = sub(&mut w);
        let fired = apply_command(
            &mut w,
            s,
            Command::FireTorpedo {
                tube: None,
                target: None,
                lead_angle: Angle::new(10.0),
                pattern: TorpedoPattern::straight(),
            },
        )
        .unwrap()
        .unwrap();
        let torpedo = w.registry().torpedo(fired).unwrap();
        assert_eq!(torpedo.parent, Some(s));
        assert_eq!(torpedo.base_heading(), Angle::new(10.0));
        let sub = w.registry().submarine(s).unwrap();
        assert_eq!(sub.torpedoes()[0].status, TubeStatus::Empty);
    }

    #[test]
    fn test_fire_torpedo_from_empty_tube() {
        let mut w = world();
        let s = sub(&mut w);
        let fire = Command::FireTorpedo {
            tube: Some(0),
            target: None,
            lead_angle: Angle::new(0.0),
            pattern: TorpedoPattern::straight(),
        };
        apply_command(&mut w, s, fire.clone()).unwrap();
        assert!(matches!(apply_command(&mut w, s, fire), Err(SimError::Rejected(_))));
    }

    #[test]
    fn test_shell_needs_surfaced_boat() {
        let mut w = world();
        let s = sub(&mut w);
        let fire = Command::FireShell {
            direction: Angle::new(90.0),
            elevation: Angle::new(5.0),
            muzzle_velocity: 400.0,
        };
        let shell = apply_command(&mut w, s, fire.clone()).unwrap().unwrap();
        assert_eq!(w.registry().gun_shell(shell).unwrap().parent, Some(s));

        w.registry_mut().body_mut(s).unwrap().position.z = -20.0;
        assert!(matches!(apply_command(&mut w, s, fire), Err(SimError::Rejected(_))));
    }

    #[test]
    fn test_drop_depth_charge_astern() {
        let mut w = world();
        let ship = w.spawn_ship(Ship::from_class_name("corvette", Vector3::zero(), Angle::new(0.0)).unwrap());
        let dc = apply_command(&mut w, ship, Command::DropDepthCharge { depth: 50.0 })
            .unwrap()
            .unwrap();
        let charge = w.registry().depth_charge(dc).unwrap();
        assert!(charge.body.position.y < 0.0);
        assert_eq!(charge.explode_depth(), 50.0);
    }

    #[test]
    fn test_dead_entity_rejects() {
        let mut w = world();
        let s = sub(&mut w);
        w.registry_mut().body_mut(s).unwrap().kill();
        assert!(matches!(apply_command(&mut w, s, Command::PeriscopeDown), Err(SimError::Rejected(_))));
    }
}
