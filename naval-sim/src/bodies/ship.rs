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
//! Surface ships and the ship class catalog

use crate::bodies::hull::{Hull, HullSpec, Propulsion};
use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::ecs::Entity;
use crate::error::ConfigError;
use crate::integration::KNOTS_TO_MS;
use crate::math::{Angle, Vector3};

/// Role of a ship class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipRole {
    /// Cargo, troop and tanker ships
    Merchant,
    /// Convoy escorts (destroyers, corvettes)
    Escort,
    /// Capital ships
    Warship,
}

/// Static data of a ship class
#[derive(Debug, Clone, PartialEq)]
pub struct ShipClass {
    /// Catalog key
    pub name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Role in a convoy
    pub role: ShipRole,
    /// Hull dimensions
    pub extents: Extents,
    /// Propulsion and drag
    pub hull: HullSpec,
    /// Gross register tons
    pub tonnage: u32,
    /// Hit points
    pub hitpoints: f64,
}

const fn extents(length: f64, width: f64, height: f64, draught: f64) -> Extents {
    Extents {
        length,
        width,
        height,
        draught,
    }
}

macro_rules! hull {
    ($mass_tons:expr, $knots:expr, $max_accel:expr, $turn_rate:expr, $noise:expr) => {
        HullSpec {
            mass: $mass_tons * 1000.0,
            max_speed: $knots * KNOTS_TO_MS,
            max_accel: $max_accel,
            turn_rate: $turn_rate,
            noise: $noise,
            fuel_a: 0.005,
            fuel_t: 8.0,
        }
    };
}

/// All ship classes
pub static SHIP_CLASSES: [ShipClass; 11] = [
    ShipClass {
        name: "largemerchant",
        description: "Large Merchant",
        role: ShipRole::Merchant,
        extents: extents(150.0, 20.0, 16.0, 8.5),
        hull: hull!(15_000.0, 12.0, 0.05, 1.5, 120.0),
        tonnage: 10_000,
        hitpoints: 2.5,
    },
    ShipClass {
        name: "mediummerchant",
        description: "Medium Merchant",
        role: ShipRole::Merchant,
        extents: extents(115.0, 16.0, 14.0, 7.0),
        hull: hull!(8_000.0, 11.0, 0.06, 1.8, 118.0),
        tonnage: 6_000,
        hitpoints: 1.8,
    },
    ShipClass {
        name: "smallmerchant",
        description: "Small Merchant",
        role: ShipRole::Merchant,
        extents: extents(80.0, 12.0, 11.0, 5.5),
        hull: hull!(3_500.0, 10.0, 0.07, 2.2, 115.0),
        tonnage: 2_500,
        hitpoints: 1.0,
    },
    ShipClass {
        name: "mediumtroopship",
        description: "Medium Troopship",
        role: ShipRole::Merchant,
        extents: extents(140.0, 18.0, 20.0, 7.5),
        hull: hull!(12_000.0, 15.0, 0.06, 1.6, 122.0),
        tonnage: 8_500,
        hitpoints: 2.0,
    },
    ShipClass {
        name: "destroyertribal",
        description: "Tribal Class Destroyer",
        role: ShipRole::Escort,
        extents: extents(115.0, 11.0, 10.0, 4.0),
        hull: hull!(2_500.0, 36.0, 0.4, 5.0, 130.0),
        tonnage: 1_850,
        hitpoints: 1.2,
    },
    ShipClass {
        name: "battleshipmalaya",
        description: "Queen Elizabeth Class Battleship",
        role: ShipRole::Warship,
        extents: extents(196.0, 31.0, 30.0, 9.2),
        hull: hull!(33_000.0, 24.0, 0.08, 1.5, 135.0),
        tonnage: 31_100,
        hitpoints: 6.0,
    },
    ShipClass {
        name: "carrierbogue",
        description: "Bogue Class Escort Carrier",
        role: ShipRole::Warship,
        extents: extents(151.0, 34.0, 25.0, 7.9),
        hull: hull!(14_000.0, 18.0, 0.08, 1.6, 128.0),
        tonnage: 9_800,
        hitpoints: 4.0,
    },
    ShipClass {
        name: "corvette",
        description: "Flower Class Corvette",
        role: ShipRole::Escort,
        extents: extents(62.0, 10.0, 9.0, 3.5),
        hull: hull!(1_000.0, 16.0, 0.25, 6.0, 125.0),
        tonnage: 925,
        hitpoints: 0.9,
    },
    ShipClass {
        name: "largefreighter",
        description: "Large Freighter",
        role: ShipRole::Merchant,
        extents: extents(145.0, 19.0, 15.0, 8.5),
        hull: hull!(14_000.0, 11.0, 0.05, 1.5, 119.0),
        tonnage: 9_000,
        hitpoints: 2.6,
    },
    ShipClass {
        name: "mediumfreighter",
        description: "Medium Freighter",
        role: ShipRole::Merchant,
        extents: extents(110.0, 15.0, 13.0, 7.0),
        hull: hull!(7_500.0, 10.0, 0.06, 1.8, 117.0),
        tonnage: 5_500,
        hitpoints: 1.9,
    },
    ShipClass {
        name: "smalltanker",
        description: "Small Tanker",
        role: ShipRole::Merchant,
        extents: extents(95.0, 14.0, 12.0, 6.5),
        hull: hull!(5_000.0, 10.0, 0.06, 2.0, 116.0),
        tonnage: 4_000,
        hitpoints: 1.5,
    },
];

impl ShipClass {
    /// Look up a class by catalog name
    pub fn from_name(name: &str) -> Result<&'static ShipClass, ConfigError> {
        SHIP_CLASSES
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::UnknownShipType(name.to_string()))
    }

    /// Classes with the given role, in catalog order
    pub fn with_role(role: ShipRole) -> impl Iterator<Item = &'static ShipClass> {
        SHIP_CLASSES.iter().filter(move |c| c.role == role)
    }
}

/// A surface ship
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    class: &'static ShipClass,
    /// Hull state
    pub hull: Hull,
    /// Convoy this ship sails in
    pub convoy: Option<Entity>,
}

impl Ship {
    /// Create a stopped ship of `class` at `position`
    pub fn new(class: &'static ShipClass, position: Vector3, heading: Angle) -> Self {
        let body = Body::new(position, heading, class.extents, class.hitpoints);
        Ship {
            class,
            hull: Hull::new(body, class.hull),
            convoy: None,
        }
    }

    /// Create a ship by catalog name
    pub fn from_class_name(name: &str, position: Vector3, heading: Angle) -> Result<Self, ConfigError> {
        Ok(Ship::new(ShipClass::from_name(name)?, position, heading))
    }

    /// Class data
    pub fn class(&self) -> &'static ShipClass {
        self.class
    }

    /// Tonnage of this ship
    pub fn tonnage(&self) -> u32 {
        self.class.tonnage
    }
}

impl Simulatable for Ship {
    fn body(&self) -> &Body {
        &self.hull.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.hull.body
    }

    fn integrate(&mut self, ctx: &TickContext) {
        if self.hull.body.is_dead() {
            self.hull.sink(ctx);
            return;
        }
        let prop = Propulsion {
            max_speed: self.class.hull.max_speed,
            powered: true,
            burns_fuel: true,
            surfaced: true,
            vertical_accel: 0.0,
        };
        self.hull.advance(ctx, prop);
        self.hull.body.position.z = 0.0;
        self.hull.body.velocity.z = 0.0;
    }

    fn is_contact(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let class = ShipClass::from_name("destroyertribal").unwrap();
        assert_eq!(class.role, ShipRole::Escort);
        assert_eq!(
            ShipClass::from_name("dreadnought"),
            Err(ConfigError::UnknownShipType("dreadnought".into()))
        );
        assert_eq!(ShipClass::with_role(ShipRole::Escort).count(), 2);
    }

    #[test]
    fn test_catalog_names_unique() {
        for (i, a) in SHIP_CLASSES.iter().enumerate() {
            assert!(SHIP_CLASSES[i + 1..].iter().all(|b| b.name != a.name));
            assert!(a.hull.max_speed > 0.0 && a.hitpoints > 0.0);
        }
    }

    #[test]
    fn test_ship_stays_on_surface() {
        let mut ship = Ship::from_class_name("corvette", Vector3::zero(), Angle::new(45.0)).unwrap();
        ship.hull.set_throttle(1.0);
        let ctx = TickContext::new(0.0, 0.1);
        for _ in 0..600 {
            ship.integrate(&ctx);
        }
        assert_eq!(ship.body().position.z, 0.0);
        assert!(ship.body().position.x > 0.0 && ship.body().position.y > 0.0);
        assert!(ship.is_contact());
    }

    #[test]
    fn test_dead_ship_sinks() {
        let mut ship = Ship::from_class_name("smallmerchant", Vector3::zero(), Angle::new(0.0)).unwrap();
        assert!(ship.body_mut().damage(5.0));
        let ctx = TickContext::new(0.0, 1.0);
        ship.integrate(&ctx);
        assert!(ship.body().is_dead());
        assert!(ship.body().depth() > 0.0);
    }
}
