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
//! Submarines: dive control, battery, torpedo storage and damageable parts
//!
//! A submarine is a hull with a vertical degree of freedom. Below
//! [`SUBMERGED_DEPTH`] it runs on electric engines and drains its battery,
//! on the surface (or snorkeling) it runs on diesels, burns fuel and
//! recharges. Torpedoes live in numbered storage slots: bow tubes, stern
//! tubes, bow reserve, stern reserve, in that order.

use crate::bodies::depth_charge::explosion_falloff;
use crate::bodies::hull::{Hull, HullSpec, Propulsion};
use crate::bodies::torpedo::{Torpedo, TorpedoPattern, TorpedoType};
use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::ecs::Entity;
use crate::error::{ConfigError, SimError};
use crate::integration::{apply_hourly_rate, consumption_rate, KNOTS_TO_MS};
use crate::math::{Angle, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Depth below which a submarine counts as submerged (m)
pub const SUBMERGED_DEPTH: f64 = 2.0;

/// Default running depth of launched torpedoes (m)
pub const DEFAULT_RUN_DEPTH: f64 = 3.0;

const DEPTH_GAIN: f64 = 0.05;
const RATE_GAIN: f64 = 0.5;
const FLOODING_ACCEL: f64 = 0.05;
const CRUSH_RATE: f64 = 1.0;
const RECHARGE_SCALE: f64 = 0.2;

/// Static data of a submarine type
#[derive(Debug, Clone, PartialEq)]
pub struct SubmarineType {
    /// Catalog key
    pub name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Hull dimensions
    pub extents: Extents,
    /// Surface propulsion and drag
    pub hull: HullSpec,
    /// Maximum speed on electric engines (m/s)
    pub max_submerged_speed: f64,
    /// Number of bow tubes
    pub bow_tubes: usize,
    /// Number of stern tubes
    pub stern_tubes: usize,
    /// Reserve torpedoes stored forward
    pub bow_reserve: usize,
    /// Reserve torpedoes stored aft
    pub stern_reserve: usize,
    /// Test depth; deeper dives damage the hull (m)
    pub max_depth: f64,
    /// Deepest depth with a usable periscope (m)
    pub periscope_depth: f64,
    /// Deepest snorkeling depth, if a snorkel is fitted (m)
    pub snorkel_depth: Option<f64>,
    /// Battery model coefficient `a` (fraction per hour)
    pub battery_a: f64,
    /// Battery model coefficient `t` (knots)
    pub battery_t: f64,
    /// Recharge model coefficient `a`
    pub recharge_a: f64,
    /// Recharge model coefficient `t` (knots)
    pub recharge_t: f64,
    /// Maximum vertical speed (m/s)
    pub max_dive_speed: f64,
    /// Maximum vertical acceleration from the dive planes (m/s²)
    pub dive_accel: f64,
    /// Time to move a torpedo within one end of the boat (s)
    pub reload_time: f64,
    /// Hit points
    pub hitpoints: f64,
    /// Surface displacement (t)
    pub tonnage: u32,
}

macro_rules! submarine_type {
    (
        $name:expr, $description:expr,
        extents: ($l:expr, $w:expr, $h:expr, $d:expr),
        tons: $tons:expr, knots: ($surf:expr, $sub:expr), turn: $turn:expr, noise: $noise:expr,
        tubes: ($bow:expr, $stern:expr), reserve: ($bow_res:expr, $stern_res:expr),
        max_depth: $max_depth:expr, periscope: $periscope:expr, snorkel: $snorkel:expr,
        reload: $reload:expr, hitpoints: $hp:expr
    ) => {
        SubmarineType {
            name: $name,
            description: $description,
            extents: Extents {
                length: $l,
                width: $w,
                height: $h,
                draught: $d,
            },
            hull: HullSpec {
                mass: $tons * 1000.0,
                max_speed: $surf * KNOTS_TO_MS,
                max_accel: 0.08,
                turn_rate: $turn,
                noise: $noise,
                fuel_a: 0.005,
                fuel_t: 9.0,
            },
            max_submerged_speed: $sub * KNOTS_TO_MS,
            bow_tubes: $bow,
            stern_tubes: $stern,
            bow_reserve: $bow_res,
            stern_reserve: $stern_res,
            max_depth: $max_depth,
            periscope_depth: $periscope,
            snorkel_depth: $snorkel,
            battery_a: 0.11,
            battery_t: $sub / 2.3,
            recharge_a: 0.6,
            recharge_t: 10.0,
            max_dive_speed: 1.0,
            dive_accel: 0.1,
            reload_time: $reload,
            hitpoints: $hp,
            tonnage: $tons as u32,
        }
    };
}

/// All submarine types
pub static SUBMARINE_TYPES: [SubmarineType; 5] = [
    submarine_type!("typeIIa", "Type IIA coastal submarine",
        extents: (40.9, 4.1, 4.5, 3.8),
        tons: 254.0, knots: (13.0, 6.9), turn: 4.0, noise: 115.0,
        tubes: (3, 0), reserve: (2, 0),
        max_depth: 150.0, periscope: 11.0, snorkel: None,
        reload: 600.0, hitpoints: 0.7),
    submarine_type!("typeVIIc", "Type VIIC attack submarine",
        extents: (67.1, 6.2, 5.0, 4.8),
        tons: 769.0, knots: (17.7, 7.6), turn: 3.5, noise: 118.0,
        tubes: (4, 1), reserve: (6, 1),
        max_depth: 220.0, periscope: 12.0, snorkel: None,
        reload: 600.0, hitpoints: 1.0),
    submarine_type!("typeIXc", "Type IXC long range submarine",
        extents: (76.8, 6.8, 5.2, 4.7),
        tons: 1120.0, knots: (18.3, 7.3), turn: 3.0, noise: 120.0,
        tubes: (4, 2), reserve: (8, 2),
        max_depth: 230.0, periscope: 12.0, snorkel: None,
        reload: 700.0, hitpoints: 1.2),
    submarine_type!("typeXXI", "Type XXI electro boat",
        extents: (76.7, 8.0, 6.3, 6.3),
        tons: 1621.0, knots: (15.6, 17.2), turn: 3.0, noise: 112.0,
        tubes: (6, 0), reserve: (17, 0),
        max_depth: 280.0, periscope: 13.0, snorkel: Some(12.0),
        reload: 300.0, hitpoints: 1.4),
    submarine_type!("typeXXIII", "Type XXIII coastal electro boat",
        extents: (34.7, 3.0, 3.7, 3.7),
        tons: 234.0, knots: (9.7, 12.5), turn: 5.0, noise: 108.0,
        tubes: (2, 0), reserve: (0, 0),
        max_depth: 180.0, periscope: 10.0, snorkel: Some(10.0),
        reload: 600.0, hitpoints: 0.6),
];

impl SubmarineType {
    /// Look up a type by catalog name
    pub fn from_name(name: &str) -> Result<&'static SubmarineType, ConfigError> {
        SUBMARINE_TYPES
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownSubmarineType(name.to_string()))
    }

    /// Total number of torpedo storage slots
    pub fn storage_slots(&self) -> usize {
        self.bow_tubes + self.stern_tubes + self.bow_reserve + self.stern_reserve
    }
}

/// State of a torpedo storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TubeStatus {
    /// Nothing stored
    #[default]
    Empty,
    /// A torpedo is being moved into this slot
    Reloading,
    /// The torpedo is being moved out of this slot
    Unloading,
    /// Holds a torpedo ready for use
    Loaded,
}

/// One torpedo storage slot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredTorpedo {
    /// Torpedo model in this slot
    pub torpedo_type: TorpedoType,
    /// Slot state
    pub status: TubeStatus,
    /// Slot a transfer comes from or goes to
    pub associated: usize,
    /// Seconds until the transfer completes
    pub remaining_time: f64,
}

impl StoredTorpedo {
    /// A loaded slot
    pub fn loaded(torpedo_type: TorpedoType) -> Self {
        StoredTorpedo {
            torpedo_type,
            status: TubeStatus::Loaded,
            associated: 0,
            remaining_time: 0.0,
        }
    }
}

/// Damageable submarine part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    /// Rudder
    Rudder,
    /// Propellers
    Screws,
    /// Aft dive planes
    SternDivePlanes,
    /// Stern torpedo tubes
    SternTubes,
    /// Electric motors
    ElectricEngines,
    /// Diesel engines
    DieselEngines,
    /// Aft battery
    AftBattery,
    /// Central pressure hull
    PressureHull,
    /// Snorkel mast
    Snorkel,
    /// Attack periscope
    Periscope,
    /// Forward battery
    ForwardBattery,
    /// Hydrophones
    ListeningDevice,
    /// Forward dive planes
    BowDivePlanes,
    /// Bow torpedo tubes
    BowTubes,
}

impl PartKind {
    /// Every part, stern to bow
    pub const ALL: [PartKind; 14] = [
        PartKind::Rudder,
        PartKind::Screws,
        PartKind::SternDivePlanes,
        PartKind::SternTubes,
        PartKind::ElectricEngines,
        PartKind::DieselEngines,
        PartKind::AftBattery,
        PartKind::PressureHull,
        PartKind::Snorkel,
        PartKind::Periscope,
        PartKind::ForwardBattery,
        PartKind::ListeningDevice,
        PartKind::BowDivePlanes,
        PartKind::BowTubes,
    ];

    /// Position along the hull, 0 at the stern and 1 at the bow
    pub fn location(&self) -> f64 {
        match self {
            PartKind::Rudder => 0.0,
            PartKind::Screws => 0.02,
            PartKind::SternDivePlanes => 0.03,
            PartKind::SternTubes => 0.06,
            PartKind::ElectricEngines => 0.2,
            PartKind::DieselEngines => 0.3,
            PartKind::AftBattery => 0.4,
            PartKind::PressureHull => 0.5,
            PartKind::Snorkel => 0.52,
            PartKind::Periscope => 0.55,
            PartKind::ForwardBattery => 0.65,
            PartKind::ListeningDevice => 0.85,
            PartKind::BowDivePlanes => 0.95,
            PartKind::BowTubes => 0.97,
        }
    }

    /// Sensitivity to shock waves
    pub fn weakness(&self) -> f64 {
        match self {
            PartKind::Rudder => 0.3,
            PartKind::Screws => 0.4,
            PartKind::SternDivePlanes | PartKind::BowDivePlanes => 0.4,
            PartKind::SternTubes | PartKind::BowTubes => 0.2,
            PartKind::ElectricEngines | PartKind::DieselEngines => 0.3,
            PartKind::AftBattery | PartKind::ForwardBattery => 0.4,
            PartKind::PressureHull => 0.1,
            PartKind::Snorkel | PartKind::Periscope => 0.5,
            PartKind::ListeningDevice => 0.6,
        }
    }
}

/// Damage status of one part, 0 intact and 1 wrecked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageablePart {
    /// Which part
    pub kind: PartKind,
    /// Damage in `[0, 1]`
    pub status: f64,
}

/// Depth keeping mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiveControl {
    /// Hold the given depth (m)
    Depth(f64),
    /// Keep the planes at a fraction of the maximum dive rate, positive rises
    Rate(f64),
}

/// A submarine
#[derive(Debug, Clone, PartialEq)]
pub struct Submarine {
    sub_type: &'static SubmarineType,
    /// Hull state
    pub hull: Hull,
    dive: DiveControl,
    scope_up: bool,
    snorkel_up: bool,
    battery_level: f64,
    torpedoes: Vec<StoredTorpedo>,
    parts: Vec<DamageablePart>,
}

impl Submarine {
    /// Create a surfaced, fully loaded submarine
    pub fn new(sub_type: &'static SubmarineType, position: Vector3, heading: Angle) -> Self {
        let body = Body::new(position, heading, sub_type.extents, sub_type.hitpoints);
        let mut torpedoes = Vec::with_capacity(sub_type.storage_slots());
        torpedoes.extend((0..sub_type.bow_tubes).map(|_| StoredTorpedo::loaded(TorpedoType::G7a)));
        torpedoes.extend((0..sub_type.stern_tubes).map(|_| StoredTorpedo::loaded(TorpedoType::G7e)));
        torpedoes.extend(
            (0..sub_type.bow_reserve + sub_type.stern_reserve).map(|_| StoredTorpedo::loaded(TorpedoType::G7e)),
        );
        Submarine {
            sub_type,
            hull: Hull::new(body, sub_type.hull),
            dive: DiveControl::Depth(position.z.min(0.0).abs()),
            scope_up: false,
            snorkel_up: false,
            battery_level: 1.0,
            torpedoes,
            parts: PartKind::ALL
                .iter()
                .map(|&kind| DamageablePart { kind, status: 0.0 })
                .collect(),
        }
    }

    /// Create a submarine by type name
    pub fn from_type_name(name: &str, position: Vector3, heading: Angle) -> Result<Self, ConfigError> {
        Ok(Submarine::new(SubmarineType::from_name(name)?, position, heading))
    }

    /// Type data
    pub fn sub_type(&self) -> &'static SubmarineType {
        self.sub_type
    }

    /// Check if the boat is below [`SUBMERGED_DEPTH`]
    pub fn is_submerged(&self) -> bool {
        self.hull.body.depth() > SUBMERGED_DEPTH
    }

    /// Check if the boat runs on its electric engines
    pub fn is_electric(&self) -> bool {
        self.is_submerged() && !self.snorkel_up
    }

    /// Battery charge in `[0, 1]`
    pub fn battery_level(&self) -> f64 {
        self.battery_level
    }

    /// Current depth keeping mode
    pub fn dive_control(&self) -> DiveControl {
        self.dive
    }

    /// Hold `meters` depth
    pub fn dive_to_depth(&mut self, meters: f64) {
        if meters.is_finite() {
            self.dive = DiveControl::Depth(meters.max(0.0));
        }
    }

    /// Set the planes to rise at `amount` of the maximum rate
    pub fn planes_up(&mut self, amount: f64) {
        if amount.is_finite() {
            self.dive = DiveControl::Rate(amount.clamp(0.0, 1.0));
        }
    }

    /// Set the planes to dive at `amount` of the maximum rate
    pub fn planes_down(&mut self, amount: f64) {
        if amount.is_finite() {
            self.dive = DiveControl::Rate(-amount.clamp(0.0, 1.0));
        }
    }

    /// Level the planes
    pub fn planes_middle(&mut self) {
        self.dive = DiveControl::Rate(0.0);
    }

    /// Raise the periscope; fails when it is wrecked
    pub fn scope_up(&mut self) -> bool {
        self.scope_up = self.part_status(PartKind::Periscope) < 1.0;
        self.scope_up
    }

    /// Lower the periscope
    pub fn scope_down(&mut self) {
        self.scope_up = false;
    }

    /// Check if the periscope is raised
    pub fn is_scope_up(&self) -> bool {
        self.scope_up
    }

    /// Check if the raised periscope reaches above the surface
    pub fn can_see_through_periscope(&self) -> bool {
        self.scope_up && self.hull.body.depth() <= self.sub_type.periscope_depth
    }

    /// Raise or lower the snorkel; raising needs a working snorkel and
    /// snorkel depth
    pub fn set_snorkel_up(&mut self, up: bool) -> bool {
        if !up {
            self.snorkel_up = false;
            return true;
        }
        self.snorkel_up = self.snorkel_usable(self.hull.body.depth());
        self.snorkel_up
    }

    /// Check if the snorkel is raised
    pub fn is_snorkel_up(&self) -> bool {
        self.snorkel_up
    }

    fn snorkel_usable(&self, depth: f64) -> bool {
        match self.sub_type.snorkel_depth {
            Some(max) => depth <= max && self.part_status(PartKind::Snorkel) < 1.0,
            None => false,
        }
    }

    /// Damage status of every part
    pub fn parts(&self) -> &[DamageablePart] {
        &self.parts
    }

    /// Damage status of one part
    pub fn part_status(&self, kind: PartKind) -> f64 {
        self.parts
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.status)
            .unwrap_or(0.0)
    }

    /// Check if the hydrophones work
    pub fn can_listen(&self) -> bool {
        self.part_status(PartKind::ListeningDevice) < 1.0
    }

    /// Radiated noise at the current speed (dB)
    pub fn noise_level(&self) -> f64 {
        let quiet = if self.is_electric() { 10.0 } else { 0.0 };
        self.hull.noise_level() - quiet
    }

    /// Torpedo storage slots
    pub fn torpedoes(&self) -> &[StoredTorpedo] {
        &self.torpedoes
    }

    /// Slot indices of the bow tubes
    pub fn bow_tube_indices(&self) -> Range<usize> {
        0..self.sub_type.bow_tubes
    }

    /// Slot indices of the stern tubes
    pub fn stern_tube_indices(&self) -> Range<usize> {
        let start = self.sub_type.bow_tubes;
        start..start + self.sub_type.stern_tubes
    }

    /// Slot indices of the forward reserve
    pub fn bow_reserve_indices(&self) -> Range<usize> {
        let start = self.stern_tube_indices().end;
        start..start + self.sub_type.bow_reserve
    }

    /// Slot indices of the aft reserve
    pub fn stern_reserve_indices(&self) -> Range<usize> {
        let start = self.bow_reserve_indices().end;
        start..start + self.sub_type.stern_reserve
    }

    fn is_forward_slot(&self, index: usize) -> bool {
        self.bow_tube_indices().contains(&index) || self.bow_reserve_indices().contains(&index)
    }

    /// First loaded tube at the bow or stern
    pub fn find_loaded_tube(&self, use_bow: bool) -> Option<usize> {
        let mut range = if use_bow {
            self.bow_tube_indices()
        } else {
            self.stern_tube_indices()
        };
        range.find(|&i| self.torpedoes[i].status == TubeStatus::Loaded)
    }

    /// Seconds needed to move a torpedo between two slots
    pub fn transfer_time(&self, from: usize, to: usize) -> f64 {
        if self.is_forward_slot(from) == self.is_forward_slot(to) {
            self.sub_type.reload_time
        } else {
            3.0 * self.sub_type.reload_time
        }
    }

    /// Start moving the torpedo in slot `from` to the empty slot `to`
    pub fn transfer_torpedo(&mut self, from: usize, to: usize) -> Result<(), SimError> {
        let len = self.torpedoes.len();
        if from >= len || to >= len || from == to {
            return Err(SimError::Rejected(format!("invalid transfer {} -> {}", from, to)));
        }
        if self.torpedoes[from].status != TubeStatus::Loaded {
            return Err(SimError::Rejected(format!("slot {} holds no torpedo", from)));
        }
        if self.torpedoes[to].status != TubeStatus::Empty {
            return Err(SimError::Rejected(format!("slot {} is not empty", to)));
        }
        let time = self.transfer_time(from, to);
        let torpedo_type = self.torpedoes[from].torpedo_type;
        self.torpedoes[from] = StoredTorpedo {
            torpedo_type,
            status: TubeStatus::Unloading,
            associated: to,
            remaining_time: time,
        };
        self.torpedoes[to] = StoredTorpedo {
            torpedo_type,
            status: TubeStatus::Reloading,
            associated: from,
            remaining_time: time,
        };
        Ok(())
    }

    /// Fire a torpedo
    ///
    /// With `tube == None` the first loaded bow tube is used, then the
    /// stern tubes. The torpedo leaves along the boat's heading (reversed
    /// for stern tubes) turned by `lead_angle`.
    pub fn fire_torpedo(
        &mut self,
        tube: Option<usize>,
        target: Option<Entity>,
        lead_angle: Angle,
        pattern: TorpedoPattern,
    ) -> Result<Torpedo, SimError> {
        if !self.hull.body.is_alive() {
            return Err(SimError::Rejected("submarine is sunk".into()));
        }
        let index = match tube {
            Some(i) => {
                let is_tube = self.bow_tube_indices().contains(&i) || self.stern_tube_indices().contains(&i);
                if !is_tube || self.torpedoes[i].status != TubeStatus::Loaded {
                    return Err(SimError::Rejected(format!("tube {} is not loaded", i)));
                }
                i
            }
            None => self
                .find_loaded_tube(true)
                .or_else(|| self.find_loaded_tube(false))
                .ok_or_else(|| SimError::Rejected("no loaded tube".into()))?,
        };

        let at_bow = self.bow_tube_indices().contains(&index);
        let tube_part = if at_bow { PartKind::BowTubes } else { PartKind::SternTubes };
        if self.part_status(tube_part) >= 1.0 {
            return Err(SimError::Rejected(format!("tube {} is wrecked", index)));
        }

        let body = &self.hull.body;
        let forward = body.heading().direction().xy0(0.0);
        let offset = body.extents.length * 0.5 + 5.0;
        let (position, heading) = if at_bow {
            (body.position + forward * offset, body.heading() + lead_angle)
        } else {
            (body.position - forward * offset, body.heading() + Angle::new(180.0) + lead_angle)
        };

        let torpedo_type = self.torpedoes[index].torpedo_type;
        self.torpedoes[index] = StoredTorpedo::default();

        let mut torpedo = Torpedo::new(torpedo_type, position, heading, DEFAULT_RUN_DEPTH, pattern);
        torpedo.target = target;
        Ok(torpedo)
    }

    /// Apply a depth charge explosion at `point`
    ///
    /// Every part takes damage scaled by its weakness and distance to the
    /// explosion; the hull takes damage by the distance to its center.
    /// Returns true if the explosion sank the boat.
    pub fn depth_charge_explosion(&mut self, point: Vector3, strength: f64) -> bool {
        let body = &self.hull.body;
        let forward = body.heading().direction().xy0(0.0);
        let length = body.extents.length;
        let center = body.position;
        for part in &mut self.parts {
            let location = center + forward * ((part.kind.location() - 0.5) * length);
            let damage = part.kind.weakness() * strength * explosion_falloff(location.distance(point));
            part.status = (part.status + damage).min(1.0);
        }
        let hull_damage = strength * explosion_falloff(center.distance(point));
        self.hull.body.damage(hull_damage)
    }

    pub(crate) fn restore(
        &mut self,
        dive: DiveControl,
        scope_up: bool,
        snorkel_up: bool,
        battery_level: f64,
        torpedoes: Vec<StoredTorpedo>,
        parts: Vec<DamageablePart>,
    ) -> Result<(), String> {
        if torpedoes.len() != self.sub_type.storage_slots() {
            return Err(format!(
                "{} torpedo slots, type {} has {}",
                torpedoes.len(),
                self.sub_type.name,
                self.sub_type.storage_slots()
            ));
        }
        if torpedoes.iter().any(|t| t.associated >= torpedoes.len()) {
            return Err("torpedo transfer references a missing slot".into());
        }
        self.dive = dive;
        self.scope_up = scope_up;
        self.snorkel_up = snorkel_up;
        self.battery_level = battery_level.clamp(0.0, 1.0);
        self.torpedoes = torpedoes;
        for part in parts {
            if let Some(p) = self.parts.iter_mut().find(|p| p.kind == part.kind) {
                p.status = part.status.clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    fn advance_transfers(&mut self, dt: f64) {
        for slot in &mut self.torpedoes {
            if matches!(slot.status, TubeStatus::Reloading | TubeStatus::Unloading) {
                slot.remaining_time -= dt;
                if slot.remaining_time <= 0.0 {
                    slot.remaining_time = 0.0;
                    slot.status = if slot.status == TubeStatus::Reloading {
                        TubeStatus::Loaded
                    } else {
                        TubeStatus::Empty
                    };
                }
            }
        }
    }

    fn vertical_accel(&self) -> f64 {
        let ty = self.sub_type;
        let body = &self.hull.body;
        let z = body.position.z;
        let wanted = match self.dive {
            DiveControl::Depth(depth) => ((-depth - z) * DEPTH_GAIN).clamp(-ty.max_dive_speed, ty.max_dive_speed),
            DiveControl::Rate(rate) => rate * ty.max_dive_speed,
        };
        let planes = 1.0
            - 0.5 * (self.part_status(PartKind::BowDivePlanes) + self.part_status(PartKind::SternDivePlanes));
        let speed_fraction = (body.speed() / ty.hull.max_speed).min(1.0);
        let control = ((wanted - body.velocity.z) * RATE_GAIN).clamp(-ty.dive_accel, ty.dive_accel)
            * planes
            * (0.3 + 0.7 * speed_fraction);
        control - FLOODING_ACCEL * body.health.damage_fraction()
    }
}

impl Simulatable for Submarine {
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
        let dt = ctx.dt;
        let ty = self.sub_type;
        self.advance_transfers(dt);

        if self.snorkel_up && !self.snorkel_usable(self.hull.body.depth()) {
            log::debug!("snorkel flooded, lowering it");
            self.snorkel_up = false;
        }
        if self.scope_up && self.part_status(PartKind::Periscope) >= 1.0 {
            self.scope_up = false;
        }

        let electric = self.is_electric();
        let engine_ok = if electric {
            self.part_status(PartKind::ElectricEngines) < 1.0 && self.battery_level > 0.0
        } else {
            self.part_status(PartKind::DieselEngines) < 1.0
        };
        let prop = Propulsion {
            max_speed: if electric { ty.max_submerged_speed } else { ty.hull.max_speed },
            powered: engine_ok && self.part_status(PartKind::Screws) < 1.0,
            burns_fuel: !electric,
            surfaced: !self.is_submerged(),
            vertical_accel: self.vertical_accel(),
        };
        self.hull.advance(ctx, prop);

        let body = &mut self.hull.body;
        if body.position.z > 0.0 {
            body.position.z = 0.0;
            body.velocity.z = body.velocity.z.min(0.0);
        }

        let knots = (self.hull.throttle() * prop.max_speed).abs() / KNOTS_TO_MS;
        if electric {
            if prop.powered {
                let rate = consumption_rate(ty.battery_a, ty.battery_t, knots);
                self.battery_level = apply_hourly_rate(self.battery_level, rate, dt);
            }
        } else if self.part_status(PartKind::DieselEngines) < 1.0 && self.hull.fuel_level() > 0.0 {
            let rate = RECHARGE_SCALE * (1.0 - ty.recharge_a * (-knots / ty.recharge_t).exp());
            self.battery_level = apply_hourly_rate(self.battery_level, -rate, dt);
        }

        let depth = self.hull.body.depth();
        if depth > ty.max_depth {
            let excess = (depth - ty.max_depth) / ty.max_depth;
            if self.hull.body.damage(excess * CRUSH_RATE * dt) {
                log::info!("{} crushed at {:.0} m", ty.description, depth);
            }
        }
    }

    fn is_contact(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityKind;

    fn vii() -> Submarine {
        Submarine::from_type_name("typeVIIc", Vector3::zero(), Angle::new(0.0)).unwrap()
    }

    fn run(sub: &mut Submarine, seconds: f64) {
        let ctx = TickContext::new(0.0, 0.1);
        for _ in 0..(seconds / 0.1).round() as usize {
            sub.integrate(&ctx);
        }
    }

    #[test]
    fn test_catalog() {
        assert_eq!(SubmarineType::from_name("typeVIIc").unwrap().storage_slots(), 12);
        assert_eq!(
            SubmarineType::from_name("typeXIV"),
            Err(ConfigError::UnknownSubmarineType("typeXIV".into()))
        );
    }

    #[test]
    fn test_slot_layout() {
        let sub = vii();
        assert_eq!(sub.bow_tube_indices(), 0..4);
        assert_eq!(sub.stern_tube_indices(), 4..5);
        assert_eq!(sub.bow_reserve_indices(), 5..11);
        assert_eq!(sub.stern_reserve_indices(), 11..12);
        assert!(sub.torpedoes().iter().all(|t| t.status == TubeStatus::Loaded));
    }

    #[test]
    fn test_dive_to_depth_and_surface() {
        let mut sub = vii();
        sub.hull.set_throttle(0.5);
        sub.dive_to_depth(50.0);
        run(&mut sub, 600.0);
        assert!((sub.body().depth() - 50.0).abs() < 1.0, "depth {}", sub.body().depth());
        assert!(sub.is_submerged() && sub.is_electric());
        assert!(sub.battery_level() < 1.0);

        sub.dive_to_depth(0.0);
        run(&mut sub, 600.0);
        assert!(sub.body().depth() < SUBMERGED_DEPTH);
        assert!(sub.body().position.z <= 0.0);
    }

    #[test]
    fn test_snorkel_needs_snorkel_depth() {
        let mut vii = vii();
        assert!(!vii.set_snorkel_up(true));
        let mut xxi = Submarine::from_type_name("typeXXI", Vector3::new(0.0, 0.0, -10.0), Angle::new(0.0)).unwrap();
        assert!(xxi.set_snorkel_up(true));
        assert!(!xxi.is_electric());
        xxi.hull.body.position.z = -30.0;
        assert!(!xxi.set_snorkel_up(true));
        assert!(vii.set_snorkel_up(false));
    }

    #[test]
    fn test_fire_and_transfer() {
        let mut sub = vii();
        let target = Entity::new(EntityKind::Ship, 3, 0);
        for _ in 0..4 {
            let torpedo = sub
                .fire_torpedo(None, Some(target), Angle::new(10.0), TorpedoPattern::straight())
                .unwrap();
            assert!((torpedo.body.heading().value() - 10.0).abs() < 1e-9);
            assert!(torpedo.body.position.y > 30.0);
            assert_eq!(torpedo.target, Some(target));
        }
        // bow empty, stern tube fires backwards
        let stern = sub.fire_torpedo(None, None, Angle::new(0.0), TorpedoPattern::straight()).unwrap();
        assert!((stern.body.heading().value() - 180.0).abs() < 1e-9);
        assert!(sub.fire_torpedo(None, None, Angle::new(0.0), TorpedoPattern::straight()).is_err());
        assert!(sub.fire_torpedo(Some(5), None, Angle::new(0.0), TorpedoPattern::straight()).is_err());

        sub.transfer_torpedo(5, 0).unwrap();
        assert_eq!(sub.torpedoes()[0].status, TubeStatus::Reloading);
        assert_eq!(sub.torpedoes()[5].status, TubeStatus::Unloading);
        assert!(sub.transfer_torpedo(6, 0).is_err());
        let dt = sub.sub_type().reload_time + 1.0;
        run(&mut sub, dt);
        assert_eq!(sub.torpedoes()[0].status, TubeStatus::Loaded);
        assert_eq!(sub.torpedoes()[5].status, TubeStatus::Empty);
        assert_eq!(sub.find_loaded_tube(true), Some(0));
    }

    #[test]
    fn test_transfer_times() {
        let sub = vii();
        assert_eq!(sub.transfer_time(5, 0), 600.0);
        assert_eq!(sub.transfer_time(5, 4), 1800.0);
    }

    #[test]
    fn test_depth_charge_damage() {
        let mut sub = vii();
        sub.hull.body.position.z = -60.0;
        let far = sub.depth_charge_explosion(Vector3::new(0.0, 0.0, -200.0), 2.0);
        assert!(!far);
        assert!(sub.parts().iter().all(|p| p.status == 0.0));

        let bow = Vector3::new(0.0, 30.0, -60.0);
        let killed = sub.depth_charge_explosion(bow, 2.0);
        assert!(!killed);
        assert!(sub.part_status(PartKind::BowTubes) > sub.part_status(PartKind::Rudder));
        assert!(sub.body().health.current() < sub.body().health.max());

        assert!(sub.depth_charge_explosion(Vector3::new(0.0, 0.0, -61.0), 2.0));
        assert!(sub.body().is_dead());
    }

    #[test]
    fn test_crush_depth_damages_hull() {
        let mut sub = vii();
        sub.hull.body.position.z = -300.0;
        sub.dive_to_depth(300.0);
        run(&mut sub, 1.0);
        assert!(sub.body().health.current() < sub.body().health.max());
    }

    #[test]
    fn test_wrecked_periscope() {
        let mut sub = vii();
        sub.parts.iter_mut().for_each(|p| {
            if p.kind == PartKind::Periscope {
                p.status = 1.0;
            }
        });
        assert!(!sub.scope_up());
        assert!(!sub.can_see_through_periscope());
    }
}
