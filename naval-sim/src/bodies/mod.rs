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
//! Physics bodies, one module per entity kind
//!
//! Every kind embeds a [`Body`](crate::ecs::components::Body) and implements
//! [`Simulatable`](crate::ecs::system::Simulatable). Ships and submarines
//! share the [`Hull`] model.

pub mod airplane;
pub mod convoy;
pub mod depth_charge;
pub mod gun_shell;
pub mod hull;
pub mod particle;
pub mod ship;
pub mod submarine;
pub mod torpedo;
pub mod water_splash;

pub use airplane::{Airplane, AirplaneSpec};
pub use convoy::Convoy;
pub use depth_charge::DepthCharge;
pub use gun_shell::{Ballistics, GunShell};
pub use hull::{Hull, HullSpec};
pub use particle::{Particle, ParticleKind};
pub use ship::{Ship, ShipClass, ShipRole};
pub use submarine::{DiveControl, PartKind, StoredTorpedo, Submarine, SubmarineType, TubeStatus};
pub use torpedo::{SearchPattern, Torpedo, TorpedoPattern, TorpedoType, TurnDirection};
pub use water_splash::WaterSplash;
