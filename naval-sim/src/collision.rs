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
//! Collision detection and response
//!
//! Runs once per tick on the coordinating thread, after integration.
//!
//! # Phases
//!
//! - **Projectiles**: every armed torpedo, gun shell and depth charge is
//!   tested against ships, then submarines, in registry order. Torpedoes
//!   and shells test the segment swept during the tick so fast movers
//!   cannot tunnel through a hull; depth charges test their position. The
//!   first overlapping target wins, so a projectile damages at most one
//!   target per tick.
//! - **Hulls**: ship and submarine pairs are culled with axis-aligned boxes
//!   and confirmed with a separating-axis test on oriented boxes. Both hulls
//!   are pushed apart and damaged by the closing speed.
//!
//! Splashes, particles, convoys and airplanes are passive.

use crate::bodies::gun_shell::SHELL_DAMAGE;
use crate::ecs::components::Body;
use crate::ecs::registry::Registry;
use crate::ecs::system::Impact;
use crate::ecs::{Entity, EntityKind};
use crate::math::{Vector2, Vector3};

/// Hull damage per m/s of closing speed in a ramming contact
pub const RAM_DAMAGE_PER_MS: f64 = 0.05;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower corner
    pub min: Vector3,
    /// Upper corner
    pub max: Vector3,
}

impl Aabb {
    /// Bounding box of a body's hull volume
    pub fn from_body(body: &Body) -> Self {
        let r = body.extents.horizontal_radius();
        let p = body.position;
        Aabb {
            min: Vector3::new(p.x - r, p.y - r, p.z - body.extents.draught),
            max: Vector3::new(p.x + r, p.y + r, p.z + body.extents.height),
        }
    }

    /// Bounding box of a segment
    pub fn from_segment(a: Vector3, b: Vector3) -> Self {
        Aabb {
            min: Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Check if two boxes intersect (touching counts)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Hull volume: a horizontally oriented rectangle swept over a depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Center in the horizontal plane
    pub center: Vector2,
    /// Unit axes: starboard, forward
    pub axes: [Vector2; 2],
    /// Half width and half length
    pub half: [f64; 2],
    /// Keel height
    pub bottom: f64,
    /// Top height
    pub top: f64,
}

impl OrientedBox {
    /// Oriented box of a body's hull volume
    pub fn from_body(body: &Body) -> Self {
        let forward = body.heading().direction();
        let starboard = Vector2::new(forward.y, -forward.x);
        OrientedBox {
            center: body.position.xy(),
            axes: [starboard, forward],
            half: [body.extents.width * 0.5, body.extents.length * 0.5],
            bottom: body.position.z - body.extents.draught,
            top: body.position.z + body.extents.height,
        }
    }

    fn projected_radius(&self, axis: Vector2) -> f64 {
        self.half[0] * self.axes[0].dot(axis).abs() + self.half[1] * self.axes[1].dot(axis).abs()
    }

    /// Separating-axis overlap test against another box
    pub fn overlaps(&self, other: &OrientedBox) -> bool {
        if self.bottom > other.top || other.bottom > self.top {
            return false;
        }
        let d = other.center - self.center;
        self.axes.iter().chain(other.axes.iter()).all(|&axis| {
            d.dot(axis).abs() <= self.projected_radius(axis) + other.projected_radius(axis)
        })
    }

    /// Closest point of the box footprint to `p`, at height `z`
    fn clamp(&self, p: Vector2) -> Vector2 {
        let d = p - self.center;
        let u = d.dot(self.axes[0]).clamp(-self.half[0], self.half[0]);
        let v = d.dot(self.axes[1]).clamp(-self.half[1], self.half[1]);
        self.center + self.axes[0] * u + self.axes[1] * v
    }

    /// Contact point estimate for two overlapping boxes
    ///
    /// Midpoint of each center clamped into the other box, at the middle
    /// of the shared height range.
    pub fn contact_point(&self, other: &OrientedBox) -> Vector3 {
        let a = other.clamp(self.center);
        let b = self.clamp(other.center);
        let z = (self.bottom.max(other.bottom) + self.top.min(other.top)) * 0.5;
        ((a + b) * 0.5).xy0(z)
    }

    /// Check if the point lies inside the box
    pub fn contains(&self, p: Vector3) -> bool {
        if p.z < self.bottom || p.z > self.top {
            return false;
        }
        let d = p.xy() - self.center;
        d.dot(self.axes[0]).abs() <= self.half[0] && d.dot(self.axes[1]).abs() <= self.half[1]
    }

    /// Parameter in `[0, 1]` where segment `a -> b` first enters the box
    ///
    /// Slab test in the box frame.
    pub fn segment_entry(&self, a: Vector3, b: Vector3) -> Option<f64> {
        let rel = a.xy() - self.center;
        let dir = (b - a).xy();
        let origin = [rel.dot(self.axes[0]), rel.dot(self.axes[1]), a.z];
        let delta = [dir.dot(self.axes[0]), dir.dot(self.axes[1]), b.z - a.z];
        let lo = [-self.half[0], -self.half[1], self.bottom];
        let hi = [self.half[0], self.half[1], self.top];

        let mut t_min = 0.0_f64;
        let mut t_max = 1.0_f64;
        for i in 0..3 {
            if delta[i].abs() < 1e-12 {
                if origin[i] < lo[i] || origin[i] > hi[i] {
                    return None;
                }
                continue;
            }
            let t1 = (lo[i] - origin[i]) / delta[i];
            let t2 = (hi[i] - origin[i]) / delta[i];
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// A resolved collision; produced and consumed within one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Striking entity (projectile or first hull of a pair)
    pub striker: Entity,
    /// Struck entity
    pub target: Entity,
    /// Estimated contact point
    pub point: Vector3,
    /// Damage dealt to the target
    pub strength: f64,
}

#[derive(Debug, Clone, Copy)]
enum Probe {
    Segment(Vector3, Vector3),
    Point(Vector3),
}

struct Projectile {
    entity: Entity,
    parent: Option<Entity>,
    probe: Probe,
    strength: f64,
}

struct HullVolume {
    entity: Entity,
    aabb: Aabb,
    obb: OrientedBox,
}

fn hull_volumes(registry: &Registry) -> Vec<HullVolume> {
    let mut hulls = Vec::new();
    for kind in [EntityKind::Ship, EntityKind::Submarine] {
        registry.for_each(kind, |entity, item| {
            if item.is_alive() {
                hulls.push(HullVolume {
                    entity,
                    aabb: Aabb::from_body(item.body()),
                    obb: OrientedBox::from_body(item.body()),
                });
            }
        });
    }
    hulls
}

fn projectiles(registry: &Registry) -> Vec<Projectile> {
    let mut out = Vec::new();
    for (entity, t) in registry.torpedoes().iter() {
        if t.body.is_alive() && t.is_armed() {
            let (a, b) = t.swept_segment();
            out.push(Projectile {
                entity,
                parent: t.parent,
                probe: Probe::Segment(a, b),
                strength: t.torpedo_type().warhead(),
            });
        }
    }
    // a shell that landed this tick is dead but may still strike a hull
    for (entity, s) in registry.gun_shells().iter() {
        if s.body.is_alive() || s.is_landing() {
            let (a, b) = s.swept_segment();
            out.push(Projectile {
                entity,
                parent: s.parent,
                probe: Probe::Segment(a, b),
                strength: SHELL_DAMAGE,
            });
        }
    }
    for (entity, c) in registry.depth_charges().iter() {
        if c.body.is_alive() {
            out.push(Projectile {
                entity,
                parent: c.parent,
                probe: Probe::Point(c.body.position),
                strength: 0.0,
            });
        }
    }
    out
}

fn probe_hull(probe: Probe, hull: &HullVolume) -> Option<Vector3> {
    match probe {
        Probe::Segment(a, b) => {
            if !Aabb::from_segment(a, b).overlaps(&hull.aabb) {
                return None;
            }
            hull.obb.segment_entry(a, b).map(|t| a + (b - a) * t)
        }
        Probe::Point(p) => {
            if hull.obb.contains(p) {
                Some(p)
            } else {
                None
            }
        }
    }
}

fn respond(registry: &mut Registry, striker: Entity, target: Entity, point: Vector3, strength: f64) {
    if let Some(item) = registry.get_mut(target) {
        item.on_collision(&Impact {
            other: striker,
            point,
            strength,
        });
    }
    if let Some(item) = registry.get_mut(striker) {
        item.on_collision(&Impact {
            other: target,
            point,
            strength: 0.0,
        });
    }
}

/// Detect and resolve every collision of this tick
///
/// Returns the resolved collisions, projectiles first.
pub fn check_collisions(registry: &mut Registry) -> Vec<Collision> {
    let mut collisions = Vec::new();
    let hulls = hull_volumes(registry);

    for projectile in projectiles(registry) {
        // hulls sunk by an earlier projectile this tick are skipped
        let hit = hulls
            .iter()
            .filter(|h| Some(h.entity) != projectile.parent)
            .filter(|h| registry.get(h.entity).map_or(false, |t| t.is_alive()))
            .find_map(|h| probe_hull(projectile.probe, h).map(|p| (h.entity, p)));
        if let Some((target, point)) = hit {
            log::debug!("{} hit {} at {:?}", projectile.entity, target, point);
            respond(registry, projectile.entity, target, point, projectile.strength);
            collisions.push(Collision {
                striker: projectile.entity,
                target,
                point,
                strength: projectile.strength,
            });
        }
    }

    let is_alive = |registry: &Registry, e: Entity| registry.get(e).map_or(false, |t| t.is_alive());
    for (i, a) in hulls.iter().enumerate() {
        for b in &hulls[i + 1..] {
            if !a.aabb.overlaps(&b.aabb) || !a.obb.overlaps(&b.obb) {
                continue;
            }
            // a hull sunk by a projectile this tick no longer rams
            if !is_alive(registry, a.entity) || !is_alive(registry, b.entity) {
                continue;
            }
            if let Some(collision) = ram(registry, a, b) {
                collisions.push(collision);
            }
        }
    }
    collisions
}

fn ram(registry: &mut Registry, a: &HullVolume, b: &HullVolume) -> Option<Collision> {
    let point = a.obb.contact_point(&b.obb);
    let (va, pa) = registry.body(a.entity).map(|x| (x.velocity, x.position))?;
    let (vb, pb) = registry.body(b.entity).map(|x| (x.velocity, x.position))?;

    let mut normal = (pb - pa).xy();
    if normal.length() < 1e-9 {
        normal = a.obb.axes[1];
    }
    let normal = normal.normal().xy0(0.0);
    let closing = (va - vb).dot(normal).max(0.0);
    let strength = closing * RAM_DAMAGE_PER_MS;

    // separate along the center line by the footprint overlap
    let reach = a.obb.projected_radius(normal.xy()) + b.obb.projected_radius(normal.xy());
    let gap = (pb - pa).xy().dot(normal.xy());
    let push = ((reach - gap) * 0.5).max(0.0);
    for (entity, sign) in [(a.entity, -1.0), (b.entity, 1.0)] {
        if let Some(body) = registry.body_mut(entity) {
            body.position += normal * (push * sign);
            let approach = body.velocity.dot(normal) * sign;
            if approach < 0.0 {
                body.velocity -= normal * (approach * sign);
            }
        }
    }

    if strength > 0.0 {
        respond(registry, a.entity, b.entity, point, strength);
        if let Some(item) = registry.get_mut(a.entity) {
            item.body_mut().damage(strength);
        }
    }
    log::debug!("{} rammed {}, closing speed {:.2} m/s", a.entity, b.entity, closing);
    Some(Collision {
        striker: a.entity,
        target: b.entity,
        point,
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{GunShell, Ship, Torpedo, TorpedoPattern, TorpedoType};
    use crate::ecs::system::{Simulatable, TickContext};
    use crate::math::Angle;

    fn ship_at(registry: &mut Registry, x: f64, y: f64) -> Entity {
        registry.spawn(Ship::from_class_name("largemerchant", Vector3::new(x, y, 0.0), Angle::new(0.0)).unwrap())
    }

    #[test]
    fn test_obb_separating_axis() {
        let mut body = Body::new(Vector3::zero(), Angle::new(0.0), crate::ecs::components::Extents::new(100.0, 10.0, 10.0, 5.0), 1.0);
        let a = OrientedBox::from_body(&body);
        body.position = Vector3::new(12.0, 0.0, 0.0);
        assert!(!a.overlaps(&OrientedBox::from_body(&body)));
        body.position = Vector3::new(8.0, 0.0, 0.0);
        assert!(a.overlaps(&OrientedBox::from_body(&body)));
        // rotated 90 degrees the long side reaches across
        body.position = Vector3::new(40.0, 0.0, 0.0);
        body.orientation = crate::math::Quaternion::from_heading(Angle::new(90.0));
        assert!(a.overlaps(&OrientedBox::from_body(&body)));
        // disjoint depth ranges never overlap
        body.position = Vector3::new(0.0, 0.0, -30.0);
        assert!(!a.overlaps(&OrientedBox::from_body(&body)));
    }

    #[test]
    fn test_segment_entry() {
        let body = Body::new(Vector3::zero(), Angle::new(0.0), crate::ecs::components::Extents::new(100.0, 10.0, 10.0, 5.0), 1.0);
        let obb = OrientedBox::from_body(&body);
        let t = obb.segment_entry(Vector3::new(-20.0, 0.0, 1.0), Vector3::new(20.0, 0.0, 1.0)).unwrap();
        assert!((t - 0.375).abs() < 1e-12);
        assert!(obb.segment_entry(Vector3::new(-20.0, 0.0, 20.0), Vector3::new(20.0, 0.0, 20.0)).is_none());
        assert!(obb.segment_entry(Vector3::new(-20.0, 0.0, 1.0), Vector3::new(-10.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_shell_hits_first_target_in_order() {
        let mut registry = Registry::new();
        let first = ship_at(&mut registry, 0.0, 0.0);
        let second = ship_at(&mut registry, 5.0, 0.0);

        let mut shell = GunShell::new(Vector3::new(-50.0, 0.0, 5.0), Angle::new(90.0), Angle::new(0.0), 400.0);
        shell.integrate(&TickContext::new(0.0, 0.2));
        let shell = registry.spawn(shell);

        let collisions = check_collisions(&mut registry);
        let hits: Vec<_> = collisions.iter().filter(|c| c.striker == shell).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, first);
        assert!(registry.ship(first).unwrap().hull.body.health.damage_fraction() > 0.0);
        assert_eq!(registry.ship(second).unwrap().hull.body.health.damage_fraction(), 0.0);
        assert!(registry.gun_shell(shell).unwrap().has_hit());
    }

    #[test]
    fn test_parent_is_never_hit() {
        let mut registry = Registry::new();
        let ship = ship_at(&mut registry, 0.0, 0.0);
        let mut shell = GunShell::new(Vector3::new(0.0, 0.0, 5.0), Angle::new(90.0), Angle::new(0.0), 400.0);
        shell.parent = Some(ship);
        shell.integrate(&TickContext::new(0.0, 0.05));
        registry.spawn(shell);
        assert!(check_collisions(&mut registry).is_empty());
    }

    #[test]
    fn test_unarmed_torpedo_passes() {
        let mut registry = Registry::new();
        let ship = ship_at(&mut registry, 0.0, 100.0);
        let mut torpedo = Torpedo::new(TorpedoType::G7a, Vector3::new(0.0, 0.0, -3.0), Angle::new(0.0), 3.0, TorpedoPattern::straight());
        torpedo.integrate(&TickContext::new(0.0, 2.0));
        registry.spawn(torpedo);
        assert!(check_collisions(&mut registry).is_empty());
        assert_eq!(registry.ship(ship).unwrap().hull.body.health.damage_fraction(), 0.0);
    }

    #[test]
    fn test_ramming_separates_and_damages() {
        let mut registry = Registry::new();
        let a = ship_at(&mut registry, 0.0, 0.0);
        let b = ship_at(&mut registry, 15.0, 0.0);
        registry.body_mut(a).unwrap().velocity = Vector3::new(5.0, 0.0, 0.0);
        let collisions = check_collisions(&mut registry);
        assert_eq!(collisions.len(), 1);
        let pa = registry.body(a).unwrap().position;
        let pb = registry.body(b).unwrap().position;
        assert!(pb.x - pa.x >= 20.0 - 1e-9);
        assert!(registry.body(b).unwrap().health.damage_fraction() > 0.0);
        assert!(registry.body(a).unwrap().velocity.x <= 1e-12);
    }

    #[test]
    fn test_hull_sunk_this_tick_does_not_ram() {
        let mut registry = Registry::new();
        let a = ship_at(&mut registry, 0.0, 0.0);
        let b = ship_at(&mut registry, 15.0, 0.0);
        {
            let body = registry.body_mut(a).unwrap();
            body.velocity = Vector3::new(5.0, 0.0, 0.0);
            let max = body.health.max();
            body.damage(max - SHELL_DAMAGE * 0.5);
        }
        let mut shell = GunShell::new(Vector3::new(-50.0, 0.0, 5.0), Angle::new(90.0), Angle::new(0.0), 400.0);
        shell.integrate(&TickContext::new(0.0, 0.2));
        let shell = registry.spawn(shell);

        let collisions = check_collisions(&mut registry);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].striker, shell);
        assert_eq!(collisions[0].target, a);
        assert!(registry.body(a).unwrap().is_dead());
        assert_eq!(registry.body(a).unwrap().position, Vector3::zero());
        assert_eq!(registry.body(b).unwrap().position, Vector3::new(15.0, 0.0, 0.0));
        assert_eq!(registry.body(b).unwrap().health.damage_fraction(), 0.0);
    }
}
