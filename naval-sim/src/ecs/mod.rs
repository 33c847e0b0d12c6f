//! Entity storage and the per-tick execution framework
//!
//! This module provides:
//! - Generational entity identities
//! - Per-kind arenas and the registry that owns every entity
//! - The `Simulatable` capability shared by all entity kinds
//! - The scheduler splitting integration across worker threads

mod entity;

pub mod arena;
pub mod components;
pub mod registry;
pub mod scheduler;
pub mod system;

pub use entity::{AliveState, Entity, EntityId, EntityKind};
pub use registry::{EntityData, Registry};
pub use system::{Simulatable, TickContext};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::WaterSplash;
    use crate::math::Vector3;

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_entity_creation() {
        let mut registry = Registry::new();
        let entity = registry.spawn(WaterSplash::new(Vector3::zero()));
        assert_eq!(registry.len(), 1);
        assert_eq!(entity.kind(), EntityKind::WaterSplash);
        assert!(registry.contains(entity));
    }
}
