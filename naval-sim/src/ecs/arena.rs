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
//! Generational arena storage for one entity kind
//!
//! The arena keeps entity values densely packed in insertion order (which
//! is the order used for iteration, collision tie-breaks and save output)
//! and maintains a sparse slot table mapping slot index to dense index and
//! slot generation.
//!
//! # Memory Layout
//!
//! ```text
//! sparse: [slot0 {gen 2, dense 1}, slot1 {gen 0, free}, slot2 {gen 0, dense 0}]
//! dense:  [Entry{slot2, value}, Entry{slot0, value}]
//! ```
//!
//! Removal happens only in batches (`evict`), which preserves the relative
//! order of the surviving entries.

use crate::ecs::{Entity, EntityKind};

#[derive(Debug, Clone, Copy)]
struct SlotMeta {
    generation: u32,
    dense: Option<usize>,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    entity: Entity,
    value: T,
}

/// Insertion-ordered generational arena
#[derive(Debug, Clone)]
pub struct Arena<T> {
    kind: EntityKind,
    sparse: Vec<SlotMeta>,
    dense: Vec<Entry<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    /// Create an empty arena for the given kind
    pub fn new(kind: EntityKind) -> Self {
        Arena {
            kind,
            sparse: Vec::new(),
            dense: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Kind of the entities stored here
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Insert a value and return its identity
    ///
    /// Freed slots are reused with their bumped generation.
    pub fn insert(&mut self, value: T) -> Entity {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.sparse.push(SlotMeta {
                    generation: 0,
                    dense: None,
                });
                (self.sparse.len() - 1) as u32
            }
        };
        let meta = &mut self.sparse[slot as usize];
        let entity = Entity::new(self.kind, slot, meta.generation);
        meta.dense = Some(self.dense.len());
        self.dense.push(Entry { entity, value });

        debug_assert!(self.dense.len() <= self.sparse.len());
        entity
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        if entity.kind() != self.kind {
            return None;
        }
        let meta = self.sparse.get(entity.id().raw() as usize)?;
        if meta.generation != entity.generation() {
            return None;
        }
        meta.dense
    }

    /// Get a reference to a stored value
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let index = self.dense_index(entity)?;
        Some(&self.dense[index].value)
    }

    /// Get a mutable reference to a stored value
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let index = self.dense_index(entity)?;
        Some(&mut self.dense[index].value)
    }

    /// Check whether the identity names a stored value
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.dense.iter().map(|e| (e.entity, &e.value))
    }

    /// Iterate mutably in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.dense.iter_mut().map(|e| (e.entity, &mut e.value))
    }

    /// Identities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().map(|e| e.entity)
    }

    /// Remove every value matching `predicate`, preserving the order of the
    /// rest, and return the evicted identities
    ///
    /// Each freed slot's generation is bumped before it becomes reusable.
    pub fn evict<F>(&mut self, mut predicate: F) -> Vec<Entity>
    where
        F: FnMut(&T) -> bool,
    {
        let mut evicted = Vec::new();
        let sparse = &mut self.sparse;
        let free = &mut self.free;
        self.dense.retain(|entry| {
            if predicate(&entry.value) {
                let slot = entry.entity.id().raw();
                let meta = &mut sparse[slot as usize];
                meta.generation = meta.generation.wrapping_add(1);
                meta.dense = None;
                free.push(slot);
                evicted.push(entry.entity);
                false
            } else {
                true
            }
        });

        if !evicted.is_empty() {
            for (index, entry) in self.dense.iter().enumerate() {
                self.sparse[entry.entity.id().raw() as usize].dense = Some(index);
            }
        }

        debug_assert_eq!(self.dense.len() + self.free.len(), self.sparse.len());
        evicted
    }

    /// Remove all values; every slot generation is bumped
    pub fn clear(&mut self) {
        self.evict(|_| true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic() {
        let mut arena = Arena::new(EntityKind::Ship);
        let e = arena.insert(10);
        assert!(arena.contains(e));
        assert_eq!(arena.get(e), Some(&10));
        if let Some(v) = arena.get_mut(e) {
            *v = 20;
        }
        assert_eq!(arena.get(e), Some(&20));
    }

    #[test]
    fn test_arena_kind_mismatch() {
        let mut arena = Arena::new(EntityKind::Ship);
        let e = arena.insert(1);
        let foreign = Entity::new(EntityKind::Submarine, e.id().raw(), e.generation());
        assert!(arena.get(foreign).is_none());
    }

    #[test]
    fn test_arena_evict_preserves_order() {
        let mut arena = Arena::new(EntityKind::Torpedo);
        for i in 0..10 {
            arena.insert(i);
        }
        let evicted = arena.evict(|v| v % 3 == 0);
        assert_eq!(evicted.len(), 4);
        let remaining: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(remaining, vec![1, 2, 4, 5, 7, 8]);
        for (e, v) in arena.iter() {
            assert_eq!(arena.get(e), Some(v));
        }
    }

    #[test]
    fn test_arena_reuse_bumps_generation() {
        let mut arena = Arena::new(EntityKind::GunShell);
        let old = arena.insert("old");
        arena.evict(|_| true);
        let new = arena.insert("new");
        assert_eq!(old.id(), new.id());
        assert_ne!(old.generation(), new.generation());
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&"new"));
    }

    #[test]
    fn test_arena_rapid_creation_destruction() {
        let mut arena = Arena::new(EntityKind::Particle);
        let handles: Vec<Entity> = (0..100).map(|i| arena.insert(i)).collect();
        arena.evict(|v| v % 2 == 1);
        assert_eq!(arena.len(), 50);
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(arena.contains(*h), i % 2 == 0);
        }
        for i in 0..50 {
            arena.insert(1000 + i);
        }
        assert_eq!(arena.len(), 100);
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(arena.contains(*h), i % 2 == 0);
        }
    }
}
