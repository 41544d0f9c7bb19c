//! Per-kind component storage: a dense array of values, a sparse entity→slot map, and an
//! intrusive free list for slot reuse.

mod sparse;

use std::any::Any;

use log::debug;
use sparse::SparseIndex;

use crate::component::Category;
use crate::entity::EntityId;
use crate::error::Error;

enum Slot<T> {
    Occupied {
        entity: EntityId,
        value: T,
        /// Next node in this entity's instance list, for Multiple kinds. Unused
        /// (always `None`) for every other category.
        next: Option<usize>,
    },
    Free {
        next_free: Option<usize>,
    },
}

/// Storage for one component kind, shaped by its [`Category`] at construction.
///
/// All four categories share this one implementation:
/// - Single: the sparse map holds each entity's one slot directly.
/// - Multiple: the sparse map holds the head of an intrusive singly-linked list of slots
///   per entity; `remove` walks and frees the whole chain.
/// - Singleton: every entity is addressed through the same fixed key (`0`), so the pool
///   behaves like a Single pool with one permanently-shared slot.
/// - SingleFrame: `remove` only clears the sparse entry; slots are reclaimed in bulk by
///   `clear_all`, not returned to the free list individually.
pub struct Pool<T> {
    dense: Vec<Slot<T>>,
    sparse: SparseIndex,
    free_head: Option<usize>,
    category: Category,
    live_count: usize,
    epoch: u64,
}

impl<T> Pool<T> {
    pub fn new(category: Category) -> Self {
        Self {
            dense: Vec::new(),
            sparse: SparseIndex::new(),
            free_head: None,
            category,
            live_count: 0,
            epoch: 0,
        }
    }

    #[inline]
    fn key_for(&self, entity: EntityId) -> usize {
        if self.category.is_singleton() {
            0
        } else {
            entity.index()
        }
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_head {
            let next_free = match &self.dense[idx] {
                Slot::Free { next_free } => *next_free,
                Slot::Occupied { .. } => unreachable!("free list pointed at an occupied slot"),
            };
            self.free_head = next_free;
            idx
        } else {
            let idx = self.dense.len();
            self.dense.push(Slot::Free { next_free: None });
            idx
        }
    }

    fn free_slot(&mut self, idx: usize) {
        self.dense[idx] = Slot::Free {
            next_free: self.free_head,
        };
        self.free_head = Some(idx);
    }

    /// Insert a new instance for `entity`. Fails with [`Error::AlreadyPresent`] if this is
    /// a Single or Singleton kind already held.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Result<(), Error> {
        let key = self.key_for(entity);
        let multiple = self.category.is_multiple();
        let was_present = self.sparse.contains(key);
        if !multiple && was_present {
            return Err(Error::AlreadyPresent);
        }
        let prev_head = if multiple { self.sparse.get(key) } else { None };
        let slot = self.alloc_slot();
        self.dense[slot] = Slot::Occupied {
            entity,
            value,
            next: prev_head,
        };
        self.sparse.insert(key, slot);
        if !was_present {
            self.live_count += 1;
        }
        self.epoch += 1;
        Ok(())
    }

    /// Overwrite an existing Single/Singleton instance in place. Fails with
    /// [`Error::Missing`] if absent, or [`Error::MultipleNotRemovable`] for a Multiple
    /// kind (single-value overwrite has no defined target among N instances).
    pub fn overwrite(&mut self, entity: EntityId, value: T) -> Result<(), Error> {
        if self.category.is_multiple() {
            return Err(Error::MultipleNotRemovable);
        }
        let key = self.key_for(entity);
        let slot = self.sparse.get(key).ok_or(Error::Missing)?;
        if let Slot::Occupied { value: existing, .. } = &mut self.dense[slot] {
            *existing = value;
        }
        Ok(())
    }

    /// Insert if absent, overwrite if present.
    pub fn upsert(&mut self, entity: EntityId, value: T) -> Result<(), Error> {
        if self.category.is_multiple() {
            return Err(Error::MultipleNotRemovable);
        }
        if self.sparse.contains(self.key_for(entity)) {
            self.overwrite(entity, value)
        } else {
            self.insert(entity, value)
        }
    }

    /// Read the single stored value for a non-Multiple kind.
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        if self.category.is_multiple() {
            return None;
        }
        let slot = self.sparse.get(self.key_for(entity))?;
        match &self.dense[slot] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Mutably read the single stored value for a non-Multiple kind.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        if self.category.is_multiple() {
            return None;
        }
        let slot = self.sparse.get(self.key_for(entity))?;
        match &mut self.dense[slot] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Every instance stored for `entity`, in insertion order (most recent first). Only
    /// meaningful for Multiple kinds; non-Multiple kinds yield at most one value.
    pub fn iter_entity(&self, entity: EntityId) -> impl Iterator<Item = &T> {
        let mut cursor = self.sparse.get(self.key_for(entity));
        std::iter::from_fn(move || loop {
            let idx = cursor?;
            match &self.dense[idx] {
                Slot::Occupied { value, next, .. } => {
                    cursor = *next;
                    return Some(value);
                }
                Slot::Free { .. } => return None,
            }
        })
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.sparse.contains(self.key_for(entity))
    }

    /// Remove every instance held by `entity`. Idempotent; returns whether anything was
    /// removed.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let key = self.key_for(entity);
        let removed = if self.category.is_single_frame() {
            // Slot reclamation happens in bulk at `clear_all`, not here.
            self.sparse.remove(key).is_some()
        } else if self.category.is_multiple() {
            match self.sparse.remove(key) {
                Some(head) => {
                    let mut cursor = Some(head);
                    while let Some(idx) = cursor {
                        let next = match &self.dense[idx] {
                            Slot::Occupied { next, .. } => *next,
                            Slot::Free { .. } => None,
                        };
                        self.free_slot(idx);
                        cursor = next;
                    }
                    true
                }
                None => false,
            }
        } else {
            match self.sparse.remove(key) {
                Some(slot) => {
                    self.free_slot(slot);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.live_count -= 1;
            self.epoch += 1;
        }
        removed
    }

    /// Bulk-clear a SingleFrame pool: truncate the dense array and reset the sparse map.
    pub fn clear_all(&mut self) {
        if !self.dense.is_empty() {
            debug!(
                "clearing pool: {} slot(s) reclaimed, {} entit(y/ies) dropped",
                self.dense.len(),
                self.live_count
            );
        }
        self.dense.clear();
        self.sparse.clear();
        self.free_head = None;
        self.live_count = 0;
        self.epoch += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// The number of distinct entities currently holding at least one instance.
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Every occupied (entity, value) pair, in dense order. For a Multiple kind this
    /// visits each stored instance once, so an entity with N instances appears N times.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.dense.iter().filter_map(|slot| match slot {
            Slot::Occupied { entity, value, .. } => Some((*entity, value)),
            Slot::Free { .. } => None,
        })
    }
}

/// Type-erased operations every `Pool<T>` supports, used by [`crate::world::World`] to
/// hold a heterogeneous `Vec<Box<dyn AnyPool>>` indexed by component [`crate::component::Id`].
pub trait AnyPool: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn contains_entity(&self, entity: EntityId) -> bool;
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn clear_all(&mut self);
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn dense_len(&self) -> usize;
    fn entity_at(&self, slot: usize) -> Option<EntityId>;
    fn epoch(&self) -> u64;
}

impl<T: 'static> AnyPool for Pool<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.contains(entity)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity)
    }

    fn clear_all(&mut self) {
        Pool::clear_all(self)
    }

    fn is_empty(&self) -> bool {
        Pool::is_empty(self)
    }

    fn len(&self) -> usize {
        Pool::len(self)
    }

    fn dense_len(&self) -> usize {
        self.dense.len()
    }

    fn entity_at(&self, slot: usize) -> Option<EntityId> {
        match self.dense.get(slot)? {
            Slot::Occupied { entity, .. } => Some(*entity),
            Slot::Free { .. } => None,
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Category;

    fn eid(raw: u64) -> EntityId {
        EntityId::new(raw)
    }

    #[test]
    fn single_insert_then_get() {
        // Given
        let mut pool: Pool<&'static str> = Pool::new(Category::Single);
        let e = eid(0);

        // When
        pool.insert(e, "hello").unwrap();

        // Then
        assert_eq!(pool.get(e), Some(&"hello"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn single_double_insert_fails() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Single);
        let e = eid(0);
        pool.insert(e, 1).unwrap();

        // When
        let result = pool.insert(e, 2);

        // Then
        assert_eq!(result, Err(Error::AlreadyPresent));
    }

    #[test]
    fn remove_then_reinsert_reuses_slot() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Single);
        let e1 = eid(0);
        let e2 = eid(1);
        pool.insert(e1, 1).unwrap();
        pool.insert(e2, 2).unwrap();

        // When
        pool.remove(e1);
        pool.insert(eid(2), 3).unwrap();

        // Then - the freed slot was reused rather than appended
        assert_eq!(pool.dense.len(), 2);
        assert_eq!(pool.get(eid(2)), Some(&3));
        assert_eq!(pool.get(e2), Some(&2));
    }

    #[test]
    fn multiple_kind_tracks_all_instances_per_entity() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Multiple);
        let e = eid(0);

        // When
        pool.insert(e, 1).unwrap();
        pool.insert(e, 2).unwrap();
        pool.insert(e, 3).unwrap();

        // Then
        let mut values: Vec<_> = pool.iter_entity(e).copied().collect();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(pool.len(), 1, "one distinct entity holds the kind");
        assert_eq!(pool.iter().count(), 3, "three stored instances total");
    }

    #[test]
    fn multiple_remove_clears_all_instances() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Multiple);
        let e = eid(0);
        pool.insert(e, 1).unwrap();
        pool.insert(e, 2).unwrap();

        // When
        let removed = pool.remove(e);

        // Then
        assert!(removed);
        assert_eq!(pool.iter_entity(e).count(), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn overwrite_on_multiple_is_rejected() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Multiple);
        let e = eid(0);
        pool.insert(e, 1).unwrap();

        // When
        let result = pool.overwrite(e, 2);

        // Then
        assert_eq!(result, Err(Error::MultipleNotRemovable));
    }

    #[test]
    fn single_frame_remove_does_not_free_slot_until_clear() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::SingleFrame { multiple: false });
        let e = eid(0);
        pool.insert(e, 1).unwrap();

        // When
        pool.remove(e);

        // Then - logically absent, but the dense slot lingers until a bulk clear
        assert!(pool.is_empty());
        assert_eq!(pool.dense_len_for_test(), 1);

        // When
        pool.clear_all();

        // Then
        assert_eq!(pool.dense_len_for_test(), 0);
    }

    #[test]
    fn singleton_ignores_entity_identity() {
        // Given
        let mut pool: Pool<i32> = Pool::new(Category::Singleton);

        // When
        pool.insert(eid(7), 42).unwrap();

        // Then - any entity id reads the same shared value
        assert_eq!(pool.get(eid(0)), Some(&42));
        assert_eq!(pool.get(eid(999)), Some(&42));
    }

    impl<T> Pool<T> {
        fn dense_len_for_test(&self) -> usize {
            self.dense.len()
        }
    }
}
