//! Entity identity and the handle types used to reach component data.

use crate::component::Component;
use crate::error::Error;
use crate::world::World;

/// A strictly monotonic entity identifier.
///
/// Identifiers are never reused within a world's lifetime. Zero is a valid id. A handle
/// constructed over a destroyed id stays structurally valid: `add` on it "revives" the
/// entity under the same identifier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw monotonic value of this identifier.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A read-only handle to an entity: a (world reference, id) pair, cheap to copy.
///
/// `Entity` borrows the world immutably; it can read components but not mutate them. Use
/// [`EntityMut`] for mutation. Both are thin wrappers around [`World`]'s generic
/// `get`/`add`/... methods and carry no state of their own beyond the id.
#[derive(Clone, Copy)]
pub struct Entity<'w> {
    world: &'w World,
    id: EntityId,
}

impl<'w> Entity<'w> {
    #[inline]
    pub(crate) fn new(world: &'w World, id: EntityId) -> Self {
        Self { world, id }
    }

    /// The identifier this handle addresses.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The world this handle was created from.
    #[inline]
    pub fn world(&self) -> &'w World {
        self.world
    }

    /// Read a Single (or Singleton) kind. Fails with [`Error::Missing`] if absent.
    pub fn get<C: Component>(&self) -> Result<&'w C, Error> {
        self.world.get::<C>(self.id)
    }

    /// Read a Single (or Singleton) kind, returning `None` rather than failing if absent.
    pub fn get_opt<C: Component>(&self) -> Option<&'w C> {
        self.world.get_opt::<C>(self.id)
    }

    /// Whether this entity currently holds at least one instance of kind `C`.
    pub fn contains<C: Component>(&self) -> bool {
        self.world.contains::<C>(self.id)
    }

    /// Iterate every stored instance of a Multiple kind on this entity.
    pub fn iter_multiple<C: Component>(&self) -> impl Iterator<Item = &'w C> {
        self.world.iter_multiple::<C>(self.id)
    }
}

/// A mutating handle to an entity: a (world reference, id) pair with write access.
///
/// Only one `EntityMut` (or `Entity`) can exist for a world at a time, by construction of
/// Rust's borrow rules — there is no aliasing hazard to guard against at runtime, matching
/// the single-threaded-cooperative, no-internal-locking model this crate assumes.
pub struct EntityMut<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityMut<'w> {
    #[inline]
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    /// The identifier this handle addresses.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Re-borrow this handle's world immutably, for read operations.
    #[inline]
    pub fn as_entity(&self) -> Entity<'_> {
        Entity::new(self.world, self.id)
    }

    /// Insert a new instance of `C`. Fails with [`Error::AlreadyPresent`] if `C` is Single
    /// (or Singleton) and already held by this entity.
    pub fn add<C: Component>(&mut self, value: C) -> Result<(), Error> {
        self.world.add(self.id, value)
    }

    /// Read a Single (or Singleton) kind. Fails with [`Error::Missing`] if absent.
    pub fn get<C: Component>(&self) -> Result<&C, Error> {
        self.world.get::<C>(self.id)
    }

    /// Read a Single (or Singleton) kind, returning `None` rather than failing if absent.
    pub fn get_opt<C: Component>(&self) -> Option<&C> {
        self.world.get_opt::<C>(self.id)
    }

    /// Mutably read a Single (or Singleton) kind. Fails with [`Error::Missing`] if absent.
    pub fn get_mut<C: Component>(&mut self) -> Result<&mut C, Error> {
        self.world.get_mut::<C>(self.id)
    }

    /// Insert if absent, overwrite if present. Single/Singleton kinds only.
    pub fn set<C: Component>(&mut self, value: C) -> Result<(), Error> {
        self.world.set(self.id, value)
    }

    /// Overwrite an existing Single (or Singleton) instance. Fails with [`Error::Missing`]
    /// if absent.
    pub fn update<C: Component>(&mut self, value: C) -> Result<(), Error> {
        self.world.update(self.id, value)
    }

    /// Remove `Old` (which must be present) then add `new_val`.
    pub fn replace<Old: Component, New: Component>(&mut self, new_val: New) -> Result<(), Error> {
        self.world.get::<Old>(self.id)?;
        self.world.remove::<Old>(self.id);
        self.world.add(self.id, new_val)
    }

    /// Remove every instance of `C` from this entity. Idempotent.
    pub fn remove<C: Component>(&mut self) {
        self.world.remove::<C>(self.id);
    }

    /// Remove every component this entity holds, of every kind. The identifier is not
    /// reused; a later `add` revives the entity.
    pub fn destroy(&mut self) {
        self.world.destroy(self.id);
    }

    /// Obtain a raw pointer to the storage slot for `C`, if present.
    ///
    /// # Safety hazard
    ///
    /// The pointer is invalidated by the next mutation of this pool: removing *any*
    /// entity's instance of `C` may free this slot for reuse, and adding a new instance may
    /// trigger a reallocation that moves every slot. Do not retain this pointer across any
    /// call that touches the `C` pool.
    pub fn get_ptr<C: Component>(&mut self) -> Option<*mut C> {
        self.world.get_mut::<C>(self.id).ok().map(|r| r as *mut C)
    }
}

#[cfg(test)]
mod tests {
    use crate::component::Category;
    use crate::world::WorldBuilder;
    use ecs_core_macros::Component;

    #[derive(Component, Debug, PartialEq)]
    struct Position(i32);

    #[derive(Component, Debug, PartialEq)]
    struct Velocity(i32);

    fn test_world() -> crate::world::World {
        let mut builder = WorldBuilder::new();
        builder.register::<Position>(Category::Single, true);
        builder.register::<Velocity>(Category::Single, true);
        builder.build()
    }

    #[test]
    fn destroyed_entity_revives_on_add() {
        // Given
        let mut world = test_world();
        let e = world.new_entity();
        world.entity_mut(e).add(Position(1)).unwrap();

        // When
        world.entity_mut(e).destroy();
        world.entity_mut(e).add(Position(2)).unwrap();

        // Then - same id, fresh value, no error for reusing a destroyed handle
        assert_eq!(world.entity(e).get::<Position>().unwrap().0, 2);
    }

    #[test]
    fn replace_is_equivalent_to_remove_then_add() {
        // Given
        let mut world = test_world();
        let e = world.new_entity();
        world.entity_mut(e).add(Position(1)).unwrap();

        // When
        world.entity_mut(e).replace::<Position, Velocity>(Velocity(9)).unwrap();

        // Then
        assert!(world.entity(e).get_opt::<Position>().is_none());
        assert_eq!(world.entity(e).get::<Velocity>().unwrap().0, 9);
    }

    #[test]
    fn replace_fails_when_old_kind_absent() {
        // Given
        let mut world = test_world();
        let e = world.new_entity();

        // When
        let result = world.entity_mut(e).replace::<Position, Velocity>(Velocity(1));

        // Then
        assert!(result.is_err());
        assert!(world.entity(e).get_opt::<Velocity>().is_none());
    }

    #[test]
    fn get_ptr_reads_through_to_the_same_slot() {
        // Given
        let mut world = test_world();
        let e = world.new_entity();
        world.entity_mut(e).add(Position(5)).unwrap();

        // When
        let ptr = world.entity_mut(e).get_ptr::<Position>().unwrap();

        // Then
        unsafe {
            assert_eq!((*ptr).0, 5);
        }
    }
}
