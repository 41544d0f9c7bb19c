//! The world: a fixed set of component pools built once by [`WorldBuilder`], plus entity
//! identity and the single-frame cleanup checker.

mod builder;

pub use builder::WorldBuilder;

use log::{debug, warn};

use crate::component::{Component, Id, KindSet, Registry};
use crate::entity::{Entity, EntityId, EntityMut};
use crate::error::Error;
use crate::filter::Filter;
use crate::pool::{AnyPool, Pool};

/// Owns every component pool and hands out entity identifiers.
///
/// A `World` is only ever produced by [`WorldBuilder::build`]: component kinds are
/// registered up front, not discovered lazily from the first value a caller happens to
/// insert.
pub struct World {
    registry: Registry,
    pools: Vec<Box<dyn AnyPool>>,
    next_entity: u64,
    /// Armed once the top-level systems group has completed its first `init`. Before
    /// arming, `MissingCleanup` is never raised, so a bare `World` exercised directly
    /// (with no `System`/`Group` involved at all) never spuriously fails.
    checker_armed: bool,
    /// Single-frame kinds a registered bulk-remove system has promised to clear.
    single_frame_cleared: KindSet,
}

impl World {
    fn pool_ref<C: Component>(&self) -> &Pool<C> {
        let id = self.registry.require::<C>();
        self.pools[id.index()]
            .as_any()
            .downcast_ref::<Pool<C>>()
            .expect("pool type did not match its registered component id")
    }

    fn pool_mut<C: Component>(&mut self) -> &mut Pool<C> {
        let id = self.registry.require::<C>();
        self.pools[id.index()]
            .as_any_mut()
            .downcast_mut::<Pool<C>>()
            .expect("pool type did not match its registered component id")
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Allocate a fresh, never-before-used identifier.
    pub fn new_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity += 1;
        id
    }

    /// The number of identifiers ever allocated, i.e. one past the highest entity id.
    pub fn entity_count(&self) -> u64 {
        self.next_entity
    }

    pub fn entity(&self, id: EntityId) -> Entity<'_> {
        Entity::new(self, id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> EntityMut<'_> {
        EntityMut::new(self, id)
    }

    /// Visit every identifier ever allocated, live or not. Callers filter by component
    /// presence themselves; a `World` does not track entity liveness beyond its pools.
    pub fn each_entity(&self, mut visitor: impl FnMut(EntityId)) {
        for raw in 0..self.next_entity {
            visitor(EntityId::new(raw));
        }
    }

    pub fn new_filter(&self) -> Filter {
        Filter::new()
    }

    pub fn add<C: Component>(&mut self, entity: EntityId, value: C) -> Result<(), Error> {
        let id = self.registry.require::<C>();
        let info = self.registry.info(id);
        if info.category().is_single_frame()
            && info.check()
            && self.checker_armed
            && !self.single_frame_cleared.contains(id)
        {
            return Err(Error::MissingCleanup);
        }
        self.pool_mut::<C>().insert(entity, value)
    }

    pub fn get<C: Component>(&self, entity: EntityId) -> Result<&C, Error> {
        self.pool_ref::<C>().get(entity).ok_or(Error::Missing)
    }

    pub fn get_opt<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.pool_ref::<C>().get(entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> Result<&mut C, Error> {
        self.pool_mut::<C>().get_mut(entity).ok_or(Error::Missing)
    }

    pub fn set<C: Component>(&mut self, entity: EntityId, value: C) -> Result<(), Error> {
        self.pool_mut::<C>().upsert(entity, value)
    }

    pub fn update<C: Component>(&mut self, entity: EntityId, value: C) -> Result<(), Error> {
        self.pool_mut::<C>().overwrite(entity, value)
    }

    pub fn remove<C: Component>(&mut self, entity: EntityId) {
        self.pool_mut::<C>().remove(entity);
    }

    pub fn contains<C: Component>(&self, entity: EntityId) -> bool {
        self.pool_ref::<C>().contains(entity)
    }

    /// Whether any entity in the world currently holds an instance of kind `C`. Backed by
    /// the pool's own live-instance counter, which doubles as the kind-present index: it is
    /// incremented on first add since empty and decremented back to zero on last remove, so
    /// this reads in O(1) regardless of world size.
    pub fn component_exists<C: Component>(&self) -> bool {
        !self.pool_ref::<C>().is_empty()
    }

    pub fn iter_multiple<C: Component>(&self, entity: EntityId) -> impl Iterator<Item = &C> {
        self.pool_ref::<C>().iter_entity(entity)
    }

    /// Remove every component an entity holds, of every registered kind. Its identifier
    /// is not reused; a later `add` revives it under the same id.
    pub fn destroy(&mut self, entity: EntityId) {
        let mut removed_anything = false;
        for pool in &mut self.pools {
            removed_anything |= pool.remove_entity(entity);
        }
        if !removed_anything {
            warn!("attempted to destroy an entity holding no components: {entity:?}");
        }
    }

    /// Clear every pool in the world, of every kind. The entity id counter is untouched:
    /// the next `new_entity` still allocates past the highest id ever issued.
    pub fn delete_all(&mut self) {
        for pool in &mut self.pools {
            pool.clear_all();
        }
    }

    /// Bulk-clear every `SingleFrame` pool. Called by the built-in bulk-remove systems
    /// driven through [`crate::system::Group`]; exposed directly for hosts that manage
    /// single-frame kinds without the systems layer.
    pub fn clear_single_frame(&mut self) {
        for info in self.registry.iter().filter(|i| i.category().is_single_frame()) {
            self.pools[info.id().index()].clear_all();
        }
    }

    pub(crate) fn arm_single_frame_checker(&mut self, cleared: KindSet) {
        debug!(
            "arming single-frame cleanup checker: {} kind(s) covered by a bulk-remove system",
            cleared.len()
        );
        self.single_frame_cleared = cleared;
        self.checker_armed = true;
    }

    pub(crate) fn checker_armed(&self) -> bool {
        self.checker_armed
    }

    pub(crate) fn pool_dyn(&self, id: Id) -> &dyn AnyPool {
        self.pools[id.index()].as_ref()
    }

    /// Bulk-clear a single pool by id, regardless of its category. Used by
    /// [`crate::system::RemoveSingleFrame`] to clear the one `SingleFrame` kind it owns.
    pub(crate) fn clear_kind(&mut self, id: Id) {
        self.pools[id.index()].clear_all();
    }
}
