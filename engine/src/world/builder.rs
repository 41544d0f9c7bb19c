use std::any::TypeId;
use std::collections::HashMap;

use super::World;
use crate::component::{Category, Component, Id, Info, Registry};
use crate::component::KindSet;
use crate::pool::{AnyPool, Pool};

/// Assigns every component kind a dense id and category up front, then builds a [`World`]
/// with one freshly-allocated pool per kind.
///
/// There is no lazy, first-use registration path: a kind not registered here panics (via
/// [`Registry::require`]) the first time a world operation names it, which is a host
/// programming error rather than something to recover from at runtime.
pub struct WorldBuilder {
    type_ids: HashMap<TypeId, Id>,
    infos: Vec<Info>,
    factories: Vec<Box<dyn FnOnce() -> Box<dyn AnyPool>>>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            type_ids: HashMap::new(),
            infos: Vec::new(),
            factories: Vec::new(),
        }
    }

    /// Register a component kind, assigning it the next dense id. `check` enables the
    /// single-frame cleanup checker for `SingleFrame` kinds; ignored for other categories.
    ///
    /// # Panics
    /// Panics if `C` has already been registered.
    pub fn register<C: Component>(&mut self, category: Category, check: bool) -> Id {
        assert!(
            !self.type_ids.contains_key(&TypeId::of::<C>()),
            "component type `{}` registered twice",
            std::any::type_name::<C>()
        );
        let id = Id::new(self.infos.len() as u32);
        self.type_ids.insert(TypeId::of::<C>(), id);
        self.infos.push(Info::new::<C>(id, category, check));
        self.factories
            .push(Box::new(move || Box::new(Pool::<C>::new(category)) as Box<dyn AnyPool>));
        id
    }

    pub fn build(self) -> World {
        let registry = Registry::from_parts(self.type_ids, self.infos);
        let pools = self.factories.into_iter().map(|factory| factory()).collect();
        World {
            registry,
            pools,
            next_entity: 0,
            checker_armed: false,
            single_frame_cleared: KindSet::empty(),
        }
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}
