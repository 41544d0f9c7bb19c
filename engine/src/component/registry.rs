use std::any::TypeId;
use std::collections::HashMap;

use super::{Category, Component, Id};

/// Metadata recorded for a registered component kind.
#[derive(Debug, Clone, Copy)]
pub struct Info {
    id: Id,
    type_name: &'static str,
    category: Category,
    check: bool,
}

impl Info {
    pub(crate) fn new<C: Component>(id: Id, category: Category, check: bool) -> Self {
        Self {
            id,
            type_name: std::any::type_name::<C>(),
            category,
            check,
        }
    }

    /// The dense id assigned to this kind.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// The Rust type name, for diagnostics only.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The storage category this kind was registered with.
    #[inline]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether the single-frame checker should enforce cleanup for this kind. Meaningless
    /// for non-`SingleFrame` categories.
    #[inline]
    pub fn check(&self) -> bool {
        self.check
    }
}

/// The build-time manifest of every component kind known to a world: its dense id,
/// category, and check flag.
///
/// A `Registry` is only ever produced by [`crate::world::WorldBuilder::build`]; there is
/// no way to register a kind against an already-built world.
#[derive(Debug, Default)]
pub struct Registry {
    type_ids: HashMap<TypeId, Id>,
    infos: Vec<Info>,
}

impl Registry {
    pub(crate) fn from_parts(type_ids: HashMap<TypeId, Id>, infos: Vec<Info>) -> Self {
        Self { type_ids, infos }
    }

    /// The id assigned to `C`, if it was registered.
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_ids.get(&TypeId::of::<C>()).copied()
    }

    /// The id assigned to `C`. Panics if `C` was never registered — a host programming
    /// error, not a recoverable runtime condition.
    pub fn require<C: Component>(&self) -> Id {
        self.get::<C>().unwrap_or_else(|| {
            panic!(
                "component type `{}` was not registered with the world builder",
                std::any::type_name::<C>()
            )
        })
    }

    /// Metadata for a previously-resolved id.
    pub fn info(&self, id: Id) -> &Info {
        &self.infos[id.index()]
    }

    /// The number of distinct registered kinds (`K` in the spec).
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Every registered kind's metadata, in registration order (and thus `Id` order).
    pub fn iter(&self) -> impl Iterator<Item = &Info> {
        self.infos.iter()
    }
}
