//! System lifecycle and the group that drives it: init, then per-frame filter/process,
//! then an unfiltered execute, then (on shutdown) teardown in reverse declaration order.

use std::marker::PhantomData;

use crate::component::{Component, Id, KindSet};
use crate::entity::EntityMut;
use crate::filter::Filter;
use crate::world::World;

/// A unit of per-frame logic bound to an optional [`Filter`].
///
/// Every hook has a default no-op so implementers only override what they use. A system
/// with no `filter` never has `process` called; one that returns `Some` has `process`
/// called once per matched entity, in filter iteration order, before `execute` runs.
pub trait System {
    /// Runs once, the first time the owning [`Group`]'s `init` is called.
    fn init(&mut self, world: &mut World) {
        let _ = world;
    }

    /// Built once per frame, before `process`. Returning `None` skips `process` entirely
    /// for this frame.
    fn filter(&self, world: &World) -> Option<Filter> {
        let _ = world;
        None
    }

    /// Called once per entity the system's filter matched this frame.
    fn process(&mut self, entity: EntityMut<'_>) {
        let _ = entity;
    }

    /// Called once per frame, after every matched entity has been processed.
    fn execute(&mut self, world: &mut World) {
        let _ = world;
    }

    /// Runs once, when the owning group is torn down.
    fn teardown(&mut self, world: &mut World) {
        let _ = world;
    }

    /// Whether this system participates in the current frame at all. An inactive system
    /// still receives `init` and `teardown`, just never `filter`/`process`/`execute`.
    fn active(&self) -> bool {
        true
    }

    /// Identifies the single-frame kind this system is responsible for bulk-clearing, if
    /// any. Collected once during the owning group's top-level `init` to decide which
    /// `check = true` single-frame kinds are considered covered.
    fn single_frame_clears(&self, world: &World) -> Option<Id> {
        let _ = world;
        None
    }
}

/// The recursive seam that lets a [`Group`] contain either systems or nested groups
/// uniformly.
trait GroupMember {
    fn init_recursive(&mut self, world: &mut World, cleared: &mut KindSet);
    fn execute_recursive(&mut self, world: &mut World);
    fn teardown_recursive(&mut self, world: &mut World);
}

struct SystemEntry<S> {
    system: S,
}

impl<S: System> GroupMember for SystemEntry<S> {
    fn init_recursive(&mut self, world: &mut World, cleared: &mut KindSet) {
        self.system.init(world);
        if let Some(id) = self.system.single_frame_clears(world) {
            cleared.insert(id);
        }
    }

    fn execute_recursive(&mut self, world: &mut World) {
        if !self.system.active() {
            return;
        }
        if let Some(filter) = self.system.filter(world) {
            for id in filter.collect_ids(world) {
                self.system.process(world.entity_mut(id));
            }
        }
        self.system.execute(world);
    }

    fn teardown_recursive(&mut self, world: &mut World) {
        self.system.teardown(world);
    }
}

/// An ordered collection of systems and nested groups.
///
/// Declaration order governs `init` and `execute`; `teardown` runs in reverse. A `Group`
/// is itself a [`GroupMember`], so nesting one group inside another recurses through the
/// same three hooks without a separate composite type.
#[derive(Default)]
pub struct Group {
    members: Vec<Box<dyn GroupMember>>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system<S: System + 'static>(mut self, system: S) -> Self {
        self.members.push(Box::new(SystemEntry { system }));
        self
    }

    pub fn add_group(mut self, group: Group) -> Self {
        self.members.push(Box::new(group));
        self
    }

    /// Run every member's `init` in declaration order, then arm the single-frame
    /// cleanup checker against the set of kinds this group's systems claimed to clear.
    ///
    /// Only meaningful on the root group: a nested group reached through `add_group` is
    /// driven through its `GroupMember` impl instead, which never arms the checker itself.
    pub fn init(&mut self, world: &mut World) {
        let mut cleared = KindSet::empty();
        for member in &mut self.members {
            member.init_recursive(world, &mut cleared);
        }
        world.arm_single_frame_checker(cleared);
    }

    pub fn execute(&mut self, world: &mut World) {
        for member in &mut self.members {
            member.execute_recursive(world);
        }
    }

    pub fn teardown(&mut self, world: &mut World) {
        for member in self.members.iter_mut().rev() {
            member.teardown_recursive(world);
        }
    }
}

impl GroupMember for Group {
    fn init_recursive(&mut self, world: &mut World, cleared: &mut KindSet) {
        for member in &mut self.members {
            member.init_recursive(world, cleared);
        }
    }

    fn execute_recursive(&mut self, world: &mut World) {
        for member in &mut self.members {
            member.execute_recursive(world);
        }
    }

    fn teardown_recursive(&mut self, world: &mut World) {
        for member in self.members.iter_mut().rev() {
            member.teardown_recursive(world);
        }
    }
}

/// Built-in bulk-remove system for a single `SingleFrame` kind `T`. Registering one of
/// these in the root group is what lets `check = true` single-frame kinds pass the
/// cleanup checker.
pub struct RemoveSingleFrame<T> {
    id: Option<Id>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> RemoveSingleFrame<T> {
    pub fn new() -> Self {
        Self {
            id: None,
            _marker: PhantomData,
        }
    }
}

impl<T: Component> Default for RemoveSingleFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> System for RemoveSingleFrame<T> {
    fn init(&mut self, world: &mut World) {
        self.id = Some(world.registry().require::<T>());
    }

    fn execute(&mut self, world: &mut World) {
        let id = self.id.expect("init runs before any execute");
        world.clear_kind(id);
    }

    fn single_frame_clears(&self, _world: &World) -> Option<Id> {
        self.id
    }
}
