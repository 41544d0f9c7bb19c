//! Queries over a [`World`]: `all_of`/`any_of`/`exclude` clauses plus a free-form
//! `select` predicate, driven by whichever included pool is cheapest to walk.
//!
//! A `Filter` carries no lifetime: clause methods take `&World` as an explicit parameter
//! rather than borrowing it internally, so a [`crate::system::System`] can build one once
//! in `filter()` and reuse the value across frames.

use fixedbitset::FixedBitSet;

use crate::component::{Component, Id, KindSet, KindsOf, Registry};
use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::pool::AnyPool;
use crate::world::World;

/// A reusable query: an AND of `all_of` kinds, an AND of `any_of` groups (each itself an
/// OR over its members), an exclusion set, and zero or more predicates.
#[derive(Default)]
pub struct Filter {
    include_all: KindSet,
    include_any: Vec<KindSet>,
    exclude: KindSet,
    /// At most one Multiple-category kind may appear in an include clause; tracked here
    /// so it can be forced as the iteration driver regardless of its pool size.
    multiple_kind: Option<Id>,
    predicates: Vec<Box<dyn Fn(Entity<'_>) -> bool>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_include_kind(&mut self, id: Id, registry: &Registry) -> Result<(), Error> {
        let info = registry.info(id);
        if info.category().is_singleton() {
            return Err(Error::IllegalFilter(
                "a singleton kind cannot appear in an include clause",
            ));
        }
        if info.category().is_multiple() {
            match self.multiple_kind {
                Some(existing) if existing != id => {
                    return Err(Error::IllegalFilter(
                        "at most one multiple-category kind may be included per filter",
                    ));
                }
                _ => self.multiple_kind = Some(id),
            }
        }
        Ok(())
    }

    /// Require every kind named by `K` (a component type or tuple of up to 8).
    pub fn all_of<K: KindsOf>(mut self, world: &World) -> Result<Self, Error> {
        let kinds = K::kinds_of(world.registry());
        for id in kinds.iter() {
            self.check_include_kind(id, world.registry())?;
            self.include_all.insert(id);
        }
        Ok(self)
    }

    /// Require a single kind `C`. Sugar for `all_of::<C>`.
    pub fn of<C: Component>(self, world: &World) -> Result<Self, Error> {
        self.all_of::<C>(world)
    }

    /// Require at least one kind named by `K`. Each call adds an independent group;
    /// groups are ANDed together, each group itself an OR over its members.
    pub fn any_of<K: KindsOf>(mut self, world: &World) -> Result<Self, Error> {
        let kinds = K::kinds_of(world.registry());
        for id in kinds.iter() {
            self.check_include_kind(id, world.registry())?;
        }
        self.include_any.push(kinds);
        Ok(self)
    }

    /// Reject entities holding any kind named by `K`. Unlike `all_of`/`any_of`, a
    /// Singleton kind is permitted here: it simply never matches, so excluding one is a
    /// (degenerate but harmless) no-op rather than a configuration error.
    pub fn exclude<K: KindsOf>(mut self, world: &World) -> Result<Self, Error> {
        let kinds = K::kinds_of(world.registry());
        self.exclude = self.exclude.union(kinds);
        Ok(self)
    }

    /// Add a free-form predicate, evaluated after every structural clause matches.
    /// Infallible: a predicate can't misconfigure the filter the way a clause can.
    pub fn select(mut self, predicate: impl Fn(Entity<'_>) -> bool + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    fn entry_matches(&self, world: &World, entity: EntityId) -> bool {
        if !self
            .include_all
            .iter()
            .all(|id| world.pool_dyn(id).contains_entity(entity))
        {
            return false;
        }
        for group in &self.include_any {
            if !group.iter().any(|id| world.pool_dyn(id).contains_entity(entity)) {
                return false;
            }
        }
        if self.exclude.iter().any(|id| world.pool_dyn(id).contains_entity(entity)) {
            return false;
        }
        let handle = Entity::new(world, entity);
        self.predicates.iter().all(|predicate| predicate(handle))
    }

    fn group_size(world: &World, group: &KindSet) -> usize {
        group.iter().map(|id| world.pool_dyn(id).len()).sum()
    }

    /// Walk every member of `group`'s pools, deduplicating by entity id. Only needed when
    /// no single pool can drive the whole iteration (a pure, multi-member `any_of` with no
    /// `all_of` clause to anchor on) — the one case in this module that allocates.
    fn union_dedup(world: &World, group: &KindSet) -> Vec<EntityId> {
        let mut seen = FixedBitSet::with_capacity(world.entity_count() as usize);
        let mut out = Vec::new();
        for id in group.iter() {
            let pool = world.pool_dyn(id);
            for slot in 0..pool.dense_len() {
                if let Some(entity) = pool.entity_at(slot) {
                    let idx = entity.raw() as usize;
                    if !seen.contains(idx) {
                        seen.insert(idx);
                        out.push(entity);
                    }
                }
            }
        }
        out
    }

    fn build_source<'w>(&self, world: &'w World) -> CandidateSource<'w> {
        if let Some(multiple_id) = self.multiple_kind {
            return CandidateSource::Driver {
                pool: world.pool_dyn(multiple_id),
                next_slot: 0,
            };
        }
        if !self.include_all.is_empty() {
            let smallest = self
                .include_all
                .iter()
                .min_by_key(|&id| world.pool_dyn(id).len())
                .expect("checked non-empty above");
            return CandidateSource::Driver {
                pool: world.pool_dyn(smallest),
                next_slot: 0,
            };
        }
        if self.include_any.len() == 1 {
            let group = &self.include_any[0];
            if group.len() == 1 {
                let id = group.iter().next().expect("checked len == 1 above");
                return CandidateSource::Driver {
                    pool: world.pool_dyn(id),
                    next_slot: 0,
                };
            }
            return CandidateSource::Materialized(Self::union_dedup(world, group).into_iter());
        }
        if !self.include_any.is_empty() {
            let smallest_group = self
                .include_any
                .iter()
                .min_by_key(|group| Self::group_size(world, group))
                .expect("checked non-empty above");
            return CandidateSource::Materialized(
                Self::union_dedup(world, smallest_group).into_iter(),
            );
        }
        CandidateSource::AllEntities {
            next: 0,
            end: world.entity_count(),
        }
    }

    /// Iterate every entity this filter currently matches.
    pub fn iterate<'w, 'f>(&'f self, world: &'w World) -> FilterIter<'w, 'f> {
        FilterIter {
            world,
            filter: self,
            source: self.build_source(world),
        }
    }

    /// The matched entity ids, materialized into an owned `Vec`. Used by the systems
    /// layer, which needs an owned id list to hand out `EntityMut` handles one at a time
    /// without holding this filter's implicit read borrow open across each call.
    pub fn collect_ids(&self, world: &World) -> Vec<EntityId> {
        self.iterate(world).map(|entity| entity.id()).collect()
    }

    /// The first entity this filter matches, or `None` if it matches nothing.
    pub fn find_entity(&self, world: &World) -> Option<EntityId> {
        self.iterate(world).next().map(|entity| entity.id())
    }

    /// The number of entities this filter matches, without materializing them.
    pub fn count(&self, world: &World) -> usize {
        self.iterate(world).count()
    }
}

enum CandidateSource<'w> {
    Driver { pool: &'w dyn AnyPool, next_slot: usize },
    AllEntities { next: u64, end: u64 },
    Materialized(std::vec::IntoIter<EntityId>),
}

impl<'w> CandidateSource<'w> {
    fn advance(&mut self) -> Option<EntityId> {
        match self {
            CandidateSource::Driver { pool, next_slot } => loop {
                if *next_slot >= pool.dense_len() {
                    return None;
                }
                let slot = *next_slot;
                *next_slot += 1;
                if let Some(entity) = pool.entity_at(slot) {
                    return Some(entity);
                }
            },
            CandidateSource::AllEntities { next, end } => {
                if *next >= *end {
                    None
                } else {
                    let id = EntityId::new(*next);
                    *next += 1;
                    Some(id)
                }
            }
            CandidateSource::Materialized(iter) => iter.next(),
        }
    }
}

/// Iterator over a filter's matches, yielding read-only [`Entity`] handles.
pub struct FilterIter<'w, 'f> {
    world: &'w World,
    filter: &'f Filter,
    source: CandidateSource<'w>,
}

impl<'w, 'f> Iterator for FilterIter<'w, 'f> {
    type Item = Entity<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.source.advance()?;
            if self.filter.entry_matches(self.world, candidate) {
                return Some(Entity::new(self.world, candidate));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Category;
    use crate::world::WorldBuilder;
    use ecs_core_macros::Component;

    #[derive(Component)]
    struct Position(i32);

    #[derive(Component)]
    struct Velocity(i32);

    #[derive(Component)]
    struct Dead;

    #[derive(Component)]
    struct Tag;

    #[derive(Component)]
    struct Marker(u32);

    #[derive(Component)]
    struct Score(u32);

    fn test_world() -> World {
        let mut builder = WorldBuilder::new();
        builder.register::<Position>(Category::Single, true);
        builder.register::<Velocity>(Category::Single, true);
        builder.register::<Dead>(Category::Single, true);
        builder.register::<Tag>(Category::Single, true);
        builder.register::<Marker>(Category::Multiple, true);
        builder.register::<Score>(Category::Singleton, true);
        builder.build()
    }

    #[test]
    fn all_of_matches_entities_holding_every_kind() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(a, Velocity(0)).unwrap();
        world.add(b, Position(0)).unwrap();

        // When
        let filter = Filter::new()
            .all_of::<(Position, Velocity)>(&world)
            .unwrap();
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then
        assert_eq!(matched, vec![a]);
    }

    #[test]
    fn exclude_removes_matching_entities() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(b, Position(0)).unwrap();
        world.add(b, Dead).unwrap();

        // When
        let filter = Filter::new()
            .all_of::<Position>(&world)
            .unwrap()
            .exclude::<Dead>(&world)
            .unwrap();
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then
        assert_eq!(matched, vec![a]);
    }

    #[test]
    fn select_applies_a_free_form_predicate() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(1)).unwrap();
        world.add(b, Position(2)).unwrap();

        // When
        let filter = Filter::new()
            .all_of::<Position>(&world)
            .unwrap()
            .select(|e| e.get::<Position>().map(|p| p.0 > 1).unwrap_or(false));
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then
        assert_eq!(matched, vec![b]);
    }

    #[test]
    fn pure_any_of_with_multiple_members_dedups_across_pools() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(a, Velocity(0)).unwrap();
        world.add(b, Velocity(0)).unwrap();

        // When - `a` holds both kinds but must appear only once
        let filter = Filter::new().any_of::<(Position, Velocity)>(&world).unwrap();
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then
        assert_eq!(matched.len(), 2);
        assert!(matched.contains(&a));
        assert!(matched.contains(&b));
    }

    #[test]
    fn singleton_kind_rejected_from_include_clause() {
        // Given
        let world = test_world();

        // When
        let result = Filter::new().all_of::<Score>(&world);

        // Then
        assert!(matches!(result, Err(Error::IllegalFilter(_))));
    }

    #[test]
    fn two_distinct_multiple_kinds_in_one_filter_rejected() {
        // Given
        let mut builder = WorldBuilder::new();
        builder.register::<Marker>(Category::Multiple, true);
        builder.register::<Tag>(Category::Multiple, true);
        let world = builder.build();

        // When
        let result = Filter::new()
            .all_of::<Marker>(&world)
            .unwrap()
            .all_of::<Tag>(&world);

        // Then
        assert!(matches!(result, Err(Error::IllegalFilter(_))));
    }

    #[test]
    fn multiple_kind_is_forced_as_driver_and_visited_once_per_instance() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        world.add(a, Marker(1)).unwrap();
        world.add(a, Marker(2)).unwrap();
        world.add(a, Position(0)).unwrap();

        // When
        let filter = Filter::new()
            .all_of::<(Position, Marker)>(&world)
            .unwrap();
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then - one dense row per instance, so `a` is visited twice
        assert_eq!(matched, vec![a, a]);
    }

    #[test]
    fn of_is_sugar_for_all_of_a_single_kind() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(b, Velocity(0)).unwrap();

        // When
        let filter = Filter::new().of::<Position>(&world).unwrap();
        let matched: Vec<_> = filter.iterate(&world).map(|e| e.id()).collect();

        // Then
        assert_eq!(matched, vec![a]);
    }

    #[test]
    fn find_entity_returns_first_match_or_none() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(b, Position(1)).unwrap();

        // When
        let filter = Filter::new().all_of::<Position>(&world).unwrap();

        // Then
        assert_eq!(filter.find_entity(&world), Some(a));

        // When - no entity holds Velocity
        let empty = Filter::new().all_of::<Velocity>(&world).unwrap();

        // Then
        assert_eq!(empty.find_entity(&world), None);
    }

    #[test]
    fn count_reports_match_count_without_materializing() {
        // Given
        let mut world = test_world();
        let a = world.new_entity();
        let b = world.new_entity();
        let c = world.new_entity();
        world.add(a, Position(0)).unwrap();
        world.add(b, Position(0)).unwrap();
        world.add(c, Velocity(0)).unwrap();

        // When
        let filter = Filter::new().all_of::<Position>(&world).unwrap();

        // Then
        assert_eq!(filter.count(&world), 2);
    }
}
