use super::{Component, Id, Registry};

/// A sorted, deduplicated set of component kind ids.
///
/// This is the currency `Filter`'s clause methods (`all_of`, `any_of`, `exclude`) accept.
/// Build one directly from ids, or use [`IntoKinds`] to build one from a component type or
/// tuple of component types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KindSet(Vec<Id>);

impl KindSet {
    /// The empty set. Accepted everywhere a clause takes a `KindSet`; contributes no
    /// constraint.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn single(id: Id) -> Self {
        Self(vec![id])
    }

    pub fn from_ids(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut v: Vec<Id> = ids.into_iter().collect();
        v.sort();
        v.dedup();
        Self(v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn insert(&mut self, id: Id) {
        if let Err(pos) = self.0.binary_search(&id) {
            self.0.insert(pos, id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.0.iter().copied()
    }

    pub fn union(mut self, other: KindSet) -> Self {
        for id in other.0 {
            self.insert(id);
        }
        self
    }
}

impl From<Id> for KindSet {
    fn from(id: Id) -> Self {
        KindSet::single(id)
    }
}

impl From<Vec<Id>> for KindSet {
    fn from(ids: Vec<Id>) -> Self {
        KindSet::from_ids(ids)
    }
}

/// Converts a component type or tuple of component types into the set of ids the
/// registry assigned them, resolving each member's id by type.
///
/// Mirrors the teacher's recursive tuple-set macro, generalized from "a set of component
/// types to attach to a spawn call" to "a set of component kinds to constrain a filter
/// clause by". Implemented for a bare type (`filter.all_of::<Position>(&registry)`) and
/// for tuples up to arity 8 (`filter.all_of::<(Position, Velocity)>(&registry)`).
pub trait KindsOf {
    fn kinds_of(registry: &Registry) -> KindSet;
}

impl<C: Component> KindsOf for C {
    fn kinds_of(registry: &Registry) -> KindSet {
        KindSet::single(registry.require::<C>())
    }
}

macro_rules! tuple_kinds_of {
    ($($member:ident),+) => {
        impl<$($member: Component),+> KindsOf for ($($member,)+) {
            fn kinds_of(registry: &Registry) -> KindSet {
                let mut set = KindSet::empty();
                $(set.insert(registry.require::<$member>());)+
                set
            }
        }
    };
}

tuple_kinds_of!(A);
tuple_kinds_of!(A, B);
tuple_kinds_of!(A, B, C);
tuple_kinds_of!(A, B, C, D);
tuple_kinds_of!(A, B, C, D, E);
tuple_kinds_of!(A, B, C, D, E, F);
tuple_kinds_of!(A, B, C, D, E, F, G);
tuple_kinds_of!(A, B, C, D, E, F, G, H);
