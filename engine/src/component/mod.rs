//! Component kinds, categories, and the build-time registry that assigns each a dense id.

mod registry;
mod set;

pub use registry::{Info, Registry};
pub use set::{KindSet, KindsOf};

/// Marker trait for a type usable as component data.
///
/// Implement this via `#[derive(Component)]` rather than by hand; the derive is a trivial
/// blanket-free marker impl so that registration (`WorldBuilder::register`) stays explicit
/// per kind rather than automatic for every `'static` type.
pub trait Component: 'static {}

/// A dense, build-time-assigned identifier for a registered component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    #[inline]
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The storage category of a component kind.
///
/// Categories are mutually orthogonal except that `SingleFrame` may combine with
/// `Multiple`, which is why `SingleFrame` carries a `multiple` flag rather than being a
/// fifth sibling of `Multiple`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// At most one instance per entity.
    Single,
    /// Zero or more instances per entity; at most one Multiple kind may appear in a
    /// filter's include set.
    Multiple,
    /// Exactly one value for the whole world, readable from any entity once set.
    Singleton,
    /// Expected to be bulk-cleared every frame. May also be `Multiple`.
    SingleFrame { multiple: bool },
}

impl Category {
    #[inline]
    pub(crate) fn is_multiple(&self) -> bool {
        matches!(
            self,
            Category::Multiple | Category::SingleFrame { multiple: true }
        )
    }

    #[inline]
    pub(crate) fn is_single_frame(&self) -> bool {
        matches!(self, Category::SingleFrame { .. })
    }

    #[inline]
    pub(crate) fn is_singleton(&self) -> bool {
        matches!(self, Category::Singleton)
    }
}
