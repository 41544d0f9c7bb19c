//! Failure kinds surfaced synchronously at the call site. None are retried and none are
//! logged here — logging covers ambient lifecycle events, not typed failures (see the
//! crate's design notes).

use thiserror::Error;

/// A recoverable failure raised by a pool, entity handle, or filter operation.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A Single (or Singleton) kind was added twice without an intervening `remove`.
    #[error("component already present on entity")]
    AlreadyPresent,

    /// `get`/`update` was called on an absent Single (or Singleton) kind.
    #[error("component missing on entity")]
    Missing,

    /// A filter's configuration violates the one-Multiple-kind rule or names a Singleton
    /// kind in an include clause.
    #[error("illegal filter configuration: {0}")]
    IllegalFilter(&'static str),

    /// The driver pool of an in-progress iteration was structurally mutated.
    ///
    /// Only ever raised in debug builds; release builds do not pay for the check.
    #[error("pool mutated during iteration")]
    MutationDuringIteration,

    /// A single-frame kind with `check = true` was added while no bulk-remove system
    /// clears it.
    #[error("single-frame component added with no bulk-remove system registered to clear it")]
    MissingCleanup,

    /// Attempted to `overwrite`/`update` a Multiple kind; only full removal is supported.
    #[error("cannot overwrite or partially remove a multiple-category component")]
    MultipleNotRemovable,
}
