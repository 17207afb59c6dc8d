//! Error types for arena allocation.

use thiserror::Error;

/// Fatal arena failures.
///
/// Soft failures never show up here; they are reported as `Ok(None)` by the
/// allocation methods when [`AllocFlags::SOFT_FAIL`](crate::AllocFlags) is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The request did not fit and could not be grown into.
    #[error("allocation failure: requested {requested} bytes at offset {offset}, capacity {capacity}")]
    Exhausted {
        /// Bytes requested, excluding alignment padding.
        requested: usize,
        /// Aligned start offset the request would have used.
        offset: usize,
        /// Capacity of the arena when the request failed.
        capacity: usize,
    },

    /// `size * count` (or the resulting end offset) overflowed `usize`.
    #[error("allocation size overflow: {size} x {count} bytes")]
    Overflow {
        /// Element size in bytes.
        size: usize,
        /// Element count.
        count: usize,
    },

    /// A formatting impl failed while writing into the arena.
    #[error("formatting into the arena failed")]
    Format,

    /// The requested alignment is not a power of two.
    #[error("invalid alignment: {alignment} is not a power of two")]
    InvalidAlignment {
        /// The requested alignment.
        alignment: usize,
    },
}

/// Result type for arena operations.
pub type Result<T> = std::result::Result<T, ArenaError>;
