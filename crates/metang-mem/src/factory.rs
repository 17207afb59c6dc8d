//! Pass-scoped arena creation.
//!
//! An [`ArenaFactory`] is the configuration for the arena of one pass: how
//! big it starts and how far it may grow. [`ArenaFactory::run`] is the one
//! place a fatal allocation failure surfaces; everything below it propagates
//! errors with `?` instead of unwinding.
//!
//! # Examples
//!
//! ```
//! use metang_mem::{AllocFlags, ArenaError, ArenaFactory};
//!
//! let factory = ArenaFactory::new(64, 1 << 20);
//!
//! let len = factory
//!     .run(|arena| -> Result<usize, ArenaError> {
//!         let span = arena.alloc(1, 1, 32, AllocFlags::ZERO)?;
//!         Ok(span.len)
//!     })
//!     .unwrap();
//!
//! assert_eq!(len, 32);
//! ```

use tracing::{debug, error};

use crate::arena::{AllocFlags, Arena};
use crate::error::ArenaError;

/// Default initial arena size.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Arena configuration for one pass.
///
/// Creating arenas is cheap; there is no pooling, each pass gets a fresh one
/// and drops it at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaFactory {
    /// Initial size of arenas created by this factory.
    initial_capacity: usize,
    /// Growth limit of arenas created by this factory.
    max_capacity: usize,
}

impl ArenaFactory {
    /// Creates a factory for arenas of `initial_capacity` bytes that never
    /// grow past `max_capacity` bytes.
    #[must_use]
    pub const fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self { initial_capacity, max_capacity }
    }

    /// Initial size of arenas created by this factory.
    #[must_use]
    pub const fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Growth limit of arenas created by this factory.
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Creates a fresh arena.
    #[must_use]
    pub fn create_arena(&self) -> Arena {
        Arena::with_max_capacity(self.initial_capacity, self.max_capacity)
    }

    /// Runs `body` with a fresh arena and tears the arena down afterwards.
    ///
    /// This is the recovery point for fatal allocation failures: whatever
    /// `body` propagates is logged here and returned to the caller, and the
    /// arena is released either way.
    ///
    /// # Errors
    ///
    /// Returns the error `body` returned.
    pub fn run<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Arena) -> Result<T, E>,
        E: From<ArenaError> + std::fmt::Display,
    {
        let mut arena = self.create_arena();
        let result = body(&mut arena);

        let stats = arena.stats();
        match &result {
            Ok(_) => debug!(
                used = stats.offset,
                capacity = stats.capacity,
                grow_count = stats.grow_count,
                "arena pass finished"
            ),
            Err(err) => error!(
                used = stats.offset,
                remaining = arena.remaining(),
                capacity = stats.capacity,
                %err,
                "arena pass failed"
            ),
        }

        arena.destroy(AllocFlags::empty());
        result
    }
}

impl Default for ArenaFactory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, isize::MAX as usize)
    }
}
