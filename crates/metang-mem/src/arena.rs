//! Region allocator for `metang` passes.
//!
//! An [`Arena`] owns one contiguous byte buffer and serves every request by
//! bumping a single offset. There is no per-allocation bookkeeping and no
//! individual free: memory comes back all at once through [`Arena::reset`]
//! or when the arena is dropped.
//!
//! # Addressing
//!
//! The backing buffer may be reallocated when a request carries
//! [`AllocFlags::EXTEND`], so allocations are handed out as [`Span`]s
//! (offset and length relative to the arena base) instead of pointers.
//! Bytes are re-derived through [`Arena::view`] or [`Arena::view_mut`]; the
//! borrow checker keeps those views from living across a call that could
//! move the buffer.
//!
//! # Failure policy
//!
//! When a request does not fit:
//!
//! 1. with `EXTEND`, the buffer grows to `(capacity + required) * 2` and the
//!    request is retried;
//! 2. otherwise, or if growing fails, `SOFT_FAIL` turns the failure into
//!    `Ok(None)` and leaves the arena untouched;
//! 3. otherwise the request fails with [`ArenaError::Exhausted`].
//!
//! Size overflow is always fatal, whatever the flags.
//!
//! # Examples
//!
//! ```
//! use metang_mem::{AllocFlags, Arena, Span};
//!
//! let mut arena = Arena::new(64);
//!
//! // Three 4-byte elements at 8-byte alignment, zeroed.
//! let span = arena.alloc(4, 8, 3, AllocFlags::ZERO).unwrap();
//! assert_eq!(span, Span::new(0, 12));
//! assert_eq!(arena.offset(), 12);
//!
//! let name = arena.claim(b"FOO_BAR", AllocFlags::empty()).unwrap().unwrap();
//! assert_eq!(arena.view(name).as_bytes(), b"FOO_BAR");
//! ```

use std::fmt;
use std::ops::Range;

use bitflags::bitflags;
use tracing::{trace, warn};

use crate::error::{ArenaError, Result};
use crate::strbuf::Str;

bitflags! {
    /// Per-request allocation policy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AllocFlags: u8 {
        /// Zero the returned bytes.
        const ZERO = 1 << 0;
        /// Report exhaustion as `Ok(None)` instead of an error.
        const SOFT_FAIL = 1 << 1;
        /// Grow the backing buffer before giving up.
        const EXTEND = 1 << 2;
    }
}

/// A range of bytes inside an [`Arena`], relative to the arena base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub offset: usize,
    /// Number of bytes.
    pub len: usize,
}

impl Span {
    /// Creates a span from an offset and a length.
    #[must_use]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last byte.
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }

    /// Returns true if the span covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// The span as an index range into the arena buffer.
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Arena usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes handed out so far, padding included.
    pub offset: usize,
    /// Current size of the backing buffer.
    pub capacity: usize,
    /// Number of times the backing buffer has grown.
    pub grow_count: usize,
}

/// A single-owner bump allocator over one growable byte buffer.
///
/// The arena is not thread-safe; it is meant to be owned by one pass and
/// passed explicitly to everything that allocates during that pass.
pub struct Arena {
    /// Backing buffer; its length is the arena capacity.
    memory: Vec<u8>,
    /// Next free position. Always `<= memory.len()`.
    offset: usize,
    /// Growth never goes beyond this many bytes.
    max_capacity: usize,
    /// Number of successful growths.
    grow_count: usize,
}

impl Arena {
    /// Creates an arena with `capacity` bytes and no growth limit beyond the
    /// platform's.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_max_capacity(capacity, isize::MAX as usize)
    }

    /// Creates an arena with `capacity` bytes that refuses to grow past
    /// `max_capacity` bytes.
    #[must_use]
    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        Self {
            memory: vec![0; capacity],
            offset: 0,
            max_capacity: max_capacity.max(capacity),
            grow_count: 0,
        }
    }

    /// Current size of the backing buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Offset of the next free byte.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left before the arena needs to grow.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Returns usage statistics for this arena.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            offset: self.offset,
            capacity: self.capacity(),
            grow_count: self.grow_count,
        }
    }

    /// Returns the smallest offset `>= self.offset()` that is a multiple of
    /// `alignment`.
    ///
    /// `alignment` must be a power of two.
    #[must_use]
    #[inline]
    pub fn next_offset(&self, alignment: usize) -> usize {
        debug_assert!(alignment.is_power_of_two());
        // -ofs & (align - 1) is the distance to the next multiple of align:
        // for ofs = 10, align = 8: 0b0110 & 0b0111 = 6, landing on 16.
        let padding = self.offset.wrapping_neg() & (alignment - 1);
        self.offset + padding
    }

    /// Allocates `count` elements of `size` bytes at `alignment`.
    ///
    /// # Arguments
    ///
    /// * `size` - Size of one element in bytes.
    /// * `alignment` - Required alignment of the start offset; a power of two.
    /// * `count` - Number of elements. May be zero.
    /// * `flags` - [`AllocFlags::ZERO`] clears the range,
    ///   [`AllocFlags::EXTEND`] grows the buffer when the request does not
    ///   fit, [`AllocFlags::SOFT_FAIL`] turns exhaustion into `Ok(None)`.
    ///
    /// # Returns
    ///
    /// `Ok(Some(span))` on success, and `Ok(None)` only when the request was
    /// exhausted under `SOFT_FAIL`, in which case the arena is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use metang_mem::{AllocFlags, Arena, ArenaError, Span};
    ///
    /// let mut arena = Arena::new(16);
    /// arena.claim(b"abc", AllocFlags::empty())?;
    ///
    /// // Padded up to the next multiple of 8.
    /// let words = arena.allocate(4, 8, 2, AllocFlags::ZERO)?;
    /// assert_eq!(words, Some(Span::new(8, 8)));
    ///
    /// // Too big, but allowed to fail quietly.
    /// assert_eq!(arena.allocate(1, 1, 64, AllocFlags::SOFT_FAIL)?, None);
    /// assert_eq!(arena.offset(), 16);
    ///
    /// // Too big and not allowed to grow.
    /// assert!(matches!(
    ///     arena.allocate(1, 1, 64, AllocFlags::empty()),
    ///     Err(ArenaError::Exhausted { .. })
    /// ));
    /// # Ok::<(), ArenaError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - [`ArenaError::Overflow`] if `size * count` does not fit a `usize`,
    ///   regardless of flags.
    /// - [`ArenaError::InvalidAlignment`] if `alignment` is not a power of two.
    /// - [`ArenaError::Exhausted`] if the request does not fit, growing was
    ///   not requested or failed, and `SOFT_FAIL` is not set.
    pub fn allocate(
        &mut self,
        size: usize,
        alignment: usize,
        count: usize,
        flags: AllocFlags,
    ) -> Result<Option<Span>> {
        if !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment { alignment });
        }

        let overflow = ArenaError::Overflow { size, count };
        let required = size.checked_mul(count).ok_or(overflow)?;
        let start = self.next_offset(alignment);
        let end = start.checked_add(required).ok_or(overflow)?;

        if end > self.capacity() {
            let grown = flags.contains(AllocFlags::EXTEND) && self.grow(end, required);

            if !grown {
                if flags.contains(AllocFlags::SOFT_FAIL) {
                    trace!(required, start, capacity = self.capacity(), "soft allocation failure");
                    return Ok(None);
                }

                return Err(ArenaError::Exhausted {
                    requested: required,
                    offset: start,
                    capacity: self.capacity(),
                });
            }
        }

        self.offset = end;
        let span = Span::new(start, required);
        if flags.contains(AllocFlags::ZERO) {
            self.memory[span.range()].fill(0);
        }

        Ok(Some(span))
    }

    /// Like [`allocate`](Self::allocate), but exhaustion is always fatal.
    ///
    /// # Errors
    ///
    /// See [`allocate`](Self::allocate); `SOFT_FAIL` is ignored.
    pub fn alloc(
        &mut self,
        size: usize,
        alignment: usize,
        count: usize,
        flags: AllocFlags,
    ) -> Result<Span> {
        match self.allocate(size, alignment, count, flags.difference(AllocFlags::SOFT_FAIL))? {
            Some(span) => Ok(span),
            None => Err(ArenaError::Exhausted {
                requested: size.saturating_mul(count),
                offset: self.next_offset(alignment),
                capacity: self.capacity(),
            }),
        }
    }

    /// Copies `bytes` into a fresh byte-aligned span.
    ///
    /// # Errors
    ///
    /// Same policy as [`allocate`](Self::allocate).
    pub fn claim(&mut self, bytes: &[u8], flags: AllocFlags) -> Result<Option<Span>> {
        let Some(span) = self.allocate(1, 1, bytes.len(), flags)? else {
            return Ok(None);
        };

        self.memory[span.range()].copy_from_slice(bytes);
        Ok(Some(span))
    }

    /// Copies the bytes of an existing span of this arena into a fresh span,
    /// followed by a NUL byte that is not part of the returned span.
    ///
    /// This is [`Str::clone_into`] for strings that already live in the
    /// arena, which cannot be borrowed while the arena is mutated.
    ///
    /// # Errors
    ///
    /// Same policy as [`allocate`](Self::allocate).
    pub fn clone_span(&mut self, span: Span, flags: AllocFlags) -> Result<Option<Span>> {
        let Some(copy) = self.allocate(1, 1, span.len + 1, flags)? else {
            return Ok(None);
        };

        self.memory.copy_within(span.range(), copy.offset);
        self.memory[copy.offset + span.len] = 0;
        Ok(Some(Span::new(copy.offset, span.len)))
    }

    /// Formats `args` straight into the arena as one contiguous span.
    ///
    /// Fragments are claimed one after another at byte alignment, so they
    /// land back to back. Any failure rolls the offset back to where it was
    /// before the call.
    ///
    /// # Errors
    ///
    /// Same policy as [`allocate`](Self::allocate), plus
    /// [`ArenaError::Format`] if a formatting impl reports an error.
    pub fn claim_fmt(&mut self, args: fmt::Arguments<'_>, flags: AllocFlags) -> Result<Option<Span>> {
        let start = self.offset;
        let mut writer = ArenaWriter {
            arena: self,
            flags: flags.difference(AllocFlags::ZERO),
            failure: None,
            soft_failed: false,
        };

        let outcome = fmt::write(&mut writer, args);
        let ArenaWriter { failure, soft_failed, .. } = writer;

        if let Some(err) = failure {
            self.offset = start;
            return Err(err);
        }

        if soft_failed {
            self.offset = start;
            return Ok(None);
        }

        if outcome.is_err() {
            self.offset = start;
            return Err(ArenaError::Format);
        }

        Ok(Some(Span::new(start, self.offset - start)))
    }

    /// Like [`claim_fmt`](Self::claim_fmt), but exhaustion is always fatal.
    ///
    /// # Errors
    ///
    /// See [`claim_fmt`](Self::claim_fmt); `SOFT_FAIL` is ignored.
    pub fn alloc_fmt(&mut self, args: fmt::Arguments<'_>, flags: AllocFlags) -> Result<Span> {
        match self.claim_fmt(args, flags.difference(AllocFlags::SOFT_FAIL))? {
            Some(span) => Ok(span),
            None => Err(ArenaError::Exhausted {
                requested: 0,
                offset: self.offset,
                capacity: self.capacity(),
            }),
        }
    }

    /// Gives back `span`, which must be the most recent allocation.
    ///
    /// This is stack discipline, not a general free: `span` must end exactly
    /// at the current offset. Popping anything else corrupts later
    /// allocations; the check only runs in debug builds.
    pub fn pop(&mut self, span: Span, flags: AllocFlags) {
        debug_assert_eq!(span.end(), self.offset, "popped span is not the arena tail");

        if flags.contains(AllocFlags::ZERO) {
            self.memory[span.range()].fill(0);
        }

        self.offset = self.offset.saturating_sub(span.len);
    }

    /// Invalidates every allocation by moving the offset back to zero.
    ///
    /// With [`AllocFlags::ZERO`] the previously live bytes are cleared first.
    pub fn reset(&mut self, flags: AllocFlags) {
        if flags.contains(AllocFlags::ZERO) {
            self.memory[..self.offset].fill(0);
        }

        trace!(released = self.offset, "arena reset");
        self.offset = 0;
    }

    /// Releases the backing buffer, zeroing it first with
    /// [`AllocFlags::ZERO`].
    pub fn destroy(mut self, flags: AllocFlags) {
        if flags.contains(AllocFlags::ZERO) {
            self.memory.fill(0);
        }

        trace!(capacity = self.capacity(), grow_count = self.grow_count, "arena destroyed");
    }

    /// Returns a view of the bytes covered by `span`.
    ///
    /// # Panics
    ///
    /// Panics if `span` lies outside the arena buffer.
    #[must_use]
    pub fn view(&self, span: Span) -> Str<'_> {
        Str::new(&self.memory[span.range()])
    }

    /// Returns the bytes covered by `span` for writing.
    ///
    /// # Panics
    ///
    /// Panics if `span` lies outside the arena buffer.
    #[must_use]
    pub fn view_mut(&mut self, span: Span) -> &mut [u8] {
        &mut self.memory[span.range()]
    }

    /// The bytes handed out so far.
    #[must_use]
    pub fn live(&self) -> &[u8] {
        &self.memory[..self.offset]
    }

    /// Recovers the span of a view that was derived from this arena.
    ///
    /// Returns `None` if `s` does not point into the arena buffer.
    #[must_use]
    pub fn span_of(&self, s: Str<'_>) -> Option<Span> {
        let base = self.memory.as_ptr().addr();
        let offset = s.as_bytes().as_ptr().addr().checked_sub(base)?;
        let end = offset.checked_add(s.len())?;
        (end <= self.capacity()).then_some(Span::new(offset, s.len()))
    }

    /// Grows the buffer for a request of `required` bytes ending at `needed`.
    #[cold]
    fn grow(&mut self, needed: usize, required: usize) -> bool {
        let capacity = self.capacity();
        if needed > self.max_capacity {
            warn!(capacity, needed, max = self.max_capacity, "arena growth refused");
            return false;
        }

        let target = capacity
            .checked_add(required)
            .and_then(|n| n.checked_mul(2))
            .map_or(self.max_capacity, |n| n.min(self.max_capacity))
            .max(needed);

        if let Err(err) = self.memory.try_reserve_exact(target - capacity) {
            warn!(capacity, target, %err, "arena growth failed");
            return false;
        }

        self.memory.resize(target, 0);
        self.grow_count += 1;
        trace!(from = capacity, to = target, "arena grew");
        true
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("offset", &self.offset)
            .field("capacity", &self.capacity())
            .field("max_capacity", &self.max_capacity)
            .field("grow_count", &self.grow_count)
            .finish()
    }
}

/// `fmt::Write` adapter used by [`Arena::claim_fmt`].
struct ArenaWriter<'a> {
    arena: &'a mut Arena,
    flags: AllocFlags,
    failure: Option<ArenaError>,
    soft_failed: bool,
}

impl fmt::Write for ArenaWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.arena.claim(s.as_bytes(), self.flags) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                self.soft_failed = true;
                Err(fmt::Error)
            }
            Err(err) => {
                self.failure = Some(err);
                Err(fmt::Error)
            }
        }
    }
}
