//! Ordered string lists stored in an arena.
//!
//! A [`StrList`] is a singly linked list whose nodes are allocated from the
//! same arena as the strings they refer to. The list handle itself only
//! remembers where its first and last nodes are, so appending is O(1) and
//! the whole list goes away with the arena.
//!
//! Each node is 24 bytes at 8-byte alignment, three little-endian `u64`
//! words:
//!
//! | word | content                              |
//! |------|--------------------------------------|
//! | 0    | offset of the next node, or `u64::MAX` |
//! | 1    | offset of the element                |
//! | 2    | length of the element                |

use crate::arena::{AllocFlags, Arena, Span};
use crate::error::Result;
use crate::strbuf::Str;

const NODE_SIZE: usize = 24;
const NODE_ALIGN: usize = 8;
const NIL: u64 = u64::MAX;

/// An ordered list of arena-resident strings.
///
/// The handle is meaningless without the arena its nodes were appended to;
/// iterating it over any other arena panics or yields garbage spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrList {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl StrList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None, tail: None, len: 0 }
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `elem` to the end of the list, allocating its node from
    /// `arena`.
    ///
    /// Returns `Ok(None)` when the node allocation soft-fails; the list is
    /// then unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use metang_mem::{AllocFlags, Arena, ArenaError, StrList};
    ///
    /// let mut arena = Arena::new(0);
    /// let mut list = StrList::new();
    /// for word in ["NONE", "POISON", "ANY"] {
    ///     let span = arena.alloc_fmt(format_args!("{word}"), AllocFlags::EXTEND)?;
    ///     list.append(&mut arena, span, AllocFlags::EXTEND)?;
    /// }
    ///
    /// let words: Vec<String> = list.iter(&arena).map(|s| s.to_string()).collect();
    /// assert_eq!(words, ["NONE", "POISON", "ANY"]);
    /// assert_eq!(list.len(), 3);
    ///
    /// // A full arena that may fail quietly leaves the list alone.
    /// let mut full = Arena::new(0);
    /// assert_eq!(list.append(&mut full, Default::default(), AllocFlags::SOFT_FAIL)?, None);
    /// assert_eq!(list.len(), 3);
    /// # Ok::<(), ArenaError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Follows the arena's failure policy for `flags`.
    pub fn append(&mut self, arena: &mut Arena, elem: Span, flags: AllocFlags) -> Result<Option<()>> {
        let Some(node) = arena.allocate(NODE_SIZE, NODE_ALIGN, 1, flags)? else {
            return Ok(None);
        };

        write_node(arena, node.offset, NIL, elem);

        if let Some(tail) = self.tail {
            let next = arena.view_mut(Span::new(tail, 8));
            next.copy_from_slice(&(node.offset as u64).to_le_bytes());
        } else {
            self.head = Some(node.offset);
        }

        self.tail = Some(node.offset);
        self.len += 1;
        Ok(Some(()))
    }

    /// Iterates the element spans in append order.
    #[must_use]
    pub fn spans<'a>(&self, arena: &'a Arena) -> Spans<'a> {
        Spans {
            arena,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Iterates the elements in append order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = Str<'a>> + use<'a> {
        self.spans(arena).map(move |span| arena.view(span))
    }
}

/// Iterator over the element spans of a [`StrList`].
#[derive(Debug)]
pub struct Spans<'a> {
    arena: &'a Arena,
    next: Option<usize>,
    remaining: usize,
}

impl Iterator for Spans<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let node = self.next?;
        let bytes = self.arena.view(Span::new(node, NODE_SIZE)).as_bytes();

        let next = read_word(bytes, 0);
        self.next = (next != NIL).then_some(next as usize);
        self.remaining = self.remaining.saturating_sub(1);

        Some(Span::new(read_word(bytes, 1) as usize, read_word(bytes, 2) as usize))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Spans<'_> {}

fn write_node(arena: &mut Arena, at: usize, next: u64, elem: Span) {
    let bytes = arena.view_mut(Span::new(at, NODE_SIZE));
    bytes[0..8].copy_from_slice(&next.to_le_bytes());
    bytes[8..16].copy_from_slice(&(elem.offset as u64).to_le_bytes());
    bytes[16..24].copy_from_slice(&(elem.len as u64).to_le_bytes());
}

fn read_word(bytes: &[u8], index: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[index * 8..index * 8 + 8]);
    u64::from_le_bytes(word)
}
