//! Non-owning byte-string views.
//!
//! [`Str`] is a `(pointer, length)` view over bytes it does not own: a
//! literal, a caller buffer, or a span of an [`Arena`]. Splitting, trimming
//! and stripping only compute new views over the same bytes and never touch
//! an arena. Two operations write bytes:
//!
//! - [`Str::to_identifier_case`] writes into a caller-supplied buffer
//! - [`Str::clone_into`] copies into an arena, and is where every
//!   persisted string is born
//!
//! Everything is byte-oriented; there is no locale or UTF-8 awareness.
//!
//! # Examples
//!
//! ```
//! use metang_mem::{Case, Str};
//!
//! let line = Str::from("SPECIES_PIKACHU = 25   # comment");
//! let entry = line.split_at_first(b'#').head.trim_end();
//! let pair = entry.split_at_first(b'=');
//!
//! assert_eq!(pair.head.trim_end(), Str::from("SPECIES_PIKACHU"));
//! assert_eq!(pair.tail.strip_leading(b' ').parse_integer(), Ok(25));
//!
//! let mut buf = [0u8; 16];
//! let ident = Str::from("Hello-World!").to_identifier_case(&mut buf, None, Case::Upper);
//! assert_eq!(ident, Str::from("HELLO_WORLD"));
//! ```

use std::fmt;

use thiserror::Error;

use crate::arena::{AllocFlags, Arena, Span};
use crate::error::Result;

/// A borrowed run of bytes.
///
/// Equality and ordering are byte-wise.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Str<'a> {
    buf: &'a [u8],
}

/// The two halves of a [`Str`] cut at a delimiter, which belongs to neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrPair<'a> {
    /// Bytes before the delimiter.
    pub head: Str<'a>,
    /// Bytes after the delimiter.
    pub tail: Str<'a>,
}

/// Letter case produced by [`Str::to_identifier_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Case {
    /// `lower_snake_case`
    Lower,
    /// `UPPER_SNAKE_CASE`
    Upper,
}

/// Failure to read a [`Str`] as a decimal integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseIntError {
    /// Empty input, or a lone sign.
    #[error("no digits to parse")]
    NoDigits,

    /// A byte that is not an ASCII digit.
    #[error("invalid byte 0x{byte:02x} at index {index}")]
    InvalidDigit {
        /// Position of the offending byte.
        index: usize,
        /// The offending byte.
        byte: u8,
    },

    /// The value does not fit an `i64`.
    #[error("integer out of range")]
    Overflow,
}

/// Whitespace as C's `isspace` sees it in the "C" locale.
#[inline]
const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

impl<'a> Str<'a> {
    /// Creates a view over `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// The viewed bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'a [u8] {
        self.buf
    }

    /// Number of bytes in the view.
    #[must_use]
    pub const fn len(self) -> usize {
        self.buf.len()
    }

    /// Returns true if the view covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.buf.is_empty()
    }

    /// Returns true if `byte` occurs in the view.
    ///
    /// NUL is always reported as contained, matching a search through a
    /// NUL-terminated buffer.
    #[must_use]
    pub fn contains_byte(self, byte: u8) -> bool {
        byte == 0 || self.buf.contains(&byte)
    }

    /// Returns true if any byte of `other` occurs in the view.
    #[must_use]
    pub fn contains_any(self, other: Str<'_>) -> bool {
        self.buf.iter().any(|b| other.buf.contains(b))
    }

    /// Length of the view without its trailing whitespace.
    #[must_use]
    pub fn trimmed_len(self) -> usize {
        self.buf.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1)
    }

    /// The view without its trailing whitespace.
    #[must_use]
    pub fn trim_end(self) -> Self {
        Self::new(&self.buf[..self.trimmed_len()])
    }

    /// The view without its leading whitespace.
    #[must_use]
    pub fn trim_start(self) -> Self {
        let skip = self.buf.iter().take_while(|&&b| is_space(b)).count();
        Self::new(&self.buf[skip..])
    }

    /// Cuts the view at the first `delim`.
    ///
    /// If `delim` is absent, `head` is the whole view and `tail` is empty.
    #[must_use]
    pub fn split_at_first(self, delim: u8) -> StrPair<'a> {
        match self.buf.iter().position(|&b| b == delim) {
            Some(i) => self.cut(i),
            None => self.uncut(),
        }
    }

    /// Cuts the view at the last `delim`.
    ///
    /// If `delim` is absent, `head` is the whole view and `tail` is empty.
    #[must_use]
    pub fn split_at_last(self, delim: u8) -> StrPair<'a> {
        match self.buf.iter().rposition(|&b| b == delim) {
            Some(i) => self.cut(i),
            None => self.uncut(),
        }
    }

    /// The view past every leading `byte`.
    #[must_use]
    pub fn strip_leading(self, byte: u8) -> Self {
        let skip = self.buf.iter().take_while(|&&b| b == byte).count();
        Self::new(&self.buf[skip..])
    }

    /// The final `/`-separated component of a path.
    #[must_use]
    pub fn basename(self) -> Self {
        match self.buf.iter().rposition(|&b| b == b'/') {
            Some(i) => Self::new(&self.buf[i + 1..]),
            None => self,
        }
    }

    /// Everything before the first `delim`, or the whole view.
    #[must_use]
    pub fn stem(self, delim: u8) -> Self {
        self.split_at_first(delim).head
    }

    /// Reads the view as a decimal integer with an optional leading `-`.
    ///
    /// The whole view must be consumed; there is no partial result.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseIntError`] if the view is empty, holds a non-digit,
    /// or does not fit an `i64`.
    pub fn parse_integer(self) -> std::result::Result<i64, ParseIntError> {
        let (negative, start) = match self.buf.first() {
            Some(b'-') => (true, 1),
            _ => (false, 0),
        };

        if self.buf.len() == start {
            return Err(ParseIntError::NoDigits);
        }

        let mut value: i64 = 0;
        for (index, &byte) in self.buf.iter().enumerate().skip(start) {
            if !byte.is_ascii_digit() {
                return Err(ParseIntError::InvalidDigit { index, byte });
            }

            let digit = i64::from(byte - b'0');
            // Accumulate towards the sign so that i64::MIN stays reachable.
            value = value
                .checked_mul(10)
                .and_then(|v| if negative { v.checked_sub(digit) } else { v.checked_add(digit) })
                .ok_or(ParseIntError::Overflow)?;
        }

        Ok(value)
    }

    /// Writes an identifier-cased copy of the view into `dest`.
    ///
    /// `-`, `_`, whitespace and any byte of `extra` become `_`; letters take
    /// `case`; digits pass through; every other byte is dropped. A NUL is
    /// written after the output for display purposes.
    ///
    /// # Arguments
    ///
    /// * `dest` - Output buffer, at least `self.len() + 1` bytes long.
    /// * `extra` - Further bytes to turn into `_`, such as `.` for file names.
    /// * `case` - Case given to letters.
    ///
    /// # Returns
    ///
    /// A view of the identifier inside `dest`, without the NUL.
    ///
    /// # Examples
    ///
    /// ```
    /// use metang_mem::{Case, Str};
    ///
    /// let mut buf = [0u8; 16];
    /// let ident = Str::from("Hello-World!").to_identifier_case(&mut buf, None, Case::Upper);
    /// assert_eq!(ident, Str::from("HELLO_WORLD"));
    ///
    /// let mut buf = [0u8; 16];
    /// let guard = Str::from("moves.v2.h").to_identifier_case(&mut buf, Some(Str::from(".")), Case::Upper);
    /// assert_eq!(guard, Str::from("MOVES_V2_H"));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `dest` is shorter than `self.len() + 1`.
    pub fn to_identifier_case<'d>(
        self,
        dest: &'d mut [u8],
        extra: Option<Str<'_>>,
        case: Case,
    ) -> Str<'d> {
        assert!(
            dest.len() > self.len(),
            "identifier buffer holds {} bytes, {} needed",
            dest.len(),
            self.len() + 1
        );

        let mut n = 0;
        for &b in self.buf {
            let out = if b == b'-' || b == b'_' || is_space(b) {
                b'_'
            } else if extra.is_some_and(|e| e.buf.contains(&b)) {
                b'_'
            } else if b.is_ascii_digit() {
                b
            } else if b.is_ascii_alphabetic() {
                match case {
                    Case::Lower => b.to_ascii_lowercase(),
                    Case::Upper => b.to_ascii_uppercase(),
                }
            } else {
                continue;
            };

            dest[n] = out;
            n += 1;
        }

        dest[n] = 0;
        let dest: &'d [u8] = dest;
        Str::new(&dest[..n])
    }

    /// Copies the view into `arena`, followed by a NUL byte that is not part
    /// of the returned span.
    ///
    /// Views of bytes that already live in `arena` cannot be passed here
    /// while it is borrowed mutably; use [`Arena::clone_span`] for those.
    ///
    /// # Errors
    ///
    /// Follows the arena's failure policy for `flags`.
    pub fn clone_into(self, arena: &mut Arena, flags: AllocFlags) -> Result<Option<Span>> {
        let Some(span) = arena.allocate(1, 1, self.len() + 1, flags)? else {
            return Ok(None);
        };

        let bytes = arena.view_mut(span);
        bytes[..self.len()].copy_from_slice(self.buf);
        bytes[self.len()] = 0;
        Ok(Some(Span::new(span.offset, self.len())))
    }

    fn cut(self, at: usize) -> StrPair<'a> {
        StrPair {
            head: Self::new(&self.buf[..at]),
            tail: Self::new(&self.buf[at + 1..]),
        }
    }

    fn uncut(self) -> StrPair<'a> {
        StrPair {
            head: self,
            tail: Self::new(&self.buf[self.buf.len()..]),
        }
    }
}

impl<'a> From<&'a str> for Str<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Str<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl AsRef<[u8]> for Str<'_> {
    fn as_ref(&self) -> &[u8] {
        self.buf
    }
}

impl fmt::Display for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(self.buf))
    }
}

impl fmt::Debug for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.buf.escape_ascii())
    }
}
