//! Loading and splitting the input listing.

use std::io::{ErrorKind, Read};

use metang_mem::{AllocFlags, Arena, Span, StrList};
use tracing::debug;

use crate::error::Result;

/// Bytes read per chunk.
const CHUNK_SIZE: usize = 1 << 15;

/// Reads all of `reader` into `arena` as one contiguous span.
///
/// # Errors
///
/// Fails on read errors and on fatal arena exhaustion.
pub fn load<R: Read>(mut reader: R, arena: &mut Arena) -> Result<Span> {
    let start = arena.offset();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut len = 0;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };

        // Byte-aligned claims land back to back, even across growth.
        let span = arena.alloc(1, 1, read, AllocFlags::EXTEND)?;
        arena.view_mut(span).copy_from_slice(&chunk[..read]);
        len += read;
    }

    debug!(bytes = len, "input loaded");
    Ok(Span::new(start, len))
}

/// Splits `text` into entry lines.
///
/// Everything from `#` to the end of a line is a comment. Lines are trimmed
/// of leading and trailing whitespace; lines left empty are skipped.
/// The returned elements point into `text`.
///
/// # Errors
///
/// Fails on fatal arena exhaustion.
pub fn read_lines(arena: &mut Arena, text: Span) -> Result<StrList> {
    let mut lines = StrList::new();
    let mut rest = text;

    while !rest.is_empty() {
        let (entry, tail) = {
            let pair = arena.view(rest).split_at_first(b'\n');
            let code = pair.head.split_at_first(b'#').head.trim_end();
            let entry = code.trim_start();

            // Each piece is a prefix or suffix of the one before it, so its
            // position follows from the lengths alone.
            let skipped = code.len() - entry.len();
            (
                Span::new(rest.offset + skipped, entry.len()),
                Span::new(rest.end() - pair.tail.len(), pair.tail.len()),
            )
        };

        if !entry.is_empty() {
            lines.append(arena, entry, AllocFlags::EXTEND)?;
        }
        rest = tail;
    }

    debug!(lines = lines.len(), "input split");
    Ok(lines)
}

/// 1-based line number of `span` within `text`.
#[must_use]
pub fn line_number(arena: &Arena, text: Span, span: Span) -> usize {
    let before = Span::new(text.offset, span.offset.saturating_sub(text.offset));
    1 + arena.view(before).as_bytes().iter().filter(|&&b| b == b'\n').count()
}
