//! Turning listing lines into named values.
//!
//! Identifiers are upper-snake-cased and claimed into the run arena, so the
//! generators only ever see final names. Values depend on the [`Mode`]:
//!
//! - `enum` counts up from `--start-from`; `NAME = VALUE` sets the value and
//!   the count continues after it.
//! - `mask` wraps the listing in `NONE` and `ANY` and gives every listed
//!   entry its own bit.

use hashbrown::HashMap;
use metang_mem::{AllocFlags, Arena, Case, Span, Str, StrList};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::input::line_number;
use crate::options::{Mode, Options};

/// Most entries a mask can hold besides `NONE` and `ANY`.
pub const MAX_MASK_BITS: usize = 63;

/// The value of one entry, as generators need to print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// A plain integer.
    Int(i64),
    /// `NONE` of a mask.
    NoBits,
    /// A single mask bit.
    Bit(u32),
    /// `ANY` of a mask: the low `n` bits.
    AllBits(u32),
}

impl Assignment {
    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Assignment::Int(v) => v,
            Assignment::NoBits => 0,
            Assignment::Bit(n) => 1 << n,
            Assignment::AllBits(n) => i64::MAX >> (63 - n),
        }
    }

    /// The number that appears in generated code: the value itself for
    /// integers, the shift for mask entries.
    #[must_use]
    pub const fn printed(self) -> i64 {
        match self {
            Assignment::Int(v) => v,
            Assignment::NoBits => 0,
            Assignment::Bit(n) | Assignment::AllBits(n) => n as i64,
        }
    }
}

/// One named value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Upper-snake-cased identifier, in the run arena.
    pub ident: Span,
    /// Value of the entry.
    pub assignment: Assignment,
}

/// The ordered entries of one run, with the column widths they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    mode: Mode,
    entries: Vec<Entry>,
    max_ident_len: usize,
    max_assign_len: usize,
}

/// Where an entry came from, for error messages.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Line(Span),
    Flag(&'static str),
    Builtin,
}

impl Enumerator {
    /// Builds the entries for `opts.mode` from the listing `lines`, whose
    /// elements point into `text`.
    ///
    /// # Errors
    ///
    /// - [`Error::Input`] for a malformed or duplicate listing line
    /// - [`Error::Usage`] for a malformed or duplicate `--append`/`--prepend`
    /// - [`Error::Arena`] on fatal arena exhaustion
    pub fn build(opts: &Options, arena: &mut Arena, text: Span, lines: &StrList) -> Result<Self> {
        let mut builder = Builder::new(opts, text);
        let lines: Vec<Span> = lines.spans(arena).collect();

        match opts.mode {
            Mode::Enum => {
                for entry in &opts.prepend {
                    builder.push_flag(arena, "--prepend", entry)?;
                }
                for &line in &lines {
                    builder.push_line(arena, line)?;
                }
                for entry in &opts.append {
                    builder.push_flag(arena, "--append", entry)?;
                }
            }
            Mode::Mask => {
                if lines.len() > MAX_MASK_BITS {
                    return Err(Error::Input {
                        line: line_number(arena, text, lines[MAX_MASK_BITS]),
                        reason: format!("a mask holds at most {MAX_MASK_BITS} entries"),
                    });
                }

                builder.push_builtin(arena, "NONE", Assignment::NoBits)?;
                for &line in &lines {
                    builder.push_line(arena, line)?;
                }
                builder.push_builtin(arena, "ANY", Assignment::AllBits(lines.len() as u32))?;
            }
        }

        builder.finish(arena)
    }

    /// Enumeration flavour.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The entries in output order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Length of the longest identifier.
    #[must_use]
    pub fn max_ident_len(&self) -> usize {
        self.max_ident_len
    }

    /// Width of the widest printed value.
    #[must_use]
    pub fn max_assign_len(&self) -> usize {
        self.max_assign_len
    }
}

struct Builder {
    mode: Mode,
    text: Span,
    entries: Vec<Entry>,
    origins: Vec<Origin>,
    next: Option<i64>,
    scratch: Vec<u8>,
}

impl Builder {
    fn new(opts: &Options, text: Span) -> Self {
        Self {
            mode: opts.mode,
            text,
            entries: Vec::new(),
            origins: Vec::new(),
            next: Some(opts.start_from.unwrap_or(0)),
            scratch: Vec::new(),
        }
    }

    fn push_line(&mut self, arena: &mut Arena, line: Span) -> Result<()> {
        let parsed = parse_entry(arena.view(line), self.mode, &mut self.scratch);
        let (len, value) = parsed.map_err(|reason| Error::Input {
            line: line_number(arena, self.text, line),
            reason,
        })?;

        let assignment = match self.mode {
            Mode::Enum => self.next_value(value).map_err(|reason| Error::Input {
                line: line_number(arena, self.text, line),
                reason,
            })?,
            Mode::Mask => Assignment::Bit((self.entries.len() - 1) as u32),
        };

        self.claim(arena, len, assignment, Origin::Line(line))
    }

    fn push_flag(&mut self, arena: &mut Arena, flag: &'static str, raw: &str) -> Result<()> {
        let (len, value) = parse_entry(Str::from(raw), self.mode, &mut self.scratch)
            .map_err(|reason| Error::Usage(format!("{flag} {raw}: {reason}")))?;
        let assignment = self
            .next_value(value)
            .map_err(|reason| Error::Usage(format!("{flag} {raw}: {reason}")))?;

        self.claim(arena, len, assignment, Origin::Flag(flag))
    }

    fn push_builtin(&mut self, arena: &mut Arena, name: &'static str, assignment: Assignment) -> Result<()> {
        self.scratch.clear();
        self.scratch.extend_from_slice(name.as_bytes());
        self.claim(arena, name.len(), assignment, Origin::Builtin)
    }

    /// Assigns the next enum value, or `value` if the entry overrides it.
    fn next_value(&mut self, value: Option<i64>) -> std::result::Result<Assignment, String> {
        let value = match value {
            Some(v) => v,
            None => self.next.ok_or_else(|| format!("value would exceed {}", i64::MAX))?,
        };

        self.next = value.checked_add(1);
        Ok(Assignment::Int(value))
    }

    fn claim(&mut self, arena: &mut Arena, len: usize, assignment: Assignment, origin: Origin) -> Result<()> {
        let ident = arena.alloc(1, 1, len, AllocFlags::EXTEND)?;
        arena.view_mut(ident).copy_from_slice(&self.scratch[..len]);

        trace!(ident = %arena.view(ident), value = assignment.value(), "entry");
        self.entries.push(Entry { ident, assignment });
        self.origins.push(origin);
        Ok(())
    }

    fn finish(self, arena: &Arena) -> Result<Enumerator> {
        let mut seen: HashMap<Str<'_>, usize> = HashMap::with_capacity(self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            let name = arena.view(entry.ident);
            if let Some(&first) = seen.get(&name) {
                return Err(self.duplicate(arena, name, first, i));
            }
            seen.insert(name, i);
        }

        let max_ident_len = self.entries.iter().map(|e| e.ident.len).max().unwrap_or(0);
        let max_assign_len = self
            .entries
            .iter()
            .map(|e| printed_width(e.assignment.printed()))
            .max()
            .unwrap_or(0);

        debug!(count = self.entries.len(), max_ident_len, max_assign_len, "enumerator built");
        Ok(Enumerator {
            mode: self.mode,
            entries: self.entries,
            max_ident_len,
            max_assign_len,
        })
    }

    fn duplicate(&self, arena: &Arena, name: Str<'_>, first: usize, again: usize) -> Error {
        // Blame the later entry, unless it is a built-in one.
        let (blamed, other) = match (self.origins[first], self.origins[again]) {
            (first, Origin::Builtin) => (first, Origin::Builtin),
            (first, again) => (again, first),
        };

        let other = match other {
            Origin::Line(span) => format!("line {}", line_number(arena, self.text, span)),
            Origin::Flag(flag) => flag.to_string(),
            Origin::Builtin => "the built-in entry".to_string(),
        };

        let reason = format!("duplicate identifier {name} (also defined by {other})");
        match blamed {
            Origin::Line(span) => Error::Input {
                line: line_number(arena, self.text, span),
                reason,
            },
            Origin::Flag(flag) => Error::Usage(format!("{flag}: {reason}")),
            Origin::Builtin => Error::Usage(reason),
        }
    }
}

/// Parses `IDENT` or `IDENT = VALUE`, writing the cased identifier to the
/// front of `scratch`. Returns its length and the override, if any.
fn parse_entry(raw: Str<'_>, mode: Mode, scratch: &mut Vec<u8>) -> std::result::Result<(usize, Option<i64>), String> {
    let pair = raw.split_at_first(b'=');
    let has_value = pair.head.len() < raw.len();
    let ident = pair.head.trim_end();

    let value = if has_value {
        if mode == Mode::Mask {
            return Err("value overrides are not permitted for masks".to_string());
        }

        let text = pair.tail.strip_leading(b' ').trim_end();
        let value = text
            .parse_integer()
            .map_err(|err| format!("invalid value {text:?}: {err}"))?;
        Some(value)
    } else {
        None
    };

    scratch.clear();
    scratch.resize(ident.len() + 1, 0);
    let cased = ident.to_identifier_case(scratch, None, Case::Upper);
    if cased.is_empty() {
        return Err(format!("{raw:?} does not contain an identifier"));
    }

    Ok((cased.len(), value))
}

/// Number of characters `value` takes when printed in decimal.
fn printed_width(value: i64) -> usize {
    let sign = usize::from(value < 0);
    let digits = value.unsigned_abs().checked_ilog10().map_or(1, |d| d as usize + 1);
    sign + digits
}
