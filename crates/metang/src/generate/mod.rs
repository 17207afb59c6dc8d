//! Code generation.
//!
//! Each generator renders the whole document into a pass arena of its own
//! before anything is written, so a failed pass leaves the output untouched.
//! Rendered text is kept as [`StrList`] sections of arena spans and written
//! out in order.

mod c;
mod py;

use std::fmt;
use std::io::Write;

use metang_mem::{AllocFlags, Arena, ArenaFactory, Case, Str, StrList};
use tracing::debug;

use crate::enumerator::Enumerator;
use crate::error::Result;
use crate::options::{Lang, Options};

pub use c::CGenerator;
pub use py::PyGenerator;

/// First line of every generated banner.
pub const BANNER: &str = "This file was generated by metang; DO NOT MODIFY IT!!";

/// Everything a generator reads.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    /// Resolved options of the run.
    pub opts: &'a Options,
    /// Entries to generate.
    pub enumerator: &'a Enumerator,
    /// Arena holding the entry identifiers.
    pub names: &'a Arena,
}

/// A target language.
pub trait Generator {
    /// Renders `doc` into `arena`, returning the sections in output order.
    ///
    /// # Errors
    ///
    /// Fails on fatal arena exhaustion.
    fn render(&self, doc: &Document<'_>, arena: &mut Arena) -> Result<Vec<StrList>>;
}

/// The generator for `lang`.
#[must_use]
pub fn generator(lang: Lang) -> &'static dyn Generator {
    match lang {
        Lang::C => &CGenerator,
        Lang::Py => &PyGenerator,
    }
}

/// Renders `doc` with the generator for its language in a fresh arena from
/// `factory`, then writes the result.
///
/// # Errors
///
/// Fails on fatal arena exhaustion or if writing fails.
pub fn emit(factory: &ArenaFactory, doc: &Document<'_>, out: &mut dyn Write) -> Result<()> {
    factory.run(|arena| -> Result<()> {
        let sections = generator(doc.opts.lang).render(doc, arena)?;

        let mut written = 0;
        for section in &sections {
            for chunk in section.iter(arena) {
                out.write_all(chunk.as_bytes())?;
                written += chunk.len();
            }
        }
        out.flush()?;

        debug!(lang = ?doc.opts.lang, bytes = written, "output written");
        Ok(())
    })
}

/// Builds one output section in a pass arena.
#[derive(Debug, Default)]
struct Section {
    lines: StrList,
}

impl Section {
    fn new() -> Self {
        Self::default()
    }

    /// Formats `args` into `arena` and appends it to the section.
    fn push(&mut self, arena: &mut Arena, args: fmt::Arguments<'_>) -> Result<()> {
        let span = arena.alloc_fmt(args, AllocFlags::EXTEND)?;
        self.lines.append(arena, span, AllocFlags::EXTEND)?;
        Ok(())
    }

    fn finish(self) -> StrList {
        self.lines
    }
}

/// A generated symbol: the leader followed by an entry identifier.
///
/// Honours width and left alignment as one unit.
#[derive(Debug, Clone, Copy)]
struct Symbol<'a> {
    leader: Str<'a>,
    name: Str<'a>,
}

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.leader, self.name)?;

        let len = self.leader.len() + self.name.len();
        for _ in len..f.width().unwrap_or(0) {
            f.write_str(" ")?;
        }
        Ok(())
    }
}

/// Upper-snake-cases `raw` into an owned prefix ending in `_`, or nothing if
/// the cased result is empty.
fn prefix(raw: Option<&str>) -> Vec<u8> {
    let raw = Str::from(raw.unwrap_or_default());
    let mut buf = vec![0u8; raw.len() + 1];

    let len = raw.to_identifier_case(&mut buf, None, Case::Upper).len();
    if len == 0 {
        return Vec::new();
    }

    buf[len] = b'_';
    buf.truncate(len + 1);
    buf
}
