//! Python module output.

use metang_mem::{Arena, Str, StrList};

use super::{BANNER, Document, Generator, Section, Symbol, prefix};
use crate::enumerator::Assignment;
use crate::error::Result;
use crate::options::Mode;

/// Generates a Python module holding one `enum.IntEnum` or `enum.IntFlag`
/// class.
#[derive(Debug, Clone, Copy, Default)]
pub struct PyGenerator;

impl Generator for PyGenerator {
    fn render(&self, doc: &Document<'_>, arena: &mut Arena) -> Result<Vec<StrList>> {
        let opts = doc.opts;
        let enumerator = doc.enumerator;

        let leader_buf = prefix(opts.leader.as_deref());
        let leader = Str::new(&leader_buf);
        let base_class = match enumerator.mode() {
            Mode::Enum => "IntEnum",
            Mode::Mask => "IntFlag",
        };

        let mut head = Section::new();
        head.push(
            arena,
            format_args!(
                concat!(
                    "\"\"\"\n",
                    "    {banner}\n",
                    "    Base command: {mode}\n",
                    "    Source file: {source}\n",
                    "    Program options:\n",
                    "      --lang py\n",
                ),
                banner = BANNER,
                mode = enumerator.mode().as_str(),
                source = opts.source_name(),
            ),
        )?;
        for (flag, value) in opts.program_options() {
            head.push(arena, format_args!("      {flag} {value}\n"))?;
        }
        head.push(
            arena,
            format_args!(
                concat!("\"\"\"\n", "\n", "import enum\n", "\n", "class {tag}(enum.{base_class}):\n"),
                tag = opts.tag,
                base_class = base_class,
            ),
        )?;

        let width = enumerator.max_ident_len() + leader.len();
        let digits = enumerator.max_assign_len();
        let mut body = Section::new();

        for entry in enumerator.entries() {
            let sym = Symbol { leader, name: doc.names.view(entry.ident) };
            let n = entry.assignment.printed();

            match entry.assignment {
                Assignment::Int(_) => body.push(arena, format_args!("    {sym:<width$} = {n:>digits$}\n"))?,
                Assignment::NoBits => body.push(arena, format_args!("    {sym:<width$} =        {n:>digits$}\n"))?,
                Assignment::Bit(_) => body.push(arena, format_args!("    {sym:<width$} =  (1 << {n:>digits$})\n"))?,
                Assignment::AllBits(_) => {
                    body.push(arena, format_args!("    {sym:<width$} = ((1 << {n:>digits$}) - 1)\n"))?;
                }
            }
        }

        Ok(vec![head.finish(), body.finish()])
    }
}
