//! C header output.
//!
//! The header carries the entries twice, as an `enum` under `{GUARD}ENUM`
//! and as `#define`s otherwise, followed by an optional lookup table sorted
//! by identifier under `{GUARD}LOOKUP`. `{GUARD}LOOKUP_IMPL` selects the
//! table definition over its declaration.

use metang_mem::{Arena, Case, Span, Str, StrList};

use super::{BANNER, Document, Generator, Section, Symbol, prefix};
use crate::enumerator::Assignment;
use crate::error::Result;
use crate::options::Options;

/// Generates C headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CGenerator;

impl Generator for CGenerator {
    fn render(&self, doc: &Document<'_>, arena: &mut Arena) -> Result<Vec<StrList>> {
        let opts = doc.opts;
        let enumerator = doc.enumerator;

        let leader_buf = prefix(opts.leader.as_deref());
        let guard_buf = prefix(Some(opts.guard()));
        let base_buf = guard_name(opts);
        let leader = Str::new(&leader_buf);
        let guard = Str::new(&guard_buf);
        let base = Str::new(&base_buf);
        let tag = opts.tag.as_str();

        let mut head = Section::new();
        head.push(
            arena,
            format_args!(
                concat!(
                    "/*\n",
                    " * {banner}\n",
                    " * Base command: {mode}\n",
                    " * Source file: {source}\n",
                    " * Program options:\n",
                ),
                banner = BANNER,
                mode = enumerator.mode().as_str(),
                source = opts.source_name(),
            ),
        )?;
        for (flag, value) in opts.program_options() {
            head.push(arena, format_args!(" *   {flag} {value}\n"))?;
        }
        head.push(
            arena,
            format_args!(
                concat!(
                    " */\n",
                    "\n",
                    "#ifndef {guard}{base}\n",
                    "#define {guard}{base}\n",
                    "\n",
                    "#ifdef __cplusplus\n",
                    "extern \"C\" {{\n",
                    "#endif\n",
                    "\n",
                    "#ifdef {guard}ENUM\n",
                    "\n",
                    "enum {tag} {{\n",
                ),
                guard = guard,
                base = base,
                tag = tag,
            ),
        )?;

        let width = enumerator.max_ident_len() + leader.len();
        let digits = enumerator.max_assign_len();
        let mut enums = Section::new();
        let mut defines = Section::new();

        for entry in enumerator.entries() {
            let sym = Symbol { leader, name: doc.names.view(entry.ident) };
            let n = entry.assignment.printed();

            match entry.assignment {
                Assignment::Int(_) => {
                    enums.push(arena, format_args!("    {sym:<width$} = {n:>digits$},\n"))?;
                    defines.push(arena, format_args!("#define {sym:<width$} {n:>digits$}\n"))?;
                }
                Assignment::NoBits => {
                    enums.push(arena, format_args!("    {sym:<width$} =        {n:>digits$},\n"))?;
                    defines.push(arena, format_args!("#define {sym:<width$}        {n:>digits$}\n"))?;
                }
                Assignment::Bit(_) => {
                    enums.push(arena, format_args!("    {sym:<width$} =  (1 << {n:>digits$}),\n"))?;
                    defines.push(arena, format_args!("#define {sym:<width$}  (1 << {n:>digits$})\n"))?;
                }
                Assignment::AllBits(_) => {
                    enums.push(arena, format_args!("    {sym:<width$} = ((1 << {n:>digits$}) - 1),\n"))?;
                    defines.push(arena, format_args!("#define {sym:<width$} ((1 << {n:>digits$}) - 1)\n"))?;
                }
            }
        }

        let mut middle = Section::new();
        middle.push(arena, format_args!("}};\n\n#else\n\n"))?;

        let mut lookup = Section::new();
        lookup.push(
            arena,
            format_args!(
                concat!(
                    "\n",
                    "#endif /* {guard}ENUM */\n",
                    "\n",
                    "#ifdef {guard}LOOKUP\n",
                    "\n",
                    "typedef struct entry__{tag} {{\n",
                    "    const long value;\n",
                    "    const char *def;\n",
                    "}} entry__{tag};\n",
                    "\n",
                    "#ifndef {guard}LOOKUP_IMPL\n",
                    "\n",
                    "extern const long lengthof__{tag};\n",
                    "extern const entry__{tag} lookup__{tag}[];\n",
                    "\n",
                    "#else\n",
                    "\n",
                    "const long lengthof__{tag} = {count};\n",
                    "const entry__{tag} lookup__{tag}[] = {{\n",
                ),
                guard = guard,
                tag = tag,
                count = enumerator.count(),
            ),
        )?;

        let mut sorted: Vec<Span> = enumerator.entries().iter().map(|e| e.ident).collect();
        sorted.sort_by(|a, b| doc.names.view(*a).cmp(&doc.names.view(*b)));

        for ident in sorted {
            let name = doc.names.view(ident);
            let sym = Symbol { leader, name };
            let pad = enumerator.max_ident_len() - name.len() + 1;
            lookup.push(arena, format_args!("    {{ {sym},{:pad$}\"{sym}\",{:pad$}}},\n", "", ""))?;
        }

        lookup.push(
            arena,
            format_args!(
                concat!(
                    "}};\n",
                    "\n",
                    "#endif /* {guard}LOOKUP_IMPL */\n",
                    "\n",
                    "#endif /* {guard}LOOKUP */\n",
                    "\n",
                    "#ifdef __cplusplus\n",
                    "}}\n",
                    "#endif\n",
                    "\n",
                    "#endif /* {guard}{base} */\n",
                ),
                guard = guard,
                base = base,
            ),
        )?;

        Ok(vec![head.finish(), enums.finish(), middle.finish(), defines.finish(), lookup.finish()])
    }
}

/// Upper-snake-cased basename of the output file, `.` included; the tag
/// stands in for the file name when writing to standard output.
fn guard_name(opts: &Options) -> Vec<u8> {
    let name = match &opts.output {
        Some(path) => path.to_string_lossy().into_owned(),
        None => format!("{}.h", opts.tag),
    };

    let base = Str::from(name.as_str()).basename();
    let mut buf = vec![0u8; base.len() + 1];
    let len = base.to_identifier_case(&mut buf, Some(Str::from(".")), Case::Upper).len();
    buf.truncate(len);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(args: &[&str]) -> Options {
        Options::parse_from(std::iter::once("metang").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_guard_name_from_output() {
        assert_eq!(guard_name(&opts(&["enum", "-o", "include/gen/species.h", "species.txt"])), b"SPECIES_H");
        assert_eq!(guard_name(&opts(&["enum", "-o", "moves.v2.hpp", "moves.txt"])), b"MOVES_V2_HPP");
    }

    #[test]
    fn test_guard_name_from_tag() {
        assert_eq!(guard_name(&opts(&["enum", "data/items.txt"])), b"ITEMS_H");
        assert_eq!(guard_name(&opts(&["mask", "-t", "Status", "-"])), b"STATUS_H");
    }
}
