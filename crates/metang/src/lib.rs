//! `metang`: generate enumerated constants from plain-text listings.
//!
//! A listing holds one identifier per line, optionally followed by
//! `= VALUE`. `#` starts a comment. From it, `metang` generates a C header
//! (an `enum`, matching `#define`s and a sorted lookup table) or a Python
//! module with an `enum.IntEnum`/`enum.IntFlag` class.
//!
//! A run is two arena passes. The first loads the listing, splits it and
//! builds the [`Enumerator`]; the second, nested inside it, renders the
//! output. Fatal allocation failures surface at the end of each pass as
//! [`Error::Arena`].

pub mod enumerator;
pub mod error;
pub mod generate;
pub mod input;
pub mod options;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use metang_mem::ArenaFactory;
use tracing::info;

pub use enumerator::{Assignment, Entry, Enumerator};
pub use error::{Error, Result};
pub use options::{Cli, Lang, Mode, Options};

use crate::generate::Document;

/// Generates output for `opts` from `input` into `output`.
///
/// # Errors
///
/// Fails on malformed input, I/O errors, and fatal arena exhaustion.
pub fn run<R: Read>(opts: &Options, input: R, output: &mut dyn Write) -> Result<()> {
    run_with(&ArenaFactory::default(), opts, input, output)
}

/// Like [`run`], with both passes drawing their arenas from `factory`.
///
/// Nothing is written to `output` unless the render pass completes.
///
/// # Errors
///
/// See [`run`].
pub fn run_with<R: Read>(
    factory: &ArenaFactory,
    opts: &Options,
    input: R,
    output: &mut dyn Write,
) -> Result<()> {
    factory.run(|arena| -> Result<()> {
        let text = input::load(input, arena)?;
        let lines = input::read_lines(arena, text)?;
        let enumerator = Enumerator::build(opts, arena, text, &lines)?;

        info!(
            mode = opts.mode.as_str(),
            lang = ?opts.lang,
            entries = enumerator.count(),
            "generating"
        );

        let doc = Document { opts, enumerator: &enumerator, names: &*arena };
        generate::emit(factory, &doc, output)
    })
}

/// Runs with the files named in `opts`, falling back to the standard streams.
///
/// # Errors
///
/// Fails if a file cannot be opened, and for everything [`run`] fails on.
pub fn execute(opts: &Options) -> Result<()> {
    execute_with(&ArenaFactory::default(), opts)
}

/// Like [`execute`], with the arenas of each pass drawn from `factory`.
///
/// # Errors
///
/// See [`execute`].
pub fn execute_with(factory: &ArenaFactory, opts: &Options) -> Result<()> {
    let input: Box<dyn Read> = match &opts.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    match &opts.output {
        Some(path) => {
            // The file is only created once rendering succeeded.
            let mut rendered = Vec::new();
            run_with(factory, opts, input, &mut rendered)?;

            let file = File::create(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&rendered)?;
            writer.flush()?;
            Ok(())
        }
        None => run_with(factory, opts, input, &mut io::stdout().lock()),
    }
}
