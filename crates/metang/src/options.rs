//! Command-line options.
//!
//! [`Cli`] is the raw `clap` surface. [`Options`] is what a run actually
//! consumes: the tag name resolved, stdin handled, and enum-only options
//! left empty for masks.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use metang_mem::{Case, ParseIntError, Str};

use crate::error::{Error, Result};

/// Default prefix for conditional directives.
pub const DEFAULT_GUARD: &str = "METANG";

/// metang - Generate enumerated constants from plain-text
#[derive(Debug, Parser)]
#[command(name = "metang", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// What kind of enumeration to generate.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an integral enumeration
    Enum {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        listing: EnumArgs,
    },

    /// Generate a bitmask enumeration
    ///
    /// NONE (0) and ANY (every bit) are added around the input. Value
    /// overrides are not permitted.
    Mask {
        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Target language
    #[arg(short = 'L', long, value_enum, default_value_t = Lang::C)]
    pub lang: Lang,

    /// Write output to OFILE instead of standard output
    #[arg(short, long, value_name = "OFILE")]
    pub output: Option<PathBuf>,

    /// Prefix for generated symbols
    #[arg(short, long)]
    pub leader: Option<String>,

    /// Base tag for enums and lookup tables [default: input basename without extension]
    #[arg(short, long = "tag-name", value_name = "NAME")]
    pub tag_name: Option<String>,

    /// Prefix for conditional directives [default: METANG]
    #[arg(short = 'G', long)]
    pub guard: Option<String>,

    /// Input listing; reads standard input when absent or `-`
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Options only the `enum` command accepts.
#[derive(Debug, Default, Args)]
pub struct EnumArgs {
    /// Append ENTRY to the input listing
    #[arg(short, long, value_name = "ENTRY")]
    pub append: Vec<String>,

    /// Prepend ENTRY to the input listing
    #[arg(short, long, value_name = "ENTRY")]
    pub prepend: Vec<String>,

    /// Start enumeration from NUMBER
    #[arg(short = 'n', long, value_name = "NUMBER", value_parser = parse_number, allow_hyphen_values = true)]
    pub start_from: Option<i64>,
}

/// Output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    /// C header with enum, defines and lookup table
    C,
    /// Python module with an `enum.IntEnum` or `enum.IntFlag` class
    Py,
}

/// Enumeration flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Consecutive integers with optional overrides
    Enum,
    /// One bit per entry between `NONE` and `ANY`
    Mask,
}

impl Mode {
    /// The command name that selects this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Enum => "enum",
            Mode::Mask => "mask",
        }
    }
}

/// Resolved options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Enumeration flavour.
    pub mode: Mode,
    /// Output language.
    pub lang: Lang,
    /// Input listing, or `None` for standard input.
    pub input: Option<PathBuf>,
    /// Output file, or `None` for standard output.
    pub output: Option<PathBuf>,
    /// Symbol prefix as given.
    pub leader: Option<String>,
    /// Tag name, given or derived.
    pub tag: String,
    /// Whether the tag was given explicitly.
    pub tag_given: bool,
    /// Directive prefix as given.
    pub guard: Option<String>,
    /// Entries added after the input (`enum` only).
    pub append: Vec<String>,
    /// Entries added before the input (`enum` only).
    pub prepend: Vec<String>,
    /// First value (`enum` only).
    pub start_from: Option<i64>,
}

impl Options {
    /// Parses and resolves a full argument list, program name included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] with clap's rendered message if the arguments
    /// do not parse, or if they are inconsistent.
    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|err| Error::Usage(err.to_string()))?;
        Self::try_from(cli.command)
    }

    /// Directive prefix, falling back to [`DEFAULT_GUARD`].
    #[must_use]
    pub fn guard(&self) -> &str {
        self.guard.as_deref().unwrap_or(DEFAULT_GUARD)
    }

    /// How the input source is named in generated banners.
    #[must_use]
    pub fn source_name(&self) -> String {
        self.input
            .as_deref()
            .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string())
    }

    /// The options that shaped the output, in banner order.
    #[must_use]
    pub fn program_options(&self) -> Vec<(&'static str, String)> {
        let mut shown = Vec::new();

        if let Some(leader) = &self.leader {
            shown.push(("--leader", leader.clone()));
        }
        if self.tag_given {
            shown.push(("--tag-name", self.tag.clone()));
        }
        if let Some(guard) = &self.guard {
            shown.push(("--guard", guard.clone()));
        }

        shown.extend(self.append.iter().map(|entry| ("--append", entry.clone())));
        shown.extend(self.prepend.iter().map(|entry| ("--prepend", entry.clone())));
        if let Some(start) = self.start_from {
            shown.push(("--start-from", start.to_string()));
        }

        shown
    }
}

impl TryFrom<Command> for Options {
    type Error = Error;

    fn try_from(command: Command) -> Result<Self> {
        let (mode, common, listing) = match command {
            Command::Enum { common, listing } => (Mode::Enum, common, listing),
            Command::Mask { common } => (Mode::Mask, common, EnumArgs::default()),
        };

        let input = common.file.filter(|path| path.as_os_str() != OsStr::new("-"));

        let (tag, tag_given) = match (common.tag_name, &input) {
            (Some(tag), _) if tag.is_empty() => {
                return Err(Error::Usage("tag name must not be empty".to_string()));
            }
            (Some(tag), _) => (tag, true),
            (None, Some(path)) => (derive_tag(path)?, false),
            (None, None) => {
                return Err(Error::Usage(
                    "reading from standard input requires --tag-name".to_string(),
                ));
            }
        };

        Ok(Self {
            mode,
            lang: common.lang,
            input,
            output: common.output,
            leader: common.leader,
            tag,
            tag_given,
            guard: common.guard,
            append: listing.append,
            prepend: listing.prepend,
            start_from: listing.start_from,
        })
    }
}

/// Tag from an input path: the basename minus any extension, lower-snake-cased.
fn derive_tag(path: &Path) -> Result<String> {
    let name = path.to_string_lossy();
    let stem = Str::from(name.as_ref()).basename().stem(b'.');

    let mut buf = vec![0u8; stem.len() + 1];
    let tag = stem.to_identifier_case(&mut buf, None, Case::Lower);
    if tag.is_empty() {
        return Err(Error::Usage(format!(
            "cannot derive a tag name from {}; pass --tag-name",
            path.display()
        )));
    }

    Ok(tag.to_string())
}

fn parse_number(s: &str) -> std::result::Result<i64, ParseIntError> {
    Str::from(s).parse_integer()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        Options::parse_from(std::iter::once("metang").chain(args.iter().copied()))
    }

    #[test]
    fn test_enum_defaults() {
        let opts = parse(&["enum", "data/species.txt"]).unwrap();

        assert_eq!(opts.mode, Mode::Enum);
        assert_eq!(opts.lang, Lang::C);
        assert_eq!(opts.tag, "species");
        assert!(!opts.tag_given);
        assert_eq!(opts.guard(), DEFAULT_GUARD);
        assert_eq!(opts.input.as_deref(), Some(Path::new("data/species.txt")));
        assert_eq!(opts.output, None);
        assert!(opts.program_options().is_empty());
    }

    #[test]
    fn test_enum_options() {
        let opts = parse(&[
            "enum", "-L", "py", "-o", "out/species.py", "-l", "species", "-t", "Species", "-G",
            "pokeplat", "-a", "max", "-p", "none", "-p", "egg", "-n", "-1", "-",
        ])
        .unwrap();

        assert_eq!(opts.lang, Lang::Py);
        assert_eq!(opts.input, None);
        assert_eq!(opts.tag, "Species");
        assert_eq!(opts.prepend, ["none", "egg"]);
        assert_eq!(opts.start_from, Some(-1));
        assert_eq!(opts.source_name(), "<stdin>");
        assert_eq!(
            opts.program_options(),
            [
                ("--leader", "species".to_string()),
                ("--tag-name", "Species".to_string()),
                ("--guard", "pokeplat".to_string()),
                ("--append", "max".to_string()),
                ("--prepend", "none".to_string()),
                ("--prepend", "egg".to_string()),
                ("--start-from", "-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_derived_tag_is_cased() {
        let opts = parse(&["mask", "lists/Move-Flags.v2.txt"]).unwrap();
        assert_eq!(opts.mode, Mode::Mask);
        assert_eq!(opts.tag, "move_flags");
    }

    #[test]
    fn test_stdin_requires_tag() {
        assert!(matches!(parse(&["enum"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["enum", "-"]), Err(Error::Usage(_))));
        assert!(parse(&["enum", "-t", "colors"]).is_ok());
    }

    #[test]
    fn test_mask_rejects_enum_options() {
        assert!(matches!(parse(&["mask", "-n", "3", "flags.txt"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["mask", "-a", "EXTRA", "flags.txt"]), Err(Error::Usage(_))));
    }

    #[test]
    fn test_start_from_uses_integer_parser() {
        assert!(matches!(parse(&["enum", "-n", "12x", "a.txt"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["enum", "-n", "+4", "a.txt"]), Err(Error::Usage(_))));
        assert_eq!(parse(&["enum", "-n", "40", "a.txt"]).unwrap().start_from, Some(40));
    }

    #[test]
    fn test_unknown_language() {
        assert!(matches!(parse(&["enum", "-L", "rust", "a.txt"]), Err(Error::Usage(_))));
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["metang", "-vv", "enum", "a.txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["metang", "enum", "a.txt", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }
}
