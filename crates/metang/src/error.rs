//! Error type for the `metang` command.

use std::io;
use std::path::PathBuf;

use metang_mem::ArenaError;
use thiserror::Error;

/// Everything that can stop a `metang` run.
#[derive(Debug, Error)]
pub enum Error {
    /// A pass arena ran out of memory. The details go to the log; the
    /// user-facing message stays fixed.
    #[error("allocation failure")]
    Arena(#[from] ArenaError),

    /// An input or output file could not be opened.
    #[error("could not open {}: {source}", path.display())]
    Open {
        /// The file that failed to open.
        path: PathBuf,
        /// The underlying failure.
        source: io::Error,
    },

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input listing is malformed.
    #[error("line {line}: {reason}")]
    Input {
        /// 1-based line number in the input listing.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// The command line is inconsistent.
    #[error("{0}")]
    Usage(String),
}

impl Error {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Result type for `metang` operations.
pub type Result<T> = std::result::Result<T, Error>;
