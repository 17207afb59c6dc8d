//! Diagnostic logging for `metang`.
//!
//! `metang` writes its generated output to stdout or a file, so every
//! diagnostic goes to stderr through a `tracing` subscriber installed here.
//! The level comes from the command line (`-v` raises it one step at a
//! time) unless the `METANG_LOG` environment variable holds a level name or
//! filter directives, which win.
//!
//! # Example
//!
//! ```no_run
//! use metang_log::Level;
//!
//! metang_log::init_from_env(Level::Warn.raised(1)).unwrap();
//! tracing::info!(entries = 12, "generated enum");
//! ```

use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt as layer_fmt, prelude::*};

/// Environment variable consulted by [`init_from_env`].
pub const ENV_VAR: &str = "METANG_LOG";

/// Log levels, from most severe to most detailed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Critical failures
    Error = 0,
    /// Recoverable trouble, such as refused arena growth
    #[default]
    Warn = 1,
    /// One line per pass
    Info = 2,
    /// Per-phase detail
    Debug = 3,
    /// Per-allocation detail
    Trace = 4,
}

/// Errors from logger setup.
#[derive(Debug, Error)]
pub enum LogError {
    /// The level name is not one of `error`, `warn`, `info`, `debug`, `trace`.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// `METANG_LOG` holds a directive `tracing` cannot parse.
    #[error("invalid {ENV_VAR} directive: {0}")]
    InvalidDirective(String),

    /// A global subscriber is already installed.
    #[error("logger already initialized")]
    AlreadyInitialized,
}

impl Level {
    /// Returns the lowercase name of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Moves `steps` levels towards [`Level::Trace`], saturating there.
    ///
    /// ```
    /// use metang_log::Level;
    ///
    /// assert_eq!(Level::Warn.raised(0), Level::Warn);
    /// assert_eq!(Level::Warn.raised(2), Level::Debug);
    /// assert_eq!(Level::Warn.raised(9), Level::Trace);
    /// ```
    #[must_use]
    pub fn raised(self, steps: u8) -> Self {
        match (self as u8).saturating_add(steps) {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }

    /// The equivalent `tracing` filter.
    #[must_use]
    pub const fn filter(&self) -> LevelFilter {
        match self {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs a stderr subscriber that shows events at `level` and above.
///
/// # Errors
///
/// Returns [`LogError::AlreadyInitialized`] if a global subscriber exists.
pub fn init(level: Level) -> Result<(), LogError> {
    install(level_filter(level))
}

/// Installs a stderr subscriber configured by `METANG_LOG`, falling back to
/// `default` when the variable is unset or empty.
///
/// The variable holds either a bare [`Level`] name (`METANG_LOG=debug`) or
/// `tracing` filter directives (`METANG_LOG=metang_mem=trace`).
///
/// # Errors
///
/// Returns [`LogError::InvalidDirective`] if `METANG_LOG` cannot be parsed,
/// or [`LogError::AlreadyInitialized`] if a global subscriber exists.
pub fn init_from_env(default: Level) -> Result<(), LogError> {
    match std::env::var(ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => install(env_filter(&value)?),
        _ => init(default),
    }
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(level.filter().into())
}

fn env_filter(value: &str) -> Result<EnvFilter, LogError> {
    match value.trim().parse::<Level>() {
        Ok(level) => Ok(level_filter(level)),
        Err(_) => parse_directives(value),
    }
}

fn parse_directives(directives: &str) -> Result<EnvFilter, LogError> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse(directives)
        .map_err(|err| LogError::InvalidDirective(err.to_string()))
}

fn install(filter: EnvFilter) -> Result<(), LogError> {
    let layer = layer_fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}
