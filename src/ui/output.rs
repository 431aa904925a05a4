//! ui::output
//!
//! Progress and status messages.
//!
//! # Design
//!
//! User-facing messages are formatted consistently and respect the quiet
//! flag. Diagnostics meant for troubleshooting go through `tracing` instead;
//! this module is for what a user running the tool expects to read.

use std::fmt::Display;

use owo_colors::{OwoColorize, Stream};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print a fatal error, highlighted when stderr is a terminal (always shown).
pub fn error(message: impl Display) {
    let text = format!("error: {}", message);
    eprintln!(
        "{}",
        text.if_supports_color(Stream::Stderr, |t| t.red().bold().to_string())
    );
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        let text = format!("warning: {}", message);
        eprintln!(
            "{}",
            text.if_supports_color(Stream::Stderr, |t| t.yellow().to_string())
        );
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }
}
