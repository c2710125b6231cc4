//! Centralized shell output.
//!
//! User-facing status lines (what is being configured, built, copied or
//! removed) go through [`Shell`] so they share one format:
//! a right-aligned 12 column status word followed by the message.
//! Diagnostics that are not part of the normal conversation with the user
//! go through `tracing` instead.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

/// Output verbosity, fixed for the lifetime of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Default: status messages and warnings
    #[default]
    Normal,
    /// -v: debug diagnostics
    Verbose,
    /// -vv: trace diagnostics
    VeryVerbose,
}

impl Verbosity {
    /// Verbosity from the number of `-v` occurrences and `--very-verbose`.
    pub fn from_flags(verbose_count: u8, very_verbose: bool) -> Self {
        if very_verbose || verbose_count >= 2 {
            Verbosity::VeryVerbose
        } else if verbose_count == 1 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// The `tracing` filter directive for this verbosity.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Normal => "srbuild=info",
            Verbosity::Verbose => "srbuild=debug",
            Verbosity::VeryVerbose => "srbuild=trace",
        }
    }
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Configured,
    Finished,
    Copied,
    Removed,

    // In-progress statuses (cyan)
    Configuring,
    Building,
    Running,
    Testing,

    // Dry-run and info statuses (blue)
    Would,
    Info,

    // Warning statuses (yellow)
    Skipped,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Configured => "Configured",
            Status::Finished => "Finished",
            Status::Copied => "Copied",
            Status::Removed => "Removed",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Running => "Running",
            Status::Testing => "Testing",
            Status::Would => "Would",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Configured | Status::Finished | Status::Copied | Status::Removed => "\x1b[1;32m",
            Status::Configuring | Status::Building | Status::Running | Status::Testing => {
                "\x1b[1;36m"
            }
            Status::Would | Status::Info => "\x1b[1;34m",
            Status::Skipped => "\x1b[1;33m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for status output on stderr.
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a new shell.
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Check if debug output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    /// Print a status message: `{status:>12} {message}`.
    pub fn status(&self, status: Status, msg: impl Display) {
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Format a duration in a human-readable way.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
