//! Colored stderr logging with module prefixes.
//!
//! ```ignore
//! log!("slides"; "loaded {} of {}", loaded, total);
//! warn!("map"; "location `{}` is not on the route", name);
//! debug!("tiles"; "fetching {}", url);
//! trace!("session"; "fragment {} is slide {}", ordinal, index);
//! ```
//!
//! The level is set once from the command-line flags; messages above it are
//! dropped before formatting reaches stderr.

use colored::{ColoredString, Colorize};
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

static LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl Level {
    /// Map `-q` / `-v` / `-vv` to a level.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Warn;
        }
        match verbose {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn tag(self) -> ColoredString {
        match self {
            Self::Error => "error".red().bold(),
            Self::Warn => "warn".yellow().bold(),
            Self::Info => "info".green(),
            Self::Debug => "debug".blue(),
            Self::Trace => "trace".dimmed(),
        }
    }
}

pub fn init(verbose: u8, quiet: bool, no_color: bool) {
    if no_color {
        colored::control::set_override(false);
    }
    set_level(Level::from_flags(verbose, quiet));
}

pub fn set_level(level: Level) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level as u8 <= LEVEL.load(Ordering::Relaxed)
}

pub fn emit(level: Level, module: &str, message: &str) {
    if !enabled(level) {
        return;
    }
    let prefix = format!("[{module}]").cyan();
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{} {prefix} {message}", level.tag()).ok();
}

/// Log at info level: `log!("module"; "fmt", args)`.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::enabled($crate::logger::Level::Info) {
            $crate::logger::emit($crate::logger::Level::Info, $module, &format!($($arg)*))
        }
    }};
}

#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::enabled($crate::logger::Level::Warn) {
            $crate::logger::emit($crate::logger::Level::Warn, $module, &format!($($arg)*))
        }
    }};
}

#[macro_export]
macro_rules! error {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::emit($crate::logger::Level::Error, $module, &format!($($arg)*))
    }};
}

#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::enabled($crate::logger::Level::Debug) {
            $crate::logger::emit($crate::logger::Level::Debug, $module, &format!($($arg)*))
        }
    }};
}

/// Per-item detail, shown with `-vv`.
#[macro_export]
macro_rules! trace {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::enabled($crate::logger::Level::Trace) {
            $crate::logger::emit($crate::logger::Level::Trace, $module, &format!($($arg)*))
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(Level::from_flags(0, false), Level::Info);
        assert_eq!(Level::from_flags(1, false), Level::Debug);
        assert_eq!(Level::from_flags(5, false), Level::Trace);
        // quiet wins over verbose
        assert_eq!(Level::from_flags(2, true), Level::Warn);
    }

    #[test]
    fn test_trace_needs_double_verbose() {
        set_level(Level::from_flags(1, false));
        assert!(enabled(Level::Debug));
        assert!(!enabled(Level::Trace));
        set_level(Level::from_flags(2, false));
        assert!(enabled(Level::Trace));
        set_level(Level::Info);
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Debug < Level::Trace);
    }
}
