//! Logging abstraction used by the pipeline.
//!
//! Pipeline code never talks to `tracing` directly. Components hold an
//! `Arc<dyn Logger>` and log through the `log_*!` macros:
//!
//! ```
//! use dailycarto::log::{Logger, NoOpLogger};
//! use dailycarto::log_info;
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "Key resources archived for the {}.", "2024-03-05");
//! ```
//!
//! The binary installs a `tracing-subscriber` and hands [`TracingLogger`] to
//! the pipeline; tests use [`NoOpLogger`] or a recording logger. Logging is a
//! side channel only: nothing in the pipeline waits on the logger.

use std::fmt::Arguments;

/// Severity of a log message, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Leveled logging interface.
///
/// Implementors provide [`Logger::log`]; the per-level methods delegate to it.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

/// Forwards every message to the matching `tracing` macro.
///
/// Messages only show up once a subscriber is installed (see `main.rs`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Parse a level name as used in `config.toml` (`"info"`, `"debug"`, ...).
pub fn parse_level(name: &str) -> Option<LogLevel> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}
