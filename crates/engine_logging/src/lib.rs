#![deny(missing_docs)]
//! Shared logging utilities for the courier workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread job scope that tags every line logged while a job's input is
//! being handled, and a minimal test initializer for the global logger.

use std::cell::Cell;
use std::fmt;

thread_local! {
    /// Job whose input the current thread is handling, if any.
    static CURRENT_JOB: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Returns the job tagged on the current thread.
pub fn current_job() -> Option<u64> {
    CURRENT_JOB.with(|v| v.get())
}

/// Tags log lines on this thread with a job id until dropped.
///
/// Scopes nest; dropping one restores the tag that was active before it.
#[must_use = "the tag is removed when the scope is dropped"]
pub struct JobScope {
    previous: Option<u64>,
}

impl JobScope {
    /// Enters a scope for `job`. `None` clears the tag for the scope's
    /// lifetime.
    pub fn enter(job: Option<u64>) -> Self {
        let previous = CURRENT_JOB.with(|v| v.replace(job));
        Self { previous }
    }
}

impl Drop for JobScope {
    fn drop(&mut self) {
        CURRENT_JOB.with(|v| v.set(self.previous));
    }
}

/// Prefix written in front of every `engine_*` message: `[job N] ` inside a
/// [`JobScope`], nothing outside.
pub struct JobTag;

impl fmt::Display for JobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match current_job() {
            Some(job) => write!(f, "[job {job}] "),
            None => Ok(()),
        }
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::JobTag, format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::JobTag, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::JobTag, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::JobTag, format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::JobTag, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already have set the logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
