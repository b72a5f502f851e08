//! Bump-allocating session logger
//!
//! Every controller transition produces one human-readable status line.
//! The logger either prints it, keeps it in an in-memory buffer for the
//! presentation layer and tests, or both. The buffer keeps the most recent
//! [`LOG_BUFFER_CAPACITY`] entries. Formatting goes through a scratch bump
//! arena that is reset after every line.

use bumpalo::collections::String as BumpString;
use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::collections::{vec_deque, VecDeque};
use std::fmt::{self, Write as FmtWrite};
use std::ops::Deref;

/// Category attached to controller status lines
pub const STATUS_CATEGORY: &str = "status";

/// Captured entries kept before the oldest ones are dropped
pub const LOG_BUFFER_CAPACITY: usize = 1024;

/// Verbosity level for session output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - only game outcomes
    Minimal = 1,
    /// Normal - status lines for every transition (default)
    #[default]
    Normal = 2,
    /// Verbose - oracle scheduling and replay traces as well
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout
    Stdout,
    /// Capture only to in-memory buffer (default for sessions)
    #[default]
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "status")
    pub category: Option<String>,
}

/// Read-only view of the captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, VecDeque<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> vec_deque::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = VecDeque<LogEntry>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct SessionLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    format_bump: RefCell<Bump>,
    log_buffer: RefCell<VecDeque<LogEntry>>,
}

impl SessionLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        SessionLogger {
            verbosity,
            output_mode: OutputMode::default(),
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(VecDeque::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    fn is_printing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
    }

    /// Print buffered lines the verbosity allows, then clear the buffer
    pub fn flush_buffer(&mut self) {
        let buffer = self.log_buffer.borrow();
        for entry in buffer.iter() {
            if entry.level <= self.verbosity {
                Self::log_to_stdout(entry.level, &entry.message);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    /// Print only the last `tail_lines` buffered lines, then clear the buffer
    pub fn flush_tail(&mut self, tail_lines: usize) {
        let buffer = self.log_buffer.borrow();
        let elided = buffer.len().saturating_sub(tail_lines);
        if elided > 0 {
            println!(">>> {elided} LOG LINES ELIDED. PRINTING LAST {tail_lines} LINES <<<");
        }
        for entry in buffer.iter().skip(elided) {
            if entry.level <= self.verbosity {
                Self::log_to_stdout(entry.level, &entry.message);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    /// Access captured entries without copying
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// Move the captured entries out, leaving the buffer empty
    pub fn take_entries(&mut self) -> Vec<LogEntry> {
        let entries = std::mem::take(&mut *self.log_buffer.borrow_mut());
        self.format_bump.borrow_mut().reset();
        entries.into()
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    #[inline]
    fn log_to_stdout(level: VerbosityLevel, message: &str) {
        if level == VerbosityLevel::Minimal {
            println!("{message}");
        } else {
            println!("  {message}");
        }
    }

    fn record(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        if level == VerbosityLevel::Silent {
            return;
        }
        if self.is_capturing() {
            let mut buffer = self.log_buffer.borrow_mut();
            if buffer.len() == LOG_BUFFER_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }
        if self.is_printing() && level <= self.verbosity {
            Self::log_to_stdout(level, message);
        }
    }

    /// Format into the bump arena and record the result
    ///
    /// Returns the formatted text so the caller can keep it (the controller
    /// stores the latest status line).
    pub fn record_fmt(
        &self,
        level: VerbosityLevel,
        category: Option<&str>,
        args: fmt::Arguments<'_>,
    ) -> String {
        let mut bump = self.format_bump.borrow_mut();
        let owned = {
            let mut text = BumpString::new_in(&bump);
            // Writing into an in-memory string cannot fail
            let _ = text.write_fmt(args);
            self.record(level, &text, category);
            text.as_str().to_string()
        };
        bump.reset();
        owned
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.record(VerbosityLevel::Minimal, message, None);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.record(VerbosityLevel::Normal, message, None);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.record(VerbosityLevel::Verbose, message, None);
    }

    /// Record a status line shown to the player
    pub fn status(&self, message: &str) {
        self.record(VerbosityLevel::Normal, message, Some(STATUS_CATEGORY));
    }

    /// Captured status lines in order
    pub fn status_lines(&self) -> Vec<String> {
        self.logs()
            .iter()
            .filter(|entry| entry.category.as_deref() == Some(STATUS_CATEGORY))
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl Default for SessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

/// Log a verbose trace line when the `verbose-logging` feature is enabled
#[macro_export]
macro_rules! log_if_verbose {
    ($logger:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.record_fmt(
                $crate::session::logger::VerbosityLevel::Verbose,
                None,
                format_args!($($arg)*),
            );
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_defaults() {
        let logger = SessionLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert_eq!(logger.output_mode(), OutputMode::Memory);
        assert!(logger.is_capturing());
    }

    #[test]
    fn test_status_capture() {
        let logger = SessionLogger::new();
        logger.status("Your turn (Black)");
        logger.normal("plain line");
        logger.status("White AI is thinking...");

        assert_eq!(logger.logs().len(), 3);
        assert_eq!(
            logger.status_lines(),
            vec!["Your turn (Black)", "White AI is thinking..."]
        );
        assert_eq!(logger.logs()[1].category, None);
    }

    #[test]
    fn test_record_fmt_returns_text() {
        let logger = SessionLogger::new();
        let text = logger.record_fmt(
            VerbosityLevel::Normal,
            Some(STATUS_CATEGORY),
            format_args!("Replay: Move {}/{} - {}", 3, 9, "White"),
        );
        assert_eq!(text, "Replay: Move 3/9 - White");
        assert_eq!(logger.status_lines(), vec![text]);
    }

    #[test]
    fn test_silent_is_never_captured() {
        let logger = SessionLogger::new();
        logger.record(VerbosityLevel::Silent, "nothing", None);
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_take_and_flush() {
        let mut logger = SessionLogger::with_verbosity(VerbosityLevel::Silent);
        logger.normal("one");
        logger.normal("two");
        let taken = logger.take_entries();
        assert_eq!(taken.len(), 2);
        assert!(logger.logs().is_empty());

        logger.normal("three");
        logger.flush_tail(1);
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_buffer_drops_oldest_entries() {
        let logger = SessionLogger::new();
        for i in 0..LOG_BUFFER_CAPACITY + 10 {
            logger.record_fmt(VerbosityLevel::Normal, None, format_args!("line {i}"));
        }
        let logs = logger.logs();
        assert_eq!(logs.len(), LOG_BUFFER_CAPACITY);
        assert_eq!(logs[0].message, "line 10");
        assert_eq!(
            logs.iter().last().map(|entry| entry.message.as_str()),
            Some(format!("line {}", LOG_BUFFER_CAPACITY + 9).as_str())
        );
    }

    #[test]
    fn test_stdout_mode_does_not_capture() {
        let mut logger = SessionLogger::with_verbosity(VerbosityLevel::Silent);
        logger.set_output_mode(OutputMode::Stdout);
        logger.status("hidden");
        assert!(!logger.is_capturing());
        assert!(logger.logs().is_empty());
    }
}
