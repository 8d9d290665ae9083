//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` / `debug!` macros for formatted terminal output with colored prefixes
//! - [`Logger`], a diagnostic sink bound to one command, owned by its pipeline
//! - [`ProgressLine`] for single-line progress display with multiple counters
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("build"; "rendering {} pages", count);
//!
//! // Command-scoped logger
//! let logger = Logger::new("github_deploy");
//! logger.info("Successful deployment");
//!
//! // Progress line for build
//! let progress = ProgressLine::new(&[("markdown", 10), ("assets", 4)]);
//! progress.inc("markdown");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stderr, stdout},
    sync::Arc,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
#[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();

    if bar_count > 0 {
        for _ in 0..bar_count {
            writeln!(stdout).ok();
        }
    }

    stdout.flush().ok();
}

/// Log an error with a red module prefix to stderr.
pub fn log_error(module: &str, message: &str) {
    let prefix = format!("[{module}]").bright_red().bold().to_string();
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "deploy" | "github_deploy" => prefix.bright_blue().bold().to_string(),
        "git" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Command-scoped logger
// ============================================================================

/// Severity of a captured log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Error,
}

/// A diagnostic sink bound to one command.
///
/// Terminal loggers forward to [`log`] / [`log_error`]. Capturing loggers
/// keep every line in memory instead, so pipelines can be inspected in tests.
#[derive(Clone)]
pub struct Logger {
    module: &'static str,
    sink: Sink,
}

#[derive(Clone)]
#[cfg_attr(not(test), allow(dead_code))]
enum Sink {
    Terminal,
    Capture(Arc<Mutex<Vec<(Level, String)>>>),
}

impl Logger {
    /// Logger writing to the terminal under `[module]`.
    pub const fn new(module: &'static str) -> Self {
        Self {
            module,
            sink: Sink::Terminal,
        }
    }

    /// Logger recording lines in memory.
    #[cfg(test)]
    pub fn capture(module: &'static str) -> Self {
        Self {
            module,
            sink: Sink::Capture(Arc::default()),
        }
    }

    pub const fn module(&self) -> &'static str {
        self.module
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Level::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Level::Error, message.as_ref());
    }

    /// Only emitted in verbose mode (always recorded by capturing loggers).
    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Level::Debug, message.as_ref());
    }

    fn emit(&self, level: Level, message: &str) {
        match &self.sink {
            Sink::Terminal => match level {
                Level::Error => log_error(self.module, message),
                Level::Info => log(self.module, message),
                Level::Debug if is_verbose() => log(self.module, message),
                Level::Debug => {}
            },
            Sink::Capture(lines) => lines.lock().push((level, message.to_owned())),
        }
    }

    /// Lines recorded so far (empty for terminal loggers).
    #[cfg(test)]
    pub fn captured(&self) -> Vec<(Level, String)> {
        match &self.sink {
            Sink::Terminal => Vec::new(),
            Sink::Capture(lines) => lines.lock().clone(),
        }
    }
}

// ============================================================================
// Progress Line (single-line counters)
// ============================================================================

/// Single-line progress display with multiple counters
///
/// Displays: `[build] markdown(5/10) assets(120/371)`
///
/// All counters update in place on the same line. Uses `try_lock` to avoid
/// blocking worker threads - if display is busy, the update is skipped
pub struct ProgressLine {
    counters: Vec<Counter>,
    lock: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Create a new build progress display.
    ///
    /// Only includes counters with total > 0.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters: Vec<_> = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(name, total)| Counter {
                name,
                total: *total,
                current: AtomicUsize::new(0),
            })
            .collect();

        BAR_COUNT.store(1, Ordering::SeqCst);

        let progress = Self {
            counters,
            lock: Mutex::new(()),
        };
        progress.display(false);
        progress
    }

    /// Increment the counter with the given name.
    ///
    /// Non-blocking: if display lock is held, skips refresh.
    #[inline]
    pub fn inc(&self, name: &str) {
        for counter in &self.counters {
            if counter.name == name {
                counter.current.fetch_add(1, Ordering::Relaxed);
                if let Some(_guard) = self.lock.try_lock() {
                    self.display(false);
                }
                return;
            }
        }
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.current.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Overwrite the current line; `keep` ends it with a newline.
    fn display(&self, keep: bool) {
        let line = self.render();
        let prefix = colorize_prefix("build", "build");

        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        if keep {
            writeln!(stdout, "{prefix} {line}").ok();
        } else {
            write!(stdout, "{prefix} {line}").ok();
        }
        stdout.flush().ok();
    }

    /// Finish progress display, preserve line and move to next line.
    pub fn finish(self) {
        BAR_COUNT.store(0, Ordering::SeqCst);

        {
            let _guard = self.lock.lock(); // Wait for any pending display
            self.display(true);
        }

        std::mem::forget(self); // Prevent Drop from clearing
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_COUNT.store(0, Ordering::SeqCst);

        // Clear the line on drop (if not finished properly)
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================
