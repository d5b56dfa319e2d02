#![deny(missing_docs)]
//! Shared logging utilities for the uploader workspace.
//!
//! This crate provides the `uploader_*` logging macros used across the
//! codebase and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Zero-based index of the queue item the current thread is working on.
    static CURRENT_ITEM: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Records the queue item the current thread is processing.
/// Messages logged through the macros are prefixed with `[item N]` (1-based)
/// until [`clear_current_item`] is called.
pub fn set_current_item(index: usize) {
    CURRENT_ITEM.with(|v| v.set(Some(index)));
}

/// Clears the item recorded by [`set_current_item`].
pub fn clear_current_item() {
    CURRENT_ITEM.with(|v| v.set(None));
}

/// Retrieves the item index recorded for the current thread, if any.
pub fn current_item() -> Option<usize> {
    CURRENT_ITEM.with(|v| v.get())
}

/// Renders the message prefix for the current thread.
#[doc(hidden)]
pub fn item_prefix() -> String {
    match current_item() {
        Some(index) => format!("[item {}] ", index + 1),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! uploader_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::item_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! uploader_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::item_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! uploader_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::item_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! uploader_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::item_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! uploader_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::item_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
