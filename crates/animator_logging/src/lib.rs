#![deny(missing_docs)]
//! Shared logging utilities for the animator workspace.
//!
//! This crate provides the `animator_*` logging macros used across the
//! codebase, a minimal test initializer for the global logger, and a helper
//! that keeps credentials out of log lines.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! animator_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! animator_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! animator_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! animator_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! animator_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Number of trailing characters of a secret that stay visible after redaction.
const VISIBLE_SUFFIX: usize = 4;

/// Masks a secret (API key, token) for logging.
///
/// Only the last four characters are kept, and only when the secret is long
/// enough that they do not reveal most of it.
pub fn redact_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= VISIBLE_SUFFIX * 2 {
        return "****".to_string();
    }
    let suffix: String = secret.chars().skip(count - VISIBLE_SUFFIX).collect();
    format!("****{suffix}")
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::redact_secret;

    #[test]
    fn long_secret_keeps_suffix() {
        assert_eq!(redact_secret("AIzaSyExampleKey1234"), "****1234");
    }

    #[test]
    fn short_secret_fully_masked() {
        assert_eq!(redact_secret("abc"), "****");
        assert_eq!(redact_secret("12345678"), "****");
    }
}
