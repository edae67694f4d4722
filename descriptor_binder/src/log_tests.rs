//! Unit tests for log.rs
//!
//! Tests LogSeverity ordering and labels, LogEntry, and DefaultLogger output
//! paths. Routing through the global logger is covered in diagnostics_tests.rs.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::Mutex;
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "binder::BindingPool".to_string(),
        message: format!("{:?} entry", severity),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
    assert_eq!(LogSeverity::Warn.max(LogSeverity::Debug), LogSeverity::Warn);
}

#[test]
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Error.label(), "ERROR");
    assert_eq!(LogSeverity::Info.label().trim_end(), "INFO");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_without_location() {
    let e = entry(LogSeverity::Info, None, None);

    assert_eq!(e.source, "binder::BindingPool");
    assert_eq!(e.message, "Info entry");
    assert!(e.file.is_none());
    assert!(e.line.is_none());
}

#[test]
fn test_log_entry_with_location_survives_clone() {
    let e = entry(LogSeverity::Error, Some("vulkan_context.rs"), Some(42));
    let copy = e.clone();

    assert_eq!(copy.severity, LogSeverity::Error);
    assert_eq!(copy.file, Some("vulkan_context.rs"));
    assert_eq!(copy.line, Some(42));
    assert_eq!(copy.timestamp, e.timestamp);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_handles_every_severity() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        // Both the plain and the file:line format
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("bind_helper.rs"), Some(7)));
    }
}

#[test]
fn test_default_logger_ignores_partial_location() {
    // Only a file without a line falls back to the plain format
    DefaultLogger.log(&entry(LogSeverity::Error, Some("bind_helper.rs"), None));
}

// ============================================================================
// LOGGER TRAIT TESTS
// ============================================================================

struct CountingLogger {
    entries: Mutex<Vec<LogSeverity>>,
}

impl Logger for CountingLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.severity);
    }
}

#[test]
fn test_custom_logger_through_trait_object() {
    let logger = CountingLogger { entries: Mutex::new(Vec::new()) };
    {
        let dyn_logger: &dyn Logger = &logger;
        dyn_logger.log(&entry(LogSeverity::Warn, None, None));
        dyn_logger.log(&entry(LogSeverity::Trace, None, None));
    }

    assert_eq!(
        *logger.entries.lock().unwrap(),
        vec![LogSeverity::Warn, LogSeverity::Trace]
    );
}

#[test]
fn test_loggers_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<Box<dyn Logger>>();
}
