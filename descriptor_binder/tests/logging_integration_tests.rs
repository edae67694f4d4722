//! Integration tests for the binder logging system
//!
//! These tests verify the global logger and the entries the helper emits.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests


use std::sync::{Arc, Mutex};

use descriptor_binder::binder::Binder;
use descriptor_binder::binder::device::{
    BindingDevice, BindingKind, CommandStreamHandle, PipelineLayout, PipelineReflection,
    ReflectedBinding, ShaderStageFlags,
};
use descriptor_binder::binder::helper::BindHelper;
use descriptor_binder::binder::log::{Logger, LogEntry, LogSeverity};
use recording_device::{RecordingDevice, TestBuffer, TestLayout};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn uniform_helper(device: &Arc<RecordingDevice>) -> BindHelper {
    let reflection = PipelineReflection::new()
        .with_binding(0, ReflectedBinding::new(0, BindingKind::UniformBuffer, 1, ShaderStageFlags::COMPUTE))
        .unwrap();
    let device: Arc<dyn BindingDevice> = device.clone();
    let layout: Arc<dyn PipelineLayout> = TestLayout::new(reflection, 1);
    BindHelper::new(device, layout).unwrap()
}

fn from_source(entries: &[LogEntry], source: &str) -> Vec<LogEntry> {
    entries.iter().filter(|e| e.source == source).cloned().collect()
}

// ============================================================================
// GLOBAL LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);

    Binder::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Binder::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Binder::log_detailed(LogSeverity::Error, "test::module", "Test error message".to_string(), "test_file.rs", 42);

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[1].message, "Test warning message");
        assert_eq!(captured[2].file, Some("test_file.rs"));
        assert_eq!(captured[2].line, Some(42));
    }

    Binder::reset_logger();
}

#[test]
#[serial]
fn test_integration_min_severity_filters_entries() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);
    Binder::set_min_severity(LogSeverity::Warn);

    Binder::log(LogSeverity::Trace, "test", "Trace message".to_string());
    Binder::log(LogSeverity::Info, "test", "Info message".to_string());
    Binder::log(LogSeverity::Warn, "test", "Warn message".to_string());
    Binder::log(LogSeverity::Error, "test", "Error message".to_string());

    {
        let captured = entries.lock().unwrap();
        let severities: Vec<LogSeverity> = captured.iter().map(|e| e.severity).collect();
        assert_eq!(severities, vec![LogSeverity::Warn, LogSeverity::Error]);
    }

    Binder::set_min_severity(LogSeverity::Debug);
    Binder::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);

    Binder::log(LogSeverity::Info, "test", "Message 1".to_string());
    Binder::reset_logger();

    // Goes to the default logger, not captured
    Binder::log(LogSeverity::Info, "test", "Message 2".to_string());

    assert_eq!(entries.lock().unwrap().len(), 1);
}

// ============================================================================
// HELPER LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_helper_lifecycle_is_traced() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);
    Binder::set_min_severity(LogSeverity::Trace);

    let device = RecordingDevice::new();
    {
        let mut helper = uniform_helper(&device);
        helper.set_uniform_buffer(0, 0, &TestBuffer(20, 64), 0, 64).unwrap();
        helper.commit(CommandStreamHandle::from_raw(1));
    }

    Binder::set_min_severity(LogSeverity::Debug);
    Binder::reset_logger();

    let captured = entries.lock().unwrap();
    let helper_entries = from_source(&captured, "binder::BindHelper");
    let pool_entries = from_source(&captured, "binder::BindingPool");

    assert!(helper_entries.iter().any(|e| e.severity == LogSeverity::Debug && e.message.contains("Created helper")));
    assert!(helper_entries.iter().any(|e| e.message.contains("Committed 1 tables")));
    assert!(pool_entries.iter().any(|e| e.message.contains("Allocated table")));
    assert!(pool_entries.iter().any(|e| e.message.contains("Destroyed pool")));
    assert!(captured.iter().all(|e| e.severity < LogSeverity::Warn));
}

#[test]
#[serial]
fn test_integration_pool_exhaustion_logged_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);

    let device = RecordingDevice::new();
    let mut helper = uniform_helper(&device);
    device.fail_tables(true);
    assert!(helper.set_uniform_buffer(0, 0, &TestBuffer(20, 64), 0, 64).is_err());

    Binder::reset_logger();

    let captured = entries.lock().unwrap();
    let errors: Vec<&LogEntry> = captured.iter().filter(|e| e.severity == LogSeverity::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, "binder::BindingPool");
    assert!(errors[0].message.contains("set 0"));
    assert!(errors[0].file.is_some_and(|file| file.ends_with("binding_pool.rs")));
    assert!(errors[0].line.is_some());
}

#[test]
#[serial]
fn test_integration_protocol_violation_logged_before_panic() {
    let (test_logger, entries) = TestLogger::new();
    Binder::set_logger(test_logger);

    let device = RecordingDevice::new();
    let mut helper = uniform_helper(&device);
    helper.commit(CommandStreamHandle::from_raw(1));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        helper.commit(CommandStreamHandle::from_raw(2));
    }));
    assert!(result.is_err());

    Binder::reset_logger();

    let captured = entries.lock().unwrap();
    let errors = from_source(&captured, "binder::BindHelper")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Error)
        .collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "BindHelper::commit called after commit");
}
