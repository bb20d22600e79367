//! The injectable logger capability.

use crate::LogLevel;
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Structured context attached to a log entry.
pub type LogContext = Map<String, Value>;

/// Something that accepts log entries.
///
/// Library code takes an optional `Arc<dyn Logger>` rather than emitting events
/// itself, so the embedding application picks the destination.
pub trait Logger: Send + Sync {
    /// Record one entry.
    fn log(&self, level: LogLevel, message: &str, context: &LogContext);

    /// Record a warning.
    fn warn(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Warn, message, context);
    }
}

/// Forwards entries to the `tracing` macros under the `ferrule` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        let context = Value::Object(context.clone());
        match level {
            LogLevel::Trace => tracing::trace!(target: "ferrule", %context, "{}", message),
            LogLevel::Debug => tracing::debug!(target: "ferrule", %context, "{}", message),
            LogLevel::Info => tracing::info!(target: "ferrule", %context, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "ferrule", %context, "{}", message),
            LogLevel::Error => tracing::error!(target: "ferrule", %context, "{}", message),
        }
    }
}

/// A single captured entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: LogContext,
}

/// Keeps every entry in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<LogRecord> {
        self.records.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}
