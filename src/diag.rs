//! Diagnostic-only output path, used by the default internal handler and for failures of the internal
//! handler itself.

use log::Level;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_TARGET: &str = "err_dispatch";

/// Injected logging capability. Implementations must not fail.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

/// Writes diagnostics through the [`log`] facade under a fixed target.
#[derive(Debug, Clone)]
pub struct LogSink {
    target: String,
}

impl LogSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, line: &str) {
        log::log!(target: &self.target, level, "{line}");
    }
}

/// Keeps every emitted line in memory. Intended for tests and examples.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, line)| line).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: Level, line: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, line.to_owned()));
    }
}
