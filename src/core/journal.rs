//! Journal - per-instance diagnostics
//!
//! Every message is emitted as a `tracing` event and kept in memory so the
//! host can show what a script reported after the fact.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A recorded diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: Severity,
    pub message: String,
    pub script: String,
}

/// Diagnostics sink shared by the control surface, the worker and the bridges
#[derive(Debug)]
pub struct Journal {
    script: PathBuf,
    entries: Mutex<Vec<LogEntry>>,
}

/// Shared handle to a journal
pub type SharedJournal = Arc<Journal>;

impl Journal {
    pub fn new(script: impl Into<PathBuf>) -> SharedJournal {
        Arc::new(Self {
            script: script.into(),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Emit and record a message
    pub fn record(&self, level: Severity, message: impl Into<String>) {
        let message = message.into();
        let script = self.script.display().to_string();

        match level {
            Severity::Debug => tracing::debug!(script = %script, "{}", message),
            Severity::Info => tracing::info!(script = %script, "{}", message),
            Severity::Warn => tracing::warn!(script = %script, "{}", message),
            Severity::Error => tracing::error!(script = %script, "{}", message),
        }

        // A panic elsewhere must not silence diagnostics
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message,
                script,
            });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.record(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(Severity::Error, message);
    }

    /// Snapshot of everything recorded so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries at exactly `level`
    pub fn entries_at(&self, level: Severity) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order_and_script() {
        let journal = Journal::new("/sd/radio.lua");
        journal.info("first");
        journal.warn("second");

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, Severity::Warn);
        assert_eq!(entries[1].script, "/sd/radio.lua");
    }

    #[test]
    fn test_entries_at_filters() {
        let journal = Journal::new("a.lua");
        journal.error("bad");
        journal.debug("noise");
        journal.error("worse");

        let errors = journal.entries_at(Severity::Error);
        assert_eq!(errors.len(), 2);
        assert!(journal.entries_at(Severity::Warn).is_empty());
    }

    #[test]
    fn test_severity_ordering_and_display() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Debug < Severity::Info);
        assert_eq!(Severity::Warn.to_string(), "warn");
    }

    #[test]
    fn test_serializes_lowercase_level() {
        let entry = LogEntry {
            level: Severity::Warn,
            message: "m".to_string(),
            script: "s".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warn");
    }
}
