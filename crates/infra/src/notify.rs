//! User-facing advisories (toasts) and the sinks that receive them.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
}

impl Advisory {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }
}

/// Fire-and-forget notification sink. Implementations must not fail the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn advise(&self, advisory: &Advisory) {
        self.notify(advisory.severity, &advisory.message);
    }
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, severity: Severity, message: &str) {
        (**self).notify(severity, message)
    }
}

/// Default sink: advisories become log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success => tracing::info!(advisory = message, "notify"),
            Severity::Warning => tracing::warn!(advisory = message, "notify"),
            Severity::Error => tracing::error!(advisory = message, "notify"),
        }
    }
}

/// Sink that keeps every advisory, for tests and UI adapters that poll.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Advisory>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Advisory> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|a| a.severity == severity)
            .map(|a| a.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Advisory::new(severity, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_filters_by_severity() {
        let sink = RecordingNotifier::new();
        sink.notify(Severity::Success, "saved");
        sink.advise(&Advisory::warning("gauze is low"));

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.with_severity(Severity::Warning), vec!["gauze is low"]);
        assert!(sink.with_severity(Severity::Error).is_empty());
    }
}
