//! Catalog read mode and the degrade/recover state behind it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Where catalog reads are answered from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Remote catalog answers every query.
    #[default]
    ServerAuthoritative,
    /// Remote unreachable; queries run against the cached snapshot.
    LocalFallback,
}

impl FilterMode {
    pub fn is_fallback(self) -> bool {
        self == FilterMode::LocalFallback
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::ServerAuthoritative => "server_authoritative",
            FilterMode::LocalFallback => "local_fallback",
        }
    }
}

impl core::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode plus the time of the last failed remote attempt.
#[derive(Debug, Default)]
pub(crate) struct ModeState {
    mode: FilterMode,
    last_failure: Option<Instant>,
}

impl ModeState {
    pub(crate) fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Enter fallback. Returns true when this is a transition.
    pub(crate) fn degrade(&mut self, now: Instant) -> bool {
        self.last_failure = Some(now);
        let changed = !self.mode.is_fallback();
        self.mode = FilterMode::LocalFallback;
        changed
    }

    /// Record a failed re-probe while staying in fallback.
    pub(crate) fn probe_failed(&mut self, now: Instant) {
        self.last_failure = Some(now);
    }

    /// Back to server-authoritative. Returns true when this is a transition.
    pub(crate) fn recover(&mut self) -> bool {
        self.last_failure = None;
        let changed = self.mode.is_fallback();
        self.mode = FilterMode::ServerAuthoritative;
        changed
    }

    /// Whether a fallback read should try the remote again.
    ///
    /// Never true without an interval; fallback is one-way until a forced refresh.
    pub(crate) fn reprobe_due(&self, interval: Option<Duration>, now: Instant) -> bool {
        match (interval, self.last_failure) {
            (Some(interval), Some(at)) => now.saturating_duration_since(at) >= interval,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
