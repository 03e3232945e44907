//! Filter coordinator: answers catalog queries from the remote catalog, or
//! from the cached snapshot while the remote is unreachable.
//!
//! ```text
//! ServerAuthoritative ──(transport error, snapshot cached)──▶ LocalFallback
//!          ▲                                                      │
//!          └──────────────(force_refresh succeeds)────────────────┘
//! ```
//!
//! Fallback never recovers on its own unless a re-probe interval is set.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use clinistock_infra::{Advisory, Notifier, RemoteCatalog, TracingNotifier, TransportError};
use clinistock_inventory::{FilterCriteria, Supply};

use crate::mode::{FilterMode, ModeState};
use crate::snapshot::{CatalogSnapshot, SnapshotCache};

pub struct FilterCoordinator<R> {
    remote: R,
    snapshot: SnapshotCache,
    state: Mutex<ModeState>,
    notifier: Arc<dyn Notifier>,
    reprobe_after: Option<Duration>,
}

impl<R: RemoteCatalog> FilterCoordinator<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            snapshot: SnapshotCache::new(),
            state: Mutex::new(ModeState::default()),
            notifier: Arc::new(TracingNotifier),
            reprobe_after: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Let fallback reads retry the remote once `interval` has passed since
    /// the last failure.
    pub fn with_reprobe_interval(mut self, interval: Option<Duration>) -> Self {
        self.reprobe_after = interval;
        self
    }

    pub fn mode(&self) -> FilterMode {
        self.state().mode()
    }

    pub fn snapshot(&self) -> Option<CatalogSnapshot> {
        self.snapshot.current()
    }

    /// Catalog view under `criteria`.
    ///
    /// Fails only when the remote is unreachable and nothing is cached.
    pub async fn get_filtered_catalog(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<Supply>, TransportError> {
        if self.mode().is_fallback() {
            let reprobe = self.state().reprobe_due(self.reprobe_after, Instant::now());
            if !reprobe {
                return Ok(self.evaluate_cached(criteria));
            }
            return self.reprobe(criteria).await;
        }

        match self.remote.query_catalog(criteria).await {
            Ok(supplies) => {
                self.snapshot.replace(supplies.clone(), Utc::now());
                Ok(supplies)
            }
            Err(err) => self.degrade(criteria, err),
        }
    }

    /// Query the remote regardless of mode and replace the snapshot.
    ///
    /// Success returns the coordinator to server-authoritative mode. Failure
    /// leaves both mode and snapshot untouched.
    pub async fn force_refresh(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<Supply>, TransportError> {
        let supplies = self.remote.query_catalog(criteria).await?;
        self.snapshot.replace(supplies.clone(), Utc::now());
        if self.state().recover() {
            info!(mode = %FilterMode::ServerAuthoritative, "catalog back in server mode");
        }
        Ok(supplies)
    }

    async fn reprobe(&self, criteria: &FilterCriteria) -> Result<Vec<Supply>, TransportError> {
        match self.remote.query_catalog(criteria).await {
            Ok(supplies) => {
                self.snapshot.replace(supplies.clone(), Utc::now());
                if self.state().recover() {
                    info!(mode = %FilterMode::ServerAuthoritative, "catalog re-probe succeeded");
                }
                Ok(supplies)
            }
            Err(err) => {
                warn!(error = %err, "catalog re-probe failed; staying in fallback");
                self.state().probe_failed(Instant::now());
                Ok(self.evaluate_cached(criteria))
            }
        }
    }

    fn degrade(
        &self,
        criteria: &FilterCriteria,
        err: TransportError,
    ) -> Result<Vec<Supply>, TransportError> {
        let Some(supplies) = self.snapshot.evaluate(criteria) else {
            warn!(error = %err, "catalog query failed and no snapshot is cached");
            return Err(err);
        };

        if self.state().degrade(Instant::now()) {
            warn!(error = %err, mode = %FilterMode::LocalFallback, "catalog degraded to local fallback");
            self.notifier.advise(&degraded_advisory(&self.snapshot));
        }
        Ok(supplies)
    }

    fn evaluate_cached(&self, criteria: &FilterCriteria) -> Vec<Supply> {
        self.snapshot.evaluate(criteria).unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, ModeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn degraded_advisory(snapshot: &SnapshotCache) -> Advisory {
    let message = match snapshot.cached_at() {
        Some(at) => format!(
            "Server unreachable; showing cached catalog from {}",
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "Server unreachable; showing cached catalog".to_string(),
    };
    Advisory::warning(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinistock_core::SupplyId;
    use clinistock_infra::{InMemoryRemote, RecordingNotifier, Severity};
    use clinistock_inventory::{StockHealth, SupplyCategory, SupplyDetails};

    fn supply(id: &str, name: &str, quantity: u32, minimum: u32) -> Supply {
        Supply::from_parts(
            SupplyId::new(id).unwrap(),
            SupplyDetails::new(name, SupplyCategory::Disposable, "pack").with_thresholds(minimum, None),
            quantity,
            Utc::now(),
        )
    }

    fn setup() -> (
        FilterCoordinator<Arc<InMemoryRemote>>,
        Arc<InMemoryRemote>,
        Arc<RecordingNotifier>,
    ) {
        let remote = Arc::new(InMemoryRemote::with_supplies([
            supply("gauze", "Sterile gauze", 10, 5),
            supply("tape", "Surgical tape", 2, 5),
            supply("gloves", "Nitrile gloves", 0, 10),
        ]));
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = FilterCoordinator::new(Arc::clone(&remote)).with_notifier(notifier.clone());
        (coordinator, remote, notifier)
    }

    #[tokio::test]
    async fn server_mode_delegates_and_caches() {
        let (coordinator, remote, _) = setup();

        let low = coordinator
            .get_filtered_catalog(&FilterCriteria::all().with_health(StockHealth::LowStock))
            .await
            .unwrap();

        assert_eq!(low.len(), 1);
        assert_eq!(remote.catalog_queries(), 1);
        assert_eq!(coordinator.snapshot().unwrap().len(), 1);
        assert_eq!(coordinator.mode(), FilterMode::ServerAuthoritative);
    }

    #[tokio::test]
    async fn failure_without_snapshot_surfaces_error() {
        let (coordinator, remote, notifier) = setup();
        remote.set_available(false);

        let err = coordinator
            .get_filtered_catalog(&FilterCriteria::all())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Unavailable(_)));
        assert_eq!(coordinator.mode(), FilterMode::ServerAuthoritative);
        assert!(notifier.entries().is_empty());
    }

    #[tokio::test]
    async fn failure_with_snapshot_degrades_once() {
        let (coordinator, remote, notifier) = setup();
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        remote.set_available(false);

        let first = coordinator
            .get_filtered_catalog(&FilterCriteria::search("tape"))
            .await
            .unwrap();
        let second = coordinator
            .get_filtered_catalog(&FilterCriteria::search("gloves"))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(coordinator.mode(), FilterMode::LocalFallback);
        // One failed query; the second read never left the cache.
        assert_eq!(remote.catalog_queries(), 2);
        assert_eq!(notifier.with_severity(Severity::Warning).len(), 1);
    }

    #[tokio::test]
    async fn fallback_does_not_recover_by_itself() {
        let (coordinator, remote, _) = setup();
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        remote.set_available(false);
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();

        remote.set_available(true);
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();

        assert_eq!(coordinator.mode(), FilterMode::LocalFallback);
        assert_eq!(remote.catalog_queries(), 2);
    }

    #[tokio::test]
    async fn force_refresh_recovers_only_on_success() {
        let (coordinator, remote, _) = setup();
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        remote.set_available(false);
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();

        assert!(coordinator.force_refresh(&FilterCriteria::all()).await.is_err());
        assert_eq!(coordinator.mode(), FilterMode::LocalFallback);
        assert_eq!(coordinator.snapshot().unwrap().len(), 3);

        remote.set_available(true);
        let refreshed = coordinator.force_refresh(&FilterCriteria::all()).await.unwrap();
        assert_eq!(refreshed.len(), 3);
        assert_eq!(coordinator.mode(), FilterMode::ServerAuthoritative);
    }

    #[tokio::test]
    async fn reprobe_interval_lets_fallback_recover() {
        let (coordinator, remote, _) = setup();
        let coordinator = coordinator.with_reprobe_interval(Some(Duration::ZERO));
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        remote.set_available(false);
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();

        // Re-probe fails: cached answer, still in fallback.
        let cached = coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(coordinator.mode(), FilterMode::LocalFallback);

        remote.set_available(true);
        coordinator.get_filtered_catalog(&FilterCriteria::all()).await.unwrap();
        assert_eq!(coordinator.mode(), FilterMode::ServerAuthoritative);
    }
}
