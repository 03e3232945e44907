//! Facade combining the filter coordinator and the movement ledger.

use std::sync::Arc;

use tracing::warn;

use clinistock_core::SupplyId;
use clinistock_events::EventBus;
use clinistock_infra::{
    LedgerError, MovementGateway, MovementLedger, MovementResult, Notifier, RemoteCatalog,
    Severity, SupplyCatalogStore, SupplyEnvelope, TracingNotifier, TransportError,
};
use clinistock_inventory::{
    FilterCriteria, Movement, MovementRequest, StockHealth, StockReport, Supply,
};

use crate::coordinator::FilterCoordinator;
use crate::mode::FilterMode;

/// Entry point for callers: catalog reads, health, movements and history.
pub struct StockLedgerClient<R, S, G, B> {
    coordinator: FilterCoordinator<R>,
    ledger: MovementLedger<S, G, B>,
    notifier: Arc<dyn Notifier>,
    history_limit: usize,
}

impl<R, S, G, B> StockLedgerClient<R, S, G, B>
where
    R: RemoteCatalog,
    S: SupplyCatalogStore + 'static,
    G: MovementGateway + 'static,
    B: EventBus<SupplyEnvelope> + 'static,
{
    pub fn new(coordinator: FilterCoordinator<R>, ledger: MovementLedger<S, G, B>) -> Self {
        Self {
            coordinator,
            ledger,
            notifier: Arc::new(TracingNotifier),
            history_limit: 50,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn coordinator(&self) -> &FilterCoordinator<R> {
        &self.coordinator
    }

    pub fn ledger(&self) -> &MovementLedger<S, G, B> {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        self.ledger.store()
    }

    pub fn mode(&self) -> FilterMode {
        self.coordinator.mode()
    }

    /// Filtered catalog view. Records fetched from the server are folded into
    /// the local store, so anything listed can take a movement.
    pub async fn get_filtered_catalog(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<Supply>, TransportError> {
        let supplies = self.coordinator.get_filtered_catalog(criteria).await?;
        if self.mode() == FilterMode::ServerAuthoritative {
            self.ledger.reconcile(supplies.clone()).await;
        }
        Ok(supplies)
    }

    pub fn get_health_state(&self, supply: &Supply) -> StockHealth {
        supply.health()
    }

    /// Apply a movement, tell the user how it went, then resync the catalog.
    ///
    /// A supply missing from the local store triggers a catalog load first.
    /// A failed resync does not fail the movement; it is already committed.
    pub async fn submit_movement(
        &self,
        request: MovementRequest,
    ) -> Result<MovementResult, LedgerError> {
        if self.store().get(&request.supply_id).is_none() {
            if let Err(err) = self.force_refresh().await {
                warn!(supply_id = %request.supply_id, error = %err, "catalog load before movement failed");
            }
        }

        let result = match self.ledger.apply_movement(request).await {
            Ok(result) => result,
            Err(err) => {
                self.notifier.notify(Severity::Error, &err.to_string());
                return Err(err);
            }
        };

        self.notifier.notify(
            Severity::Success,
            &format!(
                "Recorded {} for {}: {} → {} {}",
                result.movement.kind(),
                result.supply.name(),
                result.movement.previous_quantity(),
                result.movement.new_quantity(),
                result.supply.unit()
            ),
        );

        if let Err(err) = self.force_refresh().await {
            warn!(error = %err, "catalog refresh after movement failed");
        }
        Ok(result)
    }

    /// Movement history, newest first, up to the configured limit.
    pub async fn get_history(&self, supply_id: &SupplyId) -> Result<Vec<Movement>, LedgerError> {
        self.ledger.history(supply_id, self.history_limit).await
    }

    /// Reload the full catalog from the remote and fold it into the local store.
    pub async fn force_refresh(&self) -> Result<Vec<Supply>, TransportError> {
        let supplies = self.coordinator.force_refresh(&FilterCriteria::all()).await?;
        self.ledger.reconcile(supplies.clone()).await;
        Ok(supplies)
    }

    /// Health summary of the local store.
    pub fn stock_report(&self) -> StockReport {
        StockReport::from_supplies(&self.ledger.store().list())
    }
}

#[cfg(feature = "http")]
mod wiring {
    use std::sync::Arc;

    use anyhow::Context;

    use clinistock_events::InMemoryEventBus;
    use clinistock_infra::{InMemorySupplyCatalog, MovementLedger, SupplyEnvelope};

    use super::StockLedgerClient;
    use crate::config::ClientConfig;
    use crate::coordinator::FilterCoordinator;
    use crate::http::HttpRemote;

    pub type HttpClient = StockLedgerClient<
        Arc<HttpRemote>,
        Arc<InMemorySupplyCatalog>,
        Arc<HttpRemote>,
        Arc<InMemoryEventBus<SupplyEnvelope>>,
    >;

    /// Wire a client against the HTTP catalog service described by `config`.
    pub fn connect(config: &ClientConfig) -> anyhow::Result<HttpClient> {
        let remote = Arc::new(
            HttpRemote::new(config)
                .with_context(|| format!("failed to build HTTP client for {}", config.api_url))?,
        );

        let coordinator = FilterCoordinator::new(Arc::clone(&remote))
            .with_reprobe_interval(config.reprobe_interval);
        let ledger = MovementLedger::builder(
            Arc::new(InMemorySupplyCatalog::new()),
            Arc::clone(&remote),
            Arc::new(InMemoryEventBus::new()),
        )
        .remote_history(remote)
        .build();

        Ok(StockLedgerClient::new(coordinator, ledger).with_history_limit(config.history_limit))
    }
}

#[cfg(feature = "http")]
pub use wiring::{HttpClient, connect};
