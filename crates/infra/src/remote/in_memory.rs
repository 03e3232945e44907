use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;

use clinistock_core::{Aggregate, AggregateRoot, ExpectedVersion, MovementId, SupplyId};
use clinistock_inventory::{
    FilterCriteria, Movement, MovementError, MovementRequest, RecordMovement, Supply,
    SupplyCommand, SupplyEvent,
};

use crate::catalog::{InMemorySupplyCatalog, SupplyCatalogStore};
use crate::journal::{InMemoryMovementJournal, MovementJournal};

use super::{
    GatewayError, MovementGateway, PersistedMovement, RemoteCatalog, RemoteMovementHistory,
    TransportError,
};

/// In-process stand-in for the remote catalog service.
///
/// Applies movements atomically with the same domain rules as the client,
/// can be switched offline, and counts calls so tests can assert that no
/// remote traffic happened.
#[derive(Debug)]
pub struct InMemoryRemote {
    catalog: InMemorySupplyCatalog,
    journal: InMemoryMovementJournal,
    write_lock: Mutex<()>,
    available: AtomicBool,
    catalog_queries: AtomicUsize,
    history_queries: AtomicUsize,
    persist_calls: AtomicUsize,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self {
            catalog: InMemorySupplyCatalog::new(),
            journal: InMemoryMovementJournal::new(),
            write_lock: Mutex::new(()),
            available: AtomicBool::new(true),
            catalog_queries: AtomicUsize::new(0),
            history_queries: AtomicUsize::new(0),
            persist_calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supplies(supplies: impl IntoIterator<Item = Supply>) -> Self {
        let remote = Self::new();
        remote.catalog.reconcile(supplies.into_iter().collect());
        remote
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn supply(&self, id: &SupplyId) -> Option<Supply> {
        self.catalog.get(id)
    }

    pub fn catalog_queries(&self) -> usize {
        self.catalog_queries.load(Ordering::SeqCst)
    }

    pub fn history_queries(&self) -> usize {
        self.history_queries.load(Ordering::SeqCst)
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn recorded_movements(&self) -> usize {
        self.journal.len()
    }

    fn ensure_available(&self) -> Result<(), TransportError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Unavailable("in-memory remote is offline".to_string()))
        }
    }

    fn apply(&self, request: &MovementRequest) -> Result<PersistedMovement, GatewayError> {
        let _serialized = self
            .write_lock
            .lock()
            .map_err(|_| GatewayError::Refused("remote write lock poisoned".to_string()))?;

        let supply = self
            .catalog
            .get(&request.supply_id)
            .ok_or_else(|| GatewayError::Rejected(MovementError::SupplyNotFound(request.supply_id.clone())))?;

        let movement_id = MovementId::new();
        let events = supply
            .handle(&SupplyCommand::RecordMovement(RecordMovement {
                movement_id,
                request: request.clone(),
                occurred_at: Utc::now(),
            }))
            .map_err(GatewayError::Rejected)?;

        let mut persisted = None;
        for event in &events {
            self.catalog
                .commit(ExpectedVersion::Exact(supply.version()), event)
                .map_err(|e| GatewayError::Refused(e.to_string()))?;
            let SupplyEvent::MovementRecorded(recorded) = event;
            self.journal
                .append(recorded.movement.clone())
                .map_err(|e| GatewayError::Refused(e.to_string()))?;
            persisted = Some(PersistedMovement {
                previous_quantity: recorded.movement.previous_quantity(),
                new_quantity: recorded.movement.new_quantity(),
                movement_id,
            });
        }

        persisted.ok_or_else(|| GatewayError::Refused("no movement recorded".to_string()))
    }
}

#[async_trait::async_trait]
impl RemoteCatalog for InMemoryRemote {
    async fn query_catalog(&self, criteria: &FilterCriteria) -> Result<Vec<Supply>, TransportError> {
        self.catalog_queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        Ok(criteria.apply(&self.catalog.list()))
    }
}

#[async_trait::async_trait]
impl RemoteMovementHistory for InMemoryRemote {
    async fn query_movement_history(
        &self,
        supply_id: &SupplyId,
        limit: usize,
    ) -> Result<Vec<Movement>, TransportError> {
        self.history_queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        Ok(self.journal.history(supply_id, limit))
    }
}

#[async_trait::async_trait]
impl MovementGateway for InMemoryRemote {
    async fn persist_movement(
        &self,
        request: &MovementRequest,
    ) -> Result<PersistedMovement, GatewayError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.apply(request)
    }
}
