//! Movement ledger: the single entry point that changes a supply's quantity.
//!
//! ```text
//! MovementRequest
//!   ↓
//! 1. Validate shape (quantity, reason, unit cost), no lock or IO
//!   ↓
//! 2. Take the per-supply lock
//!   ↓
//! 3. Load supply, pre-check against the known quantity (Supply::handle)
//!   ↓
//! 4. Persist through the remote gateway (authoritative accept/reject)
//!   ↓
//! 5. Commit the confirmed quantity to the catalog (expected version)
//!   ↓
//! 6. Append to the journal, publish the event, raise stock advisories
//! ```
//!
//! Steps 2–6 run on a spawned task: a caller that stops waiting cannot leave a
//! movement persisted remotely but missing locally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use clinistock_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, MovementId, SupplyId};
use clinistock_events::{EventBus, EventEnvelope};
use clinistock_inventory::{
    Movement, MovementError, MovementRecorded, MovementRequest, RecordMovement, StockChange,
    StockHealth, Supply, SupplyCommand, SupplyEvent,
};

use crate::catalog::SupplyCatalogStore;
use crate::journal::{InMemoryMovementJournal, MovementJournal};
use crate::notify::{Advisory, Notifier, TracingNotifier};
use crate::remote::{GatewayError, MovementGateway, RemoteMovementHistory, TransportError};

/// Envelope type the ledger publishes.
pub type SupplyEnvelope = EventEnvelope<SupplyEvent>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Validation, business-rule or not-found rejection.
    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote side rejected for a reason without a typed counterpart.
    #[error("movement rejected: {0}")]
    Rejected(String),

    /// The supply changed underneath the ledger (optimistic check failed).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("catalog error: {0}")]
    Catalog(DomainError),

    #[error("movement task aborted: {0}")]
    Aborted(String),
}

impl From<GatewayError> for LedgerError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::Transport(e) => LedgerError::Transport(e),
            GatewayError::Rejected(e) => LedgerError::Movement(e),
            GatewayError::Refused(msg) => LedgerError::Rejected(msg),
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
            other => LedgerError::Catalog(other),
        }
    }
}

/// Outcome of an accepted movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementResult {
    pub movement: Movement,
    /// The supply as committed after the movement.
    pub supply: Supply,
    pub health: StockHealth,
    /// Set when the movement left the supply low or out of stock.
    pub advisory: Option<Advisory>,
}

impl MovementResult {
    pub fn new_quantity(&self) -> u32 {
        self.movement.new_quantity()
    }
}

/// Hands out one async mutex per supply id.
#[derive(Debug, Default)]
struct SupplyLocks {
    inner: Mutex<HashMap<SupplyId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SupplyLocks {
    fn lock_for(&self, id: &SupplyId) -> Arc<tokio::sync::Mutex<()>> {
        // The map holds no invariant a panic could break, so poisoning is ignored.
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(id.clone()).or_default())
    }
}

struct LedgerInner<S, G, B> {
    store: S,
    gateway: G,
    bus: B,
    journal: Arc<dyn MovementJournal>,
    history: Option<Arc<dyn RemoteMovementHistory>>,
    notifier: Arc<dyn Notifier>,
    locks: SupplyLocks,
}

/// Applies typed movements to the catalog.
///
/// Cheap to clone; clones share the same locks and collaborators.
pub struct MovementLedger<S, G, B> {
    inner: Arc<LedgerInner<S, G, B>>,
}

impl<S, G, B> Clone for MovementLedger<S, G, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`MovementLedger`]; optional collaborators have defaults.
pub struct MovementLedgerBuilder<S, G, B> {
    store: S,
    gateway: G,
    bus: B,
    journal: Arc<dyn MovementJournal>,
    history: Option<Arc<dyn RemoteMovementHistory>>,
    notifier: Arc<dyn Notifier>,
}

impl<S, G, B> MovementLedgerBuilder<S, G, B> {
    pub fn journal(mut self, journal: Arc<dyn MovementJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn remote_history(mut self, history: Arc<dyn RemoteMovementHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> MovementLedger<S, G, B> {
        MovementLedger {
            inner: Arc::new(LedgerInner {
                store: self.store,
                gateway: self.gateway,
                bus: self.bus,
                journal: self.journal,
                history: self.history,
                notifier: self.notifier,
                locks: SupplyLocks::default(),
            }),
        }
    }
}

impl<S, G, B> MovementLedger<S, G, B>
where
    S: SupplyCatalogStore + 'static,
    G: MovementGateway + 'static,
    B: EventBus<SupplyEnvelope> + 'static,
{
    pub fn builder(store: S, gateway: G, bus: B) -> MovementLedgerBuilder<S, G, B> {
        MovementLedgerBuilder {
            store,
            gateway,
            bus,
            journal: Arc::new(InMemoryMovementJournal::new()),
            history: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn journal(&self) -> &dyn MovementJournal {
        self.inner.journal.as_ref()
    }

    /// Apply one movement, all-or-nothing.
    ///
    /// Validation and business-rule failures are returned before the gateway
    /// is called. No retries happen here; a rejected movement must be
    /// resubmitted by the caller.
    pub async fn apply_movement(
        &self,
        request: MovementRequest,
    ) -> Result<MovementResult, LedgerError> {
        request.validate()?;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.apply_serialized(request).await })
            .await
            .map_err(|e| LedgerError::Aborted(e.to_string()))?
    }

    /// Fold remote catalog records into the local store.
    ///
    /// Each record is written under its supply's movement lock, so a refresh
    /// never lands between a movement's remote persist and its local commit.
    pub async fn reconcile(&self, supplies: Vec<Supply>) -> usize {
        let mut written = 0;
        for supply in supplies {
            let lock = self.inner.locks.lock_for(supply.id_typed());
            let _guard = lock.lock().await;
            written += self.inner.store.reconcile(vec![supply]);
        }
        written
    }

    /// Movement history for a supply, newest first.
    ///
    /// Prefers the remote history; falls back to the local journal when the
    /// remote side is unreachable or not configured.
    pub async fn history(
        &self,
        supply_id: &SupplyId,
        limit: usize,
    ) -> Result<Vec<Movement>, LedgerError> {
        if let Some(remote) = &self.inner.history {
            match remote.query_movement_history(supply_id, limit).await {
                Ok(movements) => return Ok(movements),
                Err(err) => {
                    warn!(supply_id = %supply_id, error = %err, "remote history unavailable; using local journal");
                }
            }
        }

        if self.inner.store.get(supply_id).is_none() {
            return Err(MovementError::SupplyNotFound(supply_id.clone()).into());
        }
        Ok(self.inner.journal.history(supply_id, limit))
    }
}

impl<S, G, B> LedgerInner<S, G, B>
where
    S: SupplyCatalogStore,
    G: MovementGateway,
    B: EventBus<SupplyEnvelope>,
{
    async fn apply_serialized(&self, request: MovementRequest) -> Result<MovementResult, LedgerError> {
        let lock = self.locks.lock_for(&request.supply_id);
        let _guard = lock.lock().await;

        let supply = self
            .store
            .get(&request.supply_id)
            .ok_or_else(|| MovementError::SupplyNotFound(request.supply_id.clone()))?;
        let expected = ExpectedVersion::Exact(supply.version());
        let occurred_at = Utc::now();

        // Local pre-check: fail fast before any remote traffic.
        let planned = planned_change(&supply, &request, occurred_at)?;

        let persisted = self.gateway.persist_movement(&request).await?;
        let confirmed = StockChange {
            previous_quantity: persisted.previous_quantity,
            new_quantity: persisted.new_quantity,
        };
        if confirmed != planned {
            warn!(
                supply_id = %request.supply_id,
                planned_previous = planned.previous_quantity,
                planned_new = planned.new_quantity,
                confirmed_previous = confirmed.previous_quantity,
                confirmed_new = confirmed.new_quantity,
                "local quantity was stale; using remote snapshot"
            );
        }

        let movement = Movement::record(persisted.movement_id, &request, confirmed, occurred_at);
        let event = SupplyEvent::MovementRecorded(MovementRecorded {
            movement: movement.clone(),
        });

        let updated = match self.store.commit(expected, &event) {
            Ok(updated) => updated,
            Err(err) if err.is_conflict() => self.settle_conflict(&request, confirmed, err)?,
            Err(err) => return Err(err.into()),
        };
        self.journal.append(movement.clone())?;

        let envelope = EventEnvelope::wrap(updated.version(), event);
        if let Err(err) = self.bus.publish(envelope) {
            // The journal already holds the movement; subscribers can catch up from it.
            warn!(supply_id = %request.supply_id, error = ?err, "failed to publish movement event");
        }

        let health = updated.health();
        let advisory = stock_advisory(&updated);
        if let Some(advisory) = &advisory {
            self.notifier.advise(advisory);
        }

        info!(
            supply_id = %request.supply_id,
            kind = %request.kind,
            previous = movement.previous_quantity(),
            new = movement.new_quantity(),
            health = %health,
            "movement recorded"
        );

        Ok(MovementResult {
            movement,
            supply: updated,
            health,
            advisory,
        })
    }

    /// The remote already accepted the movement but the local record moved on.
    /// If the stored quantity is the confirmed one, the record was refreshed
    /// from the remote in between and already reflects this movement.
    fn settle_conflict(
        &self,
        request: &MovementRequest,
        confirmed: StockChange,
        err: DomainError,
    ) -> Result<Supply, LedgerError> {
        match self.store.get(&request.supply_id) {
            Some(current) if current.quantity() == confirmed.new_quantity => {
                debug!(
                    supply_id = %request.supply_id,
                    version = current.version(),
                    "local record already holds the confirmed quantity"
                );
                Ok(current)
            }
            _ => Err(err.into()),
        }
    }
}

fn planned_change(
    supply: &Supply,
    request: &MovementRequest,
    occurred_at: chrono::DateTime<Utc>,
) -> Result<StockChange, MovementError> {
    let events = supply.handle(&SupplyCommand::RecordMovement(RecordMovement {
        movement_id: MovementId::new(),
        request: request.clone(),
        occurred_at,
    }))?;

    let change = events
        .iter()
        .map(|SupplyEvent::MovementRecorded(e)| e.movement.change())
        .last()
        .unwrap_or(StockChange {
            previous_quantity: supply.quantity(),
            new_quantity: supply.quantity(),
        });
    debug!(supply_id = %supply.id_typed(), ?change, "movement pre-check passed");
    Ok(change)
}

/// Warning for supplies left low or out of stock; `None` when stock is healthy.
pub fn stock_advisory(supply: &Supply) -> Option<Advisory> {
    match supply.health() {
        StockHealth::Normal => None,
        StockHealth::OutOfStock => Some(Advisory::warning(format!(
            "{} is out of stock",
            supply.name()
        ))),
        StockHealth::LowStock => Some(Advisory::warning(format!(
            "{} is low on stock: {} {} left (minimum {})",
            supply.name(),
            supply.quantity(),
            supply.unit(),
            supply.minimum_quantity()
        ))),
    }
}
