//! Contracts of the remote collaborators the ledger core consumes.
//!
//! Transport details live in the implementations: [`InMemoryRemote`] for
//! tests/dev, and the HTTP adapters in `clinistock-client`.

pub mod in_memory;

pub use in_memory::InMemoryRemote;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinistock_core::{MovementId, SupplyId};
use clinistock_inventory::{FilterCriteria, Movement, MovementError, MovementRequest, Supply};

/// The remote side could not be reached or answered with garbage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote request timed out")]
    Timeout,

    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode remote response: {0}")]
    Decode(String),
}

/// Failure of a remote movement write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote side applied its own rules and refused the movement.
    #[error("movement rejected by remote: {0}")]
    Rejected(MovementError),

    /// Refused for a reason that has no typed counterpart.
    #[error("movement refused by remote: {0}")]
    Refused(String),
}

/// What the remote side reports after accepting a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMovement {
    pub previous_quantity: u32,
    pub new_quantity: u32,
    pub movement_id: MovementId,
}

#[async_trait::async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn query_catalog(&self, criteria: &FilterCriteria) -> Result<Vec<Supply>, TransportError>;
}

#[async_trait::async_trait]
pub trait RemoteMovementHistory: Send + Sync {
    /// Up to `limit` movements for a supply, newest first.
    async fn query_movement_history(
        &self,
        supply_id: &SupplyId,
        limit: usize,
    ) -> Result<Vec<Movement>, TransportError>;
}

/// Authoritative write path for movements.
///
/// The remote side owns the final accept/reject decision; local checks only
/// fail fast.
#[async_trait::async_trait]
pub trait MovementGateway: Send + Sync {
    async fn persist_movement(
        &self,
        request: &MovementRequest,
    ) -> Result<PersistedMovement, GatewayError>;
}

#[async_trait::async_trait]
impl<R> RemoteCatalog for Arc<R>
where
    R: RemoteCatalog + ?Sized,
{
    async fn query_catalog(&self, criteria: &FilterCriteria) -> Result<Vec<Supply>, TransportError> {
        (**self).query_catalog(criteria).await
    }
}

#[async_trait::async_trait]
impl<R> RemoteMovementHistory for Arc<R>
where
    R: RemoteMovementHistory + ?Sized,
{
    async fn query_movement_history(
        &self,
        supply_id: &SupplyId,
        limit: usize,
    ) -> Result<Vec<Movement>, TransportError> {
        (**self).query_movement_history(supply_id, limit).await
    }
}

#[async_trait::async_trait]
impl<G> MovementGateway for Arc<G>
where
    G: MovementGateway + ?Sized,
{
    async fn persist_movement(
        &self,
        request: &MovementRequest,
    ) -> Result<PersistedMovement, GatewayError> {
        (**self).persist_movement(request).await
    }
}
