use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinistock_core::SupplyId;

use crate::event::Event;

/// Envelope for an event, containing stream metadata.
///
/// - `supply_id` names the stream the event belongs to.
/// - `sequence_number` is the supply version after the event was committed,
///   so it increases monotonically per stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    supply_id: SupplyId,
    event_type: String,

    /// Monotonically increasing position in the supply stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        supply_id: SupplyId,
        event_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            supply_id,
            event_type: event_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn supply_id(&self) -> &SupplyId {
        &self.supply_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a typed event; stream and type name come from the event itself.
    pub fn wrap(sequence_number: u64, payload: E) -> Self {
        Self::new(
            Uuid::now_v7(),
            payload.supply_id().clone(),
            payload.event_type(),
            sequence_number,
            payload,
        )
    }
}
