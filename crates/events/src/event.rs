use chrono::{DateTime, Utc};

use clinistock_core::SupplyId;

/// A fact about one supply's stock, as published on the bus.
///
/// Every event belongs to exactly one supply stream. Once published it is
/// never edited; corrections are new movements.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name subscribers route on, e.g. `inventory.supply.movement_recorded`.
    fn event_type(&self) -> &'static str;

    /// Payload schema revision. Bump when a field changes meaning.
    fn schema_version(&self) -> u32 {
        1
    }

    /// The supply stream this event is appended to.
    fn supply_id(&self) -> &SupplyId;

    /// When the movement happened at the clinic.
    fn occurred_at(&self) -> DateTime<Utc>;
}
