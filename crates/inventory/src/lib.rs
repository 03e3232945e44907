//! Inventory stock domain.
//!
//! This crate contains the business rules of the stock ledger as deterministic
//! domain logic (no IO, no HTTP, no storage): health classification, movement
//! arithmetic, the supply aggregate and catalog filtering.

pub mod filter;
pub mod health;
pub mod movement;
pub mod report;
pub mod supply;

pub use filter::FilterCriteria;
pub use health::{StockHealth, classify};
pub use movement::{
    ErrorCategory, Movement, MovementError, MovementKind, MovementRequest, StockChange,
};
pub use report::{StockAlert, StockReport};
pub use supply::{
    MovementRecorded, RecordMovement, Supply, SupplyCategory, SupplyCommand, SupplyDetails,
    SupplyDraft, SupplyEvent,
};
