//! Infrastructure layer: catalog store, movement journal, remote collaborators
//! and the ledger that ties them together.

pub mod catalog;
pub mod journal;
pub mod ledger;
pub mod notify;
pub mod remote;

pub use catalog::{InMemorySupplyCatalog, SupplyCatalogStore};
pub use journal::{InMemoryMovementJournal, MovementJournal};
pub use ledger::{
    LedgerError, MovementLedger, MovementLedgerBuilder, MovementResult, SupplyEnvelope,
    stock_advisory,
};
pub use notify::{Advisory, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use remote::{
    GatewayError, InMemoryRemote, MovementGateway, PersistedMovement, RemoteCatalog,
    RemoteMovementHistory, TransportError,
};
