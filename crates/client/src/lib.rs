//! Client-side stock ledger: catalog reads with local fallback, movement
//! submission and history, over pluggable remote collaborators.

pub mod client;
pub mod config;
pub mod coordinator;
#[cfg(feature = "http")]
pub mod http;
pub mod mode;
pub mod snapshot;

pub use client::StockLedgerClient;
#[cfg(feature = "http")]
pub use client::{HttpClient, connect};
pub use config::ClientConfig;
pub use coordinator::FilterCoordinator;
pub use mode::FilterMode;
pub use snapshot::{CatalogSnapshot, SnapshotCache};
