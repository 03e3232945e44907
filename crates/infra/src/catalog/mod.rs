//! Supply catalog storage.
//!
//! The catalog owns the authoritative quantity of every supply. Descriptive
//! fields may be edited freely; quantity only changes through
//! [`SupplyCatalogStore::commit`], which the movement ledger calls with a
//! recorded movement event and the version it read.

pub mod in_memory;

pub use in_memory::InMemorySupplyCatalog;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use clinistock_core::{DomainResult, ExpectedVersion, SupplyId};
use clinistock_inventory::{Supply, SupplyDetails, SupplyDraft, SupplyEvent};

pub trait SupplyCatalogStore: Send + Sync {
    fn get(&self, id: &SupplyId) -> Option<Supply>;

    /// All supplies, ordered by id.
    fn list(&self) -> Vec<Supply>;

    /// Add a new supply. Fails with a conflict if the id is taken.
    fn register(&self, draft: SupplyDraft, at: DateTime<Utc>) -> DomainResult<Supply>;

    fn update_details(
        &self,
        id: &SupplyId,
        details: SupplyDetails,
        at: DateTime<Utc>,
    ) -> DomainResult<Supply>;

    fn deactivate(&self, id: &SupplyId, at: DateTime<Utc>) -> DomainResult<Supply>;

    /// Apply a recorded movement to its supply if the supply is still at `expected`.
    fn commit(&self, expected: ExpectedVersion, event: &SupplyEvent) -> DomainResult<Supply>;

    /// Take in records from an authoritative source.
    ///
    /// A record replaces the local one only if its version is not older.
    /// Returns how many records were written. Refreshes that can race a
    /// movement go through `MovementLedger::reconcile` instead.
    fn reconcile(&self, supplies: Vec<Supply>) -> usize;
}

impl<S> SupplyCatalogStore for Arc<S>
where
    S: SupplyCatalogStore + ?Sized,
{
    fn get(&self, id: &SupplyId) -> Option<Supply> {
        (**self).get(id)
    }

    fn list(&self) -> Vec<Supply> {
        (**self).list()
    }

    fn register(&self, draft: SupplyDraft, at: DateTime<Utc>) -> DomainResult<Supply> {
        (**self).register(draft, at)
    }

    fn update_details(
        &self,
        id: &SupplyId,
        details: SupplyDetails,
        at: DateTime<Utc>,
    ) -> DomainResult<Supply> {
        (**self).update_details(id, details, at)
    }

    fn deactivate(&self, id: &SupplyId, at: DateTime<Utc>) -> DomainResult<Supply> {
        (**self).deactivate(id, at)
    }

    fn commit(&self, expected: ExpectedVersion, event: &SupplyEvent) -> DomainResult<Supply> {
        (**self).commit(expected, event)
    }

    fn reconcile(&self, supplies: Vec<Supply>) -> usize {
        (**self).reconcile(supplies)
    }
}
