use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use clinistock_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, SupplyId,
};
use clinistock_inventory::{Supply, SupplyDetails, SupplyDraft, SupplyEvent};

use super::SupplyCatalogStore;

/// In-memory catalog for tests/dev and for the client-side copy of the catalog.
#[derive(Debug, Default)]
pub struct InMemorySupplyCatalog {
    inner: RwLock<BTreeMap<SupplyId, Supply>>,
}

impl InMemorySupplyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-populated with `supplies`.
    pub fn with_supplies(supplies: impl IntoIterator<Item = Supply>) -> Self {
        let catalog = Self::new();
        catalog.reconcile(supplies.into_iter().collect());
        catalog
    }

    fn modify<T>(
        &self,
        id: &SupplyId,
        f: impl FnOnce(&mut Supply) -> DomainResult<T>,
    ) -> DomainResult<Supply> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("catalog lock poisoned"))?;
        let supply = map.get_mut(id).ok_or(DomainError::NotFound)?;

        // Work on a copy so a failed edit leaves the stored record untouched.
        let mut updated = supply.clone();
        f(&mut updated)?;
        *supply = updated.clone();
        Ok(updated)
    }
}

impl SupplyCatalogStore for InMemorySupplyCatalog {
    fn get(&self, id: &SupplyId) -> Option<Supply> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    fn list(&self) -> Vec<Supply> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn register(&self, draft: SupplyDraft, at: DateTime<Utc>) -> DomainResult<Supply> {
        let supply = Supply::register(draft, at)?;
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("catalog lock poisoned"))?;
        if map.contains_key(supply.id_typed()) {
            return Err(DomainError::conflict(format!(
                "supply {} already exists",
                supply.id_typed()
            )));
        }
        map.insert(supply.id_typed().clone(), supply.clone());
        Ok(supply)
    }

    fn update_details(
        &self,
        id: &SupplyId,
        details: SupplyDetails,
        at: DateTime<Utc>,
    ) -> DomainResult<Supply> {
        self.modify(id, |s| s.update_details(details, at))
    }

    fn deactivate(&self, id: &SupplyId, at: DateTime<Utc>) -> DomainResult<Supply> {
        self.modify(id, |s| s.deactivate(at))
    }

    fn commit(&self, expected: ExpectedVersion, event: &SupplyEvent) -> DomainResult<Supply> {
        let SupplyEvent::MovementRecorded(recorded) = event;
        self.modify(recorded.movement.supply_id(), |s| {
            expected.check(s.version())?;
            s.apply(event);
            Ok(())
        })
    }

    fn reconcile(&self, supplies: Vec<Supply>) -> usize {
        let Ok(mut map) = self.inner.write() else {
            return 0;
        };

        let mut written = 0;
        for incoming in supplies {
            let newer = map
                .get(incoming.id_typed())
                .is_none_or(|current| incoming.version() >= current.version());
            if newer {
                map.insert(incoming.id_typed().clone(), incoming);
                written += 1;
            }
        }
        written
    }
}
