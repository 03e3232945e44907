//! Cached catalog snapshot used by fallback reads.
//!
//! Read-only: movements never write here. The snapshot is replaced wholesale
//! by each successful remote query.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use clinistock_inventory::{FilterCriteria, Supply};

/// Point-in-time copy of a remote catalog result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub supplies: Vec<Supply>,
    pub cached_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn len(&self) -> usize {
        self.supplies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supplies.is_empty()
    }

    pub fn evaluate(&self, criteria: &FilterCriteria) -> Vec<Supply> {
        criteria.apply(&self.supplies)
    }
}

#[derive(Debug, Default)]
pub struct SnapshotCache {
    inner: RwLock<Option<CatalogSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, supplies: Vec<Supply>, at: DateTime<Utc>) {
        debug!(count = supplies.len(), "replacing catalog snapshot");
        let snapshot = CatalogSnapshot {
            supplies,
            cached_at: at,
        };
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    pub fn current(&self) -> Option<CatalogSnapshot> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    /// True when a snapshot with at least one supply is cached.
    pub fn has_data(&self) -> bool {
        self.inner
            .read()
            .is_ok_and(|guard| guard.as_ref().is_some_and(|s| !s.is_empty()))
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.cached_at))
    }

    /// Evaluate `criteria` locally; `None` when nothing usable is cached.
    pub fn evaluate(&self, criteria: &FilterCriteria) -> Option<Vec<Supply>> {
        let guard = self.inner.read().ok()?;
        guard
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| s.evaluate(criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinistock_core::SupplyId;
    use clinistock_inventory::{SupplyCategory, SupplyDetails};

    fn supply(id: &str, name: &str) -> Supply {
        Supply::from_parts(
            SupplyId::new(id).unwrap(),
            SupplyDetails::new(name, SupplyCategory::Disposable, "unit"),
            5,
            Utc::now(),
        )
    }

    #[test]
    fn empty_cache_has_no_data() {
        let cache = SnapshotCache::new();
        assert!(!cache.has_data());
        assert!(cache.evaluate(&FilterCriteria::all()).is_none());

        cache.replace(Vec::new(), Utc::now());
        assert!(!cache.has_data());
        assert!(cache.evaluate(&FilterCriteria::all()).is_none());
    }

    #[test]
    fn replace_swaps_the_whole_snapshot() {
        let cache = SnapshotCache::new();
        cache.replace(vec![supply("a", "Gauze"), supply("b", "Tape")], Utc::now());
        cache.replace(vec![supply("c", "Gloves")], Utc::now());

        let current = cache.current().unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current.supplies[0].name(), "Gloves");
    }

    #[test]
    fn evaluate_filters_cached_supplies() {
        let cache = SnapshotCache::new();
        cache.replace(
            vec![supply("a", "Sterile Gauze"), supply("b", "Tape")],
            Utc::now(),
        );

        let hits = cache.evaluate(&FilterCriteria::search("GAUZE")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id_typed().as_str(), "a");
    }
}
