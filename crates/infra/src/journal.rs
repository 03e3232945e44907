//! Append-only movement journal (the local history view).

use std::sync::{Arc, RwLock};

use clinistock_core::{DomainError, DomainResult, SupplyId};
use clinistock_inventory::Movement;

pub trait MovementJournal: Send + Sync {
    /// Append a movement. An id that is already present is a conflict.
    fn append(&self, movement: Movement) -> DomainResult<()>;

    /// Up to `limit` movements for a supply, newest first.
    fn history(&self, supply_id: &SupplyId, limit: usize) -> Vec<Movement>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<J> MovementJournal for Arc<J>
where
    J: MovementJournal + ?Sized,
{
    fn append(&self, movement: Movement) -> DomainResult<()> {
        (**self).append(movement)
    }

    fn history(&self, supply_id: &SupplyId, limit: usize) -> Vec<Movement> {
        (**self).history(supply_id, limit)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMovementJournal {
    entries: RwLock<Vec<Movement>>,
}

impl InMemoryMovementJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementJournal for InMemoryMovementJournal {
    fn append(&self, movement: Movement) -> DomainResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DomainError::invariant("journal lock poisoned"))?;
        if entries.iter().any(|m| m.id() == movement.id()) {
            return Err(DomainError::conflict(format!(
                "movement {} already recorded",
                movement.id()
            )));
        }
        entries.push(movement);
        Ok(())
    }

    fn history(&self, supply_id: &SupplyId, limit: usize) -> Vec<Movement> {
        let Ok(entries) = self.entries.read() else {
            return vec![];
        };
        entries
            .iter()
            .rev()
            .filter(|m| m.supply_id() == supply_id)
            .take(limit)
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clinistock_core::MovementId;
    use clinistock_inventory::MovementRequest;

    fn receipt(supply: &str, previous: u32, quantity: i64) -> Movement {
        let request = MovementRequest::receipt(SupplyId::new(supply).unwrap(), quantity, "po");
        let change = request.plan(previous).unwrap();
        Movement::record(MovementId::new(), &request, change, Utc::now())
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let journal = InMemoryMovementJournal::new();
        journal.append(receipt("a", 0, 1)).unwrap();
        journal.append(receipt("b", 0, 5)).unwrap();
        journal.append(receipt("a", 1, 2)).unwrap();
        journal.append(receipt("a", 3, 3)).unwrap();

        let a = SupplyId::new("a").unwrap();
        let history = journal.history(&a, 2);
        let quantities: Vec<_> = history.iter().map(|m| m.new_quantity()).collect();
        assert_eq!(quantities, vec![6, 3]);
        assert_eq!(journal.history(&a, 10).len(), 3);
        assert_eq!(journal.len(), 4);
    }

    #[test]
    fn duplicate_append_is_a_conflict() {
        let journal = InMemoryMovementJournal::new();
        let movement = receipt("a", 0, 1);
        journal.append(movement.clone()).unwrap();
        assert!(matches!(journal.append(movement), Err(DomainError::Conflict(_))));
        assert_eq!(journal.len(), 1);
    }
}
