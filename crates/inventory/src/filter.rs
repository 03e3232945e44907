//! Catalog filter criteria and their local evaluation.

use serde::{Deserialize, Serialize};

use crate::health::StockHealth;
use crate::supply::{Supply, SupplyCategory};

/// Per-query filter over the supply catalog. Every field is optional and the
/// populated ones are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub category: Option<SupplyCategory>,
    pub health: Option<StockHealth>,
}

impl FilterCriteria {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self::default().with_search(text)
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: SupplyCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_health(mut self, health: StockHealth) -> Self {
        self.health = Some(health);
        self
    }

    /// Search text, trimmed; blank text does not filter.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search_text().is_none() && self.category.is_none() && self.health.is_none()
    }

    pub fn matches(&self, supply: &Supply) -> bool {
        self.matches_search(supply)
            && self.category.is_none_or(|c| supply.category() == c)
            && self.health.is_none_or(|h| supply.health() == h)
    }

    /// Evaluate against a local snapshot, preserving its order.
    pub fn apply<'a>(&self, supplies: impl IntoIterator<Item = &'a Supply>) -> Vec<Supply> {
        supplies
            .into_iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect()
    }

    fn matches_search(&self, supply: &Supply) -> bool {
        let Some(needle) = self.search_text() else {
            return true;
        };
        let needle = needle.to_lowercase();

        supply.name().to_lowercase().contains(&needle)
            || supply
                .description()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || supply.category().as_str().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clinistock_core::SupplyId;

    use crate::supply::SupplyDetails;

    fn supply(id: &str, name: &str, category: SupplyCategory, quantity: u32, min: u32) -> Supply {
        Supply::from_parts(
            SupplyId::new(id).unwrap(),
            SupplyDetails::new(name, category, "unit").with_thresholds(min, None),
            quantity,
            Utc::now(),
        )
    }

    fn catalog() -> Vec<Supply> {
        vec![
            supply("1", "Sterile Gauze 10cm", SupplyCategory::Disposable, 40, 10),
            supply("2", "Paracetamol 500mg", SupplyCategory::Medication, 3, 10),
            supply("3", "Bandage roll", SupplyCategory::Disposable, 0, 5),
            Supply::from_parts(
                SupplyId::new("4").unwrap(),
                SupplyDetails::new("Wound kit", SupplyCategory::Surgical, "kit")
                    .with_description("includes GAUZE pads"),
                12,
                Utc::now(),
            ),
        ]
    }

    fn ids(found: &[Supply]) -> Vec<&str> {
        found.iter().map(|s| s.id_typed().as_str()).collect()
    }

    #[test]
    fn empty_criteria_returns_everything() {
        let all = catalog();
        assert!(FilterCriteria::all().is_unfiltered());
        assert_eq!(FilterCriteria::all().apply(&all).len(), all.len());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let all = catalog();
        let found = FilterCriteria::search("gauze").apply(&all);
        assert_eq!(ids(&found), vec!["1", "4"]);
    }

    #[test]
    fn search_matches_category_label() {
        let all = catalog();
        let found = FilterCriteria::search("Medic").apply(&all);
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn blank_search_does_not_filter() {
        let all = catalog();
        assert_eq!(FilterCriteria::search("   ").apply(&all).len(), 4);
    }

    #[test]
    fn predicates_are_anded() {
        let all = catalog();
        let criteria = FilterCriteria::all()
            .with_category(SupplyCategory::Disposable)
            .with_health(StockHealth::OutOfStock);
        assert_eq!(ids(&criteria.apply(&all)), vec!["3"]);

        let none = FilterCriteria::search("gauze").with_health(StockHealth::LowStock);
        assert!(none.apply(&all).is_empty());
    }

    #[test]
    fn health_filter_uses_classifier() {
        let all = catalog();
        let low = FilterCriteria::all().with_health(StockHealth::LowStock).apply(&all);
        assert_eq!(ids(&low), vec!["2"]);
    }
}
