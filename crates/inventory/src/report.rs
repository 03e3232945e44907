//! Stock health summary over a set of supplies.

use serde::{Deserialize, Serialize};

use clinistock_core::SupplyId;

use crate::health::StockHealth;
use crate::supply::Supply;

/// One supply that needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub supply_id: SupplyId,
    pub name: String,
    pub health: StockHealth,
    pub quantity: u32,
    pub minimum_quantity: u32,
}

/// Counts per health state plus the alerting supplies, out-of-stock first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    pub total: usize,
    pub normal: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub alerts: Vec<StockAlert>,
}

impl StockReport {
    /// Summarize active supplies; inactive ones are skipped.
    pub fn from_supplies<'a>(supplies: impl IntoIterator<Item = &'a Supply>) -> Self {
        let mut report = StockReport::default();

        for supply in supplies.into_iter().filter(|s| s.is_active()) {
            report.total += 1;
            let health = supply.health();
            match health {
                StockHealth::Normal => report.normal += 1,
                StockHealth::LowStock => report.low_stock += 1,
                StockHealth::OutOfStock => report.out_of_stock += 1,
            }
            if health.is_alert() {
                report.alerts.push(StockAlert {
                    supply_id: supply.id_typed().clone(),
                    name: supply.name().to_string(),
                    health,
                    quantity: supply.quantity(),
                    minimum_quantity: supply.minimum_quantity(),
                });
            }
        }

        report
            .alerts
            .sort_by_key(|a| (a.health != StockHealth::OutOfStock, a.quantity));
        report
    }
}
