//! Stock health classification.

use serde::{Deserialize, Serialize};

/// Derived classification of a supply's stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockHealth {
    OutOfStock,
    LowStock,
    Normal,
}

impl StockHealth {
    /// Classify a quantity against its alert threshold.
    ///
    /// First match wins: empty stock is out of stock, anything at or below the
    /// threshold is low, everything else is normal.
    pub fn classify(quantity: u32, minimum_quantity: u32) -> Self {
        if quantity == 0 {
            StockHealth::OutOfStock
        } else if quantity <= minimum_quantity {
            StockHealth::LowStock
        } else {
            StockHealth::Normal
        }
    }

    /// True for the states that warrant a user-facing advisory.
    pub fn is_alert(self) -> bool {
        !matches!(self, StockHealth::Normal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockHealth::OutOfStock => "out_of_stock",
            StockHealth::LowStock => "low_stock",
            StockHealth::Normal => "normal",
        }
    }
}

impl core::fmt::Display for StockHealth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for StockHealth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out_of_stock" => Ok(StockHealth::OutOfStock),
            "low_stock" => Ok(StockHealth::LowStock),
            "normal" => Ok(StockHealth::Normal),
            other => Err(format!("unknown stock health: {other}")),
        }
    }
}

/// Free-function form of [`StockHealth::classify`].
pub fn classify(quantity: u32, minimum_quantity: u32) -> StockHealth {
    StockHealth::classify(quantity, minimum_quantity)
}
