//! Stock movements: typed requests, the arithmetic that applies them, and the
//! write-once audit record they produce.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinistock_core::{MovementId, SupplyId, UserId};

/// Kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received; adds `quantity`.
    Receipt,
    /// Stock used; subtracts `quantity`.
    Consumption,
    /// Correction; `quantity` is the new absolute total.
    Adjustment,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Receipt => "receipt",
            MovementKind::Consumption => "consumption",
            MovementKind::Adjustment => "adjustment",
        }
    }

    fn quantity_rule(self) -> &'static str {
        match self {
            MovementKind::Receipt | MovementKind::Consumption => "must be positive",
            MovementKind::Adjustment => "must not be negative",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse taxonomy of movement rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input shape; never reaches a remote collaborator.
    Validation,
    /// Input is well-formed but the current stock forbids it.
    BusinessRule,
    /// The referenced supply does not exist.
    NotFound,
}

/// Why a movement was rejected. Every variant names the concrete reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    #[error("invalid quantity {quantity} for {kind}: {}", .kind.quantity_rule())]
    InvalidQuantity { kind: MovementKind, quantity: i64 },

    #[error("quantity overflow: {available} + {requested} exceeds the maximum stock level")]
    QuantityOverflow { requested: u64, available: u32 },

    #[error("a reason is required for every movement")]
    MissingReason,

    #[error("invalid unit cost {0}: must not be negative")]
    InvalidUnitCost(Decimal),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u32 },

    #[error("supply not found: {0}")]
    SupplyNotFound(SupplyId),
}

impl MovementError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MovementError::InvalidQuantity { .. }
            | MovementError::QuantityOverflow { .. }
            | MovementError::MissingReason
            | MovementError::InvalidUnitCost(_) => ErrorCategory::Validation,
            MovementError::InsufficientStock { .. } => ErrorCategory::BusinessRule,
            MovementError::SupplyNotFound(_) => ErrorCategory::NotFound,
        }
    }
}

/// A movement as submitted by a caller, before it is accepted.
///
/// `quantity` is signed so malformed input is representable and can be
/// rejected with a precise error instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub supply_id: SupplyId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: String,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub actor: Option<UserId>,
}

impl MovementRequest {
    pub fn new(
        supply_id: SupplyId,
        kind: MovementKind,
        quantity: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            supply_id,
            kind,
            quantity,
            reason: reason.into(),
            unit_cost: None,
            reference: None,
            actor: None,
        }
    }

    pub fn receipt(supply_id: SupplyId, quantity: i64, reason: impl Into<String>) -> Self {
        Self::new(supply_id, MovementKind::Receipt, quantity, reason)
    }

    pub fn consumption(supply_id: SupplyId, quantity: i64, reason: impl Into<String>) -> Self {
        Self::new(supply_id, MovementKind::Consumption, quantity, reason)
    }

    pub fn adjustment(supply_id: SupplyId, new_total: i64, reason: impl Into<String>) -> Self {
        Self::new(supply_id, MovementKind::Adjustment, new_total, reason)
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Shape checks that do not depend on the current stock.
    pub fn validate(&self) -> Result<(), MovementError> {
        let valid_quantity = match self.kind {
            MovementKind::Receipt | MovementKind::Consumption => self.quantity > 0,
            MovementKind::Adjustment => self.quantity >= 0,
        };
        if !valid_quantity {
            return Err(MovementError::InvalidQuantity {
                kind: self.kind,
                quantity: self.quantity,
            });
        }

        if self.reason.trim().is_empty() {
            return Err(MovementError::MissingReason);
        }

        if let Some(cost) = self.unit_cost {
            if cost.is_sign_negative() && !cost.is_zero() {
                return Err(MovementError::InvalidUnitCost(cost));
            }
        }

        Ok(())
    }

    /// Compute the before/after snapshot of applying this request to `available`.
    ///
    /// Runs [`validate`](Self::validate) first; nothing is clamped.
    pub fn plan(&self, available: u32) -> Result<StockChange, MovementError> {
        self.validate()?;

        // validate() guarantees quantity >= 0 for every kind.
        let magnitude = self.quantity as u64;

        let new_quantity = match self.kind {
            MovementKind::Receipt => u32::try_from(magnitude)
                .ok()
                .and_then(|q| available.checked_add(q))
                .ok_or(MovementError::QuantityOverflow {
                    requested: magnitude,
                    available,
                })?,
            MovementKind::Consumption => {
                if magnitude > u64::from(available) {
                    return Err(MovementError::InsufficientStock {
                        requested: magnitude,
                        available,
                    });
                }
                available - magnitude as u32
            }
            MovementKind::Adjustment => {
                u32::try_from(magnitude).map_err(|_| MovementError::QuantityOverflow {
                    requested: magnitude,
                    available,
                })?
            }
        };

        Ok(StockChange {
            previous_quantity: available,
            new_quantity,
        })
    }
}

/// Before/after quantities of one accepted movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub previous_quantity: u32,
    pub new_quantity: u32,
}

/// Immutable ledger entry.
///
/// Created once when a movement is accepted; there are no mutators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    id: MovementId,
    supply_id: SupplyId,
    kind: MovementKind,
    quantity: u32,
    previous_quantity: u32,
    new_quantity: u32,
    unit_cost: Option<Decimal>,
    reason: String,
    reference: Option<String>,
    actor: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl Movement {
    /// Build the audit record for an accepted request.
    ///
    /// The request must already have passed [`MovementRequest::plan`].
    pub fn record(
        id: MovementId,
        request: &MovementRequest,
        change: StockChange,
        created_at: DateTime<Utc>,
    ) -> Self {
        let quantity = match request.kind {
            MovementKind::Adjustment => change.new_quantity,
            MovementKind::Receipt | MovementKind::Consumption => {
                change.new_quantity.abs_diff(change.previous_quantity)
            }
        };

        Self {
            id,
            supply_id: request.supply_id.clone(),
            kind: request.kind,
            quantity,
            previous_quantity: change.previous_quantity,
            new_quantity: change.new_quantity,
            unit_cost: request.unit_cost,
            reason: request.reason.trim().to_string(),
            reference: request.reference.clone(),
            actor: request.actor,
            created_at,
        }
    }

    pub fn id(&self) -> MovementId {
        self.id
    }

    pub fn supply_id(&self) -> &SupplyId {
        &self.supply_id
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn previous_quantity(&self) -> u32 {
        self.previous_quantity
    }

    pub fn new_quantity(&self) -> u32 {
        self.new_quantity
    }

    pub fn change(&self) -> StockChange {
        StockChange {
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
        }
    }

    pub fn unit_cost(&self) -> Option<Decimal> {
        self.unit_cost
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display-only total: `unit_cost × quantity`, for receipts that carry a cost.
    pub fn total_cost(&self) -> Option<Decimal> {
        match (self.kind, self.unit_cost) {
            (MovementKind::Receipt, Some(cost)) => Some(cost * Decimal::from(self.quantity)),
            _ => None,
        }
    }
}
