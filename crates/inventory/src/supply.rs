use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clinistock_core::{Aggregate, AggregateRoot, DomainError, DomainResult, MovementId, SupplyId};
use clinistock_events::Event;

use crate::health::StockHealth;
use crate::movement::{Movement, MovementError, MovementRequest};

/// Closed set of supply categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyCategory {
    Medication,
    Disposable,
    Surgical,
    Diagnostic,
    Equipment,
    Cleaning,
    Office,
    Other,
}

impl SupplyCategory {
    pub const ALL: [SupplyCategory; 8] = [
        SupplyCategory::Medication,
        SupplyCategory::Disposable,
        SupplyCategory::Surgical,
        SupplyCategory::Diagnostic,
        SupplyCategory::Equipment,
        SupplyCategory::Cleaning,
        SupplyCategory::Office,
        SupplyCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SupplyCategory::Medication => "medication",
            SupplyCategory::Disposable => "disposable",
            SupplyCategory::Surgical => "surgical",
            SupplyCategory::Diagnostic => "diagnostic",
            SupplyCategory::Equipment => "equipment",
            SupplyCategory::Cleaning => "cleaning",
            SupplyCategory::Office => "office",
            SupplyCategory::Other => "other",
        }
    }
}

impl core::fmt::Display for SupplyCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SupplyCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SupplyCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown supply category: {s}")))
    }
}

/// Descriptive fields of a supply: everything a CRUD screen may edit.
///
/// Quantity is deliberately absent; only movements change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyDetails {
    pub name: String,
    pub description: Option<String>,
    pub category: SupplyCategory,
    pub unit: String,
    pub minimum_quantity: u32,
    pub maximum_quantity: Option<u32>,
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    pub expires_on: Option<NaiveDate>,
}

impl SupplyDetails {
    pub fn new(name: impl Into<String>, category: SupplyCategory, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category,
            unit: unit.into(),
            minimum_quantity: 0,
            maximum_quantity: None,
            unit_price: Decimal::ZERO,
            supplier: None,
            expires_on: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thresholds(mut self, minimum: u32, maximum: Option<u32>) -> Self {
        self.minimum_quantity = minimum;
        self.maximum_quantity = maximum;
        self
    }

    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    /// Local input validation for catalog edits.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit of measure cannot be empty"));
        }
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if let Some(max) = self.maximum_quantity {
            if self.minimum_quantity > max {
                return Err(DomainError::validation(format!(
                    "minimum quantity {} exceeds maximum quantity {max}",
                    self.minimum_quantity
                )));
            }
        }
        Ok(())
    }
}

/// Input for registering a new supply in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyDraft {
    pub id: SupplyId,
    pub details: SupplyDetails,
    pub opening_quantity: u32,
}

/// Aggregate root: Supply.
///
/// Also the catalog record exchanged with the remote catalog service, hence
/// the serde derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    id: SupplyId,
    #[serde(flatten)]
    details: SupplyDetails,
    quantity: u32,
    active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Supply {
    /// Create a validated supply from a draft.
    pub fn register(draft: SupplyDraft, at: DateTime<Utc>) -> DomainResult<Self> {
        draft.details.validate()?;
        Ok(Self::from_parts(draft.id, draft.details, draft.opening_quantity, at))
    }

    /// Assemble a supply without validation (snapshots from the remote catalog).
    pub fn from_parts(
        id: SupplyId,
        details: SupplyDetails,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            quantity,
            active: true,
            version: 0,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn id_typed(&self) -> &SupplyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn description(&self) -> Option<&str> {
        self.details.description.as_deref()
    }

    pub fn category(&self) -> SupplyCategory {
        self.details.category
    }

    pub fn unit(&self) -> &str {
        &self.details.unit
    }

    pub fn details(&self) -> &SupplyDetails {
        &self.details
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn minimum_quantity(&self) -> u32 {
        self.details.minimum_quantity
    }

    pub fn maximum_quantity(&self) -> Option<u32> {
        self.details.maximum_quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.details.unit_price
    }

    pub fn supplier(&self) -> Option<&str> {
        self.details.supplier.as_deref()
    }

    pub fn expires_on(&self) -> Option<NaiveDate> {
        self.details.expires_on
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn health(&self) -> StockHealth {
        StockHealth::classify(self.quantity, self.details.minimum_quantity)
    }

    /// True once the soft capacity hint is exceeded. Never enforced.
    pub fn is_over_capacity(&self) -> bool {
        self.details
            .maximum_quantity
            .is_some_and(|max| self.quantity > max)
    }

    /// Replace descriptive fields. Quantity and version are untouched.
    pub fn update_details(&mut self, details: SupplyDetails, at: DateTime<Utc>) -> DomainResult<()> {
        details.validate()?;
        self.details = details;
        self.updated_at = at;
        Ok(())
    }

    pub fn deactivate(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::conflict("supply is already inactive"));
        }
        self.active = false;
        self.updated_at = at;
        Ok(())
    }

    /// Set a confirmed quantity (the ledger's commit path).
    pub(crate) fn set_quantity(&mut self, quantity: u32, at: DateTime<Utc>) {
        self.quantity = quantity;
        self.updated_at = at;
        self.version += 1;
    }
}

impl AggregateRoot for Supply {
    type Id = SupplyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMovement {
    pub movement_id: MovementId,
    pub request: MovementRequest,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyCommand {
    RecordMovement(RecordMovement),
}

/// Event: MovementRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecorded {
    pub movement: Movement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyEvent {
    MovementRecorded(MovementRecorded),
}

impl Event for SupplyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SupplyEvent::MovementRecorded(_) => "inventory.supply.movement_recorded",
        }
    }

    fn supply_id(&self) -> &SupplyId {
        match self {
            SupplyEvent::MovementRecorded(e) => e.movement.supply_id(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SupplyEvent::MovementRecorded(e) => e.movement.created_at(),
        }
    }
}

impl Aggregate for Supply {
    type Command = SupplyCommand;
    type Event = SupplyEvent;
    type Error = MovementError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SupplyEvent::MovementRecorded(e) => {
                self.set_quantity(e.movement.new_quantity(), e.movement.created_at());
            }
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SupplyCommand::RecordMovement(cmd) => self.handle_record(cmd),
        }
    }
}

impl Supply {
    fn handle_record(&self, cmd: &RecordMovement) -> Result<Vec<SupplyEvent>, MovementError> {
        if cmd.request.supply_id != self.id {
            return Err(MovementError::SupplyNotFound(cmd.request.supply_id.clone()));
        }

        let change = cmd.request.plan(self.quantity)?;
        let movement = Movement::record(cmd.movement_id, &cmd.request, change, cmd.occurred_at);

        Ok(vec![SupplyEvent::MovementRecorded(MovementRecorded { movement })])
    }
}
