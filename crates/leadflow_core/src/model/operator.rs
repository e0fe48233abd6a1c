//! Operator domain model.
//!
//! # Responsibility
//! - Describe the human operators contacts are routed to.
//! - Combine an operator snapshot with its computed load for capacity checks.
//!
//! # Invariants
//! - `email` is unique across operators (enforced by storage).
//! - `Operator` never carries load; `OperatorWithLoad` is built at the point a
//!   decision needs both.

use crate::model::validation::{require_email, require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable operator identifier.
pub type OperatorId = Uuid;

/// Capacity given to operators created without an explicit limit.
pub const DEFAULT_MAX_LOAD: u32 = 10;

/// Immutable operator snapshot as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub email: String,
    /// Inactive operators are never selected, whatever their weight.
    pub is_active: bool,
    /// Maximum number of simultaneously active contacts.
    pub max_load: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Operator {
    /// Validates persisted operator invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("operator", self.id)?;
        require_text("name", &self.name)?;
        require_email("email", &self.email)
    }

    /// Returns whether `current_load` leaves room for one more contact.
    pub fn has_capacity(&self, current_load: u32) -> bool {
        current_load < self.max_load
    }
}

/// Input for creating an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub max_load: u32,
}

impl NewOperator {
    /// Creates an active operator input with the default capacity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            is_active: true,
            max_load: DEFAULT_MAX_LOAD,
        }
    }

    /// Overrides the capacity.
    pub fn with_max_load(mut self, max_load: u32) -> Self {
        self.max_load = max_load;
        self
    }

    /// Overrides the activity flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email("email", &self.email)
    }
}

/// Partial operator update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub max_load: Option<u32>,
}

impl OperatorUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(email) = self.email.as_deref() {
            require_email("email", email)?;
        }
        Ok(())
    }
}

/// Read-only view of an operator together with its current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorWithLoad {
    #[serde(flatten)]
    pub operator: Operator,
    /// Active contacts assigned to the operator when the view was built.
    pub current_load: u32,
}

impl OperatorWithLoad {
    pub fn new(operator: Operator, current_load: u32) -> Self {
        Self {
            operator,
            current_load,
        }
    }

    /// `current_load < max_load`.
    pub fn has_capacity(&self) -> bool {
        self.operator.has_capacity(self.current_load)
    }

    /// Active and under capacity.
    pub fn is_available(&self) -> bool {
        self.operator.is_active && self.has_capacity()
    }
}
