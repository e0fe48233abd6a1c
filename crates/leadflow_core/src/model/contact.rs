//! Contact (inbound interaction) domain model.
//!
//! # Responsibility
//! - Record one inbound interaction and the operator it was routed to.
//! - Define the contact lifecycle that drives operator load.
//!
//! # Invariants
//! - A contact counts toward its operator's load iff `status == New`.
//! - `New -> Closed` is the only transition and it is terminal.
//! - `closed_at` is set exactly when `status == Closed`.

use crate::model::lead::LeadId;
use crate::model::operator::OperatorId;
use crate::model::source::SourceId;
use crate::model::validation::{require_id, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable contact identifier.
pub type ContactId = Uuid;

/// Contact lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Open interaction; counts toward operator load.
    New,
    /// Finished interaction; terminal.
    Closed,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Persisted contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub lead_id: LeadId,
    pub source_id: SourceId,
    /// `None` when no operator was eligible at creation time.
    pub operator_id: Option<OperatorId>,
    pub message: Option<String>,
    pub status: ContactStatus,
    pub closed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("contact", self.id)?;
        require_id("lead", self.lead_id)?;
        require_id("source", self.source_id)?;
        if (self.status == ContactStatus::Closed) != self.closed_at.is_some() {
            return Err(ValidationError::InconsistentClosure);
        }
        Ok(())
    }

    /// Returns whether this contact still occupies operator capacity.
    pub fn is_active(&self) -> bool {
        self.status == ContactStatus::New
    }
}

/// Input for creating a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub lead_id: LeadId,
    pub source_id: SourceId,
    pub operator_id: Option<OperatorId>,
    pub message: Option<String>,
    pub status: ContactStatus,
}

impl NewContact {
    /// Creates an active contact input.
    pub fn new(lead_id: LeadId, source_id: SourceId, operator_id: Option<OperatorId>) -> Self {
        Self {
            lead_id,
            source_id,
            operator_id,
            message: None,
            status: ContactStatus::New,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("lead", self.lead_id)?;
        require_id("source", self.source_id)
    }
}

/// Contact enriched with display fields of the records it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(flatten)]
    pub contact: Contact,
    pub lead_external_id: String,
    pub lead_phone: Option<String>,
    pub lead_email: Option<String>,
    pub operator_name: Option<String>,
    pub source_name: String,
}
