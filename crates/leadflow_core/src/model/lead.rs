//! Lead (customer identity) domain model.
//!
//! # Responsibility
//! - Deduplicate customers by the identifier their channel reports.
//! - Carry optional contact details gathered from inbound contacts.
//!
//! # Invariants
//! - `external_id` is unique and never changes after creation.
//! - Hint merging only fills fields that are currently empty.

use crate::model::validation::{
    non_blank, optional_email, require_id, require_text, ValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable lead identifier.
pub type LeadId = Uuid;

/// Deduplicated customer identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    /// Identifier assigned by the inbound channel (chat id, phone, ...).
    pub external_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Lead {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("lead", self.id)?;
        require_text("external_id", &self.external_id)?;
        optional_email("email", self.email.as_deref())
    }

    /// Returns the hint values that would fill a currently empty field.
    ///
    /// An empty result means merging `hints` would not change this lead.
    pub fn missing_from(&self, hints: &LeadHints) -> LeadHints {
        fn take(current: &Option<String>, hint: &Option<String>) -> Option<String> {
            if non_blank(current.as_deref()).is_some() {
                None
            } else {
                non_blank(hint.as_deref())
            }
        }

        LeadHints {
            phone: take(&self.phone, &hints.phone),
            email: take(&self.email, &hints.email),
            full_name: take(&self.full_name, &hints.full_name),
        }
    }
}

/// Input for creating a lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub external_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub notes: Option<String>,
}

impl NewLead {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            ..Self::default()
        }
    }

    /// Builds a lead input from inbound hints, dropping blank values.
    pub fn from_hints(external_id: impl Into<String>, hints: &LeadHints) -> Self {
        let hints = hints.normalized();
        Self {
            external_id: external_id.into(),
            phone: hints.phone,
            email: hints.email,
            full_name: hints.full_name,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("external_id", &self.external_id)?;
        optional_email("email", self.email.as_deref())
    }
}

/// Partial lead update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadUpdate {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub notes: Option<String>,
}

impl LeadUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        optional_email("email", self.email.as_deref())
    }
}

/// Contact details supplied alongside an inbound contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadHints {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl LeadHints {
    /// Trims every value and drops the blank ones.
    pub fn normalized(&self) -> Self {
        Self {
            phone: non_blank(self.phone.as_deref()),
            email: non_blank(self.email.as_deref()),
            full_name: non_blank(self.full_name.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.email.is_none() && self.full_name.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        optional_email("email", self.email.as_deref())
    }
}
