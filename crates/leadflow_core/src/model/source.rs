//! Source (inbound channel) and weight domain model.
//!
//! # Responsibility
//! - Describe the channels contacts arrive through.
//! - Bind operators to a source with an integer preference weight.
//!
//! # Invariants
//! - `bot_token` is unique across sources.
//! - At most one weight entry exists per `(source_id, operator_id)` pair.
//! - Weight entries are ordered by `id`, their configuration sequence.

use crate::model::operator::OperatorId;
use crate::model::validation::{require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable source identifier.
pub type SourceId = Uuid;

/// Weight given to a binding created without an explicit value.
pub const DEFAULT_WEIGHT: u32 = 1;

/// Inbound channel configuration, e.g. one chat bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub bot_token: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Source {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("source", self.id)?;
        require_text("name", &self.name)?;
        require_text("bot_token", &self.bot_token)
    }
}

/// Input for creating a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub bot_token: String,
    pub description: Option<String>,
}

impl NewSource {
    pub fn new(name: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bot_token: bot_token.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("bot_token", &self.bot_token)
    }
}

/// Partial source update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub bot_token: Option<String>,
    pub description: Option<String>,
}

impl SourceUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(token) = self.bot_token.as_deref() {
            require_text("bot_token", token)?;
        }
        Ok(())
    }
}

/// One `(source, operator, weight)` binding.
///
/// A weight of zero keeps the binding configured while excluding the operator
/// from selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWeight {
    /// Configuration sequence; selection walks entries in ascending `id`.
    pub id: i64,
    pub source_id: SourceId,
    pub operator_id: OperatorId,
    pub weight: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Source together with its weight entries in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWithWeights {
    #[serde(flatten)]
    pub source: Source,
    pub weights: Vec<SourceWeight>,
}
