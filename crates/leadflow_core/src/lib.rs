//! Core domain logic for Leadflow.
//! Routes inbound customer contacts to operators by per-source weights,
//! bounded by each operator's load capacity.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CapacityGuard, ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{Contact, ContactDetails, ContactId, ContactStatus, NewContact};
pub use model::lead::{Lead, LeadHints, LeadId, LeadUpdate, NewLead};
pub use model::operator::{NewOperator, Operator, OperatorId, OperatorUpdate, OperatorWithLoad};
pub use model::source::{
    NewSource, Source, SourceId, SourceUpdate, SourceWeight, SourceWithWeights,
};
pub use model::validation::ValidationError;
pub use repo::contact_repo::{ContactRepository, SqliteContactRepository};
pub use repo::lead_repo::{LeadRepository, SqliteLeadRepository};
pub use repo::operator_repo::{OperatorListQuery, OperatorRepository, SqliteOperatorRepository};
pub use repo::source_repo::{SourceRepository, SqliteSourceRepository};
pub use repo::{DuplicateConstraint, EntityKind, ListQuery, RepoError, RepoResult};
pub use service::contact_service::{
    ContactService, ContactServiceError, ContactServiceResult, CreateContactRequest,
};
pub use service::distribution_service::DistributionService;
pub use service::lead_service::LeadService;
pub use service::load_service::LoadService;
pub use service::operator_service::OperatorService;
pub use service::source_service::SourceService;

/// Minimal health-check API for embedding layers.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
