//! Contact creation workflow.
//!
//! # Responsibility
//! - Resolve the lead, pick an operator and persist the contact as one step.
//! - Close contacts and expose contact listings.
//!
//! # Invariants
//! - A created contact is always `New`; its operator may be `None` when
//!   nobody is eligible.
//! - Existing lead fields are never overwritten by hints.
//! - Under `CapacityGuard::Serialized` the load count, the selection and the
//!   insert happen inside one `BEGIN IMMEDIATE` transaction, so no operator
//!   ends up above `max_load`.
//! - At most one attempt per request; busy databases surface as errors.

use crate::config::CapacityGuard;
use crate::model::contact::{Contact, ContactDetails, ContactId, NewContact};
use crate::model::lead::{Lead, LeadHints, LeadId, NewLead};
use crate::model::operator::OperatorId;
use crate::model::source::SourceId;
use crate::model::validation::{non_blank, require_text, ValidationError};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::lead_repo::{LeadRepository, SqliteLeadRepository};
use crate::repo::operator_repo::{OperatorRepository, SqliteOperatorRepository};
use crate::repo::source_repo::{SourceRepository, SqliteSourceRepository};
use crate::repo::{
    ensure_connection_ready, DuplicateConstraint, EntityKind, ListQuery, RepoError, RepoResult,
};
use crate::service::distribution_service::DistributionService;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inbound contact as reported by a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContactRequest {
    /// Channel-side customer identifier used to deduplicate leads.
    pub external_id: String,
    pub source_id: SourceId,
    pub message: Option<String>,
    pub hints: LeadHints,
}

impl CreateContactRequest {
    pub fn new(external_id: impl Into<String>, source_id: SourceId) -> Self {
        Self {
            external_id: external_id.into(),
            source_id,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hints(mut self, hints: LeadHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("external_id", &self.external_id)?;
        self.hints.normalized().validate()
    }
}

/// Workflow-level error.
#[derive(Debug)]
pub enum ContactServiceError {
    SourceNotFound(SourceId),
    ContactNotFound(ContactId),
    Validation(ValidationError),
    Repo(RepoError),
}

impl ContactServiceError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "source_not_found",
            Self::ContactNotFound(_) => "contact_not_found",
            Self::Validation(_) => "validation",
            Self::Repo(err) if err.is_busy() => "db_busy",
            Self::Repo(_) => "repo",
        }
    }

    /// Returns whether the database write lock could not be taken in time.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_busy())
    }
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(id) => write!(f, "source not found: {id}"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::SourceNotFound(_) | Self::ContactNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ContactServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for ContactServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type ContactServiceResult<T> = Result<T, ContactServiceError>;

/// Runs the creation workflow against any repository implementation.
///
/// Storage scoping (transaction or autocommit) is the caller's concern.
pub fn create_contact_with<L, S, O, C, G>(
    leads: &L,
    sources: &S,
    operators: &O,
    contacts: &C,
    request: &CreateContactRequest,
    rng: &mut G,
) -> ContactServiceResult<Contact>
where
    L: LeadRepository,
    S: SourceRepository,
    O: OperatorRepository,
    C: ContactRepository,
    G: Rng + ?Sized,
{
    request.validate()?;

    let lead = resolve_lead(leads, &request.external_id, &request.hints)?;
    if sources.get_source(request.source_id)?.is_none() {
        return Err(ContactServiceError::SourceNotFound(request.source_id));
    }

    let operator_id = DistributionService::new(sources, operators, contacts).select_operator_id(
        request.source_id,
        None,
        rng,
    )?;

    let input = NewContact::new(lead.id, request.source_id, operator_id)
        .with_message(non_blank(request.message.as_deref()));
    Ok(contacts.create_contact(&input)?)
}

fn resolve_lead<L: LeadRepository>(
    leads: &L,
    external_id: &str,
    hints: &LeadHints,
) -> RepoResult<Lead> {
    if let Some(lead) = leads.find_lead_by_external_id(external_id)? {
        return merge_hints(leads, lead, hints);
    }

    match leads.create_lead(&NewLead::from_hints(external_id.trim(), hints)) {
        Ok(lead) => Ok(lead),
        // Another autocommit writer created the lead between lookup and insert.
        Err(RepoError::Duplicate(DuplicateConstraint::LeadExternalId)) => {
            let lead = leads
                .find_lead_by_external_id(external_id)?
                .ok_or_else(|| RepoError::not_found(EntityKind::Lead, external_id.trim()))?;
            merge_hints(leads, lead, hints)
        }
        Err(err) => Err(err),
    }
}

fn merge_hints<L: LeadRepository>(leads: &L, lead: Lead, hints: &LeadHints) -> RepoResult<Lead> {
    let missing = lead.missing_from(hints);
    if missing.is_empty() {
        return Ok(lead);
    }
    leads.fill_missing_lead_fields(lead.id, &missing)
}

/// SQLite-backed contact workflow bound to one connection.
///
/// Each request-handling thread owns its own service and connection.
pub struct ContactService<'conn, G: Rng = StdRng> {
    conn: &'conn mut Connection,
    guard: CapacityGuard,
    rng: G,
}

impl<'conn> ContactService<'conn, StdRng> {
    /// Creates a service seeded from OS entropy.
    pub fn try_new(conn: &'conn mut Connection, guard: CapacityGuard) -> RepoResult<Self> {
        Self::with_rng(conn, guard, StdRng::from_entropy())
    }
}

impl<'conn, G: Rng> ContactService<'conn, G> {
    /// Creates a service with a caller-provided random source.
    pub fn with_rng(conn: &'conn mut Connection, guard: CapacityGuard, rng: G) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, guard, rng })
    }

    pub fn guard(&self) -> CapacityGuard {
        self.guard
    }

    /// Creates a contact for `request` and assigns it to an eligible operator.
    ///
    /// # Errors
    /// - `Validation` for a blank external id or malformed hint email.
    /// - `SourceNotFound` when the source does not exist.
    /// - `Repo` for storage failures, including a busy write lock.
    pub fn create_contact(
        &mut self,
        request: &CreateContactRequest,
    ) -> ContactServiceResult<Contact> {
        let result = self.create_contact_scoped(request);
        match &result {
            Ok(contact) => info!(
                "event=contact_create module=contact status=ok contact_id={} lead_id={} source_id={} operator_id={} guard={}",
                contact.id,
                contact.lead_id,
                contact.source_id,
                contact
                    .operator_id
                    .map_or_else(|| "none".to_string(), |id| id.to_string()),
                self.guard
            ),
            Err(err) => warn!(
                "event=contact_create module=contact status=error source_id={} guard={} error_code={}",
                request.source_id,
                self.guard,
                err.code()
            ),
        }
        result
    }

    fn create_contact_scoped(
        &mut self,
        request: &CreateContactRequest,
    ) -> ContactServiceResult<Contact> {
        match self.guard {
            CapacityGuard::Serialized => {
                let tx = self
                    .conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)?;
                let contact = create_on_connection(&tx, request, &mut self.rng)?;
                tx.commit()?;
                Ok(contact)
            }
            CapacityGuard::BestEffort => create_on_connection(&*self.conn, request, &mut self.rng),
        }
    }

    /// Picks an operator for `source_id` without creating anything.
    pub fn select_operator_id(
        &mut self,
        source_id: SourceId,
        exclude_operator_id: Option<OperatorId>,
    ) -> RepoResult<Option<OperatorId>> {
        let conn: &Connection = &*self.conn;
        let sources = SqliteSourceRepository::from_ready(conn);
        let operators = SqliteOperatorRepository::from_ready(conn);
        let contacts = SqliteContactRepository::from_ready(conn);
        DistributionService::new(&sources, &operators, &contacts).select_operator_id(
            source_id,
            exclude_operator_id,
            &mut self.rng,
        )
    }

    /// Closes a contact, releasing one unit of its operator's load.
    ///
    /// Closing an already closed contact returns it unchanged.
    pub fn close_contact(&self, id: ContactId) -> ContactServiceResult<Contact> {
        let closed = self
            .contacts()
            .close_contact(id)?
            .ok_or(ContactServiceError::ContactNotFound(id))?;
        info!(
            "event=contact_close module=contact status=ok contact_id={} operator_id={}",
            closed.id,
            closed
                .operator_id
                .map_or_else(|| "none".to_string(), |operator_id| operator_id.to_string())
        );
        Ok(closed)
    }

    pub fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactDetails>> {
        self.contacts().get_contact_details(id)
    }

    pub fn list_contacts(&self, query: &ListQuery) -> RepoResult<Vec<ContactDetails>> {
        self.contacts().list_contacts(query)
    }

    pub fn list_contacts_by_lead(&self, lead_id: LeadId) -> RepoResult<Vec<ContactDetails>> {
        self.contacts().list_contacts_by_lead(lead_id)
    }

    pub fn list_contacts_by_operator(
        &self,
        operator_id: OperatorId,
    ) -> RepoResult<Vec<ContactDetails>> {
        self.contacts().list_contacts_by_operator(operator_id)
    }

    fn contacts(&self) -> SqliteContactRepository<'_> {
        SqliteContactRepository::from_ready(&*self.conn)
    }
}

fn create_on_connection<G: Rng + ?Sized>(
    conn: &Connection,
    request: &CreateContactRequest,
    rng: &mut G,
) -> ContactServiceResult<Contact> {
    create_contact_with(
        &SqliteLeadRepository::from_ready(conn),
        &SqliteSourceRepository::from_ready(conn),
        &SqliteOperatorRepository::from_ready(conn),
        &SqliteContactRepository::from_ready(conn),
        request,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::{ContactServiceError, CreateContactRequest};
    use crate::model::lead::LeadHints;
    use crate::model::validation::ValidationError;
    use crate::repo::{EntityKind, RepoError};
    use uuid::Uuid;

    #[test]
    fn request_rejects_blank_external_id_and_bad_hint_email() {
        let source_id = Uuid::new_v4();
        assert_eq!(
            CreateContactRequest::new("  ", source_id).validate(),
            Err(ValidationError::BlankField("external_id"))
        );

        let request = CreateContactRequest::new("tg:1", source_id).with_hints(LeadHints {
            email: Some("not-an-email".to_string()),
            ..LeadHints::default()
        });
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidEmail { field: "email", .. })
        ));

        let blank_hints = CreateContactRequest::new("tg:1", source_id).with_hints(LeadHints {
            email: Some("   ".to_string()),
            ..LeadHints::default()
        });
        assert!(blank_hints.validate().is_ok());
    }

    #[test]
    fn repo_validation_errors_surface_as_validation() {
        let err: ContactServiceError =
            RepoError::Validation(ValidationError::BlankField("name")).into();
        assert!(matches!(err, ContactServiceError::Validation(_)));

        let err: ContactServiceError = RepoError::not_found(EntityKind::Lead, "x").into();
        assert_eq!(err.code(), "repo");
        assert!(!err.is_busy());
    }
}
