//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist contacts and their single `new -> closed` transition.
//! - Answer the active-contact count that operator load is derived from.
//! - Provide detail listings joined with lead/operator/source display fields.
//!
//! # Invariants
//! - `count_active_contacts` counts `status = 'new'` rows only and reads
//!   whatever is committed (or written in the caller's transaction) at call
//!   time; nothing is cached.
//! - `close_contact` never reopens a contact and keeps the first `closed_at`.

use crate::model::contact::{Contact, ContactDetails, ContactId, ContactStatus, NewContact};
use crate::model::lead::LeadId;
use crate::model::operator::OperatorId;
use crate::repo::{
    ensure_connection_ready, parse_count, parse_optional_uuid, parse_uuid, EntityKind, ListQuery,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    uuid,
    lead_uuid,
    source_uuid,
    operator_uuid,
    message,
    status,
    closed_at,
    created_at,
    updated_at
FROM contacts";

const CONTACT_DETAILS_SELECT_SQL: &str = "SELECT
    c.uuid AS uuid,
    c.lead_uuid AS lead_uuid,
    c.source_uuid AS source_uuid,
    c.operator_uuid AS operator_uuid,
    c.message AS message,
    c.status AS status,
    c.closed_at AS closed_at,
    c.created_at AS created_at,
    c.updated_at AS updated_at,
    l.external_id AS lead_external_id,
    l.phone AS lead_phone,
    l.email AS lead_email,
    o.name AS operator_name,
    s.name AS source_name
FROM contacts c
INNER JOIN leads l ON l.uuid = c.lead_uuid
INNER JOIN sources s ON s.uuid = c.source_uuid
LEFT JOIN operators o ON o.uuid = c.operator_uuid";

/// Repository interface for contact operations.
pub trait ContactRepository {
    fn create_contact(&self, input: &NewContact) -> RepoResult<Contact>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn get_contact_details(&self, id: ContactId) -> RepoResult<Option<ContactDetails>>;
    /// Lists contacts in creation order.
    fn list_contacts(&self, query: &ListQuery) -> RepoResult<Vec<ContactDetails>>;
    fn list_contacts_by_lead(&self, lead_id: LeadId) -> RepoResult<Vec<ContactDetails>>;
    fn list_contacts_by_operator(&self, operator_id: OperatorId)
        -> RepoResult<Vec<ContactDetails>>;
    /// Number of active contacts assigned to `operator_id`.
    fn count_active_contacts(&self, operator_id: OperatorId) -> RepoResult<u32>;
    /// Moves a contact to `closed`; returns `None` when it does not exist.
    ///
    /// Closing an already closed contact returns it unchanged.
    fn close_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
}

/// SQLite-backed contact repository.
#[derive(Clone, Copy)]
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_details(
        &self,
        filter: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<ContactDetails>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_DETAILS_SELECT_SQL} {filter}"))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_details_row(row)?);
        }
        Ok(contacts)
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_contact(&self, input: &NewContact) -> RepoResult<Contact> {
        input.validate()?;
        let id = Uuid::new_v4();

        self.conn.execute(
            "INSERT INTO contacts (
                uuid,
                lead_uuid,
                source_uuid,
                operator_uuid,
                message,
                status,
                closed_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                CASE WHEN ?6 = 'closed' THEN (strftime('%s', 'now') * 1000) ELSE NULL END
            );",
            params![
                id.to_string(),
                input.lead_id.to_string(),
                input.source_id.to_string(),
                input.operator_id.map(|operator_id| operator_id.to_string()),
                input.message.as_deref(),
                input.status.as_str(),
            ],
        )?;

        self.get_contact(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Contact, id))
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CONTACT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }
        Ok(None)
    }

    fn get_contact_details(&self, id: ContactId) -> RepoResult<Option<ContactDetails>> {
        let mut items = self.query_details(
            "WHERE c.uuid = ?1;",
            vec![Value::Text(id.to_string())],
        )?;
        Ok(items.pop())
    }

    fn list_contacts(&self, query: &ListQuery) -> RepoResult<Vec<ContactDetails>> {
        self.query_details(
            "ORDER BY c.created_at ASC, c.rowid ASC LIMIT ?1 OFFSET ?2;",
            vec![
                Value::Integer(i64::from(query.applied_limit())),
                Value::Integer(i64::from(query.offset)),
            ],
        )
    }

    fn list_contacts_by_lead(&self, lead_id: LeadId) -> RepoResult<Vec<ContactDetails>> {
        self.query_details(
            "WHERE c.lead_uuid = ?1 ORDER BY c.created_at ASC, c.rowid ASC;",
            vec![Value::Text(lead_id.to_string())],
        )
    }

    fn list_contacts_by_operator(
        &self,
        operator_id: OperatorId,
    ) -> RepoResult<Vec<ContactDetails>> {
        self.query_details(
            "WHERE c.operator_uuid = ?1 ORDER BY c.created_at ASC, c.rowid ASC;",
            vec![Value::Text(operator_id.to_string())],
        )
    }

    fn count_active_contacts(&self, operator_id: OperatorId) -> RepoResult<u32> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT COUNT(*)
             FROM contacts
             WHERE operator_uuid = ?1
               AND status = 'new';",
        )?;
        let count: i64 = stmt.query_row([operator_id.to_string()], |row| row.get(0))?;
        parse_count(count, "COUNT(contacts)")
    }

    fn close_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.conn.execute(
            "UPDATE contacts
             SET
                status = 'closed',
                closed_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND status <> 'closed';",
            [id.to_string()],
        )?;

        self.get_contact(id)
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let uuid_text: String = row.get("uuid")?;
    let lead_text: String = row.get("lead_uuid")?;
    let source_text: String = row.get("source_uuid")?;
    let status_text: String = row.get("status")?;
    let status = ContactStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid contact status `{status_text}` in contacts.status"
        ))
    })?;

    let contact = Contact {
        id: parse_uuid(&uuid_text, "contacts.uuid")?,
        lead_id: parse_uuid(&lead_text, "contacts.lead_uuid")?,
        source_id: parse_uuid(&source_text, "contacts.source_uuid")?,
        operator_id: parse_optional_uuid(row.get("operator_uuid")?, "contacts.operator_uuid")?,
        message: row.get("message")?,
        status,
        closed_at: row.get("closed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    contact.validate()?;
    Ok(contact)
}

fn parse_details_row(row: &Row<'_>) -> RepoResult<ContactDetails> {
    Ok(ContactDetails {
        contact: parse_contact_row(row)?,
        lead_external_id: row.get("lead_external_id")?,
        lead_phone: row.get("lead_phone")?,
        lead_email: row.get("lead_email")?,
        operator_name: row.get("operator_name")?,
        source_name: row.get("source_name")?,
    })
}
