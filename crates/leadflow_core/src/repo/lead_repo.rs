//! Lead repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup-by-external-id and CRUD APIs over `leads`.
//! - Merge inbound hints into existing leads without overwriting data.
//!
//! # Invariants
//! - `external_id` is unique; violations surface as
//!   `DuplicateConstraint::LeadExternalId`.
//! - `fill_missing_lead_fields` only writes columns that are NULL or blank.

use crate::model::lead::{Lead, LeadHints, LeadId, LeadUpdate, NewLead};
use crate::model::validation::non_blank;
use crate::repo::{
    ensure_connection_ready, map_unique_violation, parse_uuid, DuplicateConstraint, EntityKind,
    ListQuery, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const LEAD_SELECT_SQL: &str = "SELECT
    uuid,
    external_id,
    phone,
    email,
    full_name,
    notes,
    created_at,
    updated_at
FROM leads";

/// Repository interface for lead operations.
pub trait LeadRepository {
    fn create_lead(&self, input: &NewLead) -> RepoResult<Lead>;
    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>>;
    fn find_lead_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>>;
    /// Lists leads in creation order.
    fn list_leads(&self, query: &ListQuery) -> RepoResult<Vec<Lead>>;
    /// Applies a partial update; `None` fields keep their stored value.
    fn update_lead(&self, id: LeadId, update: &LeadUpdate) -> RepoResult<Lead>;
    /// Writes hint values only into columns that are currently NULL or empty.
    fn fill_missing_lead_fields(&self, id: LeadId, hints: &LeadHints) -> RepoResult<Lead>;
}

/// SQLite-backed lead repository.
#[derive(Clone, Copy)]
pub struct SqliteLeadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeadRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_lead(&self, id: LeadId) -> RepoResult<Lead> {
        self.get_lead(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Lead, id))
    }
}

impl LeadRepository for SqliteLeadRepository<'_> {
    fn create_lead(&self, input: &NewLead) -> RepoResult<Lead> {
        input.validate()?;
        let id = Uuid::new_v4();

        self.conn
            .execute(
                "INSERT INTO leads (uuid, external_id, phone, email, full_name, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id.to_string(),
                    input.external_id.trim(),
                    non_blank(input.phone.as_deref()),
                    non_blank(input.email.as_deref()),
                    non_blank(input.full_name.as_deref()),
                    non_blank(input.notes.as_deref()),
                ],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::LeadExternalId))?;

        self.require_lead(id)
    }

    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{LEAD_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lead_row(row)?));
        }
        Ok(None)
    }

    fn find_lead_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{LEAD_SELECT_SQL} WHERE external_id = ?1;"))?;
        let mut rows = stmt.query([external_id.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lead_row(row)?));
        }
        Ok(None)
    }

    fn list_leads(&self, query: &ListQuery) -> RepoResult<Vec<Lead>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LEAD_SELECT_SQL}
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![query.applied_limit(), query.offset])?;
        let mut leads = Vec::new();
        while let Some(row) = rows.next()? {
            leads.push(parse_lead_row(row)?);
        }
        Ok(leads)
    }

    fn update_lead(&self, id: LeadId, update: &LeadUpdate) -> RepoResult<Lead> {
        update.validate()?;

        let changed = self.conn.execute(
            "UPDATE leads
             SET
                phone = COALESCE(?2, phone),
                email = COALESCE(?3, email),
                full_name = COALESCE(?4, full_name),
                notes = COALESCE(?5, notes),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                non_blank(update.phone.as_deref()),
                update.email.as_deref().map(str::trim),
                non_blank(update.full_name.as_deref()),
                non_blank(update.notes.as_deref()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Lead, id));
        }

        self.require_lead(id)
    }

    fn fill_missing_lead_fields(&self, id: LeadId, hints: &LeadHints) -> RepoResult<Lead> {
        let hints = hints.normalized();
        hints.validate()?;

        let changed = self.conn.execute(
            "UPDATE leads
             SET
                phone = CASE
                    WHEN COALESCE(TRIM(phone), '') = '' THEN COALESCE(?2, phone)
                    ELSE phone
                END,
                email = CASE
                    WHEN COALESCE(TRIM(email), '') = '' THEN COALESCE(?3, email)
                    ELSE email
                END,
                full_name = CASE
                    WHEN COALESCE(TRIM(full_name), '') = '' THEN COALESCE(?4, full_name)
                    ELSE full_name
                END,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                hints.phone.as_deref(),
                hints.email.as_deref(),
                hints.full_name.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Lead, id));
        }

        self.require_lead(id)
    }
}

fn parse_lead_row(row: &Row<'_>) -> RepoResult<Lead> {
    let uuid_text: String = row.get("uuid")?;
    let lead = Lead {
        id: parse_uuid(&uuid_text, "leads.uuid")?,
        external_id: row.get("external_id")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    lead.validate()?;
    Ok(lead)
}
