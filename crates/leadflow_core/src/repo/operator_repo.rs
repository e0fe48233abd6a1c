//! Operator repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `operators` storage.
//! - Keep operator snapshots free of load; load lives in `contact_repo`.
//!
//! # Invariants
//! - Emails are unique; violations surface as `DuplicateConstraint::OperatorEmail`.
//! - Deleting an operator drops its weight entries and unassigns its contacts.

use crate::model::operator::{NewOperator, Operator, OperatorId, OperatorUpdate};
use crate::repo::{
    bool_to_int, ensure_connection_ready, map_unique_violation, normalize_list_limit, parse_bool,
    parse_count, parse_uuid, DuplicateConstraint, EntityKind, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const OPERATOR_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    email,
    is_active,
    max_load,
    created_at,
    updated_at
FROM operators";

/// Query options for listing operators.
#[derive(Debug, Clone, Default)]
pub struct OperatorListQuery {
    pub active_only: bool,
    /// `None` returns every matching row.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for operator operations.
pub trait OperatorRepository {
    fn create_operator(&self, input: &NewOperator) -> RepoResult<Operator>;
    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>>;
    fn get_operator_by_email(&self, email: &str) -> RepoResult<Option<Operator>>;
    /// Lists operators in creation order.
    fn list_operators(&self, query: &OperatorListQuery) -> RepoResult<Vec<Operator>>;
    fn update_operator(&self, id: OperatorId, update: &OperatorUpdate) -> RepoResult<Operator>;
    fn delete_operator(&self, id: OperatorId) -> RepoResult<()>;
}

/// SQLite-backed operator repository.
#[derive(Clone, Copy)]
pub struct SqliteOperatorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOperatorRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_operator(&self, id: OperatorId) -> RepoResult<Operator> {
        self.get_operator(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Operator, id))
    }
}

impl OperatorRepository for SqliteOperatorRepository<'_> {
    fn create_operator(&self, input: &NewOperator) -> RepoResult<Operator> {
        input.validate()?;
        let id = Uuid::new_v4();

        self.conn
            .execute(
                "INSERT INTO operators (uuid, name, email, is_active, max_load)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    input.name.trim(),
                    input.email.trim(),
                    bool_to_int(input.is_active),
                    input.max_load,
                ],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::OperatorEmail))?;

        self.require_operator(id)
    }

    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{OPERATOR_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_operator_row(row)?));
        }
        Ok(None)
    }

    fn get_operator_by_email(&self, email: &str) -> RepoResult<Option<Operator>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OPERATOR_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_operator_row(row)?));
        }
        Ok(None)
    }

    fn list_operators(&self, query: &OperatorListQuery) -> RepoResult<Vec<Operator>> {
        let mut sql = format!("{OPERATOR_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.active_only {
            sql.push_str(" AND is_active = 1");
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        if query.limit.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));
            bind_values.push(Value::Integer(i64::from(query.offset)));
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut operators = Vec::new();
        while let Some(row) = rows.next()? {
            operators.push(parse_operator_row(row)?);
        }
        Ok(operators)
    }

    fn update_operator(&self, id: OperatorId, update: &OperatorUpdate) -> RepoResult<Operator> {
        update.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE operators
                 SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    is_active = COALESCE(?4, is_active),
                    max_load = COALESCE(?5, max_load),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    id.to_string(),
                    update.name.as_deref().map(str::trim),
                    update.email.as_deref().map(str::trim),
                    update.is_active.map(bool_to_int),
                    update.max_load,
                ],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::OperatorEmail))?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Operator, id));
        }

        self.require_operator(id)
    }

    fn delete_operator(&self, id: OperatorId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM operators WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Operator, id));
        }
        Ok(())
    }
}

fn parse_operator_row(row: &Row<'_>) -> RepoResult<Operator> {
    let uuid_text: String = row.get("uuid")?;
    let operator = Operator {
        id: parse_uuid(&uuid_text, "operators.uuid")?,
        name: row.get("name")?,
        email: row.get("email")?,
        is_active: parse_bool(row.get("is_active")?, "operators.is_active")?,
        max_load: parse_count(row.get("max_load")?, "operators.max_load")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    operator.validate()?;
    Ok(operator)
}
