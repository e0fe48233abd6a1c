//! Source and weight repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `sources`.
//! - Own `source_weights` bindings that drive operator selection.
//!
//! # Invariants
//! - `list_weights` returns entries in configuration order (`id ASC`); the
//!   selection walk depends on this order being stable.
//! - One weight entry per `(source, operator)` pair.

use crate::model::operator::OperatorId;
use crate::model::source::{NewSource, Source, SourceId, SourceUpdate, SourceWeight};
use crate::repo::{
    ensure_connection_ready, map_unique_violation, parse_count, parse_uuid, DuplicateConstraint,
    EntityKind, ListQuery, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const SOURCE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    bot_token,
    description,
    created_at,
    updated_at
FROM sources";

const WEIGHT_SELECT_SQL: &str = "SELECT
    id,
    source_uuid,
    operator_uuid,
    weight,
    created_at,
    updated_at
FROM source_weights";

/// Repository interface for source and weight operations.
pub trait SourceRepository {
    fn create_source(&self, input: &NewSource) -> RepoResult<Source>;
    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>>;
    fn get_source_by_bot_token(&self, bot_token: &str) -> RepoResult<Option<Source>>;
    /// Lists sources in creation order.
    fn list_sources(&self, query: &ListQuery) -> RepoResult<Vec<Source>>;
    fn update_source(&self, id: SourceId, update: &SourceUpdate) -> RepoResult<Source>;

    /// Binds `operator_id` to `source_id`.
    fn add_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight>;
    /// Changes the weight of an existing binding, keeping its position.
    fn set_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight>;
    /// Removes a binding; `NotFound` when the pair is not configured.
    fn remove_weight(&self, source_id: SourceId, operator_id: OperatorId) -> RepoResult<()>;
    /// Returns all bindings of a source in configuration order.
    fn list_weights(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>>;
}

/// SQLite-backed source repository.
#[derive(Clone, Copy)]
pub struct SqliteSourceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSourceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_source(&self, id: SourceId) -> RepoResult<Source> {
        self.get_source(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Source, id))
    }

    fn get_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
    ) -> RepoResult<Option<SourceWeight>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WEIGHT_SELECT_SQL} WHERE source_uuid = ?1 AND operator_uuid = ?2;"
        ))?;
        let mut rows = stmt.query([source_id.to_string(), operator_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_weight_row(row)?));
        }
        Ok(None)
    }

    fn require_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
    ) -> RepoResult<SourceWeight> {
        self.get_weight(source_id, operator_id)?.ok_or_else(|| {
            RepoError::not_found(
                EntityKind::SourceWeight,
                format!("{source_id}/{operator_id}"),
            )
        })
    }
}

impl SourceRepository for SqliteSourceRepository<'_> {
    fn create_source(&self, input: &NewSource) -> RepoResult<Source> {
        input.validate()?;
        let id = Uuid::new_v4();

        self.conn
            .execute(
                "INSERT INTO sources (uuid, name, bot_token, description)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    id.to_string(),
                    input.name.trim(),
                    input.bot_token.trim(),
                    input.description.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::SourceBotToken))?;

        self.require_source(id)
    }

    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SOURCE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_source_row(row)?));
        }
        Ok(None)
    }

    fn get_source_by_bot_token(&self, bot_token: &str) -> RepoResult<Option<Source>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SOURCE_SELECT_SQL} WHERE bot_token = ?1;"))?;
        let mut rows = stmt.query([bot_token.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_source_row(row)?));
        }
        Ok(None)
    }

    fn list_sources(&self, query: &ListQuery) -> RepoResult<Vec<Source>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SOURCE_SELECT_SQL}
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![query.applied_limit(), query.offset])?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next()? {
            sources.push(parse_source_row(row)?);
        }
        Ok(sources)
    }

    fn update_source(&self, id: SourceId, update: &SourceUpdate) -> RepoResult<Source> {
        update.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE sources
                 SET
                    name = COALESCE(?2, name),
                    bot_token = COALESCE(?3, bot_token),
                    description = COALESCE(?4, description),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    id.to_string(),
                    update.name.as_deref().map(str::trim),
                    update.bot_token.as_deref().map(str::trim),
                    update.description.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::SourceBotToken))?;

        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Source, id));
        }

        self.require_source(id)
    }

    fn add_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight> {
        self.conn
            .execute(
                "INSERT INTO source_weights (source_uuid, operator_uuid, weight)
                 VALUES (?1, ?2, ?3);",
                params![source_id.to_string(), operator_id.to_string(), weight],
            )
            .map_err(|err| map_unique_violation(err, DuplicateConstraint::SourceOperatorWeight))?;

        self.require_weight(source_id, operator_id)
    }

    fn set_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight> {
        let changed = self.conn.execute(
            "UPDATE source_weights
             SET
                weight = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE source_uuid = ?1
               AND operator_uuid = ?2;",
            params![source_id.to_string(), operator_id.to_string(), weight],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(
                EntityKind::SourceWeight,
                format!("{source_id}/{operator_id}"),
            ));
        }

        self.require_weight(source_id, operator_id)
    }

    fn remove_weight(&self, source_id: SourceId, operator_id: OperatorId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM source_weights
             WHERE source_uuid = ?1
               AND operator_uuid = ?2;",
            [source_id.to_string(), operator_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(
                EntityKind::SourceWeight,
                format!("{source_id}/{operator_id}"),
            ));
        }

        Ok(())
    }

    fn list_weights(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{WEIGHT_SELECT_SQL}
             WHERE source_uuid = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([source_id.to_string()])?;
        let mut weights = Vec::new();
        while let Some(row) = rows.next()? {
            weights.push(parse_weight_row(row)?);
        }
        Ok(weights)
    }
}

fn parse_source_row(row: &Row<'_>) -> RepoResult<Source> {
    let uuid_text: String = row.get("uuid")?;
    let source = Source {
        id: parse_uuid(&uuid_text, "sources.uuid")?,
        name: row.get("name")?,
        bot_token: row.get("bot_token")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    source.validate()?;
    Ok(source)
}

fn parse_weight_row(row: &Row<'_>) -> RepoResult<SourceWeight> {
    let source_text: String = row.get("source_uuid")?;
    let operator_text: String = row.get("operator_uuid")?;
    Ok(SourceWeight {
        id: row.get("id")?,
        source_id: parse_uuid(&source_text, "source_weights.source_uuid")?,
        operator_id: parse_uuid(&operator_text, "source_weights.operator_uuid")?,
        weight: parse_count(row.get("weight")?, "source_weights.weight")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
