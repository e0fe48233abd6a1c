//! Source and weight catalog service.
//!
//! # Responsibility
//! - Provide source CRUD entry points.
//! - Manage the operator weights that drive distribution for a source.
//!
//! # Invariants
//! - A weight is only added when both its source and its operator exist.
//! - Weight changes take effect on the next selection; nothing is cached.

use crate::model::operator::OperatorId;
use crate::model::source::{
    NewSource, Source, SourceId, SourceUpdate, SourceWeight, SourceWithWeights,
};
use crate::repo::operator_repo::OperatorRepository;
use crate::repo::source_repo::SourceRepository;
use crate::repo::{EntityKind, ListQuery, RepoError, RepoResult};
use log::info;

/// Use-case wrapper for source and weight operations.
pub struct SourceService<S: SourceRepository, O: OperatorRepository> {
    sources: S,
    operators: O,
}

impl<S: SourceRepository, O: OperatorRepository> SourceService<S, O> {
    pub fn new(sources: S, operators: O) -> Self {
        Self { sources, operators }
    }

    /// Creates a source; a taken bot token yields `RepoError::Duplicate`.
    pub fn create_source(&self, input: &NewSource) -> RepoResult<Source> {
        let source = self.sources.create_source(input)?;
        info!("event=source_create module=source status=ok source_id={}", source.id);
        Ok(source)
    }

    pub fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>> {
        self.sources.get_source(id)
    }

    /// Source together with its weights in configuration order.
    pub fn get_source_with_weights(&self, id: SourceId) -> RepoResult<Option<SourceWithWeights>> {
        let Some(source) = self.sources.get_source(id)? else {
            return Ok(None);
        };
        let weights = self.sources.list_weights(id)?;
        Ok(Some(SourceWithWeights { source, weights }))
    }

    pub fn list_sources(&self, query: &ListQuery) -> RepoResult<Vec<Source>> {
        self.sources.list_sources(query)
    }

    pub fn update_source(&self, id: SourceId, update: &SourceUpdate) -> RepoResult<Source> {
        self.sources.update_source(id, update)
    }

    /// Binds an operator to a source with `weight`.
    ///
    /// # Errors
    /// - `NotFound` when the source or the operator does not exist.
    /// - `Duplicate` when the pair is already configured.
    pub fn add_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight> {
        if self.sources.get_source(source_id)?.is_none() {
            return Err(RepoError::not_found(EntityKind::Source, source_id));
        }
        if self.operators.get_operator(operator_id)?.is_none() {
            return Err(RepoError::not_found(EntityKind::Operator, operator_id));
        }

        let entry = self.sources.add_weight(source_id, operator_id, weight)?;
        info!(
            "event=weight_add module=source status=ok source_id={source_id} operator_id={operator_id} weight={weight}"
        );
        Ok(entry)
    }

    /// Changes the weight of an existing pair; `NotFound` when unconfigured.
    pub fn set_weight(
        &self,
        source_id: SourceId,
        operator_id: OperatorId,
        weight: u32,
    ) -> RepoResult<SourceWeight> {
        let entry = self.sources.set_weight(source_id, operator_id, weight)?;
        info!(
            "event=weight_set module=source status=ok source_id={source_id} operator_id={operator_id} weight={weight}"
        );
        Ok(entry)
    }

    pub fn remove_weight(&self, source_id: SourceId, operator_id: OperatorId) -> RepoResult<()> {
        self.sources.remove_weight(source_id, operator_id)?;
        info!(
            "event=weight_remove module=source status=ok source_id={source_id} operator_id={operator_id}"
        );
        Ok(())
    }

    pub fn list_weights(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>> {
        self.sources.list_weights(source_id)
    }
}
