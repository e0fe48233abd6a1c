//! Operator catalog service.
//!
//! # Responsibility
//! - Provide operator CRUD entry points.
//! - Attach the current load to operator reads.
//!
//! # Invariants
//! - Returned loads are computed at call time through `LoadService`.
//! - Deleting an operator drops its weight entries and unassigns its contacts;
//!   contacts themselves are kept.

use crate::model::operator::{NewOperator, Operator, OperatorId, OperatorUpdate, OperatorWithLoad};
use crate::repo::contact_repo::ContactRepository;
use crate::repo::operator_repo::{OperatorListQuery, OperatorRepository};
use crate::repo::{ListQuery, RepoResult};
use crate::service::load_service::LoadService;
use log::info;

/// Use-case wrapper for operator operations.
pub struct OperatorService<O: OperatorRepository, C: ContactRepository> {
    operators: O,
    contacts: C,
}

impl<O: OperatorRepository, C: ContactRepository> OperatorService<O, C> {
    pub fn new(operators: O, contacts: C) -> Self {
        Self {
            operators,
            contacts,
        }
    }

    fn load(&self) -> LoadService<'_, O, C> {
        LoadService::new(&self.operators, &self.contacts)
    }

    /// Creates an operator; a taken email yields `RepoError::Duplicate`.
    pub fn create_operator(&self, input: &NewOperator) -> RepoResult<Operator> {
        let operator = self.operators.create_operator(input)?;
        info!(
            "event=operator_create module=operator status=ok operator_id={} active={} max_load={}",
            operator.id, operator.is_active, operator.max_load
        );
        Ok(operator)
    }

    pub fn get_operator_with_load(&self, id: OperatorId) -> RepoResult<Option<OperatorWithLoad>> {
        self.load().operator_with_load(id)
    }

    /// Lists operators with their current loads, in creation order.
    pub fn list_operators(&self, query: &OperatorListQuery) -> RepoResult<Vec<OperatorWithLoad>> {
        let load = self.load();
        self.operators
            .list_operators(query)?
            .into_iter()
            .map(|operator| -> RepoResult<OperatorWithLoad> {
                let current_load = load.current_load(operator.id)?;
                Ok(OperatorWithLoad::new(operator, current_load))
            })
            .collect()
    }

    /// Active operators below capacity.
    pub fn list_available_operators(&self, query: &ListQuery) -> RepoResult<Vec<OperatorWithLoad>> {
        self.load().list_available_operators(query)
    }

    pub fn update_operator(&self, id: OperatorId, update: &OperatorUpdate) -> RepoResult<Operator> {
        let operator = self.operators.update_operator(id, update)?;
        info!(
            "event=operator_update module=operator status=ok operator_id={} active={} max_load={}",
            operator.id, operator.is_active, operator.max_load
        );
        Ok(operator)
    }

    /// Deletes an operator; `RepoError::NotFound` when missing.
    pub fn delete_operator(&self, id: OperatorId) -> RepoResult<()> {
        self.operators.delete_operator(id)?;
        info!("event=operator_delete module=operator status=ok operator_id={id}");
        Ok(())
    }
}
