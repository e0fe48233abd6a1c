//! Operator load accounting.
//!
//! # Responsibility
//! - Derive an operator's current load from its active contacts.
//! - Answer capacity questions for selection and availability listings.
//!
//! # Invariants
//! - Load is recomputed on every call from the contact set visible to the
//!   borrowed repositories; it is never cached or stored on `Operator`.
//! - Read-only: no method writes to storage.

use crate::model::operator::{Operator, OperatorId, OperatorWithLoad};
use crate::repo::contact_repo::ContactRepository;
use crate::repo::operator_repo::{OperatorListQuery, OperatorRepository};
use crate::repo::{ListQuery, RepoResult};

/// Read-side load aggregation over borrowed repositories.
pub struct LoadService<'r, O, C> {
    operators: &'r O,
    contacts: &'r C,
}

impl<'r, O: OperatorRepository, C: ContactRepository> LoadService<'r, O, C> {
    pub fn new(operators: &'r O, contacts: &'r C) -> Self {
        Self {
            operators,
            contacts,
        }
    }

    /// Count of active contacts currently assigned to `operator_id`.
    ///
    /// Unknown operators have no contacts and therefore report zero.
    pub fn current_load(&self, operator_id: OperatorId) -> RepoResult<u32> {
        self.contacts.count_active_contacts(operator_id)
    }

    /// `current_load(operator.id) < operator.max_load`.
    pub fn has_capacity(&self, operator: &Operator) -> RepoResult<bool> {
        Ok(operator.has_capacity(self.current_load(operator.id)?))
    }

    /// Resolves an operator together with its current load.
    ///
    /// Returns `None` for unknown operators; callers treat that as "no
    /// candidate" rather than as an error.
    pub fn operator_with_load(
        &self,
        operator_id: OperatorId,
    ) -> RepoResult<Option<OperatorWithLoad>> {
        let Some(operator) = self.operators.get_operator(operator_id)? else {
            return Ok(None);
        };
        let current_load = self.current_load(operator.id)?;
        Ok(Some(OperatorWithLoad::new(operator, current_load)))
    }

    /// Lists active operators that are below capacity, in creation order.
    ///
    /// Pagination applies after the capacity filter.
    pub fn list_available_operators(
        &self,
        query: &ListQuery,
    ) -> RepoResult<Vec<OperatorWithLoad>> {
        let active = self.operators.list_operators(&OperatorListQuery {
            active_only: true,
            limit: None,
            offset: 0,
        })?;

        let mut available = Vec::new();
        for operator in active {
            let current_load = self.current_load(operator.id)?;
            let view = OperatorWithLoad::new(operator, current_load);
            if view.is_available() {
                available.push(view);
            }
        }

        Ok(available
            .into_iter()
            .skip(query.offset as usize)
            .take(query.applied_limit() as usize)
            .collect())
    }
}
