//! Lead catalog service.
//!
//! # Responsibility
//! - Provide lead CRUD entry points for embedding layers.
//!
//! # Invariants
//! - `external_id` never changes after creation; `LeadUpdate` has no field for it.

use crate::model::lead::{Lead, LeadId, LeadUpdate, NewLead};
use crate::repo::lead_repo::LeadRepository;
use crate::repo::{ListQuery, RepoResult};
use log::info;

/// Use-case wrapper for lead operations.
pub struct LeadService<R: LeadRepository> {
    repo: R,
}

impl<R: LeadRepository> LeadService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a lead; a taken `external_id` yields `RepoError::Duplicate`.
    pub fn create_lead(&self, input: &NewLead) -> RepoResult<Lead> {
        let lead = self.repo.create_lead(input)?;
        info!("event=lead_create module=lead status=ok lead_id={}", lead.id);
        Ok(lead)
    }

    pub fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>> {
        self.repo.get_lead(id)
    }

    pub fn find_lead_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>> {
        self.repo.find_lead_by_external_id(external_id)
    }

    pub fn list_leads(&self, query: &ListQuery) -> RepoResult<Vec<Lead>> {
        self.repo.list_leads(query)
    }

    /// Applies a partial update; `RepoError::NotFound` when the lead is missing.
    pub fn update_lead(&self, id: LeadId, update: &LeadUpdate) -> RepoResult<Lead> {
        self.repo.update_lead(id, update)
    }
}
