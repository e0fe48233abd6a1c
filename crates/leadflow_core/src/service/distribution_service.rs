//! Weighted operator selection for inbound contacts.
//!
//! # Responsibility
//! - Turn a source's weight entries into an eligible candidate set.
//! - Pick one candidate by inverse-CDF weighted sampling.
//!
//! # Invariants
//! - Eligible means: operator exists, is active, is below capacity, has a
//!   positive weight and is not the excluded operator.
//! - Candidates are walked in weight configuration order (`SourceWeight::id`
//!   ascending), so a boundary draw always resolves to the same operator.
//! - Once the eligible set is non-empty a selection is always returned.
//! - Selection is side-effect free and takes no locks; persisting the
//!   assignment (and any capacity serialization) belongs to the caller.

use crate::model::operator::{Operator, OperatorId, OperatorWithLoad};
use crate::model::source::{SourceId, SourceWeight};
use crate::repo::contact_repo::ContactRepository;
use crate::repo::operator_repo::OperatorRepository;
use crate::repo::source_repo::SourceRepository;
use crate::repo::RepoResult;
use crate::service::load_service::LoadService;
use log::debug;
use rand::Rng;

/// Weight entry whose operator passed the eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub operator: OperatorWithLoad,
    pub weight: u32,
}

/// Distribution engine over borrowed repositories.
///
/// Construct one per decision; it holds no state between calls, so weight
/// changes and closed contacts are visible to the next selection.
pub struct DistributionService<'r, S, O, C> {
    sources: &'r S,
    load: LoadService<'r, O, C>,
}

impl<'r, S, O, C> DistributionService<'r, S, O, C>
where
    S: SourceRepository,
    O: OperatorRepository,
    C: ContactRepository,
{
    pub fn new(sources: &'r S, operators: &'r O, contacts: &'r C) -> Self {
        Self {
            sources,
            load: LoadService::new(operators, contacts),
        }
    }

    /// Load accounting view used by this engine.
    pub fn load(&self) -> &LoadService<'r, O, C> {
        &self.load
    }

    /// Returns the eligible candidates for `source_id` in walk order.
    pub fn eligible_candidates(
        &self,
        source_id: SourceId,
        exclude_operator_id: Option<OperatorId>,
    ) -> RepoResult<Vec<Candidate>> {
        let weights = self.sources.list_weights(source_id)?;
        self.filter_eligible(&weights, exclude_operator_id)
    }

    /// Picks one eligible operator for `source_id`, or `None`.
    ///
    /// `None` is a normal outcome (no weights configured, nobody eligible);
    /// only storage failures are errors.
    pub fn select_operator<G: Rng + ?Sized>(
        &self,
        source_id: SourceId,
        exclude_operator_id: Option<OperatorId>,
        rng: &mut G,
    ) -> RepoResult<Option<Operator>> {
        let weights = self.sources.list_weights(source_id)?;
        if weights.is_empty() {
            debug!(
                "event=operator_select module=distribution status=skipped source_id={source_id} reason=no_weights"
            );
            return Ok(None);
        }

        let candidates = self.filter_eligible(&weights, exclude_operator_id)?;
        let selected =
            pick_weighted(&candidates, rng).map(|candidate| candidate.operator.operator.clone());

        debug!(
            "event=operator_select module=distribution status=ok source_id={source_id} configured={} eligible={} selected={}",
            weights.len(),
            candidates.len(),
            selected
                .as_ref()
                .map_or_else(|| "none".to_string(), |operator| operator.id.to_string())
        );
        Ok(selected)
    }

    /// Same as [`Self::select_operator`], returning only the id.
    pub fn select_operator_id<G: Rng + ?Sized>(
        &self,
        source_id: SourceId,
        exclude_operator_id: Option<OperatorId>,
        rng: &mut G,
    ) -> RepoResult<Option<OperatorId>> {
        Ok(self
            .select_operator(source_id, exclude_operator_id, rng)?
            .map(|operator| operator.id))
    }

    fn filter_eligible(
        &self,
        weights: &[SourceWeight],
        exclude_operator_id: Option<OperatorId>,
    ) -> RepoResult<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(weights.len());
        for entry in weights {
            if entry.weight == 0 || Some(entry.operator_id) == exclude_operator_id {
                continue;
            }
            // Dangling bindings are skipped, not fatal.
            let Some(view) = self.load.operator_with_load(entry.operator_id)? else {
                continue;
            };
            if !view.is_available() {
                continue;
            }
            candidates.push(Candidate {
                operator: view,
                weight: entry.weight,
            });
        }
        Ok(candidates)
    }
}

/// Picks one candidate with probability `weight / total_weight`.
///
/// Draws a uniform real in `[0, total_weight]` and walks the candidates in
/// slice order. Returns `None` when the slice is empty or every weight is 0.
pub fn pick_weighted<'c, G: Rng + ?Sized>(
    candidates: &'c [Candidate],
    rng: &mut G,
) -> Option<&'c Candidate> {
    let total_weight: u64 = candidates
        .iter()
        .map(|candidate| u64::from(candidate.weight))
        .sum();
    if total_weight == 0 {
        return None;
    }

    let draw = rng.gen_range(0.0..=total_weight as f64);
    let index = walk_cumulative(candidates.iter().map(|candidate| candidate.weight), draw)?;
    candidates.get(index)
}

/// Index of the first positive-weight entry whose running sum is `>= draw`.
///
/// When rounding leaves `draw` above the final sum, the last positive-weight
/// entry is returned. Zero-weight entries are never returned.
pub fn walk_cumulative(weights: impl IntoIterator<Item = u32>, draw: f64) -> Option<usize> {
    let mut cumulative = 0.0_f64;
    let mut last_positive = None;
    for (index, weight) in weights.into_iter().enumerate() {
        if weight == 0 {
            continue;
        }
        cumulative += f64::from(weight);
        if cumulative >= draw {
            return Some(index);
        }
        last_positive = Some(index);
    }
    last_positive
}
