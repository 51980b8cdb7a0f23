use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::RoleAuthority;
use super::capacity::{AdmissionCheck, CapacityLedger, LedgerError};
use super::domain::{JobRequest, JobRequestDraft};
use super::repository::RecruitmentStore;

/// Result of gating a job request against the capacity ledger.
///
/// `headcount_approved` is only ever `true` when the ledger itself had room; an override
/// admits the request but leaves the flag `false` so over-capacity postings stay auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub accepted: bool,
    pub headcount_approved: bool,
    pub rejection: Option<AdmissionRejection>,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<AdmissionCheck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionRejection {
    CapacityExceeded,
}

impl AdmissionDecision {
    fn overridden() -> Self {
        Self {
            accepted: true,
            headcount_approved: false,
            rejection: None,
            detail: "accepted over capacity by explicit override".to_string(),
            check: None,
        }
    }

    fn from_check(check: AdmissionCheck) -> Self {
        if check.approved {
            Self {
                accepted: true,
                headcount_approved: true,
                rejection: None,
                detail: check.message.clone(),
                check: Some(check),
            }
        } else {
            Self {
                accepted: false,
                headcount_approved: false,
                rejection: Some(AdmissionRejection::CapacityExceeded),
                detail: format!("{}; resubmit with an override to proceed", check.message),
                check: Some(check),
            }
        }
    }

    /// Decision for an edit that left every admission field untouched.
    fn unchanged(stored: &JobRequest) -> Self {
        Self {
            accepted: true,
            headcount_approved: stored.headcount_approved,
            rejection: None,
            detail: "admission fields unchanged; previous decision kept".to_string(),
            check: None,
        }
    }
}

/// Gate for opening and editing job requests. Never overrides on its own: a rejected
/// request is only admitted when the caller asks again with `override_capacity`.
pub struct AdmissionController<S, A> {
    ledger: Arc<CapacityLedger<S, A>>,
}

impl<S, A> AdmissionController<S, A>
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
{
    pub fn new(ledger: Arc<CapacityLedger<S, A>>) -> Self {
        Self { ledger }
    }

    pub fn evaluate(
        &self,
        draft: &JobRequestDraft,
        override_capacity: bool,
    ) -> Result<AdmissionDecision, AdmissionError> {
        if draft.requested_vacancies == 0 {
            return Err(AdmissionError::Validation(
                "requested vacancies must be greater than zero".to_string(),
            ));
        }

        let key = draft.capacity_key();
        if override_capacity {
            info!(%key, requested = draft.requested_vacancies, "admission overridden");
            return Ok(AdmissionDecision::overridden());
        }

        let check = self
            .ledger
            .check_admission(&key, draft.requested_vacancies)?;
        let decision = AdmissionDecision::from_check(check);
        info!(
            %key,
            requested = draft.requested_vacancies,
            accepted = decision.accepted,
            "admission evaluated"
        );
        Ok(decision)
    }

    /// Re-evaluate an edit only when department, position, year or vacancy count changed.
    pub fn evaluate_edit(
        &self,
        stored: &JobRequest,
        draft: &JobRequestDraft,
        override_capacity: bool,
    ) -> Result<AdmissionDecision, AdmissionError> {
        if stored.admission_fields_differ(draft) {
            self.evaluate(draft, override_capacity)
        } else {
            Ok(AdmissionDecision::unchanged(stored))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("invalid job request: {0}")]
    Validation(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
