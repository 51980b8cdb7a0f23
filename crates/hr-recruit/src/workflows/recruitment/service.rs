use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::access::{RequestContext, RoleAuthority};
use super::admission::{AdmissionController, AdmissionDecision, AdmissionError};
use super::capacity::{AdmissionCheck, CapacityLedger, LedgerError};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateId, CapacityKey, CapacityRecord,
    InterviewRound, JobRequest, JobRequestDraft, JobRequestId, RoundId,
};
use super::interviews::{InterviewRoundTracker, RecordMode, RoundDecision, RoundDraft};
use super::progression::{Progression, ProgressionAggregator};
use super::repository::{
    ApplicationStatusView, OutcomeNotifier, RecruitmentStore, RepositoryError,
};

/// Service composing the capacity ledger, admission control, round tracking and progression.
pub struct RecruitmentService<S, A, N> {
    store: Arc<S>,
    ledger: Arc<CapacityLedger<S, A>>,
    admission: AdmissionController<S, A>,
    aggregator: Arc<ProgressionAggregator<S, N>>,
    tracker: InterviewRoundTracker<S, N>,
}

static JOB_REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_request_id() -> JobRequestId {
    let id = JOB_REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobRequestId(format!("job-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Admission decision plus the stored request when it was accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequestSubmission {
    pub decision: AdmissionDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<JobRequest>,
}

impl<S, A, N> RecruitmentService<S, A, N>
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    pub fn new(store: Arc<S>, authority: Arc<A>, notifier: Arc<N>) -> Self {
        let ledger = Arc::new(CapacityLedger::new(store.clone(), authority));
        let admission = AdmissionController::new(ledger.clone());
        let aggregator = Arc::new(ProgressionAggregator::new(store.clone(), notifier));
        let tracker = InterviewRoundTracker::new(store.clone(), aggregator.clone());

        Self {
            store,
            ledger,
            admission,
            aggregator,
            tracker,
        }
    }

    pub fn ledger(&self) -> &CapacityLedger<S, A> {
        &self.ledger
    }

    pub fn approve_headcount(
        &self,
        ctx: &RequestContext,
        key: CapacityKey,
        count: u32,
    ) -> Result<CapacityRecord, RecruitmentServiceError> {
        Ok(self.ledger.approve(ctx, key, count)?)
    }

    pub fn check_admission(
        &self,
        key: &CapacityKey,
        requested: u32,
    ) -> Result<AdmissionCheck, RecruitmentServiceError> {
        Ok(self.ledger.check_admission(key, requested)?)
    }

    /// Open a new job request. Only accepted requests are stored.
    pub fn submit_job_request(
        &self,
        ctx: &RequestContext,
        draft: JobRequestDraft,
        override_capacity: bool,
    ) -> Result<JobRequestSubmission, RecruitmentServiceError> {
        let decision = self.admission.evaluate(&draft, override_capacity)?;
        if !decision.accepted {
            return Ok(JobRequestSubmission {
                decision,
                request: None,
            });
        }

        let request = self.store.upsert_job_request(JobRequest {
            id: next_job_request_id(),
            department_id: draft.department_id,
            position_id: draft.position_id,
            year: draft.year,
            title: draft.title,
            requested_vacancies: draft.requested_vacancies,
            headcount_approved: decision.headcount_approved,
            requested_by: ctx.actor.clone(),
            updated_by: ctx.actor.clone(),
        })?;
        info!(
            actor = %ctx.actor,
            job_request = %request.id.0,
            headcount_approved = request.headcount_approved,
            "job request opened"
        );

        Ok(JobRequestSubmission {
            decision,
            request: Some(request),
        })
    }

    /// Edit a stored job request; capacity is only re-checked when admission fields changed.
    pub fn edit_job_request(
        &self,
        ctx: &RequestContext,
        id: &JobRequestId,
        draft: JobRequestDraft,
        override_capacity: bool,
    ) -> Result<JobRequestSubmission, RecruitmentServiceError> {
        let stored = self
            .store
            .job_request(id)?
            .ok_or_else(|| RecruitmentServiceError::NotFound(format!("job request {}", id.0)))?;

        let decision = self
            .admission
            .evaluate_edit(&stored, &draft, override_capacity)?;
        if !decision.accepted {
            return Ok(JobRequestSubmission {
                decision,
                request: None,
            });
        }

        let request = self.store.upsert_job_request(JobRequest {
            department_id: draft.department_id,
            position_id: draft.position_id,
            year: draft.year,
            title: draft.title,
            requested_vacancies: draft.requested_vacancies,
            headcount_approved: decision.headcount_approved,
            updated_by: ctx.actor.clone(),
            ..stored
        })?;

        Ok(JobRequestSubmission {
            decision,
            request: Some(request),
        })
    }

    /// Register a candidate's application to a job request. Each pair may apply once.
    pub fn submit_application(
        &self,
        ctx: &RequestContext,
        candidate_id: CandidateId,
        job_request_id: JobRequestId,
    ) -> Result<Application, RecruitmentServiceError> {
        if self.store.candidate(&candidate_id)?.is_none() {
            return Err(RecruitmentServiceError::NotFound(format!(
                "candidate {}",
                candidate_id.0
            )));
        }
        if self.store.job_request(&job_request_id)?.is_none() {
            return Err(RecruitmentServiceError::NotFound(format!(
                "job request {}",
                job_request_id.0
            )));
        }

        let application = self.store.insert_application(Application {
            id: next_application_id(),
            candidate_id,
            job_request_id,
            status: ApplicationStatus::Submitted,
            score: 0.0,
            hired_on: None,
            updated_by: ctx.actor.clone(),
        })?;
        info!(actor = %ctx.actor, application = %application.id.0, "application submitted");
        Ok(application)
    }

    /// Applications filed against one job request, oldest id first.
    pub fn applications_for(
        &self,
        job_request_id: &JobRequestId,
    ) -> Result<Vec<Application>, RecruitmentServiceError> {
        if self.store.job_request(job_request_id)?.is_none() {
            return Err(RecruitmentServiceError::NotFound(format!(
                "job request {}",
                job_request_id.0
            )));
        }
        let mut applications = self.store.applications_where(&|application: &Application| {
            &application.job_request_id == job_request_id
        })?;
        applications.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(applications)
    }

    pub fn record_round(
        &self,
        ctx: &RequestContext,
        draft: RoundDraft,
        mode: RecordMode,
    ) -> Result<RoundDecision, RecruitmentServiceError> {
        Ok(self.tracker.record(ctx, draft, mode)?)
    }

    pub fn cancel_round(
        &self,
        ctx: &RequestContext,
        round_id: &RoundId,
    ) -> Result<RoundDecision, RecruitmentServiceError> {
        Ok(self.tracker.cancel(ctx, round_id)?)
    }

    pub fn recompute(
        &self,
        ctx: &RequestContext,
        application_id: &ApplicationId,
    ) -> Result<Progression, RecruitmentServiceError> {
        Ok(self.aggregator.recompute(ctx, application_id)?)
    }

    /// Count a passed application against its posting's headcount, once.
    ///
    /// Returns the ledger's verdict: `false` when the seat could not be filled, in which case
    /// the application stays unhired and may be confirmed again later.
    pub fn confirm_hire(
        &self,
        ctx: &RequestContext,
        application_id: &ApplicationId,
    ) -> Result<bool, RecruitmentServiceError> {
        let application = self.application(application_id)?;
        if application.status != ApplicationStatus::Passed {
            return Err(RecruitmentServiceError::InvalidState(format!(
                "application {} is {}, only passed applications can be hired",
                application.id.0,
                application.status.label()
            )));
        }
        if let Some(hired_on) = application.hired_on {
            return Err(RecruitmentServiceError::InvalidState(format!(
                "application {} was already hired on {hired_on}",
                application.id.0
            )));
        }
        let key = self.posting(&application)?.capacity_key();

        if !self.ledger.increment_filled(&key, 1)? {
            warn!(
                actor = %ctx.actor,
                application = %application.id.0,
                %key,
                "hire not confirmed: no open seat"
            );
            return Ok(false);
        }

        let hired = Application {
            hired_on: Some(ctx.now.date_naive()),
            updated_by: ctx.actor.clone(),
            ..application
        };
        if let Err(err) = self.store.update_application(hired.clone()) {
            self.ledger.decrement_filled(&key, 1)?;
            return Err(err.into());
        }
        info!(actor = %ctx.actor, application = %hired.id.0, %key, "hire confirmed");
        Ok(true)
    }

    /// Give a confirmed hire's seat back to the ledger, e.g. when the offer is declined.
    pub fn release_hire(
        &self,
        ctx: &RequestContext,
        application_id: &ApplicationId,
    ) -> Result<bool, RecruitmentServiceError> {
        let application = self.application(application_id)?;
        if application.hired_on.is_none() {
            return Err(RecruitmentServiceError::InvalidState(format!(
                "application {} has no confirmed hire to release",
                application.id.0
            )));
        }
        let key = self.posting(&application)?.capacity_key();

        let released = self.ledger.decrement_filled(&key, 1)?;
        self.store.update_application(Application {
            hired_on: None,
            updated_by: ctx.actor.clone(),
            ..application
        })?;
        info!(
            actor = %ctx.actor,
            application = %application_id.0,
            %key,
            released,
            "hire released"
        );
        Ok(released)
    }

    pub fn application_status(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationStatusView, RecruitmentServiceError> {
        let application = self.application(application_id)?;
        let mut rounds = self
            .store
            .rounds_where(&|round: &InterviewRound| &round.application_id == application_id)?;
        rounds.sort_by(|left, right| left.scheduled_at.cmp(&right.scheduled_at));
        Ok(ApplicationStatusView::new(&application, &rounds))
    }

    fn posting(&self, application: &Application) -> Result<JobRequest, RecruitmentServiceError> {
        self.store
            .job_request(&application.job_request_id)?
            .ok_or_else(|| {
                RecruitmentServiceError::NotFound(format!(
                    "job request {}",
                    application.job_request_id.0
                ))
            })
    }

    fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, RecruitmentServiceError> {
        self.store.application(application_id)?.ok_or_else(|| {
            RecruitmentServiceError::NotFound(format!("application {}", application_id.0))
        })
    }
}

/// Error raised by the recruitment service.
#[derive(Debug, thiserror::Error)]
pub enum RecruitmentServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
}
