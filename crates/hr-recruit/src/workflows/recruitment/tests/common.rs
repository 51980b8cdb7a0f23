use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::recruitment::access::{RequestContext, Role, StaticRoleAuthority};
use crate::workflows::recruitment::domain::{
    ActorId, Application, ApplicationId, Candidate, CandidateId, CapacityKey, CapacityRecord,
    DepartmentId, InterviewRound, Interviewer, InterviewerId, JobRequest, JobRequestDraft,
    JobRequestId, Outcome, PositionId, RoundId, RoundResult,
};
use crate::workflows::recruitment::interviews::RoundDraft;
use crate::workflows::recruitment::memory::InMemoryRecruitmentStore;
use crate::workflows::recruitment::repository::{
    NotifyError, OutcomeNotifier, RecruitmentStore, RepositoryError,
};
use crate::workflows::recruitment::service::RecruitmentService;
use crate::workflows::recruitment::recruitment_router;

pub(super) const APPROVER: &str = "hr-director";
pub(super) const RECRUITER: &str = "recruiter";
pub(super) const CANDIDATE: &str = "cand-ada";
pub(super) const INTERVIEWER: &str = "int-grace";

pub(super) type MemoryService =
    RecruitmentService<InMemoryRecruitmentStore, StaticRoleAuthority, MemoryNotifier>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn days_from_now(days: i64) -> DateTime<Utc> {
    now() + Duration::days(days)
}

pub(super) fn approver_ctx() -> RequestContext {
    RequestContext::new(ActorId(APPROVER.to_string()), now())
}

pub(super) fn recruiter_ctx() -> RequestContext {
    RequestContext::new(ActorId(RECRUITER.to_string()), now())
}

pub(super) fn authority() -> StaticRoleAuthority {
    StaticRoleAuthority::default().grant(ActorId(APPROVER.to_string()), Role::HeadcountApprover)
}

pub(super) fn key() -> CapacityKey {
    CapacityKey::new(1, 2, 2026)
}

pub(super) fn capacity_record(approved: u32, filled: u32) -> CapacityRecord {
    CapacityRecord {
        key: key(),
        approved_count: approved,
        filled_count: filled,
        approved_on: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
        approver: ActorId(APPROVER.to_string()),
        version: 1,
    }
}

pub(super) fn draft(requested: u32) -> JobRequestDraft {
    JobRequestDraft {
        department_id: DepartmentId(1),
        position_id: PositionId(2),
        year: 2026,
        title: "Backend Engineer".to_string(),
        requested_vacancies: requested,
    }
}

pub(super) fn job_request(id: &str, requested: u32) -> JobRequest {
    JobRequest {
        id: JobRequestId(id.to_string()),
        department_id: DepartmentId(1),
        position_id: PositionId(2),
        year: 2026,
        title: "Backend Engineer".to_string(),
        requested_vacancies: requested,
        headcount_approved: true,
        requested_by: ActorId(RECRUITER.to_string()),
        updated_by: ActorId(RECRUITER.to_string()),
    }
}

pub(super) fn seeded_store() -> Arc<InMemoryRecruitmentStore> {
    let store = Arc::new(InMemoryRecruitmentStore::default());
    store
        .register_candidate(Candidate {
            id: CandidateId(CANDIDATE.to_string()),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        })
        .expect("seed candidate");
    store
        .register_interviewer(Interviewer {
            id: InterviewerId(INTERVIEWER.to_string()),
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
        })
        .expect("seed interviewer");
    store
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryRecruitmentStore>,
    Arc<MemoryNotifier>,
) {
    let store = seeded_store();
    let notifier = Arc::new(MemoryNotifier::default());
    let service = RecruitmentService::new(store.clone(), Arc::new(authority()), notifier.clone());
    (service, store, notifier)
}

/// Service with approved headcount, one accepted posting and one submitted application.
pub(super) fn service_with_application() -> (
    MemoryService,
    Arc<InMemoryRecruitmentStore>,
    Arc<MemoryNotifier>,
    Application,
) {
    let (service, store, notifier) = build_service();
    store
        .upsert_capacity(capacity_record(3, 1))
        .expect("seed capacity");
    let submission = service
        .submit_job_request(&recruiter_ctx(), draft(1), false)
        .expect("submit job request");
    let request = submission.request.expect("request stored");
    let application = service
        .submit_application(
            &recruiter_ctx(),
            CandidateId(CANDIDATE.to_string()),
            request.id,
        )
        .expect("submit application");
    (service, store, notifier, application)
}

pub(super) fn round_draft(application_id: &ApplicationId, label: &str, day: i64) -> RoundDraft {
    RoundDraft {
        id: None,
        application_id: application_id.clone(),
        interviewer_id: InterviewerId(INTERVIEWER.to_string()),
        scheduled_at: days_from_now(day),
        label: label.to_string(),
        result: None,
        score: 0.0,
    }
}

pub(super) fn stored_round(
    application_id: &ApplicationId,
    id: &str,
    result: RoundResult,
    score: f64,
) -> InterviewRound {
    InterviewRound {
        id: RoundId(id.to_string()),
        application_id: application_id.clone(),
        interviewer_id: InterviewerId(INTERVIEWER.to_string()),
        scheduled_at: days_from_now(1),
        label: id.to_string(),
        result,
        score,
        created_at: now(),
        updated_by: ActorId(RECRUITER.to_string()),
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<(ApplicationId, Outcome)>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<(ApplicationId, Outcome)> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl OutcomeNotifier for MemoryNotifier {
    fn notify_outcome(&self, application: &Application, outcome: Outcome) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push((application.id.clone(), outcome));
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl OutcomeNotifier for FailingNotifier {
    fn notify_outcome(
        &self,
        _application: &Application,
        _outcome: Outcome,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

/// Store whose every call fails, for exercising the 500 path.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl RecruitmentStore for UnavailableStore {
    fn capacity(&self, _key: &CapacityKey) -> Result<Option<CapacityRecord>, RepositoryError> {
        offline()
    }

    fn capacities(&self) -> Result<Vec<CapacityRecord>, RepositoryError> {
        offline()
    }

    fn upsert_capacity(&self, _record: CapacityRecord) -> Result<CapacityRecord, RepositoryError> {
        offline()
    }

    fn swap_capacity(
        &self,
        _expected_version: u64,
        _record: CapacityRecord,
    ) -> Result<(), RepositoryError> {
        offline()
    }

    fn job_request(&self, _id: &JobRequestId) -> Result<Option<JobRequest>, RepositoryError> {
        offline()
    }

    fn upsert_job_request(&self, _request: JobRequest) -> Result<JobRequest, RepositoryError> {
        offline()
    }

    fn candidate(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        offline()
    }

    fn interviewer(&self, _id: &InterviewerId) -> Result<Option<Interviewer>, RepositoryError> {
        offline()
    }

    fn application(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn applications_where(
        &self,
        _predicate: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        offline()
    }

    fn round(&self, _id: &RoundId) -> Result<Option<InterviewRound>, RepositoryError> {
        offline()
    }

    fn rounds_where(
        &self,
        _predicate: &dyn Fn(&InterviewRound) -> bool,
    ) -> Result<Vec<InterviewRound>, RepositoryError> {
        offline()
    }

    fn commit_round(
        &self,
        _round: InterviewRound,
        _application: Application,
    ) -> Result<(), RepositoryError> {
        offline()
    }

    fn commit_round_removal(
        &self,
        _round_id: &RoundId,
        _application: Application,
    ) -> Result<bool, RepositoryError> {
        offline()
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    recruitment_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
