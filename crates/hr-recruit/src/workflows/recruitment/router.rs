use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::{RequestContext, RoleAuthority};
use super::admission::AdmissionError;
use super::capacity::LedgerError;
use super::domain::{
    ActorId, ApplicationId, CandidateId, CapacityKey, CapacityRecord, JobRequestDraft,
    JobRequestId, RoundId,
};
use super::interviews::{RecordMode, RoundDecision, RoundDraft, RoundRejection};
use super::repository::{OutcomeNotifier, RecruitmentStore, RepositoryError};
use super::service::{RecruitmentService, RecruitmentServiceError};

/// Header carrying the identity of the acting user, stamped onto every write.
pub const ACTOR_HEADER: &str = "x-actor-id";

type SharedService<S, A, N> = Arc<RecruitmentService<S, A, N>>;

/// Router builder exposing headcount, job request, application and round endpoints.
pub fn recruitment_router<S, A, N>(service: SharedService<S, A, N>) -> Router
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/headcount",
            get(headcount_snapshot_handler::<S, A, N>).post(approve_handler::<S, A, N>),
        )
        .route(
            "/api/v1/headcount/check",
            post(admission_check_handler::<S, A, N>),
        )
        .route(
            "/api/v1/job-requests",
            post(submit_job_request_handler::<S, A, N>),
        )
        .route(
            "/api/v1/job-requests/:job_request_id",
            put(edit_job_request_handler::<S, A, N>),
        )
        .route(
            "/api/v1/job-requests/:job_request_id/applications",
            get(list_applications_handler::<S, A, N>),
        )
        .route(
            "/api/v1/applications",
            post(submit_application_handler::<S, A, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<S, A, N>),
        )
        .route(
            "/api/v1/applications/:application_id/hire",
            post(hire_handler::<S, A, N>).delete(release_hire_handler::<S, A, N>),
        )
        .route("/api/v1/rounds", post(create_round_handler::<S, A, N>))
        .route(
            "/api/v1/rounds/:round_id",
            put(update_round_handler::<S, A, N>).delete(cancel_round_handler::<S, A, N>),
        )
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadcountApprovalRequest {
    pub department_id: u32,
    pub position_id: u32,
    pub year: i32,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionCheckRequest {
    pub department_id: u32,
    pub position_id: u32,
    pub year: i32,
    pub requested: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequestPayload {
    #[serde(flatten)]
    pub draft: JobRequestDraft,
    #[serde(default)]
    pub override_capacity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationPayload {
    pub candidate_id: CandidateId,
    pub job_request_id: JobRequestId,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadcountView {
    #[serde(flatten)]
    pub record: CapacityRecord,
    pub remaining: u32,
}

pub(crate) async fn approve_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    headers: HeaderMap,
    Json(payload): Json<HeadcountApprovalRequest>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let key = CapacityKey::new(payload.department_id, payload.position_id, payload.year);
    match service.approve_headcount(&ctx, key, payload.count) {
        Ok(record) => {
            let remaining = record.remaining();
            (StatusCode::OK, Json(HeadcountView { record, remaining })).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn headcount_snapshot_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    match service.ledger().snapshot() {
        Ok(records) => {
            let views: Vec<HeadcountView> = records
                .into_iter()
                .map(|record| HeadcountView {
                    remaining: record.remaining(),
                    record,
                })
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => service_error_response(error.into()),
    }
}

pub(crate) async fn admission_check_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Json(payload): Json<AdmissionCheckRequest>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let key = CapacityKey::new(payload.department_id, payload.position_id, payload.year);
    match service.check_admission(&key, payload.requested) {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn submit_job_request_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    headers: HeaderMap,
    Json(payload): Json<JobRequestPayload>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match service.submit_job_request(&ctx, payload.draft, payload.override_capacity) {
        Ok(submission) if submission.decision.accepted => {
            (StatusCode::CREATED, Json(submission)).into_response()
        }
        Ok(submission) => (StatusCode::CONFLICT, Json(submission)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn edit_job_request_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(job_request_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<JobRequestPayload>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let id = JobRequestId(job_request_id);
    match service.edit_job_request(&ctx, &id, payload.draft, payload.override_capacity) {
        Ok(submission) if submission.decision.accepted => {
            (StatusCode::OK, Json(submission)).into_response()
        }
        Ok(submission) => (StatusCode::CONFLICT, Json(submission)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn submit_application_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    headers: HeaderMap,
    Json(payload): Json<ApplicationPayload>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match service.submit_application(&ctx, payload.candidate_id, payload.job_request_id) {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(RecruitmentServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "candidate already applied to this job request",
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_applications_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(job_request_id): Path<String>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    match service.applications_for(&JobRequestId(job_request_id)) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn status_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    match service.application_status(&ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn hire_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match service.confirm_hire(&ctx, &id) {
        Ok(filled) => {
            let payload = json!({
                "application_id": id.0,
                "seat_filled": filled,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn release_hire_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match service.release_hire(&ctx, &id) {
        Ok(released) => {
            let payload = json!({
                "application_id": id.0,
                "seat_released": released,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn create_round_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    headers: HeaderMap,
    Json(draft): Json<RoundDraft>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match service.record_round(&ctx, draft, RecordMode::Create) {
        Ok(decision) => round_decision_response(decision, StatusCode::CREATED),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn update_round_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(round_id): Path<String>,
    headers: HeaderMap,
    Json(mut draft): Json<RoundDraft>,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    draft.id = Some(RoundId(round_id));
    match service.record_round(&ctx, draft, RecordMode::Update) {
        Ok(decision) => round_decision_response(decision, StatusCode::OK),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn cancel_round_handler<S, A, N>(
    State(service): State<SharedService<S, A, N>>,
    Path(round_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
    N: OutcomeNotifier + 'static,
{
    let ctx = match request_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match service.cancel_round(&ctx, &RoundId(round_id)) {
        Ok(decision) => round_decision_response(decision, StatusCode::OK),
        Err(error) => service_error_response(error),
    }
}

fn request_context(headers: &HeaderMap) -> Result<RequestContext, Response> {
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match actor {
        Some(actor) => Ok(RequestContext::current(ActorId(actor.to_string()))),
        None => {
            let payload = json!({
                "error": format!("missing {ACTOR_HEADER} header"),
            });
            Err((StatusCode::BAD_REQUEST, Json(payload)).into_response())
        }
    }
}

fn round_decision_response(decision: RoundDecision, accepted_status: StatusCode) -> Response {
    match decision {
        RoundDecision::Accepted(recorded) => (accepted_status, Json(recorded)).into_response(),
        RoundDecision::Rejected(rejection) => {
            let status = match &rejection {
                RoundRejection::NotFound { .. } => StatusCode::NOT_FOUND,
                RoundRejection::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RoundRejection::ImmutableRound { .. }
                | RoundRejection::PastSchedule { .. }
                | RoundRejection::DuplicateRound { .. }
                | RoundRejection::ScheduleConflict { .. } => StatusCode::CONFLICT,
            };
            let payload = json!({
                "accepted": false,
                "reason": rejection.code(),
                "detail": rejection.summary(),
            });
            (status, Json(payload)).into_response()
        }
    }
}

fn service_error_response(error: RecruitmentServiceError) -> Response {
    let status = match &error {
        RecruitmentServiceError::Ledger(LedgerError::PermissionDenied { .. }) => {
            StatusCode::FORBIDDEN
        }
        RecruitmentServiceError::Ledger(LedgerError::Validation(_))
        | RecruitmentServiceError::Admission(AdmissionError::Validation(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RecruitmentServiceError::NotFound(_)
        | RecruitmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RecruitmentServiceError::Repository(RepositoryError::Conflict)
        | RecruitmentServiceError::InvalidState(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
