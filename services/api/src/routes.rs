use crate::infra::{AppState, InMemoryRecruitmentService, RecruitmentRuntime};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use hr_recruit::error::AppError;
use hr_recruit::workflows::headcount_plan::HeadcountPlanImporter;
use hr_recruit::workflows::recruitment::{
    recruitment_router, ActorId, Candidate, CandidateId, InMemoryRecruitmentStore, Interviewer,
    InterviewerId, RequestContext, ACTOR_HEADER,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct DirectoryEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
}

pub(crate) fn with_recruitment_routes(runtime: &RecruitmentRuntime) -> axum::Router {
    recruitment_router(runtime.service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/headcount/import",
            axum::routing::post(headcount_import_endpoint),
        )
        .route(
            "/api/v1/candidates",
            axum::routing::post(register_candidate_endpoint),
        )
        .route(
            "/api/v1/interviewers",
            axum::routing::post(register_interviewer_endpoint),
        )
        .layer(Extension(runtime.service.clone()))
        .layer(Extension(runtime.store.clone()))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Accepts a headcount plan CSV as the request body and approves every row as the caller.
pub(crate) async fn headcount_import_endpoint(
    Extension(service): Extension<Arc<InMemoryRecruitmentService>>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, AppError> {
    let Some(actor) = header_actor(&headers) else {
        return Ok(missing_actor());
    };

    let ctx = RequestContext::current(actor);
    let report = HeadcountPlanImporter::from_reader(
        Cursor::new(body.into_bytes()),
        service.ledger(),
        &ctx,
    )?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

pub(crate) async fn register_candidate_endpoint(
    Extension(store): Extension<Arc<InMemoryRecruitmentStore>>,
    Json(entry): Json<DirectoryEntry>,
) -> Result<Response, AppError> {
    let candidate = Candidate {
        id: CandidateId(entry.id),
        name: entry.name,
        email: entry.email,
    };
    store.register_candidate(candidate.clone())?;
    Ok((StatusCode::CREATED, Json(candidate)).into_response())
}

pub(crate) async fn register_interviewer_endpoint(
    Extension(store): Extension<Arc<InMemoryRecruitmentStore>>,
    Json(entry): Json<DirectoryEntry>,
) -> Result<Response, AppError> {
    let interviewer = Interviewer {
        id: InterviewerId(entry.id),
        name: entry.name,
        email: entry.email,
    };
    store.register_interviewer(interviewer.clone())?;
    Ok((StatusCode::CREATED, Json(interviewer)).into_response())
}

fn header_actor(headers: &HeaderMap) -> Option<ActorId> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ActorId(value.to_string()))
}

fn missing_actor() -> Response {
    let payload = json!({ "error": format!("missing {ACTOR_HEADER} header") });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}
