use crate::cli::ServeArgs;
use crate::infra::{AppState, RecruitmentRuntime};
use crate::routes::with_recruitment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hr_recruit::config::AppConfig;
use hr_recruit::error::AppError;
use hr_recruit::telemetry;
use hr_recruit::workflows::headcount_plan::HeadcountPlanImporter;
use hr_recruit::workflows::recruitment::RequestContext;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let runtime = RecruitmentRuntime::in_memory(&config.recruitment);
    if let Some(plan) = args.headcount_plan.take() {
        let actor = config.recruitment.primary_approver()?.clone();
        let ctx = RequestContext::current(actor);
        let report = HeadcountPlanImporter::from_path(&plan, runtime.service.ledger(), &ctx)?;
        info!(
            path = %plan.display(),
            rows = report.approved.len(),
            seats = report.total_seats(),
            "headcount plan preloaded"
        );
    }

    let app = with_recruitment_routes(&runtime)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruitment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
