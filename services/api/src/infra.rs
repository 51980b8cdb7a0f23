use hr_recruit::config::RecruitmentConfig;
use hr_recruit::workflows::recruitment::{
    Application, ApplicationId, InMemoryRecruitmentStore, NotifyError, Outcome, OutcomeNotifier,
    RecruitmentService, StaticRoleAuthority,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) type InMemoryRecruitmentService =
    RecruitmentService<InMemoryRecruitmentStore, StaticRoleAuthority, LoggingOutcomeNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Outcome notice as it would be handed to the mail relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct OutcomeNotice {
    pub(crate) application_id: ApplicationId,
    pub(crate) outcome: Outcome,
    pub(crate) score: f64,
}

/// Stands in for the mail relay: logs each notice and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingOutcomeNotifier {
    notices: Arc<Mutex<Vec<OutcomeNotice>>>,
}

impl LoggingOutcomeNotifier {
    pub(crate) fn notices(&self) -> Vec<OutcomeNotice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl OutcomeNotifier for LoggingOutcomeNotifier {
    fn notify_outcome(&self, application: &Application, outcome: Outcome) -> Result<(), NotifyError> {
        info!(
            application = %application.id.0,
            candidate = %application.candidate_id.0,
            outcome = outcome.label(),
            "outcome notice queued"
        );
        let mut guard = self
            .notices
            .lock()
            .map_err(|_| NotifyError::Transport("notice queue poisoned".to_string()))?;
        guard.push(OutcomeNotice {
            application_id: application.id.clone(),
            outcome,
            score: application.score,
        });
        Ok(())
    }
}

/// Everything the binary wires together, with handles kept for demos and directory routes.
pub(crate) struct RecruitmentRuntime {
    pub(crate) service: Arc<InMemoryRecruitmentService>,
    pub(crate) store: Arc<InMemoryRecruitmentStore>,
    pub(crate) notifier: Arc<LoggingOutcomeNotifier>,
}

impl RecruitmentRuntime {
    pub(crate) fn in_memory(config: &RecruitmentConfig) -> Self {
        let store = Arc::new(InMemoryRecruitmentStore::default());
        let notifier = Arc::new(LoggingOutcomeNotifier::default());
        let authority = Arc::new(StaticRoleAuthority::from_config(config));
        let service = Arc::new(RecruitmentService::new(
            store.clone(),
            authority,
            notifier.clone(),
        ));

        Self {
            service,
            store,
            notifier,
        }
    }
}
