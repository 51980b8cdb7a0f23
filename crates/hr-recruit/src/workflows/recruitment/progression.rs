use std::sync::Arc;

use tracing::{info, warn};

use super::access::RequestContext;
use super::domain::{
    Application, ApplicationId, ApplicationStatus, InterviewRound, Outcome, RoundResult,
};
use super::repository::{OutcomeNotifier, RecruitmentStore, RepositoryError};

/// Application state derived from its full set of rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub application: Application,
    pub previous_status: ApplicationStatus,
    /// Set when this derivation moved the application into a terminal status.
    pub transition: Option<Outcome>,
    pub pending_rounds: usize,
}

impl Progression {
    pub(crate) fn stamped(mut self, ctx: &RequestContext) -> Self {
        self.application.updated_by = ctx.actor.clone();
        self
    }
}

/// Derive score and status from `rounds`.
///
/// The score follows passed rounds even while others are pending; the status only changes
/// once no round is pending. Terminal applications are derived again like any other.
pub fn derive(application: &Application, rounds: &[InterviewRound]) -> Progression {
    let mut ordered: Vec<&InterviewRound> = rounds.iter().collect();
    ordered.sort_by(|left, right| right.created_at.cmp(&left.created_at));

    let passed: Vec<f64> = ordered
        .iter()
        .filter(|round| round.result == RoundResult::Pass && round.score > 0.0)
        .map(|round| round.score)
        .collect();
    let any_failed = ordered
        .iter()
        .any(|round| round.result == RoundResult::Fail);
    let pending_rounds = ordered
        .iter()
        .filter(|round| !round.result.is_terminal())
        .count();

    let mut next = application.clone();
    if !passed.is_empty() {
        next.score = round_score(passed.iter().sum::<f64>() / passed.len() as f64);
    } else if any_failed {
        next.score = 0.0;
    }

    if !ordered.is_empty() {
        if pending_rounds == 0 {
            next.status = if any_failed {
                ApplicationStatus::Failed
            } else {
                ApplicationStatus::Passed
            };
        } else if next.status == ApplicationStatus::Submitted {
            next.status = ApplicationStatus::InProgress;
        }
    }

    let transition = if next.status != application.status {
        Outcome::from_status(next.status)
    } else {
        None
    };

    Progression {
        application: next,
        previous_status: application.status,
        transition,
        pending_rounds,
    }
}

fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recomputes applications and dispatches outcome notifications.
pub struct ProgressionAggregator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> ProgressionAggregator<S, N>
where
    S: RecruitmentStore + 'static,
    N: OutcomeNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Reload every round of the application, derive, persist once, and notify.
    pub fn recompute(
        &self,
        ctx: &RequestContext,
        application_id: &ApplicationId,
    ) -> Result<Progression, RepositoryError> {
        let application = self
            .store
            .application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        let rounds = self
            .store
            .rounds_where(&|round: &InterviewRound| &round.application_id == application_id)?;

        let progression = derive(&application, &rounds).stamped(ctx);
        self.store
            .update_application(progression.application.clone())?;
        self.dispatch(&progression);
        Ok(progression)
    }

    /// Best effort: a failed notification is logged and never undoes the status change.
    pub(crate) fn dispatch(&self, progression: &Progression) {
        let Some(outcome) = progression.transition else {
            return;
        };
        let application = &progression.application;
        info!(
            application = %application.id.0,
            from = progression.previous_status.label(),
            to = application.status.label(),
            score = application.score,
            "application reached a final status"
        );
        if let Err(err) = self.notifier.notify_outcome(application, outcome) {
            warn!(
                application = %application.id.0,
                outcome = outcome.label(),
                error = %err,
                "outcome notification failed"
            );
        }
    }
}
