//! Interview round tracking.
//!
//! Create and update share one ordered validation pipeline (`rules`). An accepted write is
//! folded into the application's derived score and status and committed together with it.

mod rules;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::RequestContext;
use super::domain::{
    Application, ApplicationId, InterviewRound, InterviewerId, Outcome, RoundId, RoundResult,
};
use super::progression::{self, ProgressionAggregator};
use super::repository::{OutcomeNotifier, RecruitmentStore, RepositoryError};
use rules::RoundCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    Create,
    Update,
}

/// Caller-supplied round fields. `id` identifies the round on update and is ignored on
/// create; a missing `result` is recorded as pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDraft {
    #[serde(default)]
    pub id: Option<RoundId>,
    pub application_id: ApplicationId,
    pub interviewer_id: InterviewerId,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub result: Option<RoundResult>,
    #[serde(default)]
    pub score: f64,
}

/// Business-rule rejection of a round write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RoundRejection {
    Validation {
        detail: String,
    },
    NotFound {
        what: String,
    },
    ImmutableRound {
        round_id: RoundId,
        result: RoundResult,
    },
    PastSchedule {
        scheduled_at: DateTime<Utc>,
    },
    DuplicateRound {
        label: String,
        existing: RoundId,
    },
    ScheduleConflict {
        date: NaiveDate,
        existing: RoundId,
    },
}

impl RoundRejection {
    pub const fn code(&self) -> &'static str {
        match self {
            RoundRejection::Validation { .. } => "validation_error",
            RoundRejection::NotFound { .. } => "not_found",
            RoundRejection::ImmutableRound { .. } => "immutable_round",
            RoundRejection::PastSchedule { .. } => "past_schedule",
            RoundRejection::DuplicateRound { .. } => "duplicate_round",
            RoundRejection::ScheduleConflict { .. } => "schedule_conflict",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            RoundRejection::Validation { detail } => format!("invalid round: {detail}"),
            RoundRejection::NotFound { what } => format!("{what} not found"),
            RoundRejection::ImmutableRound { round_id, result } => format!(
                "round {} is final ({}) and can no longer be edited",
                round_id.0,
                result.label()
            ),
            RoundRejection::PastSchedule { scheduled_at } => format!(
                "pending round must be scheduled in the future (got {})",
                scheduled_at.to_rfc3339()
            ),
            RoundRejection::DuplicateRound { label, existing } => {
                format!("round label '{label}' already used by round {}", existing.0)
            }
            RoundRejection::ScheduleConflict { date, existing } => {
                format!("pending round {} already booked on {date}", existing.0)
            }
        }
    }
}

/// Round plus the application state it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRound {
    pub round: InterviewRound,
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundDecision {
    Accepted(RecordedRound),
    Rejected(RoundRejection),
}

impl RoundDecision {
    pub fn accepted(&self) -> bool {
        matches!(self, RoundDecision::Accepted(_))
    }

    pub fn rejection(&self) -> Option<&RoundRejection> {
        match self {
            RoundDecision::Accepted(_) => None,
            RoundDecision::Rejected(rejection) => Some(rejection),
        }
    }
}

static ROUND_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_round_id() -> RoundId {
    let id = ROUND_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RoundId(format!("round-{id:06}"))
}

/// Validates round writes and keeps the owning application's derived fields in step.
pub struct InterviewRoundTracker<S, N> {
    store: Arc<S>,
    aggregator: Arc<ProgressionAggregator<S, N>>,
}

impl<S, N> InterviewRoundTracker<S, N>
where
    S: RecruitmentStore + 'static,
    N: OutcomeNotifier + 'static,
{
    pub fn new(store: Arc<S>, aggregator: Arc<ProgressionAggregator<S, N>>) -> Self {
        Self { store, aggregator }
    }

    pub fn record(
        &self,
        ctx: &RequestContext,
        draft: RoundDraft,
        mode: RecordMode,
    ) -> Result<RoundDecision, RepositoryError> {
        let stored = match (mode, &draft.id) {
            (RecordMode::Update, Some(id)) => self.store.round(id)?,
            _ => None,
        };
        let application = self.store.application(&draft.application_id)?;
        let interviewer = self.store.interviewer(&draft.interviewer_id)?;
        let editing = stored.as_ref().map(|round| round.id.clone());
        let siblings = self.store.rounds_where(&|round: &InterviewRound| {
            round.application_id == draft.application_id && Some(&round.id) != editing.as_ref()
        })?;

        let rejection = rules::validate(&RoundCandidate {
            draft: &draft,
            mode,
            stored: stored.as_ref(),
            siblings: &siblings,
            application: application.as_ref(),
            interviewer: interviewer.as_ref(),
            now: ctx.now,
        });
        if let Some(rejection) = rejection {
            info!(
                actor = %ctx.actor,
                application = %draft.application_id.0,
                reason = rejection.code(),
                "interview round rejected"
            );
            return Ok(RoundDecision::Rejected(rejection));
        }
        let Some(application) = application else {
            return Err(RepositoryError::NotFound);
        };

        let (id, created_at) = match stored {
            Some(stored) => (stored.id, stored.created_at),
            None => (next_round_id(), ctx.now),
        };
        let round = InterviewRound {
            id,
            application_id: draft.application_id,
            interviewer_id: draft.interviewer_id,
            scheduled_at: draft.scheduled_at,
            label: draft.label.trim().to_string(),
            result: draft.result.unwrap_or_default(),
            score: draft.score,
            created_at,
            updated_by: ctx.actor.clone(),
        };

        let mut rounds = siblings;
        rounds.push(round.clone());
        let progression = progression::derive(&application, &rounds).stamped(ctx);
        self.store
            .commit_round(round.clone(), progression.application.clone())?;
        self.aggregator.dispatch(&progression);

        info!(
            actor = %ctx.actor,
            round = %round.id.0,
            application = %round.application_id.0,
            result = round.result.label(),
            ?mode,
            "interview round recorded"
        );
        Ok(RoundDecision::Accepted(RecordedRound {
            round,
            application: progression.application,
            transition: progression.transition,
        }))
    }

    /// Remove a round that has not been finalized and recompute its application.
    pub fn cancel(
        &self,
        ctx: &RequestContext,
        round_id: &RoundId,
    ) -> Result<RoundDecision, RepositoryError> {
        let Some(round) = self.store.round(round_id)? else {
            return Ok(RoundDecision::Rejected(RoundRejection::NotFound {
                what: format!("interview round {}", round_id.0),
            }));
        };
        if round.result.is_terminal() {
            return Ok(RoundDecision::Rejected(RoundRejection::ImmutableRound {
                round_id: round.id,
                result: round.result,
            }));
        }
        let application = self
            .store
            .application(&round.application_id)?
            .ok_or(RepositoryError::NotFound)?;

        let remaining = self.store.rounds_where(&|candidate: &InterviewRound| {
            candidate.application_id == round.application_id && candidate.id != round.id
        })?;
        let progression = progression::derive(&application, &remaining).stamped(ctx);
        if !self
            .store
            .commit_round_removal(&round.id, progression.application.clone())?
        {
            return Err(RepositoryError::NotFound);
        }
        self.aggregator.dispatch(&progression);

        info!(actor = %ctx.actor, round = %round.id.0, "interview round cancelled");
        Ok(RoundDecision::Accepted(RecordedRound {
            round,
            application: progression.application,
            transition: progression.transition,
        }))
    }
}
