use serde::Serialize;

use super::domain::{
    Application, ApplicationId, Candidate, CandidateId, CapacityKey, CapacityRecord,
    InterviewRound, Interviewer, InterviewerId, JobRequest, JobRequestId, Outcome, RoundId,
    RoundResult,
};

/// Record store collaborator. Every write that must stay consistent with another write is
/// exposed as a single method so implementations can wrap it in one transaction.
pub trait RecruitmentStore: Send + Sync {
    fn capacity(&self, key: &CapacityKey) -> Result<Option<CapacityRecord>, RepositoryError>;
    fn capacities(&self) -> Result<Vec<CapacityRecord>, RepositoryError>;
    fn upsert_capacity(&self, record: CapacityRecord) -> Result<CapacityRecord, RepositoryError>;
    /// Replace the record only if the stored version still equals `expected_version`.
    /// Returns `RepositoryError::Conflict` when another writer got there first.
    fn swap_capacity(
        &self,
        expected_version: u64,
        record: CapacityRecord,
    ) -> Result<(), RepositoryError>;

    fn job_request(&self, id: &JobRequestId) -> Result<Option<JobRequest>, RepositoryError>;
    fn upsert_job_request(&self, request: JobRequest) -> Result<JobRequest, RepositoryError>;

    fn candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, RepositoryError>;

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn applications_where(
        &self,
        predicate: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;

    fn round(&self, id: &RoundId) -> Result<Option<InterviewRound>, RepositoryError>;
    fn rounds_where(
        &self,
        predicate: &dyn Fn(&InterviewRound) -> bool,
    ) -> Result<Vec<InterviewRound>, RepositoryError>;
    /// Upsert a round and write its owning application's derived fields atomically.
    fn commit_round(
        &self,
        round: InterviewRound,
        application: Application,
    ) -> Result<(), RepositoryError>;
    /// Delete a round and write its owning application's derived fields atomically.
    fn commit_round_removal(
        &self,
        round_id: &RoundId,
        application: Application,
    ) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound result notification (e-mail or messaging adapters).
pub trait OutcomeNotifier: Send + Sync {
    fn notify_outcome(&self, application: &Application, outcome: Outcome)
        -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub job_request_id: JobRequestId,
    pub status: &'static str,
    pub score: f64,
    pub rounds: Vec<RoundSummary>,
}

impl ApplicationStatusView {
    pub fn new(application: &Application, rounds: &[InterviewRound]) -> Self {
        Self {
            application_id: application.id.clone(),
            candidate_id: application.candidate_id.clone(),
            job_request_id: application.job_request_id.clone(),
            status: application.status.label(),
            score: application.score,
            rounds: rounds.iter().map(RoundSummary::from).collect(),
        }
    }

    pub fn pending_rounds(&self) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.result == RoundResult::Pending.label())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round_id: RoundId,
    pub label: String,
    pub scheduled_at: String,
    pub result: &'static str,
    pub score: f64,
}

impl From<&InterviewRound> for RoundSummary {
    fn from(round: &InterviewRound) -> Self {
        Self {
            round_id: round.id.clone(),
            label: round.label.clone(),
            scheduled_at: round.scheduled_at.to_rfc3339(),
            result: round.result.label(),
            score: round.score,
        }
    }
}
