//! Recruitment admission and interview progression.
//!
//! Job requests are gated by the headcount ledger; interview rounds are validated per
//! application and folded into the application's derived score and status.

pub mod access;
pub mod admission;
pub mod capacity;
pub mod domain;
pub mod interviews;
pub mod memory;
pub mod progression;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{RequestContext, Role, RoleAuthority, StaticRoleAuthority};
pub use admission::{AdmissionController, AdmissionDecision, AdmissionError, AdmissionRejection};
pub use capacity::{AdmissionCheck, CapacityLedger, LedgerError};
pub use domain::{
    ActorId, Application, ApplicationId, ApplicationStatus, Candidate, CandidateId, CapacityKey,
    CapacityRecord, DepartmentId, InterviewRound, Interviewer, InterviewerId, JobRequest,
    JobRequestDraft, JobRequestId, Outcome, PositionId, RoundId, RoundResult,
};
pub use interviews::{
    InterviewRoundTracker, RecordMode, RecordedRound, RoundDecision, RoundDraft, RoundRejection,
};
pub use memory::InMemoryRecruitmentStore;
pub use progression::{Progression, ProgressionAggregator};
pub use repository::{
    ApplicationStatusView, NotifyError, OutcomeNotifier, RecruitmentStore, RepositoryError,
    RoundSummary,
};
pub use router::{recruitment_router, ACTOR_HEADER};
pub use service::{JobRequestSubmission, RecruitmentService, RecruitmentServiceError};
