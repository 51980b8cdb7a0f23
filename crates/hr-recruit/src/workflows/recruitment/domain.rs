use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the person performing an operation (approver, recruiter, interviewer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterviewerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRequestId(pub String);

/// Identifier wrapper for candidate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundId(pub String);

/// Ledger key: one approved headcount allowance per department, position and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapacityKey {
    pub department_id: DepartmentId,
    pub position_id: PositionId,
    pub year: i32,
}

impl CapacityKey {
    pub const fn new(department_id: u32, position_id: u32, year: i32) -> Self {
        Self {
            department_id: DepartmentId(department_id),
            position_id: PositionId(position_id),
            year,
        }
    }
}

impl fmt::Display for CapacityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "department {} / position {} / {}",
            self.department_id.0, self.position_id.0, self.year
        )
    }
}

/// Approved versus filled headcount for one ledger key.
///
/// `filled_count` never exceeds `approved_count`. `version` increases on every write so
/// concurrent fill adjustments can be detected by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRecord {
    pub key: CapacityKey,
    pub approved_count: u32,
    pub filled_count: u32,
    pub approved_on: NaiveDate,
    pub approver: ActorId,
    pub version: u64,
}

impl CapacityRecord {
    pub fn remaining(&self) -> u32 {
        self.approved_count.saturating_sub(self.filled_count)
    }
}

/// Admission-relevant fields supplied by whoever opens or edits a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequestDraft {
    pub department_id: DepartmentId,
    pub position_id: PositionId,
    pub year: i32,
    pub title: String,
    pub requested_vacancies: u32,
}

impl JobRequestDraft {
    pub fn capacity_key(&self) -> CapacityKey {
        CapacityKey {
            department_id: self.department_id,
            position_id: self.position_id,
            year: self.year,
        }
    }
}

/// Stored job posting. `headcount_approved` is only ever written by admission control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub id: JobRequestId,
    pub department_id: DepartmentId,
    pub position_id: PositionId,
    pub year: i32,
    pub title: String,
    pub requested_vacancies: u32,
    pub headcount_approved: bool,
    pub requested_by: ActorId,
    pub updated_by: ActorId,
}

impl JobRequest {
    pub fn capacity_key(&self) -> CapacityKey {
        CapacityKey {
            department_id: self.department_id,
            position_id: self.position_id,
            year: self.year,
        }
    }

    /// True when the draft touches a field that admission control cares about.
    pub fn admission_fields_differ(&self, draft: &JobRequestDraft) -> bool {
        self.capacity_key() != draft.capacity_key()
            || self.requested_vacancies != draft.requested_vacancies
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: InterviewerId,
    pub name: String,
    pub email: String,
}

/// Aggregate status of an application across all of its interview rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    InProgress,
    Passed,
    Failed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Passed => "passed",
            ApplicationStatus::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Passed | ApplicationStatus::Failed)
    }
}

/// One candidate applying to one job request. `status` and `score` are derived from rounds.
///
/// `hired_on` is set when the hire took a seat from the ledger and cleared when it is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub job_request_id: JobRequestId,
    pub status: ApplicationStatus,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_on: Option<NaiveDate>,
    pub updated_by: ActorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    #[default]
    Pending,
    Pass,
    Fail,
}

impl RoundResult {
    pub const fn label(self) -> &'static str {
        match self {
            RoundResult::Pending => "pending",
            RoundResult::Pass => "pass",
            RoundResult::Fail => "fail",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RoundResult::Pass | RoundResult::Fail)
    }
}

/// A scheduled interview for one application. Terminal rounds are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRound {
    pub id: RoundId,
    pub application_id: ApplicationId,
    pub interviewer_id: InterviewerId,
    pub scheduled_at: DateTime<Utc>,
    pub label: String,
    pub result: RoundResult,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_by: ActorId,
}

impl InterviewRound {
    pub fn scheduled_on(&self) -> NaiveDate {
        self.scheduled_at.date_naive()
    }
}

/// Outcome reported to the candidate once an application becomes terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Pass => "Pass",
            Outcome::Fail => "Fail",
        }
    }

    pub const fn from_status(status: ApplicationStatus) -> Option<Self> {
        match status {
            ApplicationStatus::Passed => Some(Outcome::Pass),
            ApplicationStatus::Failed => Some(Outcome::Fail),
            ApplicationStatus::Submitted | ApplicationStatus::InProgress => None,
        }
    }
}
