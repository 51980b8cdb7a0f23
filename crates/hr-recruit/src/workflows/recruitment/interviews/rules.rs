use chrono::{DateTime, Utc};

use super::super::domain::{Application, InterviewRound, Interviewer, RoundResult};
use super::{RecordMode, RoundDraft, RoundRejection};

const MAX_SCORE: f64 = 100.0;

/// Everything a rule may look at when judging one round write.
pub(crate) struct RoundCandidate<'a> {
    pub draft: &'a RoundDraft,
    pub mode: RecordMode,
    /// The stored round being edited (update only).
    pub stored: Option<&'a InterviewRound>,
    /// Other rounds of the same application, excluding the one being edited.
    pub siblings: &'a [InterviewRound],
    pub application: Option<&'a Application>,
    pub interviewer: Option<&'a Interviewer>,
    pub now: DateTime<Utc>,
}

impl RoundCandidate<'_> {
    fn incoming_result(&self) -> RoundResult {
        self.draft.result.unwrap_or_default()
    }
}

type RoundRule = fn(&RoundCandidate<'_>) -> Option<RoundRejection>;

/// Checks shared by create and update, in evaluation order.
const PIPELINE: [RoundRule; 6] = [
    well_formed,
    references_exist,
    stored_round_is_open,
    scheduled_in_future,
    label_is_unique,
    pending_slot_is_free,
];

/// First rejection in pipeline order, if any.
pub(crate) fn validate(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    PIPELINE.iter().find_map(|rule| rule(candidate))
}

fn well_formed(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    let score = candidate.draft.score;
    if !score.is_finite() || !(0.0..=MAX_SCORE).contains(&score) {
        return Some(RoundRejection::Validation {
            detail: format!("score {score} must be between 0 and {MAX_SCORE}"),
        });
    }

    if candidate.mode == RecordMode::Update {
        let Some(id) = &candidate.draft.id else {
            return Some(RoundRejection::Validation {
                detail: "update requires the id of the round being edited".to_string(),
            });
        };
        let Some(stored) = candidate.stored else {
            return Some(RoundRejection::NotFound {
                what: format!("interview round {}", id.0),
            });
        };
        if stored.application_id != candidate.draft.application_id {
            return Some(RoundRejection::Validation {
                detail: format!(
                    "round {} belongs to application {}",
                    id.0, stored.application_id.0
                ),
            });
        }
    }

    None
}

fn references_exist(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    if candidate.application.is_none() {
        return Some(RoundRejection::NotFound {
            what: format!("application {}", candidate.draft.application_id.0),
        });
    }
    if candidate.interviewer.is_none() {
        return Some(RoundRejection::NotFound {
            what: format!("interviewer {}", candidate.draft.interviewer_id.0),
        });
    }
    None
}

fn stored_round_is_open(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    candidate
        .stored
        .filter(|stored| stored.result.is_terminal())
        .map(|stored| RoundRejection::ImmutableRound {
            round_id: stored.id.clone(),
            result: stored.result,
        })
}

/// Terminal rounds may carry past dates so historical interviews can be entered.
fn scheduled_in_future(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    if candidate.incoming_result().is_terminal() || candidate.draft.scheduled_at > candidate.now
    {
        return None;
    }
    Some(RoundRejection::PastSchedule {
        scheduled_at: candidate.draft.scheduled_at,
    })
}

fn label_is_unique(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    let label = normalize_label(&candidate.draft.label);
    if label.is_empty() {
        return None;
    }
    candidate
        .siblings
        .iter()
        .find(|round| normalize_label(&round.label) == label)
        .map(|round| RoundRejection::DuplicateRound {
            label: candidate.draft.label.trim().to_string(),
            existing: round.id.clone(),
        })
}

fn pending_slot_is_free(candidate: &RoundCandidate<'_>) -> Option<RoundRejection> {
    if candidate.incoming_result() != RoundResult::Pending {
        return None;
    }
    let date = candidate.draft.scheduled_at.date_naive();
    candidate
        .siblings
        .iter()
        .find(|round| round.result == RoundResult::Pending && round.scheduled_on() == date)
        .map(|round| RoundRejection::ScheduleConflict {
            date,
            existing: round.id.clone(),
        })
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::recruitment::domain::{
        ActorId, ApplicationId, ApplicationStatus, CandidateId, InterviewerId, JobRequestId,
        RoundId,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn application() -> Application {
        Application {
            id: ApplicationId("app-1".to_string()),
            candidate_id: CandidateId("cand-1".to_string()),
            job_request_id: JobRequestId("job-1".to_string()),
            status: ApplicationStatus::Submitted,
            score: 0.0,
            hired_on: None,
            updated_by: ActorId("recruiter".to_string()),
        }
    }

    fn interviewer() -> Interviewer {
        Interviewer {
            id: InterviewerId("int-1".to_string()),
            name: "Dana Reyes".to_string(),
            email: "dana@example.com".to_string(),
        }
    }

    fn draft(label: &str, day: u32) -> RoundDraft {
        RoundDraft {
            id: None,
            application_id: ApplicationId("app-1".to_string()),
            interviewer_id: InterviewerId("int-1".to_string()),
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, day, 14, 0, 0).unwrap(),
            label: label.to_string(),
            result: None,
            score: 0.0,
        }
    }

    fn stored(id: &str, label: &str, day: u32, result: RoundResult) -> InterviewRound {
        InterviewRound {
            id: RoundId(id.to_string()),
            application_id: ApplicationId("app-1".to_string()),
            interviewer_id: InterviewerId("int-1".to_string()),
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
            label: label.to_string(),
            result,
            score: 0.0,
            created_at: now(),
            updated_by: ActorId("recruiter".to_string()),
        }
    }

    fn judge(draft: &RoundDraft, siblings: &[InterviewRound]) -> Option<RoundRejection> {
        let application = application();
        let interviewer = interviewer();
        validate(&RoundCandidate {
            draft,
            mode: RecordMode::Create,
            stored: None,
            siblings,
            application: Some(&application),
            interviewer: Some(&interviewer),
            now: now(),
        })
    }

    #[test]
    fn labels_compare_trimmed_and_case_insensitive() {
        let siblings = [stored("round-1", "Technical", 5, RoundResult::Pass)];
        let rejection = judge(&draft("  technical ", 9), &siblings);
        assert!(matches!(
            rejection,
            Some(RoundRejection::DuplicateRound { ref label, .. }) if label == "technical"
        ));
    }

    #[test]
    fn empty_labels_are_never_duplicates() {
        let siblings = [stored("round-1", "", 5, RoundResult::Pass)];
        assert!(judge(&draft("   ", 9), &siblings).is_none());
    }

    #[test]
    fn terminal_rounds_do_not_block_a_pending_slot() {
        let siblings = [stored("round-1", "Screening", 9, RoundResult::Fail)];
        assert!(judge(&draft("Technical", 9), &siblings).is_none());
    }

    #[test]
    fn terminal_incoming_round_skips_slot_and_date_checks() {
        let siblings = [stored("round-1", "Screening", 9, RoundResult::Pending)];
        let mut past = draft("Technical", 9);
        past.scheduled_at = Utc.with_ymd_and_hms(2026, 2, 9, 10, 0, 0).unwrap();
        past.result = Some(RoundResult::Pass);
        past.score = 75.0;
        assert!(judge(&past, &siblings).is_none());
    }

    #[test]
    fn score_outside_range_is_a_validation_error_before_lookups() {
        let mut bad = draft("Technical", 9);
        bad.score = 120.0;
        let rejection = validate(&RoundCandidate {
            draft: &bad,
            mode: RecordMode::Create,
            stored: None,
            siblings: &[],
            application: None,
            interviewer: None,
            now: now(),
        });
        assert!(matches!(rejection, Some(RoundRejection::Validation { .. })));
    }

    #[test]
    fn scheduled_exactly_now_counts_as_past() {
        let mut at_now = draft("Technical", 1);
        at_now.scheduled_at = now();
        assert!(matches!(
            judge(&at_now, &[]),
            Some(RoundRejection::PastSchedule { .. })
        ));
    }
}
