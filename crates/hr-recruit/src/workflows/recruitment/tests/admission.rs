use super::common::*;
use std::sync::Arc;

use crate::workflows::recruitment::access::StaticRoleAuthority;
use crate::workflows::recruitment::admission::{
    AdmissionController, AdmissionError, AdmissionRejection,
};
use crate::workflows::recruitment::capacity::CapacityLedger;
use crate::workflows::recruitment::memory::InMemoryRecruitmentStore;
use crate::workflows::recruitment::repository::RecruitmentStore;

fn controller(
    approved: u32,
    filled: u32,
) -> AdmissionController<InMemoryRecruitmentStore, StaticRoleAuthority> {
    let store = Arc::new(InMemoryRecruitmentStore::default());
    store
        .upsert_capacity(capacity_record(approved, filled))
        .expect("seed capacity");
    let ledger = Arc::new(CapacityLedger::new(store, Arc::new(authority())));
    AdmissionController::new(ledger)
}

#[test]
fn request_within_capacity_is_accepted_and_approved() {
    let decision = controller(3, 1).evaluate(&draft(2), false).expect("evaluate");

    assert!(decision.accepted);
    assert!(decision.headcount_approved);
    assert!(decision.rejection.is_none());
    assert_eq!(decision.check.expect("check attached").remaining, 2);
}

#[test]
fn request_over_capacity_is_rejected_without_override() {
    let decision = controller(3, 1).evaluate(&draft(3), false).expect("evaluate");

    assert!(!decision.accepted);
    assert!(!decision.headcount_approved);
    assert_eq!(
        decision.rejection,
        Some(AdmissionRejection::CapacityExceeded)
    );
    assert!(decision.detail.contains("override"));
}

#[test]
fn override_always_accepts_without_approving_headcount() {
    for (approved, filled, requested) in [(3, 1, 2), (3, 1, 10), (0, 0, 1)] {
        let decision = controller(approved, filled)
            .evaluate(&draft(requested), true)
            .expect("evaluate");
        assert!(decision.accepted);
        assert!(!decision.headcount_approved);
    }
}

#[test]
fn zero_vacancies_is_a_validation_error() {
    assert!(matches!(
        controller(3, 0).evaluate(&draft(0), false),
        Err(AdmissionError::Validation(_))
    ));
}

#[test]
fn edit_without_admission_changes_keeps_the_previous_decision() {
    let controller = controller(1, 1);
    let mut stored = job_request("job-edit", 2);
    stored.headcount_approved = false;
    let mut edited = draft(2);
    edited.title = "Senior Backend Engineer".to_string();

    let decision = controller
        .evaluate_edit(&stored, &edited, false)
        .expect("evaluate");
    assert!(decision.accepted);
    assert!(!decision.headcount_approved);
    assert!(decision.check.is_none());
}

#[test]
fn edit_raising_vacancies_is_checked_again() {
    let controller = controller(3, 1);
    let stored = job_request("job-edit", 1);

    let decision = controller
        .evaluate_edit(&stored, &draft(4), false)
        .expect("evaluate");
    assert!(!decision.accepted);
    assert_eq!(
        decision.rejection,
        Some(AdmissionRejection::CapacityExceeded)
    );
}
