use super::common::*;
use std::sync::Arc;

use crate::workflows::recruitment::domain::{
    ActorId, Application, ApplicationId, ApplicationStatus, CandidateId, InterviewRound,
    JobRequestId, Outcome, RoundResult,
};
use crate::workflows::recruitment::memory::InMemoryRecruitmentStore;
use crate::workflows::recruitment::progression::ProgressionAggregator;
use crate::workflows::recruitment::repository::{RecruitmentStore, RepositoryError};

fn seed_rounds(
    store: &InMemoryRecruitmentStore,
    application_id: &ApplicationId,
    outcomes: &[(RoundResult, f64)],
) {
    let application = store
        .application(application_id)
        .expect("read")
        .expect("present");
    for (index, (result, score)) in outcomes.iter().enumerate() {
        let round = InterviewRound {
            scheduled_at: days_from_now(index as i64 + 1),
            ..stored_round(application_id, &format!("round-{index}"), *result, *score)
        };
        store
            .commit_round(round, application.clone())
            .expect("seed round");
    }
}

#[test]
fn recompute_with_a_pending_round_moves_score_only() {
    let (service, store, notifier, application) = service_with_application();
    seed_rounds(
        &store,
        &application.id,
        &[
            (RoundResult::Pass, 80.0),
            (RoundResult::Pass, 60.0),
            (RoundResult::Pending, 0.0),
        ],
    );

    let progression = service
        .recompute(&recruiter_ctx(), &application.id)
        .expect("recompute");
    assert_eq!(progression.application.score, 70.0);
    assert_eq!(progression.application.status, ApplicationStatus::InProgress);
    assert_eq!(progression.pending_rounds, 1);
    assert!(notifier.events().is_empty());
}

#[test]
fn recompute_persists_a_failure_and_notifies() {
    let (service, store, notifier, application) = service_with_application();
    seed_rounds(
        &store,
        &application.id,
        &[(RoundResult::Pass, 80.0), (RoundResult::Fail, 0.0)],
    );

    let progression = service
        .recompute(&approver_ctx(), &application.id)
        .expect("recompute");
    assert_eq!(progression.application.status, ApplicationStatus::Failed);
    assert_eq!(progression.application.score, 80.0);

    let stored = store
        .application(&application.id)
        .expect("read")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::Failed);
    assert_eq!(stored.updated_by.0, APPROVER);
    assert_eq!(notifier.events(), vec![(application.id, Outcome::Fail)]);
}

#[test]
fn repeated_recompute_does_not_notify_twice() {
    let (service, store, notifier, application) = service_with_application();
    seed_rounds(
        &store,
        &application.id,
        &[(RoundResult::Pass, 90.0), (RoundResult::Pass, 70.0)],
    );

    let ctx = recruiter_ctx();
    service.recompute(&ctx, &application.id).expect("first");
    let second = service.recompute(&ctx, &application.id).expect("second");

    assert_eq!(second.application.score, 80.0);
    assert!(second.transition.is_none());
    assert_eq!(notifier.events().len(), 1);
}

#[test]
fn notifier_failure_keeps_the_new_status() {
    let store = seeded_store();
    let application = Application {
        id: ApplicationId("app-notify".to_string()),
        candidate_id: CandidateId(CANDIDATE.to_string()),
        job_request_id: JobRequestId("job-notify".to_string()),
        status: ApplicationStatus::InProgress,
        score: 0.0,
        hired_on: None,
        updated_by: ActorId(RECRUITER.to_string()),
    };
    store
        .insert_application(application.clone())
        .expect("seed application");
    seed_rounds(&store, &application.id, &[(RoundResult::Pass, 64.0)]);

    let aggregator = ProgressionAggregator::new(store.clone(), Arc::new(FailingNotifier));
    let progression = aggregator
        .recompute(&recruiter_ctx(), &application.id)
        .expect("recompute");

    assert_eq!(progression.transition, Some(Outcome::Pass));
    let stored = store
        .application(&application.id)
        .expect("read")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::Passed);
}

#[test]
fn recompute_of_unknown_application_is_not_found() {
    let store = seeded_store();
    let aggregator = ProgressionAggregator::new(store, Arc::new(FailingNotifier));

    assert!(matches!(
        aggregator.recompute(&recruiter_ctx(), &ApplicationId("app-ghost".to_string())),
        Err(RepositoryError::NotFound)
    ));
}
