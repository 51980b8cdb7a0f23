use crate::infra::RecruitmentRuntime;
use chrono::Duration;
use clap::Args;
use hr_recruit::config::{AppConfig, RecruitmentConfig};
use hr_recruit::error::AppError;
use hr_recruit::workflows::headcount_plan::HeadcountPlanImporter;
use hr_recruit::workflows::recruitment::{
    ActorId, Candidate, CandidateId, CapacityKey, CapacityRecord, DepartmentId, Interviewer,
    InterviewerId, JobRequestDraft, PositionId, RecordMode, RequestContext, RoundDecision,
    RoundDraft, RoundResult,
};
use std::path::PathBuf;

const DEMO_APPROVER: &str = "hr-director";
const DEMO_RECRUITER: &str = "recruiter";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional headcount plan CSV used instead of the built-in allowance.
    #[arg(long)]
    pub(crate) headcount_plan: Option<PathBuf>,
    /// Stop after the admission portion of the demo.
    #[arg(long)]
    pub(crate) skip_interviews: bool,
}

#[derive(Args, Debug)]
pub(crate) struct HeadcountImportArgs {
    /// Headcount plan CSV (Department,Position,Year,Approved,Approved On)
    pub(crate) path: PathBuf,
    /// Approver to import as (defaults to the first entry of RECRUIT_HEADCOUNT_APPROVERS)
    #[arg(long)]
    pub(crate) actor: Option<String>,
    /// Print the resulting ledger as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_headcount_import(args: HeadcountImportArgs) -> Result<(), AppError> {
    let HeadcountImportArgs { path, actor, json } = args;
    let config = AppConfig::load()?;
    let actor = match actor {
        Some(actor) => ActorId(actor),
        None => config.recruitment.primary_approver()?.clone(),
    };

    let runtime = RecruitmentRuntime::in_memory(&config.recruitment);
    let ctx = RequestContext::current(actor);
    let report = HeadcountPlanImporter::from_path(&path, runtime.service.ledger(), &ctx)?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Ledger payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!(
        "Imported {} allowance(s), {} seat(s) approved by {}",
        report.approved.len(),
        report.total_seats(),
        ctx.actor
    );
    for record in &report.approved {
        print_capacity(record);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        headcount_plan,
        skip_interviews,
    } = args;

    let runtime = RecruitmentRuntime::in_memory(&RecruitmentConfig {
        headcount_approvers: vec![ActorId(DEMO_APPROVER.to_string())],
    });
    let service = &runtime.service;
    let approver = RequestContext::current(ActorId(DEMO_APPROVER.to_string()));
    let recruiter = RequestContext::current(ActorId(DEMO_RECRUITER.to_string()));
    let key = CapacityKey::new(1, 2, 2026);

    println!("Recruitment admission demo");
    match headcount_plan {
        Some(path) => {
            let report = HeadcountPlanImporter::from_path(&path, service.ledger(), &approver)?;
            println!("- Loaded {} allowance(s) from {}", report.approved.len(), path.display());
        }
        None => {
            service.approve_headcount(&approver, key, 3)?;
            service.ledger().increment_filled(&key, 1)?;
            println!("- Approved 3 seats for {key} and recorded 1 existing hire");
        }
    }
    for record in service.ledger().snapshot()? {
        print_capacity(&record);
    }

    let check = service.check_admission(&key, 2)?;
    println!(
        "\nCheck for 2 vacancies: approved={} remaining={} ({})",
        check.approved, check.remaining, check.message
    );

    let draft = JobRequestDraft {
        department_id: DepartmentId(1),
        position_id: PositionId(2),
        year: 2026,
        title: "Backend Engineer".to_string(),
        requested_vacancies: 3,
    };
    let rejected = service.submit_job_request(&recruiter, draft.clone(), false)?;
    println!(
        "Request for 3 vacancies: accepted={} ({})",
        rejected.decision.accepted, rejected.decision.detail
    );
    let overridden = service.submit_job_request(&recruiter, draft, true)?;
    println!(
        "Resubmitted with override: accepted={} headcount_approved={}",
        overridden.decision.accepted, overridden.decision.headcount_approved
    );

    let Some(request) = overridden.request else {
        println!("  Job request was not stored");
        return Ok(());
    };
    if skip_interviews {
        return Ok(());
    }

    println!("\nInterview progression demo");
    runtime.store.register_candidate(Candidate {
        id: CandidateId("cand-001".to_string()),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    })?;
    runtime.store.register_interviewer(Interviewer {
        id: InterviewerId("int-001".to_string()),
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
    })?;

    let application = service.submit_application(
        &recruiter,
        CandidateId("cand-001".to_string()),
        request.id.clone(),
    )?;
    println!(
        "- Application {} submitted for {} ({})",
        application.id.0, request.id.0, request.title
    );

    let mut round_ids = Vec::new();
    for (label, days) in [("Technical", 1), ("Culture", 2)] {
        let draft = RoundDraft {
            id: None,
            application_id: application.id.clone(),
            interviewer_id: InterviewerId("int-001".to_string()),
            scheduled_at: recruiter.now + Duration::days(days),
            label: label.to_string(),
            result: None,
            score: 0.0,
        };
        match service.record_round(&recruiter, draft.clone(), RecordMode::Create)? {
            RoundDecision::Accepted(recorded) => {
                println!(
                    "- Scheduled '{}' on {} -> application {}",
                    recorded.round.label,
                    recorded.round.scheduled_on(),
                    recorded.application.status.label()
                );
                round_ids.push((recorded.round.id, draft));
            }
            RoundDecision::Rejected(rejection) => println!("- Rejected: {}", rejection.summary()),
        }
    }

    let duplicate = RoundDraft {
        id: None,
        application_id: application.id.clone(),
        interviewer_id: InterviewerId("int-001".to_string()),
        scheduled_at: recruiter.now + Duration::days(5),
        label: "technical".to_string(),
        result: None,
        score: 0.0,
    };
    if let RoundDecision::Rejected(rejection) =
        service.record_round(&recruiter, duplicate, RecordMode::Create)?
    {
        println!("- Duplicate label refused: {}", rejection.summary());
    }

    for ((round_id, draft), score) in round_ids.into_iter().zip([90.0, 70.0]) {
        let finalized = RoundDraft {
            id: Some(round_id),
            result: Some(RoundResult::Pass),
            score,
            ..draft
        };
        match service.record_round(&recruiter, finalized, RecordMode::Update)? {
            RoundDecision::Accepted(recorded) => println!(
                "- '{}' passed with {} -> application {} (score {:.2})",
                recorded.round.label,
                recorded.round.score,
                recorded.application.status.label(),
                recorded.application.score
            ),
            RoundDecision::Rejected(rejection) => println!("- Rejected: {}", rejection.summary()),
        }
    }

    let seat_filled = service.confirm_hire(&approver, &application.id)?;
    println!("- Hire confirmed, seat filled: {seat_filled}");
    for record in service.ledger().snapshot()? {
        print_capacity(&record);
    }

    let notices = runtime.notifier.notices();
    if notices.is_empty() {
        println!("  Outcome notices: none dispatched");
    } else {
        println!("  Outcome notices:");
        for notice in notices {
            println!(
                "    - {} -> {} (score {:.2})",
                notice.application_id.0,
                notice.outcome.label(),
                notice.score
            );
        }
    }

    let view = service.application_status(&application.id)?;
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("  Public status payload:\n{}", json),
        Err(err) => println!("  Public status payload unavailable: {}", err),
    }

    Ok(())
}

fn print_capacity(record: &CapacityRecord) {
    println!(
        "  - {}: approved {} | filled {} | remaining {} (approved {} by {})",
        record.key,
        record.approved_count,
        record.filled_count,
        record.remaining(),
        record.approved_on,
        record.approver
    );
}
