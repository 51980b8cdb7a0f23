use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, Candidate, CandidateId, CapacityKey, CapacityRecord,
    InterviewRound, Interviewer, InterviewerId, JobRequest, JobRequestId, RoundId,
};
use super::repository::{RecruitmentStore, RepositoryError};

/// Process-local store used by the API binary, demos and tests.
///
/// All tables sit behind one mutex, so multi-record commits are atomic.
#[derive(Debug, Default)]
pub struct InMemoryRecruitmentStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    capacity: BTreeMap<CapacityKey, CapacityRecord>,
    job_requests: HashMap<JobRequestId, JobRequest>,
    candidates: HashMap<CandidateId, Candidate>,
    interviewers: HashMap<InterviewerId, Interviewer>,
    applications: HashMap<ApplicationId, Application>,
    rounds: HashMap<RoundId, InterviewRound>,
}

impl InMemoryRecruitmentStore {
    pub fn register_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.candidates.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    pub fn register_interviewer(&self, interviewer: Interviewer) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.interviewers.insert(interviewer.id.clone(), interviewer);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl RecruitmentStore for InMemoryRecruitmentStore {
    fn capacity(&self, key: &CapacityKey) -> Result<Option<CapacityRecord>, RepositoryError> {
        Ok(self.lock()?.capacity.get(key).cloned())
    }

    fn capacities(&self) -> Result<Vec<CapacityRecord>, RepositoryError> {
        Ok(self.lock()?.capacity.values().cloned().collect())
    }

    fn upsert_capacity(&self, record: CapacityRecord) -> Result<CapacityRecord, RepositoryError> {
        self.lock()?.capacity.insert(record.key, record.clone());
        Ok(record)
    }

    fn swap_capacity(
        &self,
        expected_version: u64,
        record: CapacityRecord,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.capacity.get(&record.key) {
            Some(current) if current.version == expected_version => {
                tables.capacity.insert(record.key, record);
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn job_request(&self, id: &JobRequestId) -> Result<Option<JobRequest>, RepositoryError> {
        Ok(self.lock()?.job_requests.get(id).cloned())
    }

    fn upsert_job_request(&self, request: JobRequest) -> Result<JobRequest, RepositoryError> {
        self.lock()?
            .job_requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.lock()?.candidates.get(id).cloned())
    }

    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, RepositoryError> {
        Ok(self.lock()?.interviewers.get(id).cloned())
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn applications_where(
        &self,
        predicate: &dyn Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| predicate(application))
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        let duplicate = tables.applications.values().any(|existing| {
            existing.id == application.id
                || (existing.candidate_id == application.candidate_id
                    && existing.job_request_id == application.job_request_id)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    fn round(&self, id: &RoundId) -> Result<Option<InterviewRound>, RepositoryError> {
        Ok(self.lock()?.rounds.get(id).cloned())
    }

    fn rounds_where(
        &self,
        predicate: &dyn Fn(&InterviewRound) -> bool,
    ) -> Result<Vec<InterviewRound>, RepositoryError> {
        Ok(self
            .lock()?
            .rounds
            .values()
            .filter(|round| predicate(round))
            .cloned()
            .collect())
    }

    fn commit_round(
        &self,
        round: InterviewRound,
        application: Application,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.rounds.insert(round.id.clone(), round);
        tables
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    fn commit_round_removal(
        &self,
        round_id: &RoundId,
        application: Application,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        let removed = tables.rounds.remove(round_id).is_some();
        if removed {
            tables
                .applications
                .insert(application.id.clone(), application);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::recruitment::domain::{ActorId, ApplicationStatus};
    use chrono::NaiveDate;

    fn capacity(version: u64) -> CapacityRecord {
        CapacityRecord {
            key: CapacityKey::new(1, 2, 2026),
            approved_count: 3,
            filled_count: 1,
            approved_on: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
            approver: ActorId("hr-director".to_string()),
            version,
        }
    }

    fn application(id: &str, candidate: &str) -> Application {
        Application {
            id: ApplicationId(id.to_string()),
            candidate_id: CandidateId(candidate.to_string()),
            job_request_id: JobRequestId("job-1".to_string()),
            status: ApplicationStatus::Submitted,
            score: 0.0,
            hired_on: None,
            updated_by: ActorId("recruiter".to_string()),
        }
    }

    #[test]
    fn swap_capacity_rejects_stale_versions() {
        let store = InMemoryRecruitmentStore::default();
        store.upsert_capacity(capacity(3)).expect("seed");

        let mut next = capacity(4);
        next.filled_count = 2;
        assert!(matches!(
            store.swap_capacity(2, next.clone()),
            Err(RepositoryError::Conflict)
        ));
        store.swap_capacity(3, next).expect("fresh version swaps");

        let stored = store
            .capacity(&CapacityKey::new(1, 2, 2026))
            .expect("read")
            .expect("present");
        assert_eq!(stored.filled_count, 2);
        assert_eq!(stored.version, 4);
    }

    #[test]
    fn insert_application_rejects_duplicate_candidate_posting_pairs() {
        let store = InMemoryRecruitmentStore::default();
        store
            .insert_application(application("app-1", "cand-1"))
            .expect("first insert");

        assert!(matches!(
            store.insert_application(application("app-2", "cand-1")),
            Err(RepositoryError::Conflict)
        ));
        store
            .insert_application(application("app-3", "cand-2"))
            .expect("different candidate inserts");
    }
}
