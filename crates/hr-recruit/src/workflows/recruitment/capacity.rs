use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::access::{RequestContext, Role, RoleAuthority};
use super::domain::{ActorId, CapacityKey, CapacityRecord};
use super::repository::{RecruitmentStore, RepositoryError};

const NO_RECORD_MESSAGE: &str = "no capacity record for this period";

/// Answer to "can `requested` more hires be admitted for this key?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionCheck {
    pub approved: bool,
    pub remaining: u32,
    pub approved_total: u32,
    pub filled_total: u32,
    pub message: String,
}

/// Headcount ledger keyed by department, position and year.
pub struct CapacityLedger<S, A> {
    store: Arc<S>,
    authority: Arc<A>,
}

impl<S, A> CapacityLedger<S, A>
where
    S: RecruitmentStore + 'static,
    A: RoleAuthority + 'static,
{
    pub fn new(store: Arc<S>, authority: Arc<A>) -> Self {
        Self { store, authority }
    }

    /// Seats still open. A missing record means zero capacity, never unlimited.
    pub fn remaining(&self, key: &CapacityKey) -> Result<u32, LedgerError> {
        Ok(self
            .store
            .capacity(key)?
            .map(|record| record.remaining())
            .unwrap_or(0))
    }

    pub fn check_admission(
        &self,
        key: &CapacityKey,
        requested: u32,
    ) -> Result<AdmissionCheck, LedgerError> {
        let Some(record) = self.store.capacity(key)? else {
            return Ok(AdmissionCheck {
                approved: false,
                remaining: 0,
                approved_total: 0,
                filled_total: 0,
                message: NO_RECORD_MESSAGE.to_string(),
            });
        };

        let remaining = record.remaining();
        let approved = remaining >= requested;
        let message = if approved {
            format!("{requested} of {remaining} remaining seat(s) available for {key}")
        } else {
            format!(
                "requested {requested} exceeds remaining {remaining} (approved {}, filled {}) for {key}",
                record.approved_count, record.filled_count
            )
        };

        Ok(AdmissionCheck {
            approved,
            remaining,
            approved_total: record.approved_count,
            filled_total: record.filled_count,
            message,
        })
    }

    /// Approve `count` seats for the key as of the context date.
    pub fn approve(
        &self,
        ctx: &RequestContext,
        key: CapacityKey,
        count: u32,
    ) -> Result<CapacityRecord, LedgerError> {
        self.approve_as_of(ctx, key, count, ctx.now.date_naive())
    }

    /// Approve with an explicit approval date, e.g. when loading a headcount plan.
    pub fn approve_as_of(
        &self,
        ctx: &RequestContext,
        key: CapacityKey,
        count: u32,
        approved_on: NaiveDate,
    ) -> Result<CapacityRecord, LedgerError> {
        let existing = self.verify_approval(ctx, &key, count)?;
        let (filled_count, version) = existing
            .as_ref()
            .map(|record| (record.filled_count, record.version + 1))
            .unwrap_or((0, 1));

        let record = self.store.upsert_capacity(CapacityRecord {
            key,
            approved_count: count,
            filled_count,
            approved_on,
            approver: ctx.actor.clone(),
            version,
        })?;

        info!(
            actor = %ctx.actor,
            %key,
            approved = record.approved_count,
            filled = record.filled_count,
            "headcount approved"
        );
        Ok(record)
    }

    /// Check that `ctx` may approve `count` seats for the key without writing anything.
    /// Returns the current record, if any.
    pub fn verify_approval(
        &self,
        ctx: &RequestContext,
        key: &CapacityKey,
        count: u32,
    ) -> Result<Option<CapacityRecord>, LedgerError> {
        if !self.authority.has_role(&ctx.actor, Role::HeadcountApprover) {
            warn!(actor = %ctx.actor, %key, "headcount approval denied");
            return Err(LedgerError::PermissionDenied {
                actor: ctx.actor.clone(),
                role: Role::HeadcountApprover,
            });
        }

        let existing = self.store.capacity(key)?;
        let filled_count = existing.as_ref().map_or(0, |record| record.filled_count);
        if count < filled_count {
            return Err(LedgerError::Validation(format!(
                "approved count {count} is below the {filled_count} seat(s) already filled for {key}"
            )));
        }
        Ok(existing)
    }

    /// Add `by` filled seats. Returns `false` (and logs) instead of exceeding the approval.
    pub fn increment_filled(&self, key: &CapacityKey, by: u32) -> Result<bool, LedgerError> {
        self.adjust_filled(key, by, FillAdjustment::Increment)
    }

    /// Release `by` filled seats. Returns `false` (and logs) instead of going below zero.
    pub fn decrement_filled(&self, key: &CapacityKey, by: u32) -> Result<bool, LedgerError> {
        self.adjust_filled(key, by, FillAdjustment::Decrement)
    }

    pub fn snapshot(&self) -> Result<Vec<CapacityRecord>, LedgerError> {
        Ok(self.store.capacities()?)
    }

    fn adjust_filled(
        &self,
        key: &CapacityKey,
        by: u32,
        adjustment: FillAdjustment,
    ) -> Result<bool, LedgerError> {
        if by == 0 {
            return Err(LedgerError::Validation(
                "fill adjustment must be positive".to_string(),
            ));
        }

        let Some(record) = self.store.capacity(key)? else {
            warn!(%key, by, "fill adjustment skipped: {NO_RECORD_MESSAGE}");
            return Ok(false);
        };

        let next = match adjustment {
            FillAdjustment::Increment => record
                .filled_count
                .checked_add(by)
                .filter(|filled| *filled <= record.approved_count),
            FillAdjustment::Decrement => record.filled_count.checked_sub(by),
        };

        let Some(filled_count) = next else {
            warn!(
                %key,
                by,
                ?adjustment,
                approved = record.approved_count,
                filled = record.filled_count,
                "fill adjustment would leave the approved range"
            );
            return Ok(false);
        };

        let expected_version = record.version;
        self.store.swap_capacity(
            expected_version,
            CapacityRecord {
                filled_count,
                version: expected_version + 1,
                ..record
            },
        )?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy)]
enum FillAdjustment {
    Increment,
    Decrement,
}

/// Failures raised by the capacity ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("actor {actor} lacks the {} role", .role.label())]
    PermissionDenied { actor: ActorId, role: Role },
    #[error("invalid capacity request: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
