//! Headcount plan import: loads approved allowances from a CSV export into the capacity ledger.

mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::workflows::recruitment::{
    CapacityKey, CapacityLedger, CapacityRecord, LedgerError, RecruitmentStore, RequestContext,
    RoleAuthority,
};
use parser::{ParseFailure, PlanRow};

#[derive(Debug)]
pub enum HeadcountImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, reason: String },
    Ledger { line: u64, source: LedgerError },
}

impl std::fmt::Display for HeadcountImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadcountImportError::Io(err) => write!(f, "failed to read headcount plan: {}", err),
            HeadcountImportError::Csv(err) => write!(f, "invalid headcount plan CSV: {}", err),
            HeadcountImportError::Row { line, reason } => {
                write!(f, "headcount plan line {}: {}", line, reason)
            }
            HeadcountImportError::Ledger { line, source } => write!(
                f,
                "could not approve headcount from plan line {}: {}",
                line, source
            ),
        }
    }
}

impl std::error::Error for HeadcountImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeadcountImportError::Io(err) => Some(err),
            HeadcountImportError::Csv(err) => Some(err),
            HeadcountImportError::Row { .. } => None,
            HeadcountImportError::Ledger { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for HeadcountImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseFailure> for HeadcountImportError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::Csv(err) => Self::Csv(err),
            ParseFailure::Row { line, reason } => Self::Row { line, reason },
        }
    }
}

/// Records written by one import, in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadcountImportReport {
    pub approved: Vec<CapacityRecord>,
}

impl HeadcountImportReport {
    pub fn total_seats(&self) -> u32 {
        self.approved
            .iter()
            .map(|record| record.approved_count)
            .sum()
    }
}

pub struct HeadcountPlanImporter;

impl HeadcountPlanImporter {
    pub fn from_path<P, S, A>(
        path: P,
        ledger: &CapacityLedger<S, A>,
        ctx: &RequestContext,
    ) -> Result<HeadcountImportReport, HeadcountImportError>
    where
        P: AsRef<Path>,
        S: RecruitmentStore + 'static,
        A: RoleAuthority + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, ledger, ctx)
    }

    /// Parse and check the whole plan first: nothing reaches the ledger unless every row is
    /// well formed and the ledger would accept it. Only a store failure during the write pass
    /// can leave an import partial. Blank approval dates default to the date of the import.
    pub fn from_reader<R, S, A>(
        reader: R,
        ledger: &CapacityLedger<S, A>,
        ctx: &RequestContext,
    ) -> Result<HeadcountImportReport, HeadcountImportError>
    where
        R: Read,
        S: RecruitmentStore + 'static,
        A: RoleAuthority + 'static,
    {
        let rows = parser::parse_rows(reader)?;
        reject_duplicate_keys(&rows)?;
        for row in &rows {
            ledger
                .verify_approval(ctx, &row.key, row.approved)
                .map_err(|source| HeadcountImportError::Ledger {
                    line: row.line,
                    source,
                })?;
        }

        let import_date = ctx.now.date_naive();
        let mut approved = Vec::with_capacity(rows.len());
        for row in rows {
            let record = ledger
                .approve_as_of(
                    ctx,
                    row.key,
                    row.approved,
                    row.approved_on.unwrap_or(import_date),
                )
                .map_err(|source| HeadcountImportError::Ledger {
                    line: row.line,
                    source,
                })?;
            approved.push(record);
        }

        info!(actor = %ctx.actor, rows = approved.len(), "headcount plan imported");
        Ok(HeadcountImportReport { approved })
    }
}

fn reject_duplicate_keys(rows: &[PlanRow]) -> Result<(), HeadcountImportError> {
    let mut seen: HashMap<CapacityKey, u64> = HashMap::new();
    for row in rows {
        if let Some(first) = seen.insert(row.key, row.line) {
            return Err(HeadcountImportError::Row {
                line: row.line,
                reason: format!("{} already planned on line {}", row.key, first),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::recruitment::{
        ActorId, InMemoryRecruitmentStore, Role, StaticRoleAuthority,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::io::Cursor;
    use std::sync::Arc;

    const HEADER: &str = "Department,Position,Year,Approved,Approved On\n";

    fn ledger() -> CapacityLedger<InMemoryRecruitmentStore, StaticRoleAuthority> {
        let authority = StaticRoleAuthority::default()
            .grant(ActorId("hr-director".to_string()), Role::HeadcountApprover);
        CapacityLedger::new(
            Arc::new(InMemoryRecruitmentStore::default()),
            Arc::new(authority),
        )
    }

    fn ctx(actor: &str) -> RequestContext {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        RequestContext::new(ActorId(actor.to_string()), now)
    }

    #[test]
    fn blank_dates_default_to_the_import_day() {
        let ledger = ledger();
        let csv = format!("{HEADER}1,2,2026,3,2026-01-05\n1,3,2026,2,\n");

        let report =
            HeadcountPlanImporter::from_reader(Cursor::new(csv), &ledger, &ctx("hr-director"))
                .expect("import");

        assert_eq!(report.approved.len(), 2);
        assert_eq!(report.total_seats(), 5);
        assert_eq!(
            report.approved[0].approved_on,
            NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date")
        );
        assert_eq!(
            report.approved[1].approved_on,
            NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
        );
        assert_eq!(ledger.remaining(&CapacityKey::new(1, 3, 2026)).expect("read"), 2);
    }

    #[test]
    fn duplicate_keys_fail_before_any_write() {
        let ledger = ledger();
        let csv = format!("{HEADER}1,2,2026,3,\n1,2,2026,4,\n");

        let err =
            HeadcountPlanImporter::from_reader(Cursor::new(csv), &ledger, &ctx("hr-director"))
                .expect_err("duplicate");

        assert!(matches!(err, HeadcountImportError::Row { line: 3, .. }));
        assert!(ledger.snapshot().expect("snapshot").is_empty());
    }

    #[test]
    fn importing_requires_the_approver_role() {
        let ledger = ledger();
        let csv = format!("{HEADER}1,2,2026,3,\n");

        let err = HeadcountPlanImporter::from_reader(Cursor::new(csv), &ledger, &ctx("intern"))
            .expect_err("denied");

        match err {
            HeadcountImportError::Ledger {
                line,
                source: LedgerError::PermissionDenied { .. },
            } => assert_eq!(line, 2),
            other => panic!("expected permission failure, got {other:?}"),
        }
    }

    #[test]
    fn ledger_refusals_fail_before_any_write() {
        let ledger = ledger();
        let approver = ctx("hr-director");
        let filled = CapacityKey::new(1, 2, 2026);
        ledger.approve(&approver, filled, 3).expect("seed approval");
        assert!(ledger.increment_filled(&filled, 2).expect("fill"));
        let csv = format!("{HEADER}1,3,2026,4,
1,2,2026,1,
");

        let err = HeadcountPlanImporter::from_reader(Cursor::new(csv), &ledger, &approver)
            .expect_err("below filled");

        assert!(matches!(
            err,
            HeadcountImportError::Ledger {
                line: 3,
                source: LedgerError::Validation(_),
            }
        ));
        assert_eq!(ledger.remaining(&CapacityKey::new(1, 3, 2026)).expect("read"), 0);
        assert_eq!(ledger.snapshot().expect("snapshot").len(), 1);
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let err = HeadcountPlanImporter::from_path(
            "./does-not-exist.csv",
            &ledger(),
            &ctx("hr-director"),
        )
        .expect_err("expected io error");

        assert!(matches!(err, HeadcountImportError::Io(_)));
    }
}
