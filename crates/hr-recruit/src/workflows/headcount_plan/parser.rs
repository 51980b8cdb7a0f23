use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::recruitment::CapacityKey;

/// One approved allowance read from a headcount plan export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlanRow {
    /// 1-based line number in the source file, header included.
    pub(crate) line: u64,
    pub(crate) key: CapacityKey,
    pub(crate) approved: u32,
    pub(crate) approved_on: Option<NaiveDate>,
}

#[derive(Debug)]
pub(crate) enum ParseFailure {
    Csv(csv::Error),
    Row { line: u64, reason: String },
}

impl From<csv::Error> for ParseFailure {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<PlanRow>, ParseFailure> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        let row: PlanCsvRow = record.deserialize(Some(&headers))?;
        let approved_on = match row.approved_on.as_deref() {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| ParseFailure::Row {
                line,
                reason: format!("unrecognized approval date '{raw}'"),
            })?),
            None => None,
        };

        rows.push(PlanRow {
            line,
            key: CapacityKey::new(row.department, row.position, row.year),
            approved: row.approved,
            approved_on,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct PlanCsvRow {
    #[serde(rename = "Department")]
    department: u32,
    #[serde(rename = "Position")]
    position: u32,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Approved")]
    approved: u32,
    #[serde(
        rename = "Approved On",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    approved_on: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
