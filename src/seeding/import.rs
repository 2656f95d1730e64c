//! Bulk ingestion of regency student statistics
//!
//! Rows are validated together and written in one transaction, so a batch
//! with one bad row stores nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{NewStudentStatistic, StudentStatistic};
use crate::storage::StudentStatisticRepository;

/// One row or a list of rows, as accepted by the import endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatisticBatch {
    Many(Vec<NewStudentStatistic>),
    One(NewStudentStatistic),
}

impl StatisticBatch {
    pub fn into_rows(self) -> Vec<NewStudentStatistic> {
        match self {
            Self::Many(rows) => rows,
            Self::One(row) => vec![row],
        }
    }
}

/// Summary of one import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub academic_years: BTreeSet<String>,
    pub dry_run: bool,
}

/// Validate every row, naming the first offending row by position
pub fn prepare_statistics(rows: Vec<NewStudentStatistic>) -> Result<Vec<StudentStatistic>> {
    if rows.is_empty() {
        return Err(Error::validation("no statistic rows to import"));
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.into_statistic().map_err(|e| match e {
                Error::Validation(msg) => Error::validation(format!("row {}: {msg}", i + 1)),
                other => other,
            })
        })
        .collect()
}

/// Validate and store statistic rows unless `dry_run`
///
/// Returns the stored rows alongside the report so callers can echo them.
pub fn import_statistics<S: StudentStatisticRepository>(
    store: &S,
    rows: Vec<NewStudentStatistic>,
    dry_run: bool,
) -> Result<(Vec<StudentStatistic>, ImportReport)> {
    let _timer = metrics::start_seeding_timer("import-statistics");
    let statistics = prepare_statistics(rows)?;

    let written = if dry_run {
        0
    } else {
        store.insert_statistics(&statistics)?
    };
    metrics::record_rows_written("import-statistics", written);

    let report = ImportReport {
        rows: if dry_run { statistics.len() } else { written },
        academic_years: statistics.iter().map(|s| s.academic_year.clone()).collect(),
        dry_run,
    };
    tracing::info!(
        rows = report.rows,
        years = report.academic_years.len(),
        dry_run,
        "Student statistics imported"
    );
    Ok((statistics, report))
}
