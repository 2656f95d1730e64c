//! Education program summaries

use serde::Serialize;

use super::group_by;
use crate::models::EducationProgram;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramYearStats {
    pub year: i32,
    pub count: usize,
    pub total_recipients: u64,
}

/// Program count and recipients per year, newest first
pub fn program_stats(programs: &[EducationProgram]) -> Vec<ProgramYearStats> {
    group_by(programs, |p| p.year)
        .into_iter()
        .rev()
        .map(|(year, group)| ProgramYearStats {
            year,
            count: group.len(),
            total_recipients: group.iter().map(|p| p.recipients).sum(),
        })
        .collect()
}
