//! Student statistic summaries

use serde::Serialize;

use super::group_by;
use crate::models::{Level, Ownership, StudentStatistic};

const TOP_REGENCIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegencyStudentSummary {
    pub regency: String,
    pub regency_code: String,
    pub total_students: u64,
    pub public_students: u64,
    pub private_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStudentSummary {
    pub level: Level,
    pub total_students: u64,
    pub public_students: u64,
    pub private_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentTrendPoint {
    pub academic_year: String,
    pub level: Level,
    pub total_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTotal {
    pub level: Level,
    pub total_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipTotal {
    pub ownership: Ownership,
    pub total_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegencyTotal {
    pub regency: String,
    pub total_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStudentStats {
    pub by_level: Vec<LevelTotal>,
    pub by_ownership: Vec<OwnershipTotal>,
    pub top_regencies: Vec<RegencyTotal>,
    pub total_students: u64,
    pub total_records: usize,
}

fn sum(rows: &[&StudentStatistic]) -> u64 {
    rows.iter().map(|r| r.student_count).sum()
}

fn split(rows: &[&StudentStatistic]) -> (u64, u64) {
    rows.iter().fold((0, 0), |(public, private), r| {
        if r.ownership.is_public() {
            (public + r.student_count, private)
        } else {
            (public, private + r.student_count)
        }
    })
}

/// Student totals per regency, largest first
pub fn students_by_regency(rows: &[StudentStatistic]) -> Vec<RegencyStudentSummary> {
    let mut summaries: Vec<RegencyStudentSummary> =
        group_by(rows, |r| (r.regency_name.clone(), r.regency_code.clone()))
            .into_iter()
            .map(|((regency, regency_code), group)| {
                let (public_students, private_students) = split(&group);
                RegencyStudentSummary {
                    regency,
                    regency_code,
                    total_students: sum(&group),
                    public_students,
                    private_students,
                }
            })
            .collect();
    summaries.sort_by(|a, b| b.total_students.cmp(&a.total_students));
    summaries
}

/// Student totals per level, in level order
pub fn students_by_level(rows: &[StudentStatistic]) -> Vec<LevelStudentSummary> {
    group_by(rows, |r| r.level)
        .into_iter()
        .map(|(level, group)| {
            let (public_students, private_students) = split(&group);
            LevelStudentSummary {
                level,
                total_students: sum(&group),
                public_students,
                private_students,
            }
        })
        .collect()
}

/// Student totals per academic year and level
pub fn student_trends(rows: &[StudentStatistic]) -> Vec<StudentTrendPoint> {
    group_by(rows, |r| (r.academic_year.clone(), r.level))
        .into_iter()
        .map(|((academic_year, level), group)| StudentTrendPoint {
            academic_year,
            level,
            total_students: sum(&group),
        })
        .collect()
}

pub fn overall_student_stats(rows: &[StudentStatistic]) -> OverallStudentStats {
    let by_level = group_by(rows, |r| r.level)
        .into_iter()
        .map(|(level, group)| LevelTotal {
            level,
            total_students: sum(&group),
        })
        .collect();

    let by_ownership = group_by(rows, |r| r.ownership)
        .into_iter()
        .map(|(ownership, group)| OwnershipTotal {
            ownership,
            total_students: sum(&group),
        })
        .collect();

    let mut top_regencies: Vec<RegencyTotal> = group_by(rows, |r| r.regency_name.clone())
        .into_iter()
        .map(|(regency, group)| RegencyTotal {
            regency,
            total_students: sum(&group),
        })
        .collect();
    top_regencies.sort_by(|a, b| b.total_students.cmp(&a.total_students));
    top_regencies.truncate(TOP_REGENCIES);

    OverallStudentStats {
        by_level,
        by_ownership,
        top_regencies,
        total_students: rows.iter().map(|r| r.student_count).sum(),
        total_records: rows.len(),
    }
}
