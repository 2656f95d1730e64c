//! Dashboard overview combining schools, students and programs

use serde::Serialize;
use std::collections::BTreeMap;

use super::student::{students_by_level, LevelStudentSummary};
use super::{average, distinct, group_by, percentage, zeroed_levels};
use crate::models::{Accreditation, Level, Ownership, School, StudentStatistic};

const TOP_REGENCIES: usize = 10;
const TOP_DISTRICTS: usize = 15;
const ACCREDITATION_SAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub overview: Overview,
    pub schools: DashboardSchools,
    pub students: DashboardStudents,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub school_count: usize,
    /// Sum of per-school student counts
    pub registered_students: u64,
    /// Sum of the (optionally year-filtered) student statistics
    pub student_total: u64,
    pub program_count: u64,
    pub academic_years: Vec<String>,
    pub regency_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSchools {
    pub by_level: Vec<LevelOverview>,
    pub by_ownership: Vec<OwnershipShare>,
    pub by_accreditation: Vec<AccreditationSamples>,
    pub top_regencies: Vec<RegencyOverview>,
    pub top_districts: Vec<DistrictOverview>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelOverview {
    pub level: Level,
    pub school_count: usize,
    pub public: usize,
    pub private: usize,
    pub average_students: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipShare {
    pub ownership: Ownership,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolLocation {
    pub name: String,
    pub regency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccreditationSamples {
    pub accreditation: Accreditation,
    pub count: usize,
    pub sample_schools: Vec<SchoolLocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegencyOverview {
    pub regency: String,
    pub total_schools: usize,
    pub public: usize,
    pub private: usize,
    pub levels: BTreeMap<Level, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictOverview {
    pub district: String,
    pub regency: String,
    pub school_count: usize,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStudents {
    pub by_level: Vec<LevelStudentSummary>,
    pub top_regencies: Vec<RegencyStudentBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentBreakdownRow {
    pub level: Level,
    pub ownership: Ownership,
    pub student_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegencyStudentBreakdown {
    pub regency: String,
    pub total_students: u64,
    pub breakdown: Vec<StudentBreakdownRow>,
}

/// Build the dashboard report
///
/// `statistics` should already be narrowed to the requested academic year;
/// `academic_years` lists every year on record regardless of that filter.
pub fn dashboard_stats(
    schools: &[School],
    statistics: &[StudentStatistic],
    program_count: u64,
    academic_years: Vec<String>,
) -> DashboardStats {
    let school_count = schools.len();

    let overview = Overview {
        school_count,
        registered_students: schools.iter().map(|s| s.student_count).sum(),
        student_total: statistics.iter().map(|s| s.student_count).sum(),
        program_count,
        academic_years,
        regency_count: distinct(
            schools
                .iter()
                .map(|s| s.regency_name.as_str())
                .filter(|r| !r.is_empty()),
        )
        .len(),
    };

    let by_level = group_by(schools, |s| s.level)
        .into_iter()
        .map(|(level, group)| {
            let public = group.iter().filter(|s| s.ownership.is_public()).count();
            let students: u64 = group.iter().map(|s| s.student_count).sum();
            LevelOverview {
                level,
                school_count: group.len(),
                public,
                private: group.len() - public,
                average_students: average(students, group.len()),
            }
        })
        .collect();

    let by_ownership = group_by(schools, |s| s.ownership)
        .into_iter()
        .map(|(ownership, group)| OwnershipShare {
            ownership,
            count: group.len(),
            percentage: percentage(group.len() as u64, school_count as u64),
        })
        .collect();

    let mut by_accreditation: Vec<AccreditationSamples> = group_by(schools, |s| s.accreditation)
        .into_iter()
        .map(|(accreditation, group)| AccreditationSamples {
            accreditation,
            count: group.len(),
            sample_schools: group
                .iter()
                .take(ACCREDITATION_SAMPLES)
                .map(|s| SchoolLocation {
                    name: s.name.clone(),
                    regency: s.regency_name.clone(),
                })
                .collect(),
        })
        .collect();
    by_accreditation.sort_by(|a, b| b.count.cmp(&a.count));

    let mut top_regencies: Vec<RegencyOverview> = group_by(schools, |s| s.regency_name.clone())
        .into_iter()
        .map(|(regency, group)| {
            let mut levels = zeroed_levels();
            for school in &group {
                *levels.entry(school.level).or_default() += 1;
            }
            let public = group.iter().filter(|s| s.ownership.is_public()).count();
            RegencyOverview {
                regency,
                total_schools: group.len(),
                public,
                private: group.len() - public,
                levels,
            }
        })
        .collect();
    top_regencies.sort_by(|a, b| b.total_schools.cmp(&a.total_schools));
    top_regencies.truncate(TOP_REGENCIES);

    let mut top_districts: Vec<DistrictOverview> =
        group_by(schools, |s| (s.regency_name.clone(), s.district_name.clone()))
            .into_iter()
            .map(|((regency, district), group)| DistrictOverview {
                district,
                regency,
                school_count: group.len(),
                levels: distinct(group.iter().map(|s| s.level)),
            })
            .collect();
    top_districts.sort_by(|a, b| b.school_count.cmp(&a.school_count));
    top_districts.truncate(TOP_DISTRICTS);

    let mut student_regencies: Vec<RegencyStudentBreakdown> =
        group_by(statistics, |s| s.regency_name.clone())
            .into_iter()
            .map(|(regency, group)| RegencyStudentBreakdown {
                regency,
                total_students: group.iter().map(|s| s.student_count).sum(),
                breakdown: group
                    .iter()
                    .map(|s| StudentBreakdownRow {
                        level: s.level,
                        ownership: s.ownership,
                        student_count: s.student_count,
                    })
                    .collect(),
            })
            .collect();
    student_regencies.sort_by(|a, b| b.total_students.cmp(&a.total_students));
    student_regencies.truncate(TOP_REGENCIES);

    DashboardStats {
        overview,
        schools: DashboardSchools {
            by_level,
            by_ownership,
            by_accreditation,
            top_regencies,
            top_districts,
        },
        students: DashboardStudents {
            by_level: students_by_level(statistics),
            top_regencies: student_regencies,
        },
    }
}
