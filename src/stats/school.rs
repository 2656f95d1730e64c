//! School breakdowns and region listings

use serde::Serialize;

use super::{average, distinct, group_by, round_to, zeroed_accreditations};
use crate::models::{Accreditation, Level, Ownership, School};
use std::collections::BTreeMap;

const TOP_REGENCIES: usize = 10;
const TOP_DISTRICTS: usize = 20;
const MATRIX_ROWS: usize = 50;
const SAMPLE_SCHOOLS: usize = 3;

/// Combined school report
#[derive(Debug, Clone, Serialize)]
pub struct SchoolStats {
    pub by_level: Vec<LevelSchoolStats>,
    pub by_ownership: Vec<OwnershipSchoolStats>,
    pub by_accreditation: Vec<AccreditationSchoolStats>,
    pub top_regencies: Vec<RegencySchoolStats>,
    pub top_districts: Vec<DistrictSchoolStats>,
    pub regency_level_matrix: Vec<RegencyLevelCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSchoolStats {
    pub level: Level,
    pub count: usize,
    pub total_students: u64,
    pub public: usize,
    pub private: usize,
    /// School count per accreditation label
    pub accreditation: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipSchoolStats {
    pub ownership: Ownership,
    pub count: usize,
    pub total_students: u64,
    pub average_students: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccreditationSchoolStats {
    pub accreditation: Accreditation,
    pub count: usize,
    pub public: usize,
    pub private: usize,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolSample {
    pub name: String,
    pub level: Level,
    pub ownership: Ownership,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegencySchoolStats {
    pub regency: String,
    pub count: usize,
    pub total_students: u64,
    pub public: usize,
    pub private: usize,
    pub levels: Vec<Level>,
    pub average_students: f64,
    pub sample_schools: Vec<SchoolSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictSchoolStats {
    pub district: String,
    pub regency: String,
    pub count: usize,
    pub levels: Vec<Level>,
    pub level_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegencyLevelCell {
    pub regency: String,
    pub level: Level,
    pub count: usize,
}

/// Regency listing entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RegencyEntry {
    pub regency: String,
    pub regency_code: String,
}

/// District listing entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DistrictEntry {
    pub district: String,
    pub regency: String,
    pub district_code: String,
}

fn split_ownership(schools: &[&School]) -> (usize, usize) {
    let public = schools.iter().filter(|s| s.ownership.is_public()).count();
    (public, schools.len() - public)
}

fn student_total(schools: &[&School]) -> u64 {
    schools.iter().map(|s| s.student_count).sum()
}

/// Build the combined school report
pub fn school_stats(schools: &[School]) -> SchoolStats {
    let by_level = group_by(schools, |s| s.level)
        .into_iter()
        .map(|(level, group)| {
            let (public, private) = split_ownership(&group);
            let mut accreditation = zeroed_accreditations();
            for school in &group {
                *accreditation.entry(school.accreditation.label()).or_default() += 1;
            }
            LevelSchoolStats {
                level,
                count: group.len(),
                total_students: student_total(&group),
                public,
                private,
                accreditation,
            }
        })
        .collect();

    let by_ownership = group_by(schools, |s| s.ownership)
        .into_iter()
        .map(|(ownership, group)| {
            let total_students = student_total(&group);
            OwnershipSchoolStats {
                ownership,
                count: group.len(),
                total_students,
                average_students: average(total_students, group.len()),
            }
        })
        .collect();

    let by_accreditation = group_by(schools, |s| s.accreditation)
        .into_iter()
        .map(|(accreditation, group)| {
            let (public, private) = split_ownership(&group);
            let mut levels = distinct(group.iter().map(|s| s.level));
            levels.sort();
            AccreditationSchoolStats {
                accreditation,
                count: group.len(),
                public,
                private,
                levels,
            }
        })
        .collect();

    let mut top_regencies: Vec<RegencySchoolStats> =
        group_by(schools, |s| s.regency_name.clone())
            .into_iter()
            .map(|(regency, group)| {
                let (public, private) = split_ownership(&group);
                let total_students = student_total(&group);
                RegencySchoolStats {
                    regency,
                    count: group.len(),
                    total_students,
                    public,
                    private,
                    levels: distinct(group.iter().map(|s| s.level)),
                    average_students: round_to(average(total_students, group.len()), 0),
                    sample_schools: group
                        .iter()
                        .take(SAMPLE_SCHOOLS)
                        .map(|s| SchoolSample {
                            name: s.name.clone(),
                            level: s.level,
                            ownership: s.ownership,
                        })
                        .collect(),
                }
            })
            .collect();
    top_regencies.sort_by(|a, b| b.count.cmp(&a.count));
    top_regencies.truncate(TOP_REGENCIES);

    let mut top_districts: Vec<DistrictSchoolStats> = group_by(schools, |s| {
        (s.regency_name.clone(), s.district_name.clone())
    })
    .into_iter()
    .map(|((regency, district), group)| {
        let levels = distinct(group.iter().map(|s| s.level));
        DistrictSchoolStats {
            district,
            regency,
            count: group.len(),
            level_count: levels.len(),
            levels,
        }
    })
    .collect();
    top_districts.sort_by(|a, b| b.count.cmp(&a.count));
    top_districts.truncate(TOP_DISTRICTS);

    let regency_level_matrix = group_by(schools, |s| (s.regency_name.clone(), s.level))
        .into_iter()
        .take(MATRIX_ROWS)
        .map(|((regency, level), group)| RegencyLevelCell {
            regency,
            level,
            count: group.len(),
        })
        .collect();

    SchoolStats {
        by_level,
        by_ownership,
        by_accreditation,
        top_regencies,
        top_districts,
        regency_level_matrix,
    }
}

/// Distinct regencies sorted by name
pub fn regency_list(schools: &[School]) -> Vec<RegencyEntry> {
    let mut entries: Vec<RegencyEntry> = schools
        .iter()
        .map(|s| RegencyEntry {
            regency: s.regency_name.clone(),
            regency_code: s.regency_code.clone(),
        })
        .collect();
    entries.sort();
    entries.dedup();
    entries
}

/// Distinct districts sorted by name
pub fn district_list(schools: &[School]) -> Vec<DistrictEntry> {
    let mut entries: Vec<DistrictEntry> = schools
        .iter()
        .map(|s| DistrictEntry {
            district: s.district_name.clone(),
            regency: s.regency_name.clone(),
            district_code: s.district_code.clone(),
        })
        .collect();
    entries.sort();
    entries.dedup();
    entries
}
