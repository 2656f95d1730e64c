//! Dashboard statistics
//!
//! Every report is a pure function over already-loaded records, so handlers
//! pick the rows with a repository filter and hand the slice over. Groupings
//! use `BTreeMap`, which keeps ties in name order after the count sorts.

pub mod comparison;
pub mod dashboard;
pub mod program;
pub mod school;
pub mod spread;
pub mod student;

use std::collections::BTreeMap;

use crate::models::{Accreditation, Level};

pub use comparison::{compare_regencies, RegencyComparison};
pub use dashboard::{dashboard_stats, DashboardStats};
pub use program::{program_stats, ProgramYearStats};
pub use school::{district_list, regency_list, school_stats, DistrictEntry, RegencyEntry, SchoolStats};
pub use spread::{spread_analysis, Density, SpreadAnalysis, SpreadSort};
pub use student::{
    overall_student_stats, students_by_level, students_by_regency, student_trends,
    LevelStudentSummary, OverallStudentStats, RegencyStudentSummary, StudentTrendPoint,
};

/// Group items by a key, preserving input order inside each group
pub(crate) fn group_by<'a, T, K, F>(items: &'a [T], key: F) -> BTreeMap<K, Vec<&'a T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }
    groups
}

/// Every level with a zero count
pub(crate) fn zeroed_levels() -> BTreeMap<Level, u64> {
    Level::ALL.into_iter().map(|level| (level, 0)).collect()
}

/// Every accreditation label with a zero count
pub(crate) fn zeroed_accreditations() -> BTreeMap<&'static str, u64> {
    Accreditation::ALL
        .into_iter()
        .map(|grade| (grade.label(), 0))
        .collect()
}

/// `part / whole` as a percentage, 0 for an empty whole
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub(crate) fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Distinct values in first-seen order
pub(crate) fn distinct<T: PartialEq + Copy>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Case-insensitive substring match
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
