//! Side-by-side comparison of regencies

use serde::Serialize;
use std::collections::BTreeMap;

use super::{contains_ignore_case, distinct, group_by, round_to, zeroed_accreditations, zeroed_levels};
use crate::error::{Error, Result};
use crate::models::{Level, School};

#[derive(Debug, Clone, Serialize)]
pub struct RegencyComparison {
    pub regency: String,
    pub total_schools: usize,
    pub public: usize,
    pub private: usize,
    /// Public to private school ratio, two decimals
    pub public_private_ratio: f64,
    pub levels: BTreeMap<Level, u64>,
    pub accreditation: BTreeMap<&'static str, u64>,
    pub district_count: usize,
}

/// Compare the regencies whose names contain `first` or `second`
///
/// Both needles are required. Every matching regency gets its own row, so
/// a broad needle can yield more than two rows.
pub fn compare_regencies(
    schools: &[School],
    first: &str,
    second: &str,
) -> Result<Vec<RegencyComparison>> {
    let (first, second) = (first.trim(), second.trim());
    if first.is_empty() || second.is_empty() {
        return Err(Error::validation(
            "both regencies to compare are required",
        ));
    }

    let matched: Vec<School> = schools
        .iter()
        .filter(|s| {
            contains_ignore_case(&s.regency_name, first)
                || contains_ignore_case(&s.regency_name, second)
        })
        .cloned()
        .collect();

    let rows = group_by(&matched, |s| s.regency_name.clone())
        .into_iter()
        .map(|(regency, group)| {
            let mut levels = zeroed_levels();
            let mut accreditation = zeroed_accreditations();
            for school in &group {
                *levels.entry(school.level).or_default() += 1;
                *accreditation.entry(school.accreditation.label()).or_default() += 1;
            }
            let public = group.iter().filter(|s| s.ownership.is_public()).count();
            let private = group.len() - public;

            RegencyComparison {
                regency,
                total_schools: group.len(),
                public,
                private,
                public_private_ratio: round_to(public as f64 / private.max(1) as f64, 2),
                levels,
                accreditation,
                district_count: distinct(group.iter().map(|s| s.district_name.as_str())).len(),
            }
        })
        .collect();

    Ok(rows)
}
