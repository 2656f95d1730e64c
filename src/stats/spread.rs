//! Regional spread ("persebaran") analysis of schools

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{group_by, percentage, round_to, zeroed_accreditations, zeroed_levels};
use crate::error::Error;
use crate::models::{Level, School};

/// Regency ordering of the spread report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpreadSort {
    #[default]
    TotalDesc,
    TotalAsc,
    NameAsc,
    NameDesc,
}

impl SpreadSort {
    /// Parse a sort key, falling back to `total-desc` for unknown values
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    fn compare(&self, a: &RegencySpread, b: &RegencySpread) -> Ordering {
        match self {
            Self::TotalDesc => b.total_schools.cmp(&a.total_schools),
            Self::TotalAsc => a.total_schools.cmp(&b.total_schools),
            Self::NameAsc => compare_names(&a.regency, &b.regency),
            Self::NameDesc => compare_names(&b.regency, &a.regency),
        }
    }
}

impl FromStr for SpreadSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "total-desc" => Ok(Self::TotalDesc),
            "total-asc" => Ok(Self::TotalAsc),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            other => Err(Error::validation(format!("unknown sort: {other}"))),
        }
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// School density class of a regency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    High,
    Medium,
    Low,
}

impl Density {
    pub fn from_count(count: usize) -> Self {
        if count > 100 {
            Self::High
        } else if count > 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegencySpread {
    pub regency: String,
    pub total_schools: usize,
    pub levels: BTreeMap<Level, u64>,
    pub public: usize,
    pub private: usize,
    /// School count per accreditation label
    pub accreditation: BTreeMap<&'static str, u64>,
    pub percentage: f64,
    pub density: Density,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopRegency {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpreadSummary {
    pub regency_count: usize,
    pub total_schools: usize,
    pub average_per_regency: f64,
    pub top_regency: Option<TopRegency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelShare {
    pub level: Level,
    pub count: u64,
    /// Rounded to one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpreadAnalysis {
    pub summary: SpreadSummary,
    pub regencies: Vec<RegencySpread>,
    pub level_distribution: Vec<LevelShare>,
}

/// Spread of `schools` over regencies
///
/// Schools without a regency count toward the totals but form no regency
/// row.
pub fn spread_analysis(schools: &[School], sort: SpreadSort) -> SpreadAnalysis {
    let total_schools = schools.len();
    let total = total_schools as u64;

    let located: Vec<School> = schools
        .iter()
        .filter(|s| !s.regency_name.trim().is_empty())
        .cloned()
        .collect();

    let mut regencies: Vec<RegencySpread> = group_by(&located, |s| s.regency_name.clone())
        .into_iter()
        .map(|(regency, group)| {
            let mut levels = zeroed_levels();
            let mut accreditation = zeroed_accreditations();
            for school in &group {
                *levels.entry(school.level).or_default() += 1;
                *accreditation.entry(school.accreditation.label()).or_default() += 1;
            }
            let public = group.iter().filter(|s| s.ownership.is_public()).count();

            RegencySpread {
                regency,
                total_schools: group.len(),
                levels,
                public,
                private: group.len() - public,
                accreditation,
                percentage: percentage(group.len() as u64, total),
                density: Density::from_count(group.len()),
            }
        })
        .collect();
    regencies.sort_by(|a, b| sort.compare(a, b));

    let top_regency = regencies
        .iter()
        .fold(None::<&RegencySpread>, |best, r| match best {
            Some(b) if b.total_schools >= r.total_schools => Some(b),
            _ => Some(r),
        })
        .map(|r| TopRegency {
            name: r.regency.clone(),
            count: r.total_schools,
        });

    let mut per_level = zeroed_levels();
    for school in schools {
        *per_level.entry(school.level).or_default() += 1;
    }
    let level_distribution = per_level
        .into_iter()
        .map(|(level, count)| LevelShare {
            level,
            count,
            percentage: round_to(percentage(count, total), 1),
        })
        .collect();

    let regency_count = regencies.len();
    SpreadAnalysis {
        summary: SpreadSummary {
            regency_count,
            total_schools,
            average_per_regency: if regency_count > 0 {
                total_schools as f64 / regency_count as f64
            } else {
                0.0
            },
            top_regency,
        },
        regencies,
        level_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Accreditation, Ownership};
    use crate::stats::fixtures::school;

    fn fixture() -> Vec<School> {
        let mut schools = vec![
            school("SD 1", Level::Sd, Ownership::Negeri, "KOTA BANDUNG", "Coblong", 0),
            school("SD 2", Level::Sd, Ownership::Swasta, "KOTA BANDUNG", "Coblong", 0),
            school("SMK 1", Level::Smk, Ownership::Swasta, "KOTA BANDUNG", "Coblong", 0),
            school("SD 3", Level::Sd, Ownership::Negeri, "kab. bogor", "Cibinong", 0),
            school("SLB 1", Level::Slb, Ownership::Negeri, "", "", 0),
        ];
        schools[0].accreditation = Accreditation::NotAccredited;
        schools
    }

    #[test]
    fn test_sort_parsing_falls_back() {
        assert_eq!(SpreadSort::parse_or_default(Some("name-desc")), SpreadSort::NameDesc);
        assert_eq!(SpreadSort::parse_or_default(Some("bogus")), SpreadSort::TotalDesc);
        assert_eq!(SpreadSort::parse_or_default(None), SpreadSort::TotalDesc);
    }

    #[test]
    fn test_density_thresholds() {
        assert_eq!(Density::from_count(101), Density::High);
        assert_eq!(Density::from_count(100), Density::Medium);
        assert_eq!(Density::from_count(51), Density::Medium);
        assert_eq!(Density::from_count(50), Density::Low);
    }

    #[test]
    fn test_spread_rows_and_summary() {
        let analysis = spread_analysis(&fixture(), SpreadSort::TotalDesc);

        assert_eq!(analysis.summary.total_schools, 5);
        assert_eq!(analysis.summary.regency_count, 2);
        assert_eq!(analysis.summary.average_per_regency, 2.5);

        let bandung = &analysis.regencies[0];
        assert_eq!(bandung.regency, "KOTA BANDUNG");
        assert_eq!(bandung.total_schools, 3);
        assert_eq!(bandung.levels[&Level::Sd], 2);
        assert_eq!(bandung.levels[&Level::Smp], 0);
        assert_eq!((bandung.public, bandung.private), (1, 2));
        assert_eq!(bandung.accreditation["Tidak Terakreditasi"], 1);
        assert_eq!(bandung.accreditation["Belum Terakreditasi"], 2);
        assert!((bandung.percentage - 60.0).abs() < 1e-9);
        assert_eq!(bandung.density, Density::Low);
    }

    #[test]
    fn test_top_regency_ignores_sort_direction() {
        let analysis = spread_analysis(&fixture(), SpreadSort::TotalAsc);
        assert_eq!(analysis.regencies[0].regency, "kab. bogor");
        assert_eq!(analysis.summary.top_regency.unwrap().name, "KOTA BANDUNG");
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let analysis = spread_analysis(&fixture(), SpreadSort::NameAsc);
        assert_eq!(analysis.regencies[0].regency, "kab. bogor");

        let analysis = spread_analysis(&fixture(), SpreadSort::NameDesc);
        assert_eq!(analysis.regencies[0].regency, "KOTA BANDUNG");
    }

    #[test]
    fn test_level_distribution_percentages() {
        let analysis = spread_analysis(&fixture(), SpreadSort::default());
        let sd = &analysis.level_distribution[0];
        assert_eq!((sd.level, sd.count, sd.percentage), (Level::Sd, 3, 60.0));
        assert_eq!(analysis.level_distribution.len(), 5);
    }

    #[test]
    fn test_empty_input() {
        let analysis = spread_analysis(&[], SpreadSort::default());
        assert_eq!(analysis.summary.total_schools, 0);
        assert!(analysis.summary.top_regency.is_none());
        assert!(analysis.level_distribution.iter().all(|l| l.percentage == 0.0));
    }
}
