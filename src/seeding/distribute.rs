//! Student-count distribution driver
//!
//! Splits each regency's aggregate student statistic across the schools of
//! the same level and ownership using the allocation engine, then writes
//! every new count in one transaction.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::allocation::{AllocationError, Allocator, Outcome};
use crate::config::LevelLimitsConfig;
use crate::error::Result;
use crate::metrics;
use crate::models::{GroupKey, School, StudentStatistic};
use crate::storage::{SchoolFilter, SchoolRepository, StatisticFilter, StudentStatisticRepository};

/// Allocation result for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub key: GroupKey,
    pub academic_year: String,
    pub schools: usize,
    pub target: u64,
    pub allocated: u64,
    pub outcome: Outcome,
}

/// Group whose statistic had no school to receive it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedGroup {
    pub key: GroupKey,
    pub target: u64,
    pub reason: String,
}

/// Summary of one distribution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
    pub groups: Vec<GroupReport>,
    /// Groups with schools but no statistic; their counts are left alone
    pub skipped: Vec<GroupKey>,
    pub rejected: Vec<RejectedGroup>,
    pub schools_updated: usize,
    pub dry_run: bool,
}

impl DistributionReport {
    /// Groups that did not come out exact
    pub fn degraded(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| !matches!(g.outcome, Outcome::Exact))
    }

    pub fn exact_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.outcome, Outcome::Exact))
            .count()
    }
}

/// Planned writes plus their report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPlan {
    pub updates: Vec<(String, u64)>,
    pub report: DistributionReport,
}

/// Target of one group: the sum of its rows from the latest academic year
#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupTarget {
    academic_year: String,
    total: u64,
}

fn group_targets(statistics: &[StudentStatistic]) -> BTreeMap<GroupKey, GroupTarget> {
    let mut targets: BTreeMap<GroupKey, GroupTarget> = BTreeMap::new();
    for row in statistics {
        let entry = targets.entry(row.group_key()).or_insert_with(|| GroupTarget {
            academic_year: row.academic_year.clone(),
            total: 0,
        });

        if row.academic_year > entry.academic_year {
            entry.academic_year = row.academic_year.clone();
            entry.total = row.student_count;
        } else if row.academic_year == entry.academic_year {
            entry.total += row.student_count;
        }
    }
    targets
}

/// Compute new student counts without touching storage
///
/// Groups are visited in key order and draw from one RNG, so a seeded RNG
/// reproduces the same plan for the same records.
pub fn plan_distribution<R: Rng + ?Sized>(
    schools: &[School],
    statistics: &[StudentStatistic],
    levels: &LevelLimitsConfig,
    rng: &mut R,
) -> DistributionPlan {
    let mut members: BTreeMap<GroupKey, Vec<&School>> = BTreeMap::new();
    for school in schools {
        members.entry(school.group_key()).or_default().push(school);
    }
    let mut targets = group_targets(statistics);

    let mut updates = Vec::with_capacity(schools.len());
    let mut report = DistributionReport::default();

    for (key, group) in &members {
        let Some(target) = targets.remove(key) else {
            tracing::debug!(group = %key, schools = group.len(), "No statistic for group, skipping");
            report.skipped.push(key.clone());
            continue;
        };

        let allocator = Allocator::new(levels.for_level(key.level));
        let allocation = match allocator.allocate(target.total, group.len(), rng) {
            Ok(allocation) => allocation,
            Err(e) => {
                report.rejected.push(RejectedGroup {
                    key: key.clone(),
                    target: target.total,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        metrics::record_allocation(key.level.as_str(), allocation.outcome.as_str());
        match allocation.outcome {
            Outcome::Exact => {
                tracing::debug!(group = %key, target = target.total, schools = group.len(), "Group allocated");
            }
            outcome => {
                tracing::warn!(
                    group = %key,
                    target = target.total,
                    allocated = allocation.total(),
                    schools = group.len(),
                    outcome = outcome.as_str(),
                    "Group allocation degraded"
                );
            }
        }

        report.groups.push(GroupReport {
            key: key.clone(),
            academic_year: target.academic_year,
            schools: group.len(),
            target: target.total,
            allocated: allocation.total(),
            outcome: allocation.outcome,
        });
        updates.extend(
            group
                .iter()
                .zip(allocation.shares)
                .map(|(school, share)| (school.id.clone(), share)),
        );
    }

    // Statistics left over have no school in their group
    for (key, target) in targets {
        if target.total == 0 {
            continue;
        }
        let reason = AllocationError::EmptyGroup {
            target: target.total,
        }
        .to_string();
        tracing::warn!(group = %key, target = target.total, "Statistic has no schools");
        report.rejected.push(RejectedGroup {
            key,
            target: target.total,
            reason,
        });
    }

    DistributionPlan { updates, report }
}

/// Load records, plan the distribution and persist it unless `dry_run`
pub fn run_distribution<S>(
    store: &S,
    levels: &LevelLimitsConfig,
    seed: Option<u64>,
    dry_run: bool,
) -> Result<DistributionReport>
where
    S: SchoolRepository + StudentStatisticRepository,
{
    let _timer = metrics::start_seeding_timer("distribute");
    let schools = store.find_schools(&SchoolFilter::default())?;
    let statistics = store.find_statistics(&StatisticFilter::default())?;
    tracing::info!(
        schools = schools.len(),
        statistics = statistics.len(),
        seed = ?seed,
        dry_run,
        "Starting student-count distribution"
    );

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let DistributionPlan { updates, mut report } =
        plan_distribution(&schools, &statistics, levels, &mut rng);
    report.dry_run = dry_run;

    if !dry_run {
        report.schools_updated = store.update_student_counts(&updates)?;
        metrics::record_rows_written("distribute", report.schools_updated);
    }

    tracing::info!(
        groups = report.groups.len(),
        exact = report.exact_count(),
        degraded = report.degraded().count(),
        skipped = report.skipped.len(),
        rejected = report.rejected.len(),
        schools_updated = report.schools_updated,
        "Distribution finished"
    );
    Ok(report)
}
