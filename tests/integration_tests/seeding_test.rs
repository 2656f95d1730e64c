//! Seeding integration tests
//!
//! Distribution and accreditation runs against the seeded fixture store.

use axum::http::{Method, StatusCode};
use serde_json::json;

use edumon::allocation::Outcome;
use edumon::config::LevelLimitsConfig;
use edumon::metrics;
use edumon::models::{Accreditation, GroupKey, Level, Ownership};
use edumon::seeding::{accreditation_for_npsn, run_accreditation, run_distribution};
use edumon::storage::{SchoolFilter, SchoolRepository, StudentStatisticRepository};

use super::fixtures::{router, schools_only_store, seeded_store, send};

fn group_total(store: &edumon::storage::SqliteStore, key: &GroupKey) -> u64 {
    store
        .find_schools(&SchoolFilter::default())
        .unwrap()
        .iter()
        .filter(|s| &s.group_key() == key)
        .map(|s| s.student_count)
        .sum()
}

// ============================================================================
// Distribution
// ============================================================================

#[test]
fn test_distribution_meets_latest_year_targets() {
    let store = seeded_store();
    let report = run_distribution(&*store, &LevelLimitsConfig::default(), Some(42), false)
        .unwrap();

    assert_eq!(report.groups.len(), 4);
    assert_eq!(report.exact_count(), 4);
    assert!(report.groups.iter().all(|g| g.outcome == Outcome::Exact));
    assert_eq!(report.schools_updated, 6);
    assert!(!report.dry_run);

    let bandung_sd = GroupKey::new(Level::Sd, Ownership::Negeri, "KOTA BANDUNG");
    let group = report.groups.iter().find(|g| g.key == bandung_sd).unwrap();
    assert_eq!(group.academic_year, "2023/2024");
    assert_eq!(group.target, 1800);
    assert_eq!(group_total(&store, &bandung_sd), 1800);

    let bogor_sma = GroupKey::new(Level::Sma, Ownership::Negeri, "KAB. BOGOR");
    assert_eq!(group_total(&store, &bogor_sma), 1100);
}

#[test]
fn test_distribution_reports_unmatched_groups() {
    let store = seeded_store();
    let report = run_distribution(&*store, &LevelLimitsConfig::default(), Some(7), false)
        .unwrap();

    assert_eq!(
        report.skipped,
        vec![GroupKey::new(Level::Smk, Ownership::Swasta, "KAB. BOGOR")]
    );
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].key.regency, "KAB. GARUT");
    assert_eq!(report.rejected[0].target, 2500);

    // the skipped school keeps its count
    let smk = store.find_school_by_npsn("20230002").unwrap().unwrap();
    assert_eq!(smk.student_count, 0);
}

#[test]
fn test_distribution_dry_run_writes_nothing() {
    let store = seeded_store();
    let report = run_distribution(&*store, &LevelLimitsConfig::default(), Some(42), true)
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.schools_updated, 0);
    assert_eq!(report.groups.len(), 4);

    let schools = store.find_schools(&SchoolFilter::default()).unwrap();
    assert!(schools.iter().all(|s| s.student_count == 0));
}

#[test]
fn test_distribution_is_reproducible_with_seed() {
    let counts = |seed| {
        let store = seeded_store();
        run_distribution(&*store, &LevelLimitsConfig::default(), Some(seed), false)
            .unwrap();
        store
            .find_schools(&SchoolFilter::default())
            .unwrap()
            .into_iter()
            .map(|s| (s.npsn, s.student_count))
            .collect::<Vec<_>>()
    };

    assert_eq!(counts(2024), counts(2024));
}

#[tokio::test]
async fn test_posted_statistics_drive_distribution() {
    let store = schools_only_store();
    let app = router(store.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/students",
        Some(json!([
            {
                "regency_name": "KOTA BANDUNG",
                "level": "SD",
                "ownership": "NEGERI",
                "student_count": 1500,
                "academic_year": "2023/2024"
            },
            {
                "province_code": "32",
                "province_name": "JAWA BARAT",
                "regency_name": "KAB. BOGOR",
                "level": "SMA",
                "ownership": "NEGERI",
                "student_count": 700,
                "academic_year": "2023/2024"
            }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["count"], 2);
    assert_eq!(store.academic_years().unwrap(), vec!["2023/2024".to_string()]);

    let report = run_distribution(&*store, &LevelLimitsConfig::default(), Some(5), false)
        .unwrap();
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.exact_count(), 2);

    let bandung_sd = GroupKey::new(Level::Sd, Ownership::Negeri, "KOTA BANDUNG");
    assert_eq!(group_total(&store, &bandung_sd), 1500);
    let bogor_sma = GroupKey::new(Level::Sma, Ownership::Negeri, "KAB. BOGOR");
    assert_eq!(group_total(&store, &bogor_sma), 700);
}

#[test]
fn test_distribution_records_allocation_outcomes() {
    metrics::init_metrics().unwrap();
    let store = seeded_store();
    run_distribution(&*store, &LevelLimitsConfig::default(), Some(42), false).unwrap();

    let text = metrics::encode_metrics().unwrap();
    let series = text
        .lines()
        .find(|line| {
            line.starts_with("edumon_allocations_total")
                && line.contains(r#"level="SD""#)
                && line.contains(r#"outcome="exact""#)
        })
        .unwrap_or_else(|| panic!("no SD exact allocation series in:\n{text}"));
    let count: f64 = series.rsplit(' ').next().unwrap().parse().unwrap();
    assert!(count >= 2.0, "{series}");
    assert!(text.contains(r#"edumon_seeding_rows_written_total{command="distribute"}"#));
}

// ============================================================================
// Accreditation
// ============================================================================

#[test]
fn test_accreditation_grades_every_school() {
    let store = seeded_store();
    let report = run_accreditation(&*store, false).unwrap();

    assert_eq!(report.schools, 7);
    assert_eq!(report.updated, 7);
    assert_eq!(report.distribution.values().sum::<usize>(), 7);
    assert!(!report.distribution.contains_key(&Accreditation::Pending));

    for school in store.find_schools(&SchoolFilter::default()).unwrap() {
        assert_eq!(school.accreditation, accreditation_for_npsn(&school.npsn));
    }
}

#[test]
fn test_accreditation_is_stable_across_runs() {
    let store = seeded_store();
    let first = run_accreditation(&*store, false).unwrap();
    let second = run_accreditation(&*store, false).unwrap();

    assert_eq!(first.distribution, second.distribution);
}

#[test]
fn test_accreditation_dry_run_keeps_grades() {
    let store = seeded_store();
    let report = run_accreditation(&*store, true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.updated, 0);
    let school = store.find_school_by_npsn("20219002").unwrap().unwrap();
    assert_eq!(school.accreditation, Accreditation::Pending);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_clears_every_table() {
    let store = seeded_store();
    let summary = store.reset().unwrap();

    assert_eq!(summary.schools, 7);
    assert_eq!(summary.statistics, 6);
    assert_eq!(summary.programs, 0);
    assert_eq!(store.count_schools().unwrap(), 0);
}
