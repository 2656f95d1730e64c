use std::path::Path;

use anyhow::{Context, Result};

use edumon::config::Config;
use edumon::metrics;
use edumon::seeding::{import_statistics, run_accreditation, run_distribution, StatisticBatch};
use edumon::stats::percentage;
use edumon::storage::SqliteStore;

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.database.sqlite_path).with_context(|| {
        format!(
            "Failed to open database: {}",
            config.database.sqlite_path.display()
        )
    })
}

fn dry_run_note(dry_run: bool) {
    if dry_run {
        println!("(dry run: nothing was written)");
    }
}

fn init_seeding_metrics() {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }
}

/// Write the Prometheus text exposition of this run
fn write_metrics(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let text = metrics::encode_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {e}"))?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics file: {}", path.display()))?;
    println!("Metrics written to {}", path.display());
    Ok(())
}

/// Load aggregate student statistics from a JSON file
pub fn import(config: &Config, file: &Path, dry_run: bool, metrics_file: Option<&Path>) -> Result<()> {
    init_seeding_metrics();
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read statistics file: {}", file.display()))?;
    let batch: StatisticBatch = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse statistics file: {}", file.display()))?;

    let store = open_store(config)?;
    let (_, report) = import_statistics(&store, batch.into_rows(), dry_run)
        .context("Statistics import failed")?;

    println!("Statistics Import");
    println!("=================");
    println!("File: {}", file.display());
    println!("Rows: {}", report.rows);
    let years: Vec<&str> = report.academic_years.iter().map(String::as_str).collect();
    println!("Academic years: {}", years.join(", "));

    dry_run_note(dry_run);
    write_metrics(metrics_file)
}

/// Spread every regency statistic over its schools
pub fn distribute(
    config: &Config,
    seed: Option<u64>,
    dry_run: bool,
    metrics_file: Option<&Path>,
) -> Result<()> {
    init_seeding_metrics();
    let store = open_store(config)?;
    let seed = seed.or(config.allocation.seed);

    let report = run_distribution(&store, &config.allocation.levels, seed, dry_run)
        .context("Student-count distribution failed")?;

    println!("Student Distribution");
    println!("====================");
    match seed {
        Some(seed) => println!("Seed: {seed}"),
        None => println!("Seed: random"),
    }
    println!();
    println!("Groups allocated: {}", report.groups.len());
    println!("  Exact:    {}", report.exact_count());
    println!("  Degraded: {}", report.degraded().count());
    println!("Groups skipped (no statistic): {}", report.skipped.len());
    println!("Statistics rejected (no schools): {}", report.rejected.len());
    println!("Schools updated: {}", report.schools_updated);

    let degraded: Vec<_> = report.degraded().collect();
    if !degraded.is_empty() {
        println!();
        println!("Degraded groups:");
        for group in degraded {
            println!(
                "  {:<40} target {:>8}  allocated {:>8}  {}",
                group.key.to_string(),
                group.target,
                group.allocated,
                group.outcome.as_str()
            );
        }
    }

    if !report.rejected.is_empty() {
        println!();
        println!("Rejected statistics:");
        for rejected in &report.rejected {
            println!("  {:<40} {}", rejected.key.to_string(), rejected.reason);
        }
    }

    dry_run_note(dry_run);
    write_metrics(metrics_file)
}

/// Assign deterministic accreditation grades
pub fn accreditation(config: &Config, dry_run: bool, metrics_file: Option<&Path>) -> Result<()> {
    init_seeding_metrics();
    let store = open_store(config)?;
    let report = run_accreditation(&store, dry_run).context("Accreditation seeding failed")?;

    println!("Accreditation");
    println!("=============");
    println!("Schools: {}", report.schools);
    for (grade, count) in &report.distribution {
        println!(
            "  {:<22} {:>7} ({:.1}%)",
            grade.label(),
            count,
            percentage(*count as u64, report.schools as u64)
        );
    }
    println!("Schools updated: {}", report.updated);

    dry_run_note(dry_run);
    write_metrics(metrics_file)
}

/// Delete every stored record
pub fn reset(config: &Config, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to reset without --yes");
    }

    let store = open_store(config)?;
    let summary = store.reset().context("Reset failed")?;

    println!("Reset complete");
    println!("  Schools deleted:    {}", summary.schools);
    println!("  Statistics deleted: {}", summary.statistics);
    println!("  Programs deleted:   {}", summary.programs);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edumon::models::{Accreditation, Level, NewSchool, NewStudentStatistic, Ownership};
    use edumon::storage::{SchoolRepository, StudentStatisticRepository};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.database.sqlite_path = dir.path().join("edumon.db");
        config
    }

    fn seed_store(config: &Config) {
        let store = open_store(config).unwrap();
        for (name, npsn) in [("SMP Negeri 1", "20219101"), ("SMP Negeri 2", "20219102")] {
            let school = NewSchool {
                name: name.to_string(),
                npsn: npsn.to_string(),
                level: Level::Smp,
                ownership: Ownership::Negeri,
                address: "Jl. Dago 1".to_string(),
                province_code: String::new(),
                province_name: String::new(),
                regency_code: String::new(),
                regency_name: "KOTA BANDUNG".to_string(),
                bps_district_code: String::new(),
                bps_district_name: String::new(),
                district_code: String::new(),
                district_name: "Coblong".to_string(),
                year: 2023,
                student_count: 0,
                accreditation: Accreditation::Pending,
            };
            store.insert_school(&school.into_school()).unwrap();
        }
    }

    #[test]
    fn test_import_then_distribute_writes_metrics_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        seed_store(&config);

        let rows = vec![NewStudentStatistic {
            province_code: String::new(),
            province_name: String::new(),
            regency_code: String::new(),
            regency_name: "KOTA BANDUNG".to_string(),
            level: Level::Smp,
            ownership: Ownership::Negeri,
            student_count: 1000,
            academic_year: "2023/2024".to_string(),
        }];
        let file = dir.path().join("statistics.json");
        std::fs::write(&file, serde_json::to_string(&rows).unwrap()).unwrap();
        import(&config, &file, false, None).unwrap();

        let metrics_file = dir.path().join("metrics.prom");
        distribute(&config, Some(3), false, Some(&metrics_file)).unwrap();

        let text = std::fs::read_to_string(&metrics_file).unwrap();
        assert!(text.contains("edumon_allocations_total"), "{text}");
        assert!(text.contains("edumon_seeding_rows_written_total"), "{text}");

        let store = open_store(&config).unwrap();
        assert_eq!(store.academic_years().unwrap(), vec!["2023/2024".to_string()]);
        let total: u64 = store
            .find_schools(&Default::default())
            .unwrap()
            .iter()
            .map(|s| s.student_count)
            .sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_import_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let file = dir.path().join("broken.json");
        std::fs::write(&file, "[{\"regency_name\": ").unwrap();

        assert!(import(&config, &file, false, None).is_err());
    }
}
