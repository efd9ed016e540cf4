use std::path::PathBuf;

use seriesboard_analytics::model::{Report, Snapshot};
use seriesboard_analytics::{available_fiscal_years, run, ReportConfig};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn snapshot() -> Snapshot {
    let path = fixtures_dir().join("snapshot.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    Snapshot::from_json(&json).unwrap()
}

fn load_config(name: &str) -> ReportConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    ReportConfig::from_toml(&toml).unwrap()
}

fn load_and_run(name: &str) -> Report {
    run(&load_config(name), &snapshot()).unwrap()
}

fn counts_row(report: &Report, label: &str) -> Vec<usize> {
    let row = report
        .counts
        .row(label)
        .unwrap_or_else(|| panic!("no row '{label}'"));
    report.counts.cells[row].clone()
}

fn changes_row(report: &Report, label: &str) -> Vec<usize> {
    let row = report.changes.row(label).unwrap();
    report.changes.cells[row].clone()
}

// -------------------------------------------------------------------------
// Snapshot loading
// -------------------------------------------------------------------------

#[test]
fn inactive_series_are_dropped() {
    let snapshot = snapshot();
    assert_eq!(snapshot.series.len(), 5);
    assert!(snapshot.series.iter().all(|s| s.name != "Echo"));
    assert_eq!(snapshot.executions.len(), 5);
}

#[test]
fn fiscal_years_from_snapshot() {
    assert_eq!(available_fiscal_years(&snapshot().series), vec![2023, 2024]);
}

// -------------------------------------------------------------------------
// Count / name matrices
// -------------------------------------------------------------------------

#[test]
fn quarterly_counts() {
    let report = load_and_run("report.toml");

    assert_eq!(report.meta.report_name, "FY23-24 Quarterly");
    assert_eq!(
        report.counts.periods,
        vec!["FY2023Q1", "FY2023Q2", "FY2023Q3", "FY2024Q1"]
    );

    assert_eq!(counts_row(&report, "Series"), vec![1, 2, 2, 2]);
    assert_eq!(report.counts.sum_of("Series"), Some(&4));

    assert_eq!(counts_row(&report, "UNCLASS"), vec![1, 1, 0, 1]);
    assert_eq!(report.counts.sum_of("UNCLASS"), Some(&2));
    assert_eq!(counts_row(&report, "In Support"), vec![1, 1, 0, 1]);
    assert_eq!(counts_row(&report, "Awareness"), vec![1, 1, 0, 0]);

    // Dangling execution only; nothing matches
    assert_eq!(counts_row(&report, "Phone"), vec![0, 0, 0, 0]);
    // Delta's only execution has a malformed means value
    assert_eq!(counts_row(&report, "Radio"), vec![1, 2, 1, 0]);

    assert_eq!(
        report.names.get("Series", "FY2024Q1"),
        Some(&vec!["Charlie".to_string(), "Delta".to_string()])
    );
}

#[test]
fn other_values_get_their_own_rows() {
    let report = load_and_run("report.toml");
    let labels = &report.counts.labels;

    let tail: Vec<&str> = labels[labels.len() - 3..].iter().map(String::as_str).collect();
    assert_eq!(tail, vec!["TS//SCI", "Narcotics", "Billboard"]);
    // Program is not included, so its other value is not requested
    assert!(!labels.iter().any(|l| l == "Local Ops"));
    // Catch-all enumeration entries are never rows
    assert!(!labels.iter().any(|l| l == "Other" || l == "OTHER"));

    assert_eq!(counts_row(&report, "TS//SCI"), vec![0, 0, 1, 1]);
    assert_eq!(counts_row(&report, "Narcotics"), vec![0, 0, 1, 1]);
    assert_eq!(counts_row(&report, "Billboard"), vec![0, 0, 1, 1]);
}

#[test]
fn social_media_only_narrows_means() {
    let mut config = load_config("report.toml");
    config.social_media_only = true;
    let report = run(&config, &snapshot()).unwrap();

    // Bravo's Radio execution is not social media
    assert_eq!(counts_row(&report, "Radio"), vec![1, 1, 0, 0]);
    assert_eq!(counts_row(&report, "Billboard"), vec![0, 0, 1, 1]);
    assert!(report.meta.social_media_only);
}

// -------------------------------------------------------------------------
// Change matrix
// -------------------------------------------------------------------------

#[test]
fn quarterly_churn() {
    let report = load_and_run("report.toml");

    assert_eq!(changes_row(&report, "Series"), vec![0, 1, 2, 2]);
    assert_eq!(report.changes.sum_of("Series"), Some(&5));
    assert_eq!(changes_row(&report, "UNCLASS"), vec![0, 0, 1, 1]);
    assert_eq!(report.changes.sum_of("UNCLASS"), Some(&2));

    let row = report.change_names.labels.iter().position(|l| l == "Series").unwrap();
    let q3 = &report.change_names.cells[row][2];
    assert_eq!(q3.added, vec!["Charlie"]);
    assert_eq!(q3.dropped, vec!["Alpha"]);
    assert_eq!(
        report.change_names.affected[row],
        vec!["Alpha", "Bravo", "Charlie", "Delta"]
    );

    let baseline = &report.change_names.cells[row][0];
    assert!(baseline.baseline);
    assert_eq!(baseline.added, vec!["Alpha"]);
}

// -------------------------------------------------------------------------
// Region scope
// -------------------------------------------------------------------------

#[test]
fn regional_quarter() {
    let report = load_and_run("regional.toml");

    assert_eq!(report.counts.periods, vec!["FY2023Q2"]);
    assert_eq!(
        &report.counts.labels[..6],
        &["Series", "JSOC", "SOCAF", "UNCLASS", "S//NF", "S//REL FVEY"]
    );
    assert_eq!(counts_row(&report, "Series"), vec![2]);
    assert_eq!(counts_row(&report, "JSOC"), vec![1]);
    assert_eq!(counts_row(&report, "UNCLASS JSOC"), vec![1]);
    assert_eq!(counts_row(&report, "UNCLASS SOCAF"), vec![0]);
    assert_eq!(counts_row(&report, "S//NF SOCAF"), vec![1]);
    assert_eq!(counts_row(&report, "TS//SCI JSOC"), vec![0]);

    // Bravo is also in Q3 and Charlie only in Q3; neither widens the Sum
    assert_eq!(report.counts.sum_of("Series"), Some(&2));
    assert_eq!(changes_row(&report, "Series"), vec![0]);
}

#[test]
fn regional_breakdowns() {
    let report = load_and_run("regional.toml");
    let active = &report.breakdowns[0];
    assert_eq!(active.title, "Active Series");
    let counts: Vec<(&str, usize)> = active
        .rows
        .iter()
        .map(|r| (r.category.as_str(), r.counts[0]))
        .collect();
    assert_eq!(counts, vec![("JSOC", 1), ("SOCAF", 1)]);

    let threat = report.breakdowns.iter().find(|t| t.title == "Series by Threat").unwrap();
    assert_eq!(threat.columns, vec!["JSOC", "SOCAF"]);
    let rus = threat.rows.iter().find(|r| r.category == "NDS-RUS").unwrap();
    assert_eq!(rus.counts, vec![0, 1]);
}

#[test]
fn means_share_over_filtered_series() {
    let share = load_and_run("report.toml").means_share;

    // Delta's means are malformed; the dangling execution is skipped
    assert_eq!(share.total, 4);
    let shares: Vec<(&str, usize)> = share
        .rows
        .iter()
        .filter(|r| r.count > 0)
        .map(|r| (r.means.as_str(), r.count))
        .collect();
    assert_eq!(shares, vec![("Internet", 1), ("Radio", 2), ("Billboard", 1)]);
    assert_eq!(share.rows.iter().find(|r| r.means == "Radio").unwrap().share, Some(0.5));
    assert_eq!(share.internet, 1);
    assert_eq!(share.social_media_internet, 1);
    assert_eq!(share.social_media_share, Some(1.0));
}
