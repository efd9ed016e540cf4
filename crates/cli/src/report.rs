//! `sboard report`: quarterly series reports from a record snapshot.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use seriesboard_analytics::model::Snapshot;
use seriesboard_analytics::{available_fiscal_years, engine, ReportConfig};

use crate::exit_codes::{report_exit_code, EXIT_REPORT_CONFIG, EXIT_REPORT_OUTPUT, EXIT_REPORT_SNAPSHOT};
use crate::render::{breakdown_text, means_share_text, report_csv, CsvTable};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Build the count, name and change matrices
    #[command(after_help = "\
Examples:
  sboard report run quarterly.toml --snapshot snapshot.json
  sboard report run quarterly.toml --snapshot snapshot.json --json
  sboard report run quarterly.toml --snapshot snapshot.json --output report.json
  sboard report run quarterly.toml --snapshot snapshot.json --csv changes")]
    Run {
        /// Path to the report .toml config file
        config: PathBuf,

        /// Path to the JSON record snapshot
        #[arg(long, env = "SBOARD_SNAPSHOT")]
        snapshot: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long, conflicts_with = "csv")]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write one matrix as CSV to stdout
        #[arg(long, value_enum)]
        csv: Option<CsvTable>,
    },

    /// Validate a report config without running
    #[command(after_help = "\
Examples:
  sboard report validate quarterly.toml")]
    Validate {
        /// Path to the report .toml config file
        config: PathBuf,
    },

    /// List the row labels a config requests against a snapshot
    #[command(after_help = "\
Examples:
  sboard report labels quarterly.toml --snapshot snapshot.json")]
    Labels {
        config: PathBuf,

        #[arg(long, env = "SBOARD_SNAPSHOT")]
        snapshot: PathBuf,

        /// Output JSON array to stdout
        #[arg(long)]
        json: bool,
    },

    /// List the fiscal years present in a snapshot
    #[command(after_help = "\
Examples:
  sboard report years --snapshot snapshot.json")]
    Years {
        #[arg(long, env = "SBOARD_SNAPSHOT")]
        snapshot: PathBuf,

        /// Output JSON array to stdout
        #[arg(long)]
        json: bool,
    },

    /// Print per-dimension breakdown tables and the means share
    #[command(after_help = "\
Examples:
  sboard report breakdown quarterly.toml --snapshot snapshot.json
  sboard report breakdown quarterly.toml --snapshot snapshot.json --json")]
    Breakdown {
        config: PathBuf,

        #[arg(long, env = "SBOARD_SNAPSHOT")]
        snapshot: PathBuf,

        /// Output JSON to stdout instead of text tables
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_report(cmd: ReportCommands) -> Result<(), CliError> {
    match cmd {
        ReportCommands::Run { config, snapshot, json, output, csv } => {
            cmd_report_run(config, snapshot, json, output, csv)
        }
        ReportCommands::Validate { config } => cmd_report_validate(config),
        ReportCommands::Labels { config, snapshot, json } => cmd_report_labels(config, snapshot, json),
        ReportCommands::Years { snapshot, json } => cmd_report_years(snapshot, json),
        ReportCommands::Breakdown { config, snapshot, json } => {
            cmd_report_breakdown(config, snapshot, json)
        }
    }
}

fn report_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn engine_err(err: seriesboard_analytics::ReportError) -> CliError {
    report_err(report_exit_code(&err), err.to_string())
}

fn load_config(path: &Path) -> Result<ReportConfig, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        report_err(EXIT_REPORT_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReportConfig::from_toml(&config_str).map_err(engine_err)
}

fn load_snapshot(path: &Path) -> Result<Snapshot, CliError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        report_err(EXIT_REPORT_SNAPSHOT, format!("cannot read snapshot {}: {e}", path.display()))
    })?;
    let snapshot = Snapshot::from_json(&json).map_err(|e| {
        engine_err(e).with_hint("a snapshot is a JSON object with \"series\", \"executions\" and \"assessments\" arrays")
    })?;
    log::debug!(
        "loaded snapshot {}: {} series, {} executions, {} assessments",
        path.display(),
        snapshot.series.len(),
        snapshot.executions.len(),
        snapshot.assessments.len()
    );
    Ok(snapshot)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| report_err(EXIT_REPORT_OUTPUT, format!("JSON serialization error: {e}")))
}

fn cmd_report_run(
    config_path: PathBuf,
    snapshot_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_table: Option<CsvTable>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let snapshot = load_snapshot(&snapshot_path)?;

    let report = seriesboard_analytics::run(&config, &snapshot).map_err(engine_err)?;

    if let Some(ref path) = output_file {
        let json_str = to_json(&report)?;
        std::fs::write(path, &json_str)
            .map_err(|e| report_err(EXIT_REPORT_OUTPUT, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{}", to_json(&report)?);
    }

    if let Some(table) = csv_table {
        use std::io::Write;
        let bytes = report_csv(&report, table)?;
        std::io::stdout()
            .lock()
            .write_all(&bytes)
            .map_err(|e| report_err(EXIT_REPORT_OUTPUT, format!("cannot write CSV: {e}")))?;
    }

    // Human summary to stderr
    let series_total = report.counts.sum.first().copied().unwrap_or(0);
    let churn_total = report.changes.sum.first().copied().unwrap_or(0);
    eprintln!(
        "report '{}': {} rows x {} periods, {} series in window, {} series changes{}",
        report.meta.report_name,
        report.counts.labels.len(),
        report.counts.periods.len(),
        series_total,
        churn_total,
        if report.meta.social_media_only { " (social media only)" } else { "" },
    );
    if report.counts.periods.is_empty() {
        eprintln!("no series report in the selected periods; Sum column uses the region scope");
    }

    Ok(())
}

fn cmd_report_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let include = &config.include;
    let enabled = [
        include.support,
        include.no_support,
        include.classification,
        include.threat,
        include.program,
        include.audience,
        include.means,
        include.hpem,
    ]
    .iter()
    .filter(|t| t.enabled)
    .count();

    eprintln!(
        "valid: report '{}' with {} region(s), {} year(s), {} quarter(s), {} categor{} included",
        config.name,
        config.filter.regions.len(),
        config.filter.years.len(),
        config.filter.quarters.len(),
        enabled,
        if enabled == 1 { "y" } else { "ies" },
    );
    Ok(())
}

fn cmd_report_labels(config_path: PathBuf, snapshot_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let snapshot = load_snapshot(&snapshot_path)?;
    let labels: Vec<String> = engine::labels(&config, &snapshot)
        .iter()
        .map(|l| l.to_string())
        .collect();

    if json_output {
        println!("{}", to_json(&labels)?);
    } else {
        for label in &labels {
            println!("{label}");
        }
    }
    Ok(())
}

fn cmd_report_years(snapshot_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let snapshot = load_snapshot(&snapshot_path)?;
    let years = available_fiscal_years(&snapshot.series);

    if json_output {
        println!("{}", to_json(&years)?);
    } else {
        for year in &years {
            println!("{year}");
        }
    }
    Ok(())
}

fn cmd_report_breakdown(config_path: PathBuf, snapshot_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let snapshot = load_snapshot(&snapshot_path)?;
    let breakdowns = engine::breakdowns(&config, &snapshot).map_err(engine_err)?;

    if json_output {
        println!("{}", to_json(&breakdowns)?);
    } else {
        for table in &breakdowns.tables {
            println!("{}", breakdown_text(table));
        }
        print!("{}", means_share_text(&breakdowns.means_share));
    }
    Ok(())
}
