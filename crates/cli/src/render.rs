//! Tabular renderings of a report: CSV sheets and stderr summaries.

use clap::ValueEnum;
use seriesboard_analytics::model::{BreakdownTable, ChangeNameMatrix, Matrix, MeansShare, Report};

use crate::exit_codes::EXIT_REPORT_OUTPUT;
use crate::CliError;

/// Matrix to emit with `--csv`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CsvTable {
    Counts,
    Names,
    Changes,
    ChangeNames,
}

const CATEGORY: &str = "Category";
const SUM: &str = "Sum";
const AFFECTED: &str = "All Series Affected";
const NAME_SEPARATOR: &str = "; ";

fn csv_err(e: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_REPORT_OUTPUT,
        message: format!("CSV write error: {e}"),
        hint: None,
    }
}

fn write_sheet(
    header: Vec<String>,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<Vec<u8>, CliError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&header).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }

    writer.into_inner().map_err(csv_err)
}

fn matrix_csv<T>(
    matrix: &Matrix<T>,
    last_column: &str,
    cell: impl Fn(&T) -> String,
) -> Result<Vec<u8>, CliError> {
    let mut header = vec![CATEGORY.to_string()];
    header.extend(matrix.periods.iter().cloned());
    header.push(last_column.to_string());

    let rows = matrix.labels.iter().enumerate().map(|(row, label)| {
        let mut record = vec![label.clone()];
        record.extend(matrix.cells[row].iter().map(&cell));
        record.push(cell(&matrix.sum[row]));
        record
    });

    write_sheet(header, rows)
}

fn change_names_csv(matrix: &ChangeNameMatrix) -> Result<Vec<u8>, CliError> {
    let mut header = vec![CATEGORY.to_string()];
    header.extend(matrix.periods.iter().cloned());
    header.push(AFFECTED.to_string());

    let rows = matrix.labels.iter().enumerate().map(|(row, label)| {
        let mut record = vec![label.clone()];
        record.extend(matrix.cells[row].iter().map(|c| c.describe()));
        record.push(matrix.affected[row].join(NAME_SEPARATOR));
        record
    });

    write_sheet(header, rows)
}

/// Render one of the report matrices as CSV bytes.
pub fn report_csv(report: &Report, table: CsvTable) -> Result<Vec<u8>, CliError> {
    match table {
        CsvTable::Counts => matrix_csv(&report.counts, SUM, |n| n.to_string()),
        CsvTable::Names => matrix_csv(&report.names, SUM, |names| names.join(NAME_SEPARATOR)),
        CsvTable::Changes => matrix_csv(&report.changes, SUM, |n| n.to_string()),
        CsvTable::ChangeNames => change_names_csv(&report.change_names),
    }
}

/// Aligned plain-text rendering of a breakdown table.
pub fn breakdown_text(table: &BreakdownTable) -> String {
    let first_width = table
        .rows
        .iter()
        .map(|r| r.category.len())
        .chain(std::iter::once(CATEGORY.len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            table
                .rows
                .iter()
                .filter_map(|r| r.counts.get(i))
                .map(|n| n.to_string().len())
                .chain(std::iter::once(col.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{}\n", table.title);
    out.push_str(&format!("  {CATEGORY:<first_width$}"));
    for (col, width) in table.columns.iter().zip(&widths) {
        out.push_str(&format!("  {col:>width$}"));
    }
    out.push('\n');

    for row in &table.rows {
        out.push_str(&format!("  {:<first_width$}", row.category));
        for (count, width) in row.counts.iter().zip(&widths) {
            out.push_str(&format!("  {count:>width$}"));
        }
        out.push('\n');
    }
    out
}

fn percent(share: Option<f64>) -> String {
    share.map_or_else(|| "-".to_string(), |s| format!("{:.0}%", s * 100.0))
}

/// "n/total (p%) used X" lines for the dissemination means share.
pub fn means_share_text(share: &MeansShare) -> String {
    let mut out = String::from("Dissemination Means Share\n");
    if share.total == 0 {
        out.push_str("  no series found\n");
        return out;
    }
    for row in &share.rows {
        out.push_str(&format!(
            "  {}/{} ({}) used {}\n",
            row.count,
            share.total,
            percent(row.share),
            row.means
        ));
        if row.means == "Internet" && share.social_media_share.is_some() {
            out.push_str(&format!(
                "  {}/{} ({}) used Internet and Social Media\n",
                share.social_media_internet,
                share.internet,
                percent(share.social_media_share)
            ));
        }
    }
    out
}
