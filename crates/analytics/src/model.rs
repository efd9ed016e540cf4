use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One operation series as handed over by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub threat: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub audience_category: String,
    /// Whether the series is run in support of another unit. `None` = not recorded.
    #[serde(default)]
    pub in_support: Option<bool>,
    /// Fiscal year -> quarter tags the series reports in.
    #[serde(default)]
    pub period_membership: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_active", skip_serializing)]
    pub is_active: bool,
}

/// One dissemination execution belonging to a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub id: String,
    pub series_id: String,
    /// Encoded multi-valued text, see [`crate::encoding`].
    #[serde(default)]
    pub dissemination_means: String,
    /// Encoded multi-valued text, see [`crate::encoding`].
    #[serde(default)]
    pub dissemination_method: String,
    #[serde(default = "default_active", skip_serializing)]
    pub is_active: bool,
}

/// One assessment of a series (optionally tied to an execution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(default)]
    pub id: String,
    pub series_id: String,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub phase: String,
    #[serde(default = "default_active", skip_serializing)]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Active-record snapshot of all three collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub series: Vec<SeriesRecord>,
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
    #[serde(default)]
    pub assessments: Vec<AssessmentRecord>,
}

impl Snapshot {
    /// Parse a JSON snapshot, keeping active records only.
    pub fn from_json(input: &str) -> Result<Self, ReportError> {
        let snapshot: Snapshot =
            serde_json::from_str(input).map_err(|e| ReportError::SnapshotParse(e.to_string()))?;
        Ok(snapshot.active_only())
    }

    pub fn active_only(mut self) -> Self {
        self.series.retain(|s| s.is_active);
        self.executions.retain(|e| e.is_active);
        self.assessments.retain(|a| a.is_active);
        self
    }
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// Label × period table with a trailing summary column.
///
/// `cells[row][col]` lines up with `labels[row]` and `periods[col]`;
/// `sum[row]` is the trailing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matrix<T> {
    pub labels: Vec<String>,
    pub periods: Vec<String>,
    pub cells: Vec<Vec<T>>,
    pub sum: Vec<T>,
}

impl<T> Matrix<T> {
    pub fn row(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn column(&self, period: &str) -> Option<usize> {
        self.periods.iter().position(|p| p == period)
    }

    /// Cell lookup by rendered label and period.
    pub fn get(&self, label: &str, period: &str) -> Option<&T> {
        let row = self.row(label)?;
        let col = self.column(period)?;
        self.cells.get(row)?.get(col)
    }

    pub fn sum_of(&self, label: &str) -> Option<&T> {
        self.sum.get(self.row(label)?)
    }
}

pub type CountMatrix = Matrix<usize>;
pub type NameMatrix = Matrix<Vec<String>>;
pub type ChangeMatrix = Matrix<usize>;

/// Added/dropped series for one change cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCell {
    pub added: Vec<String>,
    pub dropped: Vec<String>,
    /// First period: `added` lists the starting names and nothing is counted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub baseline: bool,
}

impl ChangeCell {
    pub fn count(&self) -> usize {
        if self.baseline {
            0
        } else {
            self.added.len() + self.dropped.len()
        }
    }

    /// Human description in the report's "Added: ... / Dropped: ..." form.
    pub fn describe(&self) -> String {
        if self.baseline {
            format!("Added: {:?}", self.added)
        } else {
            format!("Added: {:?}\r\n\r\nDropped: {:?}", self.added, self.dropped)
        }
    }
}

/// Added/dropped names per cell plus, per label, every series seen across the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNameMatrix {
    pub labels: Vec<String>,
    pub periods: Vec<String>,
    pub cells: Vec<Vec<ChangeCell>>,
    /// "All Series Affected" column.
    pub affected: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Breakdown tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownRow {
    pub category: String,
    pub counts: Vec<usize>,
}

/// Category × region count table for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<BreakdownRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeansShareRow {
    pub means: String,
    pub count: usize,
    /// `count / total`; `None` when no scoped series used any means.
    pub share: Option<f64>,
}

/// How the scoped series split across dissemination means.
///
/// `total` adds the per-means counts, so a series using two means is counted
/// twice. The social-media line compares against Internet use only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeansShare {
    pub total: usize,
    pub rows: Vec<MeansShareRow>,
    pub internet: usize,
    pub social_media_internet: usize,
    /// `None` when no scoped series used the Internet.
    pub social_media_share: Option<f64>,
}

/// Output of `engine::breakdowns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdowns {
    pub tables: Vec<BreakdownTable>,
    pub means_share: MeansShare,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub report_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub series_count: usize,
    pub execution_count: usize,
    pub assessment_count: usize,
    pub social_media_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub counts: CountMatrix,
    pub names: NameMatrix,
    pub changes: ChangeMatrix,
    pub change_names: ChangeNameMatrix,
    pub breakdowns: Vec<BreakdownTable>,
    pub means_share: MeansShare,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "series": [
            {"id": "1", "name": "Alpha", "region": "JSOC", "classification": "UNCLASS",
             "period_membership": {"2023": ["FYQ1", "FYQ2"]}},
            {"id": "2", "name": "Bravo", "is_active": false},
            {"id": "3", "name": "Charlie"}
        ],
        "executions": [
            {"series_id": "1", "dissemination_means": "{Internet}", "dissemination_method": "{\"Social Media\"}"}
        ]
    }"#;

    #[test]
    fn snapshot_drops_inactive_records() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.series.len(), 2);
        assert_eq!(snapshot.series[0].name, "Alpha");
        assert_eq!(snapshot.series[1].name, "Charlie");
        assert_eq!(snapshot.executions.len(), 1);
        assert!(snapshot.assessments.is_empty());
    }

    #[test]
    fn missing_membership_is_empty_not_null() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert!(snapshot.series[1].period_membership.is_empty());
        assert_eq!(snapshot.series[1].in_support, None);
    }

    #[test]
    fn bad_snapshot_is_an_error() {
        let err = Snapshot::from_json("{\"series\": 3}").unwrap_err();
        assert!(matches!(err, ReportError::SnapshotParse(_)));
    }

    #[test]
    fn matrix_lookup() {
        let m: CountMatrix = Matrix {
            labels: vec!["Series".into(), "JSOC".into()],
            periods: vec!["FY2023Q1".into()],
            cells: vec![vec![2], vec![1]],
            sum: vec![3, 1],
        };
        assert_eq!(m.get("JSOC", "FY2023Q1"), Some(&1));
        assert_eq!(m.sum_of("Series"), Some(&3));
        assert_eq!(m.get("Foo", "FY2023Q1"), None);
    }

    #[test]
    fn change_cell_counts() {
        let baseline = ChangeCell { added: vec!["A".into()], dropped: vec![], baseline: true };
        assert_eq!(baseline.count(), 0);
        assert_eq!(baseline.describe(), "Added: [\"A\"]");

        let cell = ChangeCell { added: vec!["B".into()], dropped: vec!["A".into()], baseline: false };
        assert_eq!(cell.count(), 2);
        assert!(cell.describe().contains("Dropped: [\"A\"]"));
    }
}
