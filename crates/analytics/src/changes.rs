//! Period-over-period churn.
//!
//! The change matrix is a left fold over the chronological period sequence.
//! [`ChangeAccumulator`] carries the fold state; each [`ChangeAccumulator::step`]
//! consumes one name column and yields the next state plus that column's cells.

use std::collections::BTreeSet;

use crate::model::{ChangeCell, ChangeMatrix, ChangeNameMatrix, Matrix, NameMatrix};
use crate::period::PeriodKey;

/// Fold state, one entry per label row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeAccumulator {
    /// Names in the previous period. `None` until the baseline column is seen.
    previous: Option<Vec<BTreeSet<String>>>,
    union: Vec<BTreeSet<String>>,
    totals: Vec<usize>,
}

impl ChangeAccumulator {
    pub fn new(rows: usize) -> Self {
        Self {
            previous: None,
            union: vec![BTreeSet::new(); rows],
            totals: vec![0; rows],
        }
    }

    /// Fold in the next period's name column.
    pub fn step(self, column: &[Vec<String>]) -> (Self, Vec<ChangeCell>) {
        let current: Vec<BTreeSet<String>> = column
            .iter()
            .map(|names| names.iter().cloned().collect())
            .collect();

        let Self {
            previous,
            mut union,
            mut totals,
        } = self;

        let cells: Vec<ChangeCell> = match &previous {
            None => current
                .iter()
                .map(|names| ChangeCell {
                    added: names.iter().cloned().collect(),
                    dropped: Vec::new(),
                    baseline: true,
                })
                .collect(),
            Some(previous) => current
                .iter()
                .zip(previous)
                .map(|(now, before)| ChangeCell {
                    added: now.difference(before).cloned().collect(),
                    dropped: before.difference(now).cloned().collect(),
                    baseline: false,
                })
                .collect(),
        };

        for (row, cell) in cells.iter().enumerate() {
            totals[row] += cell.count();
            union[row].extend(current[row].iter().cloned());
        }

        let next = Self {
            previous: Some(current),
            union,
            totals,
        };
        (next, cells)
    }

    pub fn totals(&self) -> &[usize] {
        &self.totals
    }

    /// Every name seen so far, per row.
    pub fn affected(&self) -> &[BTreeSet<String>] {
        &self.union
    }
}

/// Name column for `period`, or all-empty when the period is not in `names`.
fn name_column(names: &NameMatrix, period: &str) -> Vec<Vec<String>> {
    match names.column(period) {
        Some(col) => names
            .cells
            .iter()
            .map(|row| row.get(col).cloned().unwrap_or_default())
            .collect(),
        None => {
            log::debug!("period {period} not in name matrix; treating as empty");
            vec![Vec::new(); names.labels.len()]
        }
    }
}

/// Build the change and change-name matrices from a name matrix.
///
/// `ordered_periods` is sorted and deduplicated first, so callers may pass
/// periods in any order.
pub fn build_change_matrix(
    names: &NameMatrix,
    ordered_periods: &[PeriodKey],
) -> (ChangeMatrix, ChangeNameMatrix) {
    let periods: Vec<String> = ordered_periods
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|p| p.to_string())
        .collect();

    let rows = names.labels.len();
    let mut count_cells: Vec<Vec<usize>> = vec![Vec::with_capacity(periods.len()); rows];
    let mut name_cells: Vec<Vec<ChangeCell>> = vec![Vec::with_capacity(periods.len()); rows];

    let accumulator = periods
        .iter()
        .fold(ChangeAccumulator::new(rows), |acc, period| {
            let (next, column) = acc.step(&name_column(names, period));
            for (row, cell) in column.into_iter().enumerate() {
                count_cells[row].push(cell.count());
                name_cells[row].push(cell);
            }
            next
        });

    let changes = Matrix {
        labels: names.labels.clone(),
        periods: periods.clone(),
        cells: count_cells,
        sum: accumulator.totals().to_vec(),
    };
    let change_names = ChangeNameMatrix {
        labels: names.labels.clone(),
        periods,
        cells: name_cells,
        affected: accumulator
            .affected()
            .iter()
            .map(|names| names.iter().cloned().collect())
            .collect(),
    };

    (changes, change_names)
}
