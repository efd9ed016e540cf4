use std::collections::{BTreeMap, HashSet};

use crate::classify::{ClassifyContext, Dispatcher};
use crate::label::CategoryLabel;
use crate::model::{CountMatrix, Matrix, NameMatrix, SeriesRecord};
use crate::period::PeriodKey;

/// Records in the period index, deduplicated by id, first appearance wins.
pub fn distinct_records<'a>(
    period_index: &BTreeMap<PeriodKey, Vec<&'a SeriesRecord>>,
) -> Vec<&'a SeriesRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut distinct = Vec::new();
    for records in period_index.values() {
        for record in records {
            if seen.insert(record.id.as_str()) {
                distinct.push(*record);
            }
        }
    }
    distinct
}

fn classify_cell(
    records: &[&SeriesRecord],
    label: &CategoryLabel,
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> Vec<String> {
    let mut names: Vec<String> = dispatcher
        .matches(records.iter().copied(), label, ctx)
        .into_iter()
        .map(|r| r.name.clone())
        .collect();
    names.sort();
    names
}

/// Build the count and name matrices.
///
/// One column per period in the index (chronological), then "Sum". The Sum
/// column classifies the distinct records of the whole index; when the index
/// is empty it classifies `fallback` instead. Counts are always the length of
/// the matching name cell.
pub fn build_matrices(
    period_index: &BTreeMap<PeriodKey, Vec<&SeriesRecord>>,
    labels: &[CategoryLabel],
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
    fallback: &[&SeriesRecord],
) -> (CountMatrix, NameMatrix) {
    let periods: Vec<String> = period_index.keys().map(|k| k.to_string()).collect();
    let row_labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();

    let mut name_cells: Vec<Vec<Vec<String>>> = vec![Vec::with_capacity(periods.len()); labels.len()];
    for records in period_index.values() {
        for (row, label) in labels.iter().enumerate() {
            name_cells[row].push(classify_cell(records, label, dispatcher, ctx));
        }
    }

    let pool = distinct_records(period_index);
    let sum_pool: &[&SeriesRecord] = if pool.is_empty() {
        log::debug!("period index is empty; Sum column uses {} scoped records", fallback.len());
        fallback
    } else {
        &pool
    };
    let name_sum: Vec<Vec<String>> = labels
        .iter()
        .map(|label| classify_cell(sum_pool, label, dispatcher, ctx))
        .collect();

    let counts = Matrix {
        labels: row_labels.clone(),
        periods: periods.clone(),
        cells: name_cells
            .iter()
            .map(|row| row.iter().map(Vec::len).collect())
            .collect(),
        sum: name_sum.iter().map(Vec::len).collect(),
    };
    let names = Matrix {
        labels: row_labels,
        periods,
        cells: name_cells,
        sum: name_sum,
    };

    (counts, names)
}
