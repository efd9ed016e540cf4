//! Fiscal periods and the period → series index.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::Taxonomy;
use crate::error::ReportError;
use crate::model::SeriesRecord;

/// Fiscal year + quarter.
///
/// Field order gives chronological `Ord`; the rendered form `FY2023Q1`
/// sorts lexicographically in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    year: u16,
    quarter: u8,
}

impl PeriodKey {
    pub fn new(year: u32, quarter: u32) -> Result<Self, ReportError> {
        if year > 9999 || !(1..=4).contains(&quarter) {
            return Err(ReportError::InvalidPeriod { year, quarter });
        }
        Ok(Self {
            year: year as u16,
            quarter: quarter as u8,
        })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FY{:04}Q{}", self.year, self.quarter)
    }
}

impl FromStr for PeriodKey {
    type Err = ReportError;

    /// Parses the canonical `FY2023Q1` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || ReportError::PeriodParse(s.to_string());
        let rest = s.strip_prefix("FY").ok_or_else(parse_err)?;
        let (year, quarter) = rest.split_once('Q').ok_or_else(parse_err)?;
        let year: u32 = year.parse().map_err(|_| parse_err())?;
        let quarter: u32 = quarter.parse().map_err(|_| parse_err())?;
        PeriodKey::new(year, quarter)
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Year/quarter restriction. An empty set means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    pub years: BTreeSet<u16>,
    pub quarters: BTreeSet<u8>,
}

impl PeriodFilter {
    pub fn accepts_year(&self, year: u16) -> bool {
        self.years.is_empty() || self.years.contains(&year)
    }

    pub fn accepts_quarter(&self, quarter: u8) -> bool {
        self.quarters.is_empty() || self.quarters.contains(&quarter)
    }

    pub fn accepts(&self, key: PeriodKey) -> bool {
        self.accepts_year(key.year) && self.accepts_quarter(key.quarter)
    }
}

/// Every parseable (year, quarter) a record reports in, deduplicated, in order.
pub fn record_periods(record: &SeriesRecord, taxonomy: &Taxonomy) -> BTreeSet<PeriodKey> {
    let mut periods = BTreeSet::new();
    for (year, quarters) in &record.period_membership {
        let Ok(year_num) = year.trim().parse::<u32>() else {
            log::debug!("series '{}': skipping unparseable fiscal year '{year}'", record.id);
            continue;
        };
        for tag in quarters {
            let key = taxonomy
                .quarter_number(tag)
                .and_then(|q| PeriodKey::new(year_num, q as u32).ok());
            match key {
                Some(key) => {
                    periods.insert(key);
                }
                None => log::debug!(
                    "series '{}': skipping unparseable period {year}/{tag}",
                    record.id
                ),
            }
        }
    }
    periods
}

/// Build the period → records index under `filter`.
///
/// A record lands under every accepted period it reports in, once per period.
/// Periods with no records are not materialized.
pub fn build_period_index<'a>(
    records: &'a [SeriesRecord],
    filter: &PeriodFilter,
    taxonomy: &Taxonomy,
) -> BTreeMap<PeriodKey, Vec<&'a SeriesRecord>> {
    let mut index: BTreeMap<PeriodKey, Vec<&SeriesRecord>> = BTreeMap::new();
    for record in records {
        for key in record_periods(record, taxonomy) {
            if filter.accepts(key) {
                index.entry(key).or_default().push(record);
            }
        }
    }
    index
}

/// Sorted distinct fiscal years across all records.
///
/// Only years a [`PeriodKey`] can carry are listed.
pub fn available_fiscal_years(records: &[SeriesRecord]) -> Vec<u16> {
    let years: BTreeSet<u16> = records
        .iter()
        .flat_map(|r| r.period_membership.keys())
        .filter_map(|y| y.trim().parse::<u16>().ok())
        .filter(|&y| PeriodKey::new(y as u32, 1).is_ok())
        .collect();
    years.into_iter().collect()
}
