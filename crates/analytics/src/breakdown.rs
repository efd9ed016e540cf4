//! Per-dimension breakdown tables over the scoped record set.

use crate::classify::{ClassifyContext, Dispatcher};
use crate::config::{reportable, Taxonomy};
use crate::label::{CategoryKind, CategoryLabel};
use crate::model::{BreakdownRow, BreakdownTable, MeansShare, MeansShareRow, SeriesRecord};
use crate::period::PeriodFilter;

const SERIES_COUNT: &str = "Series Count";
const INTERNET: &str = "Internet";

/// Records selected by the filter at series level, ignoring period bucketing.
///
/// A record passes the period part when no year is selected, or when one of
/// its selected years also carries a selected quarter (any quarter if no
/// quarter is selected). It passes the region part when no region is selected
/// or its region is one of them.
pub fn scope_records<'a>(
    records: &'a [SeriesRecord],
    filter: &PeriodFilter,
    regions: &[String],
    taxonomy: &Taxonomy,
) -> Vec<&'a SeriesRecord> {
    records
        .iter()
        .filter(|r| regions.is_empty() || regions.iter().any(|g| g == r.region.trim()))
        .filter(|r| filter.years.is_empty() || in_selected_period(r, filter, taxonomy))
        .collect()
}

fn in_selected_period(record: &SeriesRecord, filter: &PeriodFilter, taxonomy: &Taxonomy) -> bool {
    record.period_membership.iter().any(|(year, quarters)| {
        let year_selected = year
            .trim()
            .parse::<u16>()
            .is_ok_and(|y| filter.accepts_year(y));
        year_selected
            && (filter.quarters.is_empty()
                || quarters.iter().any(|tag| {
                    taxonomy
                        .quarter_number(tag)
                        .is_some_and(|q| filter.accepts_quarter(q))
                }))
    })
}

fn count(
    scoped: &[&SeriesRecord],
    label: &CategoryLabel,
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> usize {
    dispatcher.matches(scoped.iter().copied(), label, ctx).len()
}

/// Rows are category values, columns are regions.
fn by_region(
    title: &str,
    kind: CategoryKind,
    values: Vec<String>,
    scoped: &[&SeriesRecord],
    regions: &[String],
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> BreakdownTable {
    let rows = values
        .into_iter()
        .map(|value| {
            let counts = regions
                .iter()
                .map(|region| {
                    let label = CategoryLabel::scoped(value.as_str(), region.as_str()).pinned(kind);
                    count(scoped, &label, dispatcher, ctx)
                })
                .collect();
            BreakdownRow { category: value, counts }
        })
        .collect();

    BreakdownTable {
        title: title.to_string(),
        columns: regions.to_vec(),
        rows,
    }
}

/// Rows are `values`, one "Series Count" column.
fn single_column(
    title: &str,
    kind: CategoryKind,
    values: &[String],
    scoped: &[&SeriesRecord],
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> BreakdownTable {
    let rows = values
        .iter()
        .map(|value| {
            let label = CategoryLabel::new(value.as_str()).pinned(kind);
            BreakdownRow {
                category: value.clone(),
                counts: vec![count(scoped, &label, dispatcher, ctx)],
            }
        })
        .collect();

    BreakdownTable {
        title: title.to_string(),
        columns: vec![SERIES_COUNT.to_string()],
        rows,
    }
}

/// Enumerated values (catch-all excluded) followed by discovered other values.
fn with_others(values: &[String], kind: CategoryKind, ctx: &ClassifyContext<'_>) -> Vec<String> {
    let mut all: Vec<String> = reportable(values).cloned().collect();
    if let Some(others) = ctx.others.for_kind(kind) {
        all.extend(others.iter().cloned());
    }
    all
}

/// Build the breakdown tables for the scoped records.
///
/// Region columns are `regions`, or every configured region when empty.
pub fn build_breakdowns(
    scoped: &[&SeriesRecord],
    regions: &[String],
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> Vec<BreakdownTable> {
    let taxonomy = ctx.taxonomy;
    let columns: &[String] = if regions.is_empty() {
        &taxonomy.regions
    } else {
        regions
    };

    vec![
        single_column("Active Series", CategoryKind::Region, columns, scoped, dispatcher, ctx),
        by_region(
            "Series by Threat",
            CategoryKind::Threat,
            with_others(&taxonomy.threats, CategoryKind::Threat, ctx),
            scoped,
            columns,
            dispatcher,
            ctx,
        ),
        by_region(
            "Series by Program",
            CategoryKind::Program,
            with_others(&taxonomy.programs, CategoryKind::Program, ctx),
            scoped,
            columns,
            dispatcher,
            ctx,
        ),
        by_region(
            "Series by Target Audience",
            CategoryKind::Audience,
            with_others(&taxonomy.audiences, CategoryKind::Audience, ctx),
            scoped,
            columns,
            dispatcher,
            ctx,
        ),
        single_column(
            "Series by HPEM Phase",
            CategoryKind::HpemPhase,
            &taxonomy.hpem_phases,
            scoped,
            dispatcher,
            ctx,
        ),
        by_region(
            "Dissemination Means",
            CategoryKind::DisseminationMeans,
            with_others(&taxonomy.dissemination_means, CategoryKind::DisseminationMeans, ctx),
            scoped,
            columns,
            dispatcher,
            ctx,
        ),
    ]
}

fn means_count(
    scoped: &[&SeriesRecord],
    value: &str,
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> usize {
    let label = CategoryLabel::new(value).pinned(CategoryKind::DisseminationMeans);
    count(scoped, &label, dispatcher, ctx)
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Share of each dissemination means among all means hits of the scoped
/// series, plus how much of the Internet use went through social media.
///
/// Counts ignore the report's social-media-only switch; only the Internet
/// line applies it.
pub fn build_means_share(
    scoped: &[&SeriesRecord],
    dispatcher: &Dispatcher,
    ctx: &ClassifyContext<'_>,
) -> MeansShare {
    let all = ClassifyContext {
        social_media_only: false,
        ..*ctx
    };
    let social = ClassifyContext {
        social_media_only: true,
        ..*ctx
    };
    let counts: Vec<(String, usize)> =
        with_others(&ctx.taxonomy.dissemination_means, CategoryKind::DisseminationMeans, ctx)
            .into_iter()
            .map(|value| {
                let n = means_count(scoped, &value, dispatcher, &all);
                (value, n)
            })
            .collect();
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    let internet = means_count(scoped, INTERNET, dispatcher, &all);
    let social_media_internet = means_count(scoped, INTERNET, dispatcher, &social);

    MeansShare {
        total,
        rows: counts
            .into_iter()
            .map(|(means, count)| MeansShareRow {
                share: ratio(count, total),
                means,
                count,
            })
            .collect(),
        internet,
        social_media_internet,
        social_media_share: ratio(social_media_internet, internet),
    }
}
