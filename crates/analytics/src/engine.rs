use crate::breakdown::{build_breakdowns, build_means_share, scope_records};
use crate::changes::build_change_matrix;
use crate::classify::{ClassifyContext, Dispatcher, RelatedIndex};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::label::CategoryLabel;
use crate::matrix::build_matrices;
use crate::model::{Breakdowns, Report, ReportMeta, Snapshot};
use crate::period::{build_period_index, PeriodFilter, PeriodKey};
use crate::request::{build_labels, OtherValues};

/// Run the full report pipeline over one snapshot.
pub fn run(config: &ReportConfig, snapshot: &Snapshot) -> Result<Report, ReportError> {
    config.validate()?;
    let filter = config.period_filter()?;
    let taxonomy = &config.taxonomy;
    let regions = &config.filter.regions;

    let others = OtherValues::discover(snapshot, taxonomy);
    let labels = build_labels(&config.include, regions, taxonomy, &others);
    let related = RelatedIndex::build(&snapshot.executions, &snapshot.assessments, taxonomy);
    let ctx = ClassifyContext {
        taxonomy,
        others: &others,
        related: &related,
        social_media_only: config.social_media_only,
    };
    let dispatcher = Dispatcher::standard();

    let index = build_period_index(&snapshot.series, &filter, taxonomy);
    let scoped = scope_records(&snapshot.series, &filter, regions, taxonomy);
    // Sum fallback ignores the period filter
    let fallback = scope_records(&snapshot.series, &PeriodFilter::default(), regions, taxonomy);
    log::info!(
        "report '{}': {} labels, {} periods, {} scoped series",
        config.name,
        labels.len(),
        index.len(),
        scoped.len()
    );

    let (counts, names) = build_matrices(&index, &labels, &dispatcher, &ctx, &fallback);
    let periods: Vec<PeriodKey> = index.keys().copied().collect();
    let (changes, change_names) = build_change_matrix(&names, &periods);
    let breakdowns = build_breakdowns(&scoped, regions, &dispatcher, &ctx);
    let means_share = build_means_share(&scoped, &dispatcher, &ctx);

    Ok(Report {
        meta: ReportMeta {
            report_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            series_count: snapshot.series.len(),
            execution_count: snapshot.executions.len(),
            assessment_count: snapshot.assessments.len(),
            social_media_only: config.social_media_only,
        },
        counts,
        names,
        changes,
        change_names,
        breakdowns,
        means_share,
    })
}

/// Row labels the report would request for this snapshot.
pub fn labels(config: &ReportConfig, snapshot: &Snapshot) -> Vec<CategoryLabel> {
    let others = OtherValues::discover(snapshot, &config.taxonomy);
    build_labels(&config.include, &config.filter.regions, &config.taxonomy, &others)
}

/// Breakdown tables and the means share, without the period matrices.
pub fn breakdowns(config: &ReportConfig, snapshot: &Snapshot) -> Result<Breakdowns, ReportError> {
    let filter = config.period_filter()?;
    let taxonomy = &config.taxonomy;
    let others = OtherValues::discover(snapshot, taxonomy);
    let related = RelatedIndex::build(&snapshot.executions, &snapshot.assessments, taxonomy);
    let ctx = ClassifyContext {
        taxonomy,
        others: &others,
        related: &related,
        social_media_only: config.social_media_only,
    };
    let scoped = scope_records(&snapshot.series, &filter, &config.filter.regions, taxonomy);
    let dispatcher = Dispatcher::standard();
    Ok(Breakdowns {
        tables: build_breakdowns(&scoped, &config.filter.regions, &dispatcher, &ctx),
        means_share: build_means_share(&scoped, &dispatcher, &ctx),
    })
}
