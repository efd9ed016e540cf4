//! Category classification of series records.
//!
//! Each category family is a [`Classifier`]. The [`Dispatcher`] holds them in a
//! fixed priority order; an unpinned label value goes to the first classifier
//! that recognizes it. Values nobody recognizes match nothing.
//!
//! Order: Series → region → support flag → classification → threat →
//! program → audience → dissemination means → HPEM phase.

use std::collections::{BTreeSet, HashMap};

use crate::config::Taxonomy;
use crate::encoding::decode_or_empty;
use crate::label::{CategoryKind, CategoryLabel, IN_SUPPORT, NOT_IN_SUPPORT, SERIES};
use crate::model::{AssessmentRecord, ExecutionRecord, SeriesRecord};
use crate::request::OtherValues;

// ---------------------------------------------------------------------------
// Join index
// ---------------------------------------------------------------------------

/// Per-series unions of execution means and assessment phases.
///
/// Records pointing at series that are not in the snapshot are kept but never
/// looked up.
#[derive(Debug, Clone, Default)]
pub struct RelatedIndex {
    means: HashMap<String, BTreeSet<String>>,
    social_means: HashMap<String, BTreeSet<String>>,
    phases: HashMap<String, BTreeSet<String>>,
}

impl RelatedIndex {
    pub fn build(
        executions: &[ExecutionRecord],
        assessments: &[AssessmentRecord],
        taxonomy: &Taxonomy,
    ) -> Self {
        let mut index = RelatedIndex::default();

        for execution in executions {
            let means = decode_or_empty("dissemination_means", &execution.dissemination_means);
            if means.is_empty() {
                continue;
            }
            let methods = decode_or_empty("dissemination_method", &execution.dissemination_method);
            let social = taxonomy
                .social_media_methods
                .iter()
                .any(|marker| methods.contains(marker));

            if social {
                index
                    .social_means
                    .entry(execution.series_id.clone())
                    .or_default()
                    .extend(means.iter().cloned());
            }
            index
                .means
                .entry(execution.series_id.clone())
                .or_default()
                .extend(means);
        }

        for assessment in assessments {
            let phase = assessment.phase.trim();
            if phase.is_empty() {
                continue;
            }
            index
                .phases
                .entry(assessment.series_id.clone())
                .or_default()
                .insert(phase.to_string());
        }

        index
    }

    /// Union of dissemination means across the series' executions.
    pub fn means_for(&self, series_id: &str, social_media_only: bool) -> Option<&BTreeSet<String>> {
        if social_media_only {
            self.social_means.get(series_id)
        } else {
            self.means.get(series_id)
        }
    }

    pub fn phases_for(&self, series_id: &str) -> Option<&BTreeSet<String>> {
        self.phases.get(series_id)
    }
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Everything a classifier may consult besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub taxonomy: &'a Taxonomy,
    pub others: &'a OtherValues,
    pub related: &'a RelatedIndex,
    pub social_media_only: bool,
}

/// How a value was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Member of the configured enumeration (or a sentinel).
    Fixed,
    /// User-entered value outside the enumeration.
    Other,
}

pub trait Classifier: Send + Sync {
    fn kind(&self) -> CategoryKind;

    /// `Some` when `value` belongs to this category.
    fn recognize(&self, value: &str, ctx: &ClassifyContext<'_>) -> Option<Resolution>;

    fn matches(&self, record: &SeriesRecord, value: &str, ctx: &ClassifyContext<'_>) -> bool;
}

struct SeriesSentinel;

impl Classifier for SeriesSentinel {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Series
    }

    fn recognize(&self, value: &str, _ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        (value == SERIES).then_some(Resolution::Fixed)
    }

    fn matches(&self, _record: &SeriesRecord, value: &str, _ctx: &ClassifyContext<'_>) -> bool {
        value == SERIES
    }
}

struct RegionMembership;

impl Classifier for RegionMembership {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Region
    }

    fn recognize(&self, value: &str, ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        ctx.taxonomy.is_region(value).then_some(Resolution::Fixed)
    }

    fn matches(&self, record: &SeriesRecord, value: &str, _ctx: &ClassifyContext<'_>) -> bool {
        record.region.trim() == value
    }
}

struct SupportFlag;

impl Classifier for SupportFlag {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Support
    }

    fn recognize(&self, value: &str, _ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        (value == IN_SUPPORT || value == NOT_IN_SUPPORT).then_some(Resolution::Fixed)
    }

    fn matches(&self, record: &SeriesRecord, value: &str, _ctx: &ClassifyContext<'_>) -> bool {
        match value {
            IN_SUPPORT => record.in_support == Some(true),
            NOT_IN_SUPPORT => record.in_support == Some(false),
            _ => false,
        }
    }
}

/// Scalar attribute compared for equality.
struct FieldClassifier {
    kind: CategoryKind,
    values: fn(&Taxonomy) -> &[String],
    others: Option<fn(&OtherValues) -> &BTreeSet<String>>,
    field: fn(&SeriesRecord) -> &str,
}

impl Classifier for FieldClassifier {
    fn kind(&self) -> CategoryKind {
        self.kind
    }

    fn recognize(&self, value: &str, ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        if (self.values)(ctx.taxonomy).iter().any(|v| v == value) {
            return Some(Resolution::Fixed);
        }
        let others = self.others?;
        others(ctx.others).contains(value).then_some(Resolution::Other)
    }

    fn matches(&self, record: &SeriesRecord, value: &str, _ctx: &ClassifyContext<'_>) -> bool {
        (self.field)(record).trim() == value
    }
}

struct DisseminationMeans;

impl Classifier for DisseminationMeans {
    fn kind(&self) -> CategoryKind {
        CategoryKind::DisseminationMeans
    }

    fn recognize(&self, value: &str, ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        if ctx.taxonomy.dissemination_means.iter().any(|v| v == value) {
            Some(Resolution::Fixed)
        } else if ctx.others.means.contains(value) {
            Some(Resolution::Other)
        } else {
            None
        }
    }

    fn matches(&self, record: &SeriesRecord, value: &str, ctx: &ClassifyContext<'_>) -> bool {
        ctx.related
            .means_for(&record.id, ctx.social_media_only)
            .is_some_and(|means| means.contains(value))
    }
}

struct HpemPhase;

impl Classifier for HpemPhase {
    fn kind(&self) -> CategoryKind {
        CategoryKind::HpemPhase
    }

    fn recognize(&self, value: &str, ctx: &ClassifyContext<'_>) -> Option<Resolution> {
        ctx.taxonomy
            .hpem_phases
            .iter()
            .any(|v| v == value)
            .then_some(Resolution::Fixed)
    }

    fn matches(&self, record: &SeriesRecord, value: &str, ctx: &ClassifyContext<'_>) -> bool {
        ctx.related
            .phases_for(&record.id)
            .is_some_and(|phases| phases.contains(value))
    }
}

fn classifications(t: &Taxonomy) -> &[String] {
    &t.classifications
}

fn threats(t: &Taxonomy) -> &[String] {
    &t.threats
}

fn programs(t: &Taxonomy) -> &[String] {
    &t.programs
}

fn audiences(t: &Taxonomy) -> &[String] {
    &t.audiences
}

fn other_classifications(o: &OtherValues) -> &BTreeSet<String> {
    &o.classification
}

fn other_threats(o: &OtherValues) -> &BTreeSet<String> {
    &o.threat
}

fn other_programs(o: &OtherValues) -> &BTreeSet<String> {
    &o.program
}

fn classification_of(r: &SeriesRecord) -> &str {
    &r.classification
}

fn threat_of(r: &SeriesRecord) -> &str {
    &r.threat
}

fn program_of(r: &SeriesRecord) -> &str {
    &r.program
}

fn audience_of(r: &SeriesRecord) -> &str {
    &r.audience_category
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Classifiers in fixed priority order.
pub struct Dispatcher {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

impl Dispatcher {
    pub fn standard() -> Self {
        let classifiers: Vec<Box<dyn Classifier>> = vec![
            Box::new(SeriesSentinel),
            Box::new(RegionMembership),
            Box::new(SupportFlag),
            Box::new(FieldClassifier {
                kind: CategoryKind::Classification,
                values: classifications,
                others: Some(other_classifications),
                field: classification_of,
            }),
            Box::new(FieldClassifier {
                kind: CategoryKind::Threat,
                values: threats,
                others: Some(other_threats),
                field: threat_of,
            }),
            Box::new(FieldClassifier {
                kind: CategoryKind::Program,
                values: programs,
                others: Some(other_programs),
                field: program_of,
            }),
            Box::new(FieldClassifier {
                kind: CategoryKind::Audience,
                values: audiences,
                others: None,
                field: audience_of,
            }),
            Box::new(DisseminationMeans),
            Box::new(HpemPhase),
        ];
        Self { classifiers }
    }

    /// First classifier that recognizes `value`.
    pub fn resolve(
        &self,
        value: &str,
        ctx: &ClassifyContext<'_>,
    ) -> Option<(&dyn Classifier, Resolution)> {
        self.classifiers
            .iter()
            .find_map(|c| c.recognize(value, ctx).map(|r| (c.as_ref(), r)))
    }

    pub fn classifier(&self, kind: CategoryKind) -> Option<&dyn Classifier> {
        self.classifiers
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| c.as_ref())
    }

    /// Classifier responsible for `label`: the pinned kind, else dispatch order.
    pub fn classifier_for(
        &self,
        label: &CategoryLabel,
        ctx: &ClassifyContext<'_>,
    ) -> Option<&dyn Classifier> {
        match label.kind {
            Some(kind) => self.classifier(kind),
            None => self.resolve(&label.base, ctx).map(|(c, _)| c),
        }
    }

    /// Records from `records` that fall under `label`, in input order.
    pub fn matches<'r, I>(
        &self,
        records: I,
        label: &CategoryLabel,
        ctx: &ClassifyContext<'_>,
    ) -> Vec<&'r SeriesRecord>
    where
        I: IntoIterator<Item = &'r SeriesRecord>,
    {
        let Some(classifier) = self.classifier_for(label, ctx) else {
            log::debug!("label '{label}' not recognized; matching nothing");
            return Vec::new();
        };

        records
            .into_iter()
            .filter(|r| label.region.as_deref().map_or(true, |region| r.region.trim() == region))
            .filter(|r| classifier.matches(r, &label.base, ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(id: &str, region: &str, classification: &str) -> SeriesRecord {
        SeriesRecord {
            id: id.into(),
            name: format!("S{id}"),
            region: region.into(),
            classification: classification.into(),
            threat: "NDS-PRC".into(),
            program: "CTWMP".into(),
            audience_category: "Citizens".into(),
            in_support: None,
            period_membership: Default::default(),
            is_active: true,
        }
    }

    fn execution(series_id: &str, means: &str, method: &str) -> ExecutionRecord {
        ExecutionRecord {
            id: format!("e_{series_id}"),
            series_id: series_id.into(),
            dissemination_means: means.into(),
            dissemination_method: method.into(),
            is_active: true,
        }
    }

    fn assessment(series_id: &str, phase: &str) -> AssessmentRecord {
        AssessmentRecord {
            id: format!("a_{series_id}"),
            series_id: series_id.into(),
            execution_id: None,
            phase: phase.into(),
            is_active: true,
        }
    }

    struct Fixture {
        taxonomy: Taxonomy,
        others: OtherValues,
        related: RelatedIndex,
    }

    impl Fixture {
        fn new(executions: &[ExecutionRecord], assessments: &[AssessmentRecord]) -> Self {
            let taxonomy = Taxonomy::default();
            let related = RelatedIndex::build(executions, assessments, &taxonomy);
            Self {
                taxonomy,
                others: OtherValues::default(),
                related,
            }
        }

        fn ctx(&self, social_media_only: bool) -> ClassifyContext<'_> {
            ClassifyContext {
                taxonomy: &self.taxonomy,
                others: &self.others,
                related: &self.related,
                social_media_only,
            }
        }
    }

    fn ids(records: &[&SeriesRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn series_sentinel_matches_everything() {
        let fx = Fixture::new(&[], &[]);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "SOCAF", "S//NF")];
        let d = Dispatcher::standard();
        let hits = d.matches(&records, &CategoryLabel::new("Series"), &fx.ctx(false));
        assert_eq!(ids(&hits), vec!["1", "2"]);
    }

    #[test]
    fn region_membership() {
        let fx = Fixture::new(&[], &[]);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "SOCAF", "S//NF")];
        let d = Dispatcher::standard();
        let hits = d.matches(&records, &CategoryLabel::new("SOCAF"), &fx.ctx(false));
        assert_eq!(ids(&hits), vec!["2"]);
    }

    #[test]
    fn support_flag_ignores_unrecorded() {
        let fx = Fixture::new(&[], &[]);
        let mut a = series("1", "JSOC", "UNCLASS");
        a.in_support = Some(true);
        let mut b = series("2", "JSOC", "UNCLASS");
        b.in_support = Some(false);
        let c = series("3", "JSOC", "UNCLASS");
        let records = vec![a, b, c];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new(IN_SUPPORT), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new(NOT_IN_SUPPORT), &ctx)), vec!["2"]);
    }

    #[test]
    fn scoped_label_filters_region_first() {
        let fx = Fixture::new(&[], &[]);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "SOCAF", "UNCLASS")];
        let d = Dispatcher::standard();
        let hits = d.matches(&records, &CategoryLabel::scoped("UNCLASS", "SOCAF"), &fx.ctx(false));
        assert_eq!(ids(&hits), vec!["2"]);
    }

    #[test]
    fn unknown_label_matches_nothing() {
        let fx = Fixture::new(&[], &[]);
        let records = vec![series("1", "JSOC", "Foo")];
        let d = Dispatcher::standard();
        assert!(d.matches(&records, &CategoryLabel::new("Foo"), &fx.ctx(false)).is_empty());
    }

    #[test]
    fn other_value_recognized_only_when_supplied() {
        let mut fx = Fixture::new(&[], &[]);
        let records = vec![series("1", "JSOC", "TS//SCI")];
        let d = Dispatcher::standard();
        assert!(d.matches(&records, &CategoryLabel::new("TS//SCI"), &fx.ctx(false)).is_empty());

        fx.others.classification.insert("TS//SCI".into());
        let ctx = fx.ctx(false);
        let (c, resolution) = d.resolve("TS//SCI", &ctx).unwrap();
        assert_eq!(c.kind(), CategoryKind::Classification);
        assert_eq!(resolution, Resolution::Other);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("TS//SCI"), &ctx)), vec!["1"]);
    }

    #[test]
    fn pinned_kind_skips_dispatch() {
        let fx = Fixture::new(&[], &[]);
        // Classification value spelled like a region code
        let records = vec![series("1", "SOCAF", "JSOC")];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert!(d.matches(&records, &CategoryLabel::new("JSOC"), &ctx).is_empty());
        let pinned = CategoryLabel::new("JSOC").pinned(CategoryKind::Classification);
        assert_eq!(ids(&d.matches(&records, &pinned, &ctx)), vec!["1"]);
    }

    #[test]
    fn dispatch_order_prefers_earlier_category() {
        // "Other" is in both the threat and program enumerations; threat wins.
        let fx = Fixture::new(&[], &[]);
        let d = Dispatcher::standard();
        let (c, _) = d.resolve("Other", &fx.ctx(false)).unwrap();
        assert_eq!(c.kind(), CategoryKind::Threat);
    }

    #[test]
    fn means_join_unions_executions() {
        let executions = vec![
            execution("1", "{Internet}", "{AdTech}"),
            execution("1", "{Radio,\"Physical Event\"}", "{Radio}"),
            execution("2", "{Phone}", "{SMS}"),
        ];
        let fx = Fixture::new(&executions, &[]);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "JSOC", "UNCLASS")];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Radio"), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Physical Event"), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Phone"), &ctx)), vec!["2"]);
    }

    #[test]
    fn social_media_only_excludes_other_methods() {
        let executions = vec![
            execution("1", "{Internet}", "{AdTech}"),
            execution("2", "{Internet}", "{\"Social Media\",YouTube}"),
            execution("3", "{Internet}", "{\"RBR (social media)\"}"),
        ];
        let fx = Fixture::new(&executions, &[]);
        let records = vec![
            series("1", "JSOC", "UNCLASS"),
            series("2", "JSOC", "UNCLASS"),
            series("3", "JSOC", "UNCLASS"),
        ];
        let d = Dispatcher::standard();
        let label = CategoryLabel::new("Internet");
        assert_eq!(ids(&d.matches(&records, &label, &fx.ctx(false))), vec!["1", "2", "3"]);
        assert_eq!(ids(&d.matches(&records, &label, &fx.ctx(true))), vec!["2", "3"]);
    }

    #[test]
    fn malformed_means_contribute_nothing() {
        let executions = vec![
            execution("1", "{Internet", "{AdTech}"),
            execution("2", "{Internet}", "{AdTech}"),
        ];
        let fx = Fixture::new(&executions, &[]);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "JSOC", "UNCLASS")];
        let d = Dispatcher::standard();
        let hits = d.matches(&records, &CategoryLabel::new("Internet"), &fx.ctx(false));
        assert_eq!(ids(&hits), vec!["2"]);
    }

    #[test]
    fn hpem_phase_join() {
        let assessments = vec![
            assessment("1", "Awareness"),
            assessment("1", "Attitude"),
            assessment("2", "Too Early"),
            assessment("99", "Awareness"),
        ];
        let fx = Fixture::new(&[], &assessments);
        let records = vec![series("1", "JSOC", "UNCLASS"), series("2", "JSOC", "UNCLASS")];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Awareness"), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Attitude"), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Too Early"), &ctx)), vec!["2"]);
    }

    #[test]
    fn scalar_fields() {
        let fx = Fixture::new(&[], &[]);
        let mut b = series("2", "JSOC", "UNCLASS");
        b.threat = "NDS-RUS".into();
        b.program = "DACMP".into();
        b.audience_category = "Influencers".into();
        let records = vec![series("1", "JSOC", "UNCLASS"), b];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("NDS-RUS"), &ctx)), vec!["2"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("CTWMP"), &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Influencers"), &ctx)), vec!["2"]);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let assessments = vec![assessment("1", " Awareness ")];
        let fx = Fixture::new(&[], &assessments);
        let mut a = series("1", " SOCAF", "UNCLASS ");
        a.threat = "Narcotics ".into();
        let records = vec![a];
        let d = Dispatcher::standard();
        let ctx = fx.ctx(false);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("SOCAF"), &ctx)), vec!["1"]);
        let unclass = CategoryLabel::scoped("UNCLASS", "SOCAF").pinned(CategoryKind::Classification);
        assert_eq!(ids(&d.matches(&records, &unclass, &ctx)), vec!["1"]);
        let narcotics = CategoryLabel::new("Narcotics").pinned(CategoryKind::Threat);
        assert_eq!(ids(&d.matches(&records, &narcotics, &ctx)), vec!["1"]);
        assert_eq!(ids(&d.matches(&records, &CategoryLabel::new("Awareness"), &ctx)), vec!["1"]);
    }
}
