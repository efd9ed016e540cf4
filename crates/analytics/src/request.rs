//! Which rows a report asks for.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::{reportable, IncludeConfig, Taxonomy, Toggle};
use crate::encoding::decode_or_empty;
use crate::label::{CategoryKind, CategoryLabel, IN_SUPPORT, NOT_IN_SUPPORT, SERIES};
use crate::model::Snapshot;

/// User-entered values found outside the configured enumerations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OtherValues {
    pub classification: BTreeSet<String>,
    pub threat: BTreeSet<String>,
    pub program: BTreeSet<String>,
    pub means: BTreeSet<String>,
}

impl OtherValues {
    /// Scan the snapshot for out-of-enumeration values. Empty values are ignored.
    pub fn discover(snapshot: &Snapshot, taxonomy: &Taxonomy) -> Self {
        fn collect<'a>(
            values: impl Iterator<Item = &'a str>,
            known: &[String],
        ) -> BTreeSet<String> {
            values
                .map(str::trim)
                .filter(|v| !v.is_empty() && !known.iter().any(|k| k.as_str() == *v))
                .map(str::to_string)
                .collect()
        }

        let series = &snapshot.series;
        let means = snapshot
            .executions
            .iter()
            .flat_map(|e| decode_or_empty("dissemination_means", &e.dissemination_means))
            .filter(|m| !taxonomy.dissemination_means.contains(m))
            .collect();

        Self {
            classification: collect(
                series.iter().map(|s| s.classification.as_str()),
                &taxonomy.classifications,
            ),
            threat: collect(series.iter().map(|s| s.threat.as_str()), &taxonomy.threats),
            program: collect(series.iter().map(|s| s.program.as_str()), &taxonomy.programs),
            means,
        }
    }

    pub fn for_kind(&self, kind: CategoryKind) -> Option<&BTreeSet<String>> {
        match kind {
            CategoryKind::Classification => Some(&self.classification),
            CategoryKind::Threat => Some(&self.threat),
            CategoryKind::Program => Some(&self.program),
            CategoryKind::DisseminationMeans => Some(&self.means),
            _ => None,
        }
    }
}

/// Category families behind the include switches, in row order.
fn switched_families<'a>(
    include: &IncludeConfig,
    taxonomy: &'a Taxonomy,
) -> Vec<(Toggle, CategoryKind, Vec<&'a str>)> {
    let values = |list: &'a [String]| reportable(list).map(String::as_str).collect::<Vec<_>>();
    vec![
        (include.support, CategoryKind::Support, vec![IN_SUPPORT]),
        (include.no_support, CategoryKind::Support, vec![NOT_IN_SUPPORT]),
        (include.classification, CategoryKind::Classification, values(&taxonomy.classifications)),
        (include.threat, CategoryKind::Threat, values(&taxonomy.threats)),
        (include.program, CategoryKind::Program, values(&taxonomy.programs)),
        (include.audience, CategoryKind::Audience, values(&taxonomy.audiences)),
        (include.means, CategoryKind::DisseminationMeans, values(&taxonomy.dissemination_means)),
        (include.hpem, CategoryKind::HpemPhase, values(&taxonomy.hpem_phases)),
    ]
}

/// Build the ordered row labels for a report.
///
/// Row groups, in order:
/// 1. "Series", each selected region, then the enumerated values of every
///    enabled category;
/// 2. region-scoped variants for categories switched to "by region";
/// 3. discovered "other" values of enabled categories;
/// 4. region-scoped variants of those "other" values.
///
/// Labels built here carry their category kind, so they never depend on
/// dispatch order or on parsing a region suffix. An "other" value that is also
/// a row value of another category renders with its kind, e.g. `Local (threat)`.
pub fn build_labels(
    include: &IncludeConfig,
    regions: &[String],
    taxonomy: &Taxonomy,
    others: &OtherValues,
) -> Vec<CategoryLabel> {
    let families = switched_families(include, taxonomy);

    let mut regular = vec![CategoryLabel::new(SERIES).pinned(CategoryKind::Series)];
    regular.extend(
        regions
            .iter()
            .map(|r| CategoryLabel::new(r.as_str()).pinned(CategoryKind::Region)),
    );

    let mut scoped = Vec::new();
    for (toggle, kind, values) in &families {
        if !toggle.enabled {
            continue;
        }
        for value in values {
            regular.push(CategoryLabel::new(*value).pinned(*kind));
        }
        if toggle.scoped() {
            for value in values {
                for region in regions {
                    scoped.push(CategoryLabel::scoped(*value, region.as_str()).pinned(*kind));
                }
            }
        }
    }

    let other_values: Vec<(Toggle, CategoryKind, &String)> = families
        .iter()
        .filter(|(toggle, _, _)| toggle.enabled)
        .filter_map(|(toggle, kind, _)| others.for_kind(*kind).map(|values| (*toggle, *kind, values)))
        .flat_map(|(toggle, kind, values)| values.iter().map(move |v| (toggle, kind, v)))
        .collect();

    // Categories each unscoped row value appears under
    let mut kinds_by_value: BTreeMap<String, BTreeSet<CategoryKind>> = BTreeMap::new();
    for label in &regular {
        if let Some(kind) = label.kind {
            kinds_by_value.entry(label.base.clone()).or_default().insert(kind);
        }
    }
    for (_, kind, value) in &other_values {
        kinds_by_value.entry((*value).clone()).or_default().insert(*kind);
    }

    let mut other_rows = Vec::new();
    let mut other_scoped = Vec::new();
    for (toggle, kind, value) in other_values {
        let mut label = CategoryLabel::new(value.as_str()).pinned(kind);
        if kinds_by_value.get(value).is_some_and(|kinds| kinds.len() > 1) {
            log::debug!("other value '{value}' is shared across categories; qualifying its {kind} row");
            label = label.qualified();
        }
        if toggle.by_region {
            other_scoped.extend(regions.iter().map(|region| label.in_region(region.as_str())));
        }
        other_rows.push(label);
    }

    regular.extend(scoped);
    regular.extend(other_rows);
    regular.extend(other_scoped);
    regular
}
