use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::period::PeriodFilter;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    #[serde(default)]
    pub taxonomy: Taxonomy,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub include: IncludeConfig,
    /// Restrict dissemination-means matching to social-media executions.
    #[serde(default)]
    pub social_media_only: bool,
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// Recognized values per category. Anything outside these lists is an "other" value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    pub regions: Vec<String>,
    pub classifications: Vec<String>,
    pub threats: Vec<String>,
    pub programs: Vec<String>,
    pub audiences: Vec<String>,
    pub dissemination_means: Vec<String>,
    pub hpem_phases: Vec<String>,
    /// Dissemination methods that mark an execution as social media.
    pub social_media_methods: Vec<String>,
    /// Quarter tags in quarter order (index 0 = Q1).
    pub quarter_labels: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            regions: strings(&[
                "JSOC", "SOCAF", "SOCCENT", "SOCEUR", "SOCKOR", "SOCNORTH", "SOCPAC", "SOCSOUTH",
            ]),
            classifications: strings(&["UNCLASS", "S//NF", "S//REL FVEY", "OTHER"]),
            threats: strings(&["NDS-DPRK", "NDS-IRAN/ITN", "NDS-PRC", "NDS-RUS", "NDS-VEO", "Other"]),
            programs: strings(&["CTWMP", "DACMP", "Other"]),
            audiences: strings(&[
                "Citizens",
                "Decision Makers",
                "Defense Personnel",
                "Influencers",
                "Social Media Users",
            ]),
            dissemination_means: strings(&[
                "Internet",
                "Phone",
                "Physical Event",
                "Physical Product",
                "Radio",
                "Television Products",
                "Other",
            ]),
            hpem_phases: strings(&[
                "Data Not Available",
                "Too Early",
                "Awareness",
                "Understanding",
                "Attitude",
                "Preference",
                "Intention",
                "Behavior Change",
            ]),
            social_media_methods: strings(&["Social Media", "RBR (social media)"]),
            quarter_labels: strings(&["FYQ1", "FYQ2", "FYQ3", "FYQ4"]),
        }
    }
}

impl Taxonomy {
    pub fn is_region(&self, value: &str) -> bool {
        self.regions.iter().any(|r| r == value)
    }

    /// Resolve a quarter tag to 1..=4.
    ///
    /// Exact match against `quarter_labels` first, then any tag whose last
    /// character is a digit 1-4 ("Q3", "FYQ3", "3").
    pub fn quarter_number(&self, tag: &str) -> Option<u8> {
        let tag = tag.trim();
        if let Some(idx) = self.quarter_labels.iter().position(|q| q == tag) {
            return Some(idx as u8 + 1);
        }
        match tag.chars().last()?.to_digit(10)? {
            d @ 1..=4 => Some(d as u8),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.quarter_labels.len() != 4 {
            return Err(ReportError::ConfigValidation(format!(
                "taxonomy.quarter_labels must list 4 quarters, got {}",
                self.quarter_labels.len()
            )));
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.is_empty() || region.contains(char::is_whitespace) {
                return Err(ReportError::ConfigValidation(format!(
                    "region code '{region}' must be a single non-empty token"
                )));
            }
            if !seen.insert(region.as_str()) {
                return Err(ReportError::ConfigValidation(format!(
                    "duplicate region code '{region}'"
                )));
            }
        }

        let lists = [
            ("classifications", &self.classifications),
            ("threats", &self.threats),
            ("programs", &self.programs),
            ("audiences", &self.audiences),
            ("dissemination_means", &self.dissemination_means),
            ("hpem_phases", &self.hpem_phases),
        ];
        for (name, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(ReportError::ConfigValidation(format!(
                    "taxonomy.{name} contains an empty value"
                )));
            }
        }

        Ok(())
    }
}

/// Values that are requested as report rows: the enumeration minus its catch-all.
pub fn reportable(values: &[String]) -> impl Iterator<Item = &String> {
    values.iter().filter(|v| !v.eq_ignore_ascii_case("other"))
}

// ---------------------------------------------------------------------------
// Filter + include switches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Fiscal years; empty = all.
    #[serde(default)]
    pub years: Vec<u16>,
    /// Quarter tags; empty = all.
    #[serde(default)]
    pub quarters: Vec<String>,
    /// Selected region codes. Drive region rows and scoped variants.
    #[serde(default)]
    pub regions: Vec<String>,
}

impl FilterConfig {
    pub fn period_filter(&self, taxonomy: &Taxonomy) -> Result<PeriodFilter, ReportError> {
        let years: BTreeSet<u16> = self.years.iter().copied().collect();
        let mut quarters = BTreeSet::new();
        for tag in &self.quarters {
            let q = taxonomy
                .quarter_number(tag)
                .ok_or_else(|| ReportError::PeriodParse(tag.clone()))?;
            quarters.insert(q);
        }
        Ok(PeriodFilter { years, quarters })
    }
}

/// One "include category X" switch and its "by region" companion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Toggle {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub by_region: bool,
}

impl Toggle {
    pub fn on() -> Self {
        Self { enabled: true, by_region: false }
    }

    pub fn with_regions() -> Self {
        Self { enabled: true, by_region: true }
    }

    /// Scoped variants only make sense when the category itself is included.
    pub fn scoped(&self) -> bool {
        self.enabled && self.by_region
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeConfig {
    #[serde(default)]
    pub support: Toggle,
    #[serde(default)]
    pub no_support: Toggle,
    #[serde(default)]
    pub classification: Toggle,
    #[serde(default)]
    pub threat: Toggle,
    #[serde(default)]
    pub program: Toggle,
    #[serde(default)]
    pub audience: Toggle,
    #[serde(default)]
    pub means: Toggle,
    #[serde(default)]
    pub hpem: Toggle,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReportError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        self.taxonomy.validate()?;

        for region in &self.filter.regions {
            if !self.taxonomy.is_region(region) {
                return Err(ReportError::ConfigValidation(format!(
                    "filter region '{region}' is not a configured region code"
                )));
            }
        }

        // Surfaces unknown quarter tags
        self.filter.period_filter(&self.taxonomy)?;

        Ok(())
    }

    pub fn period_filter(&self) -> Result<PeriodFilter, ReportError> {
        self.filter.period_filter(&self.taxonomy)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
