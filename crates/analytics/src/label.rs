//! Report row labels.

use std::fmt;

use serde::Serialize;

use crate::config::Taxonomy;

/// Row label naming "Series".
pub const SERIES: &str = "Series";
pub const IN_SUPPORT: &str = "In Support";
pub const NOT_IN_SUPPORT: &str = "Not In Support";

/// Category family a label value belongs to, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Series,
    Region,
    Support,
    Classification,
    Threat,
    Program,
    Audience,
    DisseminationMeans,
    HpemPhase,
}

impl CategoryKind {
    /// Kinds that accept user-entered "other" values.
    pub fn accepts_other(&self) -> bool {
        matches!(
            self,
            Self::Classification | Self::Threat | Self::Program | Self::DisseminationMeans
        )
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Series => write!(f, "series"),
            Self::Region => write!(f, "region"),
            Self::Support => write!(f, "support"),
            Self::Classification => write!(f, "classification"),
            Self::Threat => write!(f, "threat"),
            Self::Program => write!(f, "program"),
            Self::Audience => write!(f, "audience"),
            Self::DisseminationMeans => write!(f, "dissemination_means"),
            Self::HpemPhase => write!(f, "hpem_phase"),
        }
    }
}

/// A report row: a category value, optionally scoped to one region.
///
/// `kind` pins the category family. Unpinned labels are resolved by the
/// classifier dispatch order. `qualified` renders the pinned kind after the
/// value so rows sharing a value across categories stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryLabel {
    pub base: String,
    pub region: Option<String>,
    pub kind: Option<CategoryKind>,
    pub qualified: bool,
}

impl CategoryLabel {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            region: None,
            kind: None,
            qualified: false,
        }
    }

    pub fn scoped(base: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            region: Some(region.into()),
            kind: None,
            qualified: false,
        }
    }

    pub fn pinned(mut self, kind: CategoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    /// Same value and kind, scoped to `region`.
    pub fn in_region(&self, region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..self.clone()
        }
    }

    /// Parse the single-string form `"<value> <REGION>"`.
    ///
    /// The trailing token is taken as a region only when it is a configured
    /// region code and something precedes it. A bare value that happens to end
    /// in a region code is misread; build labels with [`CategoryLabel::scoped`]
    /// when the value is not known to be safe.
    pub fn parse(text: &str, taxonomy: &Taxonomy) -> Self {
        if let Some((base, last)) = text.rsplit_once(' ') {
            let base = base.trim_end();
            if !base.is_empty() && taxonomy.is_region(last) {
                return Self::scoped(base, last);
            }
        }
        Self::new(text)
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let (true, Some(kind)) = (self.qualified, self.kind) {
            write!(f, " ({kind})")?;
        }
        if let Some(region) = &self.region {
            write!(f, " {region}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scoped_label() {
        let t = Taxonomy::default();
        let label = CategoryLabel::parse("UNCLASS JSOC", &t);
        assert_eq!(label, CategoryLabel::scoped("UNCLASS", "JSOC"));
        assert_eq!(label.to_string(), "UNCLASS JSOC");
    }

    #[test]
    fn parse_multi_word_scoped_label() {
        let t = Taxonomy::default();
        let label = CategoryLabel::parse("S//REL FVEY SOCPAC", &t);
        assert_eq!(label.base, "S//REL FVEY");
        assert_eq!(label.region.as_deref(), Some("SOCPAC"));
    }

    #[test]
    fn parse_bare_labels() {
        let t = Taxonomy::default();
        assert_eq!(CategoryLabel::parse("S//REL FVEY", &t), CategoryLabel::new("S//REL FVEY"));
        // A lone region code is a region-membership label, not a scoped empty value
        assert_eq!(CategoryLabel::parse("JSOC", &t), CategoryLabel::new("JSOC"));
    }

    #[test]
    fn parse_misreads_value_ending_in_region() {
        // Known limitation of the string form; the struct form avoids it.
        let t = Taxonomy::default();
        let parsed = CategoryLabel::parse("Team JSOC", &t);
        assert_eq!(parsed.region.as_deref(), Some("JSOC"));

        let built = CategoryLabel::new("Team JSOC").pinned(CategoryKind::Classification);
        assert_eq!(built.region, None);
        assert_eq!(built.to_string(), "Team JSOC");
    }

    #[test]
    fn other_capable_kinds() {
        assert!(CategoryKind::Threat.accepts_other());
        assert!(CategoryKind::DisseminationMeans.accepts_other());
        assert!(!CategoryKind::Audience.accepts_other());
        assert!(!CategoryKind::HpemPhase.accepts_other());
    }

    #[test]
    fn qualified_label_shows_kind_before_region() {
        let label = CategoryLabel::new("Local").pinned(CategoryKind::Threat).qualified();
        assert_eq!(label.to_string(), "Local (threat)");
        assert_eq!(label.in_region("JSOC").to_string(), "Local (threat) JSOC");
        // Unpinned labels have no kind to show
        assert_eq!(CategoryLabel::new("Local").qualified().to_string(), "Local");
    }
}
