use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate region, bad quarter labels, etc.).
    ConfigValidation(String),
    /// Snapshot JSON could not be parsed.
    SnapshotParse(String),
    /// A (year, quarter) pair outside the representable range.
    InvalidPeriod { year: u32, quarter: u32 },
    /// A period or quarter string that does not parse.
    PeriodParse(String),
    /// Encoded multi-valued field that cannot be decoded.
    MalformedField { field: String, value: String },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SnapshotParse(msg) => write!(f, "snapshot parse error: {msg}"),
            Self::InvalidPeriod { year, quarter } => {
                write!(f, "invalid period: fiscal year {year}, quarter {quarter}")
            }
            Self::PeriodParse(value) => write!(f, "cannot parse period '{value}'"),
            Self::MalformedField { field, value } => {
                write!(f, "field '{field}': malformed encoded value '{value}'")
            }
        }
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_period() {
        let err = ReportError::InvalidPeriod { year: 2023, quarter: 5 };
        assert_eq!(err.to_string(), "invalid period: fiscal year 2023, quarter 5");
    }

    #[test]
    fn display_malformed_field() {
        let err = ReportError::MalformedField {
            field: "dissemination_means".into(),
            value: "{Radio".into(),
        };
        assert!(err.to_string().contains("dissemination_means"));
        assert!(err.to_string().contains("{Radio"));
    }
}
