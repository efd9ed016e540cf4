//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                    |
//! |------|-----------|------------------------------------------------|
//! | 0    | Universal | Success                                        |
//! | 2    | Universal | CLI usage error (bad args)                     |
//! | 3    | report    | Report config unreadable or invalid            |
//! | 4    | report    | Snapshot unreadable or malformed               |
//! | 5    | report    | Output could not be serialized or written      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use seriesboard_analytics::ReportError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Report (3-5)
// =============================================================================

/// Config file missing, unparseable, or failing validation.
pub const EXIT_REPORT_CONFIG: u8 = 3;

/// Snapshot file missing or not a valid snapshot document.
pub const EXIT_REPORT_SNAPSHOT: u8 = 4;

/// JSON/CSV serialization or output file write failed.
pub const EXIT_REPORT_OUTPUT: u8 = 5;

/// Map an engine error to its exit code.
pub fn report_exit_code(err: &ReportError) -> u8 {
    match err {
        ReportError::ConfigParse(_)
        | ReportError::ConfigValidation(_)
        | ReportError::PeriodParse(_) => EXIT_REPORT_CONFIG,
        ReportError::SnapshotParse(_) | ReportError::MalformedField { .. } => EXIT_REPORT_SNAPSHOT,
        ReportError::InvalidPeriod { .. } => EXIT_USAGE,
    }
}
