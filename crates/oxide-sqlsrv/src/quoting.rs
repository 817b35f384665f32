//! Quoted-identifier mode detection.
//!
//! `@@OPTIONS` is a bitmask of session options; bit 256 is
//! `QUOTED_IDENTIFIER`. When it is on, double quotes delimit
//! identifiers. Otherwise only brackets are safe.

use oxide_sqlsrv_core::{QuotingMode, Row, Value};

/// The diagnostic query run right after connecting.
pub const QUOTED_IDENTIFIER_PROBE: &str =
    "SELECT CASE WHEN (@@OPTIONS | 256) = @@OPTIONS THEN 1 ELSE 0 END AS qi";

/// Column returned by [`QUOTED_IDENTIFIER_PROBE`].
pub const PROBE_COLUMN: &str = "qi";

/// Picks the quoting mode from the probe's first row.
///
/// A missing row (failed query, empty result) selects
/// [`QuotingMode::Bracketed`].
#[must_use]
pub fn mode_from_probe(row: Option<&Row>) -> QuotingMode {
    let quoted = row
        .and_then(|r| r.get(PROBE_COLUMN))
        .is_some_and(Value::is_truthy);
    if quoted {
        QuotingMode::Quoted
    } else {
        QuotingMode::Bracketed
    }
}
