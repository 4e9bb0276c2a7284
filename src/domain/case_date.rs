//! Closing-date handling for merger cases
//!
//! Listing pages carry human-formatted dates such as `"17 October 2025"`.
//! The human string is what gets published; the canonical ISO form is derived
//! only to order cases.

use chrono::NaiveDate;
use thiserror::Error;

/// Format used when parsing listing dates (`D MMMM YYYY`)
const HUMAN_PARSE_FORMAT: &str = "%d %B %Y";

/// Format used when rendering a date back into the listing style
const HUMAN_RENDER_FORMAT: &str = "%-d %B %Y";

/// Canonical sortable format
const CANONICAL_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Unrecognised closing date '{text}' (expected 'D MMMM YYYY', e.g. '5 January 2024')")]
    UnrecognisedFormat { text: String },
}

/// Parse a `D MMMM YYYY` date, tolerating surrounding and repeated whitespace.
///
/// The day is unpadded and the month is the full English name with a leading
/// capital; abbreviations and other casings are rejected.
pub fn parse_human_date(text: &str) -> Result<NaiveDate, DateParseError> {
    let unrecognised = || DateParseError::UnrecognisedFormat {
        text: text.to_string(),
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let compact = tokens.join(" ");
    let date =
        NaiveDate::parse_from_str(&compact, HUMAN_PARSE_FORMAT).map_err(|_| unrecognised())?;

    // chrono's month parsing also accepts abbreviations in any case
    if compact != date.format(HUMAN_RENDER_FORMAT).to_string() {
        return Err(unrecognised());
    }
    Ok(date)
}

/// Canonical `YYYY-MM-DD` form of an optional human date.
///
/// Absent or blank input is `Ok(None)`; present but malformed input is an error.
pub fn canonical_date(text: Option<&str>) -> Result<Option<String>, DateParseError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(t) => parse_human_date(t).map(|d| Some(d.format(CANONICAL_FORMAT).to_string())),
    }
}

/// Convert an ISO date (`2025-10-17` or `2025-10-17T00:00:00`) into `17 October 2025`.
///
/// Returns `None` when the text does not start with an ISO calendar date.
pub fn iso_to_human(text: &str) -> Option<String> {
    let head = text.trim().get(..10)?;
    NaiveDate::parse_from_str(head, CANONICAL_FORMAT)
        .ok()
        .map(|d| d.format(HUMAN_RENDER_FORMAT).to_string())
}

/// Ordering key for cases: canonical date (absent first), then name by codepoint
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub canonical_date: Option<String>,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_date_round_trip_keeps_human_form_separate() {
        assert_eq!(
            canonical_date(Some("5 January 2024")).unwrap(),
            Some("2024-01-05".to_string())
        );
    }

    #[rstest]
    #[case("17 October 2025", "2025-10-17")]
    #[case("  1 March 1999 ", "1999-03-01")]
    #[case("31  December   2023", "2023-12-31")]
    fn test_canonical_forms(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical_date(Some(input)).unwrap().as_deref(), Some(expected));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_absent_dates_are_not_errors(#[case] input: Option<&str>) {
        assert_eq!(canonical_date(input).unwrap(), None);
    }

    #[rstest]
    #[case("2024-01-05")]
    #[case("Fifth of January")]
    #[case("32 January 2024")]
    #[case("5 Janvier 2024")]
    #[case("5 Jan 2024")]
    #[case("05 january 2024")]
    #[case("5 JANUARY 2024")]
    #[case("05 January 2024")]
    fn test_malformed_dates_are_errors(#[case] input: &str) {
        let err = canonical_date(Some(input)).unwrap_err();
        assert!(err.to_string().contains(input));
    }

    #[test]
    fn test_iso_to_human() {
        assert_eq!(iso_to_human("2025-10-17").as_deref(), Some("17 October 2025"));
        assert_eq!(iso_to_human("2024-01-05T00:00:00").as_deref(), Some("5 January 2024"));
        assert_eq!(iso_to_human("17 October 2025"), None);
        assert_eq!(iso_to_human("2025"), None);
    }

    #[test]
    fn test_sort_key_orders_missing_dates_first() {
        let open = SortKey { canonical_date: None, name: "Zeta".into() };
        let closed = SortKey { canonical_date: Some("2020-01-01".into()), name: "Alpha".into() };
        assert!(open < closed);

        let a = SortKey { canonical_date: Some("2024-01-05".into()), name: "Alpha".into() };
        let b = SortKey { canonical_date: Some("2024-01-05".into()), name: "Beta".into() };
        assert!(a < b);
    }
}
