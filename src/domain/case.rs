use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::case_date::{DateParseError, SortKey, canonical_date};

/// One merger case as listed on the regulator's index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub name: String,
    /// Always absolute
    pub link: String,
    pub status: String,
    /// Category tag
    pub tag: String,
    pub outcome: Option<String>,
    /// Human-formatted closing date, e.g. "17 October 2025"
    pub date: Option<String>,
}

impl CaseSummary {
    /// Derive the transient ordering key; fails when the date is present but malformed
    pub fn sort_key(&self) -> Result<SortKey, DateParseError> {
        Ok(SortKey {
            canonical_date: canonical_date(self.date.as_deref())?,
            name: self.name.clone(),
        })
    }
}

/// A single timeline entry scraped from repeated update nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseUpdate {
    pub date: String,
    pub title: String,
    pub document_link: Option<String>,
    pub document_title: Option<String>,
}

/// Timeline of a case, in whichever shape the source provided it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseUpdates {
    Events(Vec<CaseUpdate>),
    /// Objects taken verbatim from an embedded `timeline` payload
    Timeline(Vec<serde_json::Value>),
}

impl CaseUpdates {
    pub fn len(&self) -> usize {
        match self {
            Self::Events(events) => events.len(),
            Self::Timeline(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CaseUpdates {
    fn default() -> Self {
        Self::Events(Vec::new())
    }
}

/// Extended information scraped from a case's detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub description: String,
    /// Normalized label -> value
    pub case_details: BTreeMap<String, String>,
    pub updates: CaseUpdates,
}

impl CaseDetail {
    /// The degraded value attached when a case's detail page cannot be used
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.case_details.is_empty() && self.updates.is_empty()
    }
}

/// Unit of the detailed artifact: the listing fields plus `details`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCase {
    #[serde(flatten)]
    pub summary: CaseSummary,
    pub details: CaseDetail,
}

impl EnrichedCase {
    pub fn new(summary: CaseSummary, details: CaseDetail) -> Self {
        Self { summary, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> CaseSummary {
        CaseSummary {
            name: "Alpha / Beta merger inquiry".into(),
            link: "https://example.org/case/42".into(),
            status: "Closed".into(),
            tag: "Mergers".into(),
            outcome: None,
            date: Some("5 January 2024".into()),
        }
    }

    #[test]
    fn test_summary_serializes_listing_keys() {
        let value = serde_json::to_value(summary()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Alpha / Beta merger inquiry",
                "link": "https://example.org/case/42",
                "status": "Closed",
                "tag": "Mergers",
                "outcome": null,
                "date": "5 January 2024"
            })
        );
    }

    #[test]
    fn test_empty_detail_shape() {
        let value = serde_json::to_value(CaseDetail::empty()).unwrap();
        assert_eq!(value, json!({"description": "", "case_details": {}, "updates": []}));
        assert!(CaseDetail::empty().is_empty());
    }

    #[test]
    fn test_enriched_case_flattens_summary() {
        let enriched = EnrichedCase::new(summary(), CaseDetail::empty());
        let text = serde_json::to_string(&enriched).unwrap();
        assert!(text.starts_with(r#"{"name":"Alpha / Beta merger inquiry","link":"#));
        assert!(text.ends_with(r#""details":{"description":"","case_details":{},"updates":[]}}"#));

        let back: EnrichedCase = serde_json::from_str(&text).unwrap();
        assert_eq!(back, enriched);
    }

    #[test]
    fn test_timeline_updates_keep_source_shape() {
        let entry = json!({"date": "2024-01-05", "label": "Phase 1"});
        let updates = CaseUpdates::Timeline(vec![entry.clone()]);
        assert_eq!(serde_json::to_value(&updates).unwrap(), json!([entry]));
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_sort_key_rejects_malformed_date() {
        let mut case = summary();
        case.date = Some("January the fifth".into());
        assert!(case.sort_key().is_err());
    }
}
