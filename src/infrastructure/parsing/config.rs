//! Parsing configuration for HTML extraction
//!
//! Centralized configuration for CSS selectors with ordered fallbacks. Each
//! list is tried front to back and the first selector that matches wins.

use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Main parsing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Listing page selectors
    pub case_list_selectors: CaseListSelectors,

    /// Case detail page selectors
    pub case_detail_selectors: CaseDetailSelectors,
}

/// Selectors for the listing page (one card per case)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseListSelectors {
    /// Card containers - multiple fallbacks
    pub case_container: Vec<String>,

    /// Anchor carrying the case name and link
    pub case_link: Vec<String>,

    pub status: Vec<String>,
    pub tag: Vec<String>,
    pub outcome: Vec<String>,
    pub date: Vec<String>,

    /// "Label: value" metadata items inside a card
    pub metadata_item: Vec<String>,

    /// Card attributes consulted when no selector matches
    pub status_attributes: Vec<String>,
    pub tag_attributes: Vec<String>,
    pub outcome_attributes: Vec<String>,
    pub date_attributes: Vec<String>,

    /// Metadata labels (lowercase, no colon) mapped to each field
    pub status_labels: Vec<String>,
    pub tag_labels: Vec<String>,
    pub outcome_labels: Vec<String>,
    pub date_labels: Vec<String>,
}

impl Default for CaseListSelectors {
    fn default() -> Self {
        Self {
            case_container: strings(&[
                "div.case-card",
                "article.case-card",
                "li.gem-c-document-list__item",
                ".case-listing li",
                "tr.case-row",
            ]),
            case_link: strings(&[
                "a.case-card__link",
                "a.gem-c-document-list__item-title",
                "h3 a",
                "h2 a",
                "a[href]",
            ]),
            status: strings(&[".case-card__status", ".case-status", "[data-field='status']"]),
            tag: strings(&[
                ".case-card__tag",
                ".case-tag",
                ".case-category",
                "[data-field='tag']",
            ]),
            outcome: strings(&[
                ".case-card__outcome",
                ".case-outcome",
                "[data-field='outcome']",
            ]),
            date: strings(&[
                ".case-card__date",
                ".case-date",
                "[data-field='date']",
                "time",
            ]),
            metadata_item: strings(&[
                "li.gem-c-document-list__attribute",
                ".case-card__meta li",
                ".case-meta li",
            ]),
            status_attributes: strings(&["data-status", "data-case-state"]),
            tag_attributes: strings(&["data-tag", "data-category", "data-case-type"]),
            outcome_attributes: strings(&["data-outcome"]),
            date_attributes: strings(&["data-date", "data-date-closed"]),
            status_labels: strings(&["status", "case state"]),
            tag_labels: strings(&["category", "case type", "case category", "tag"]),
            outcome_labels: strings(&["outcome", "outcomes"]),
            date_labels: strings(&["date closed", "closed", "closing date", "date"]),
        }
    }
}

/// Selectors for case detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDetailSelectors {
    /// Prose block holding the case description
    pub description: Vec<String>,

    /// Definition-list layout for labeled fields
    pub definition_list: Vec<String>,

    /// Flat record layout: record node, title child, value child
    pub record: Vec<String>,
    pub record_title: Vec<String>,
    pub record_value: Vec<String>,

    /// Repeated update nodes
    pub update: Vec<String>,
    pub update_date: Vec<String>,
    pub update_title: Vec<String>,
    pub update_document: Vec<String>,

    /// Script blocks that may carry a JSON `timeline` payload
    pub embedded_json_script: Vec<String>,
}

impl Default for CaseDetailSelectors {
    fn default() -> Self {
        Self {
            description: strings(&[
                ".case-description",
                ".govuk-govspeak",
                ".prose",
                "#content .body",
                "main .content",
            ]),
            definition_list: strings(&["dl.case-details", ".case-details dl", "main dl"]),
            record: strings(&[".case-detail-record", ".field-record", ".record"]),
            record_title: strings(&[".record__title", ".field-label", ".title"]),
            record_value: strings(&[".record__value", ".field-value", ".value"]),
            update: strings(&[".case-update", ".timeline__item", "li.update"]),
            update_date: strings(&[".update-date", "time", ".date"]),
            update_title: strings(&[".update-title", "h3", "h4", ".title"]),
            update_document: strings(&["a.update-document", "a[href]"]),
            embedded_json_script: strings(&[
                "script[type='application/json']",
                "script[type='application/ld+json']",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"case_list_selectors": {"case_container": ["div.item"]}}"#;
        let config: ParsingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.case_list_selectors.case_container, vec!["div.item".to_string()]);
        assert_eq!(config.case_list_selectors.case_link, CaseListSelectors::default().case_link);
        assert_eq!(config.case_detail_selectors, CaseDetailSelectors::default());
    }
}
