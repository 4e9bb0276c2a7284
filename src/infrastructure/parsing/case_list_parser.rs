//! Case listing parser
//!
//! Extracts one `CaseSummary` per case from either a server-rendered listing
//! page (repeated cards) or a JSON API response, then normalizes and sorts
//! the result. A listing that yields no cases is a structural error: the
//! page layout has most likely changed upstream.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use super::config::CaseListSelectors;
use super::context::{ListingParseContext, absolutize};
use super::text::{
    compile_named_selectors, compile_selectors, element_text, first_text, non_empty, normalize_ws,
};
use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::CaseSummary;
use crate::domain::case_date::iso_to_human;

/// Keys under which a JSON API may wrap its case array
const JSON_ARRAY_KEYS: &[&str] = &[
    "Items", "items", "Results", "results", "Data", "data", "Cases", "cases",
];

const JSON_NAME_KEYS: &[&str] = &["Title", "title", "Name", "name"];
const JSON_LINK_KEYS: &[&str] = &["Link", "link", "Url", "url"];
const JSON_STATUS_KEYS: &[&str] = &["Status", "status"];
const JSON_TAG_KEYS: &[&str] = &["CaseCategory", "Category", "category", "tag"];
const JSON_OUTCOME_KEYS: &[&str] = &["Outcomes", "Outcome", "outcomes", "outcome"];
const JSON_DATE_KEYS: &[&str] = &["DateClosed", "dateClosed", "date_closed", "date"];

/// Raw, un-normalized fields of one listing record
#[derive(Debug)]
struct RawCase {
    name: String,
    href: String,
    status: Option<String>,
    tag: Option<String>,
    outcome: Option<String>,
    date: Option<String>,
}

/// A field that may come from a child element, a card attribute, or a metadata label
struct FieldSource {
    selectors: Vec<Selector>,
    attributes: Vec<String>,
    labels: Vec<String>,
}

impl FieldSource {
    fn new(selectors: &[String], attributes: &[String], labels: &[String]) -> ParsingResult<Self> {
        Ok(Self {
            selectors: compile_selectors(selectors)?,
            attributes: attributes.to_vec(),
            labels: labels.iter().map(|l| l.to_lowercase()).collect(),
        })
    }

    fn resolve(&self, card: &ElementRef<'_>, metadata: &[(String, String)]) -> Option<String> {
        first_text(card, &self.selectors)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find_map(|attr| card.value().attr(attr).and_then(non_empty))
            })
            .or_else(|| {
                self.labels.iter().find_map(|label| {
                    metadata
                        .iter()
                        .find(|(key, _)| key == label)
                        .and_then(|(_, value)| non_empty(value))
                })
            })
    }
}

/// Parser for the case listing (HTML cards or JSON API)
pub struct CaseListParser {
    container_selectors: Vec<(String, Selector)>,
    link_selectors: Vec<Selector>,
    metadata_selectors: Vec<Selector>,
    status: FieldSource,
    tag: FieldSource,
    outcome: FieldSource,
    date: FieldSource,
}

impl CaseListParser {
    /// Create a parser with the default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&CaseListSelectors::default())
    }

    /// Create a parser with a custom selector configuration
    pub fn with_config(selectors: &CaseListSelectors) -> ParsingResult<Self> {
        let container_selectors = compile_named_selectors(&selectors.case_container)?;

        Ok(Self {
            container_selectors,
            link_selectors: compile_selectors(&selectors.case_link)?,
            metadata_selectors: compile_selectors(&selectors.metadata_item)?,
            status: FieldSource::new(
                &selectors.status,
                &selectors.status_attributes,
                &selectors.status_labels,
            )?,
            tag: FieldSource::new(
                &selectors.tag,
                &selectors.tag_attributes,
                &selectors.tag_labels,
            )?,
            outcome: FieldSource::new(
                &selectors.outcome,
                &selectors.outcome_attributes,
                &selectors.outcome_labels,
            )?,
            date: FieldSource::new(
                &selectors.date,
                &selectors.date_attributes,
                &selectors.date_labels,
            )?,
        })
    }
}

impl ContextualParser for CaseListParser {
    type Output = Vec<CaseSummary>;
    type Context = ListingParseContext;

    fn parse_with_context(
        &self,
        content: &str,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output> {
        if content.trim().is_empty() {
            return Err(ParsingError::EmptySource {
                url: context.source_url.clone(),
            });
        }

        let raw_cases = if looks_like_json(content) {
            debug!("Listing {} detected as JSON", context.source_url);
            self.extract_from_json(content, context)?
        } else {
            debug!("Listing {} detected as HTML", context.source_url);
            self.extract_from_html(content, context)?
        };

        let cases = raw_cases
            .into_iter()
            .map(|raw| normalize_case(raw, context))
            .collect::<Vec<_>>();

        let sorted = sort_cases(cases)?;
        info!("Extracted {} cases from {}", sorted.len(), context.source_url);
        Ok(sorted)
    }
}

impl CaseListParser {
    fn extract_from_html(
        &self,
        content: &str,
        context: &ListingParseContext,
    ) -> ParsingResult<Vec<RawCase>> {
        let html = Html::parse_document(content);
        let mut tried_layouts = Vec::new();

        for (selector_str, selector) in &self.container_selectors {
            tried_layouts.push(selector_str.clone());

            let cards: Vec<ElementRef> = html.select(selector).collect();
            if cards.is_empty() {
                continue;
            }

            debug!("Found {} case cards using selector '{}'", cards.len(), selector_str);
            return cards
                .iter()
                .enumerate()
                .map(|(index, card)| self.extract_case_from_card(card, index))
                .collect();
        }

        Err(ParsingError::no_cases_found(&context.source_url, tried_layouts))
    }

    fn extract_case_from_card(
        &self,
        card: &ElementRef<'_>,
        index: usize,
    ) -> ParsingResult<RawCase> {
        let card_context = format!("listing card {}", index + 1);

        let (anchor, href) = self
            .link_selectors
            .iter()
            .find_map(|selector| {
                card.select(selector)
                    .find_map(|a| a.value().attr("href").and_then(non_empty).map(|href| (a, href)))
            })
            .ok_or_else(|| ParsingError::required_field_missing("link", &card_context))?;

        let name = element_text(&anchor);
        if name.is_empty() {
            return Err(ParsingError::required_field_missing("name", &card_context));
        }

        let metadata = self.extract_metadata(card);

        Ok(RawCase {
            name,
            href,
            status: self.status.resolve(card, &metadata),
            tag: self.tag.resolve(card, &metadata),
            outcome: self.outcome.resolve(card, &metadata),
            date: self.date.resolve(card, &metadata),
        })
    }

    /// Collect "Label: value" items as (lowercase label, value)
    fn extract_metadata(&self, card: &ElementRef<'_>) -> Vec<(String, String)> {
        self.metadata_selectors
            .iter()
            .flat_map(|selector| card.select(selector))
            .filter_map(|item| {
                let text = element_text(&item);
                let (label, value) = text.split_once(':')?;
                Some((normalize_ws(label).to_lowercase(), value.trim().to_string()))
            })
            .collect()
    }

    fn extract_from_json(
        &self,
        content: &str,
        context: &ListingParseContext,
    ) -> ParsingResult<Vec<RawCase>> {
        let value: Value = serde_json::from_str(content).map_err(|e| ParsingError::MalformedJson {
            message: e.to_string(),
        })?;

        let records = json_records(&value).ok_or_else(|| ParsingError::MalformedJson {
            message: format!(
                "expected an array of cases or an object with one of: {}",
                JSON_ARRAY_KEYS.join(", ")
            ),
        })?;

        if records.is_empty() {
            return Err(ParsingError::no_cases_found(&context.source_url, vec!["json".to_string()]));
        }

        records
            .iter()
            .enumerate()
            .map(|(index, record)| extract_case_from_json(record, index))
            .collect()
    }
}

fn extract_case_from_json(record: &Value, index: usize) -> ParsingResult<RawCase> {
    let record_context = format!("JSON record {}", index + 1);

    if !record.is_object() {
        return Err(ParsingError::MalformedJson {
            message: format!("{record_context} is not an object"),
        });
    }

    let name = json_field(record, JSON_NAME_KEYS)
        .ok_or_else(|| ParsingError::required_field_missing("Title", &record_context))?;
    let href = json_field(record, JSON_LINK_KEYS)
        .ok_or_else(|| ParsingError::required_field_missing("Link", &record_context))?;

    let date = json_field(record, JSON_DATE_KEYS).map(|d| iso_to_human(&d).unwrap_or(d));

    Ok(RawCase {
        name,
        href,
        status: json_field(record, JSON_STATUS_KEYS),
        tag: json_field(record, JSON_TAG_KEYS),
        outcome: json_field(record, JSON_OUTCOME_KEYS),
        date,
    })
}

fn looks_like_json(content: &str) -> bool {
    matches!(content.trim_start().chars().next(), Some('[' | '{'))
}

fn json_records(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => JSON_ARRAY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// First present, non-blank value among `keys`, rendered as text
fn json_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(json_text))
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(json_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn normalize_case(raw: RawCase, context: &ListingParseContext) -> CaseSummary {
    CaseSummary {
        name: normalize_ws(&raw.name),
        link: absolutize(&context.origin, &raw.href),
        status: raw.status.map(|s| s.trim().to_string()).unwrap_or_default(),
        tag: raw.tag.map(|s| s.trim().to_string()).unwrap_or_default(),
        outcome: raw.outcome.as_deref().and_then(non_empty),
        date: raw.date.as_deref().and_then(non_empty),
    }
}

/// Sort by canonical date (missing first) then by name codepoints.
///
/// A present but malformed date aborts the sort.
pub fn sort_cases(cases: Vec<CaseSummary>) -> ParsingResult<Vec<CaseSummary>> {
    let mut keyed = cases
        .into_iter()
        .map(|case| case.sort_key().map(|key| (key, case)))
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed.into_iter().map(|(_, case)| case).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://example.org/cases";

    fn parse(content: &str) -> ParsingResult<Vec<CaseSummary>> {
        let parser = CaseListParser::new().unwrap();
        let context = ListingParseContext::new(SOURCE).unwrap();
        parser.parse_with_context(content, &context)
    }

    fn card(name: &str, href: &str, date: Option<&str>) -> String {
        let date_html = date
            .map(|d| format!(r#"<span class="case-card__date">{d}</span>"#))
            .unwrap_or_default();
        format!(
            r#"<div class="case-card">
                 <h3><a class="case-card__link" href="{href}">{name}</a></h3>
                 <span class="case-card__status">Closed</span>
                 <span class="case-card__tag">Mergers</span>
                 <span class="case-card__outcome">Cleared</span>
                 {date_html}
               </div>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><main>{}</main></body></html>", cards.join("\n"))
    }

    #[test]
    fn test_parser_creation() {
        assert!(CaseListParser::new().is_ok());
    }

    #[test]
    fn test_sort_order_null_first_then_date_then_name() {
        let html = page(&[
            card("Zulu Holdings / Yankee", "/case/5", Some("17 October 2025")),
            card("Bravo / Charlie", "/case/4", Some("5 January 2024")),
            card("Alpha / Delta", "/case/3", Some("5 January 2024")),
            card("Open Inquiry", "/case/2", None),
            card("Echo / Foxtrot", "/case/1", Some("1 March 2023")),
        ]);

        let cases = parse(&html).unwrap();
        let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Open Inquiry",
                "Echo / Foxtrot",
                "Alpha / Delta",
                "Bravo / Charlie",
                "Zulu Holdings / Yankee"
            ]
        );
    }

    #[test]
    fn test_fields_are_cleaned_and_date_preserved() {
        let html = page(&[r#"<div class="case-card">
                <a class="case-card__link" href="/case/42">
                    Alpha   Ltd /
                    Beta plc
                </a>
                <span class="case-card__status">  Closed </span>
                <span class="case-card__tag"> Mergers </span>
                <span class="case-card__outcome">   </span>
                <span class="case-card__date"> 5 January 2024 </span>
            </div>"#
            .to_string()]);

        let cases = parse(&html).unwrap();
        assert_eq!(cases.len(), 1);
        let case = &cases[0];
        assert_eq!(case.name, "Alpha Ltd / Beta plc");
        assert_eq!(case.link, "https://example.org/case/42");
        assert_eq!(case.status, "Closed");
        assert_eq!(case.tag, "Mergers");
        assert_eq!(case.outcome, None);
        assert_eq!(case.date.as_deref(), Some("5 January 2024"));
    }

    #[test]
    fn test_absolute_links_pass_through() {
        let html = page(&[card("Alpha", "https://other.example.com/case/9", None)]);
        let cases = parse(&html).unwrap();
        assert_eq!(cases[0].link, "https://other.example.com/case/9");
    }

    #[test]
    fn test_metadata_labels_and_attributes() {
        let html = r#"<ul>
            <li class="gem-c-document-list__item" data-outcome="Phase 2 referral">
              <a class="gem-c-document-list__item-title" href="/cma-cases/alpha-beta">Alpha / Beta</a>
              <ul>
                <li class="gem-c-document-list__attribute">Case type: Mergers</li>
                <li class="gem-c-document-list__attribute">Case state: Open</li>
              </ul>
            </li>
            <li class="gem-c-document-list__item">
              <a class="gem-c-document-list__item-title" href="/cma-cases/gamma">Gamma</a>
              <ul>
                <li class="gem-c-document-list__attribute">Case type: Mergers</li>
                <li class="gem-c-document-list__attribute">Case state: Closed</li>
                <li class="gem-c-document-list__attribute">Outcome: Cleared</li>
                <li class="gem-c-document-list__attribute">Closed: 17 October 2025</li>
              </ul>
            </li>
        </ul>"#;

        let cases = parse(html).unwrap();
        assert_eq!(cases.len(), 2);

        assert_eq!(cases[0].name, "Alpha / Beta");
        assert_eq!(cases[0].status, "Open");
        assert_eq!(cases[0].tag, "Mergers");
        assert_eq!(cases[0].outcome.as_deref(), Some("Phase 2 referral"));
        assert_eq!(cases[0].date, None);

        assert_eq!(cases[1].link, "https://example.org/cma-cases/gamma");
        assert_eq!(cases[1].outcome.as_deref(), Some("Cleared"));
        assert_eq!(cases[1].date.as_deref(), Some("17 October 2025"));
    }

    #[test]
    fn test_json_api_shape() {
        let json = r#"{"Items": [
            {"Title": "  Alpha   / Beta ", "Link": "/case/1", "Status": "Closed",
             "Outcomes": ["Cleared", "Undertakings accepted"], "DateClosed": "2024-01-05T00:00:00",
             "CaseCategory": "Mergers"},
            {"Title": "Gamma", "Link": "https://example.org/case/2", "Status": "Open",
             "Outcomes": "", "DateClosed": null, "CaseCategory": "Mergers"},
            {"Title": "Delta", "Link": "/case/3", "Status": "Closed",
             "Outcomes": "Prohibited", "DateClosed": "17 October 2025", "CaseCategory": "Mergers"}
        ]}"#;

        let cases = parse(json).unwrap();
        assert_eq!(cases.len(), 3);

        assert_eq!(cases[0].name, "Gamma");
        assert_eq!(cases[0].outcome, None);
        assert_eq!(cases[0].date, None);

        assert_eq!(cases[1].name, "Alpha / Beta");
        assert_eq!(cases[1].link, "https://example.org/case/1");
        assert_eq!(cases[1].outcome.as_deref(), Some("Cleared, Undertakings accepted"));
        assert_eq!(cases[1].date.as_deref(), Some("5 January 2024"));
        assert_eq!(cases[1].tag, "Mergers");

        assert_eq!(cases[2].date.as_deref(), Some("17 October 2025"));
    }

    #[test]
    fn test_top_level_json_array() {
        let cases = parse(r#"[{"Title": "Alpha", "Link": "/a"}]"#).unwrap();
        assert_eq!(cases[0].link, "https://example.org/a");
        assert_eq!(cases[0].status, "");
    }

    #[test]
    fn test_zero_cards_is_structural_error() {
        let err = parse("<html><body><p>Site redesigned</p></body></html>").unwrap_err();
        assert!(matches!(err, ParsingError::NoCasesFound { .. }));
        assert!(!err.is_recoverable());

        let err = parse(r#"{"Items": []}"#).unwrap_err();
        assert!(matches!(err, ParsingError::NoCasesFound { .. }));
    }

    #[test]
    fn test_empty_source_is_error() {
        assert!(matches!(parse("   \n").unwrap_err(), ParsingError::EmptySource { .. }));
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let html = page(&[card("Alpha", "/case/1", Some("Jan 5th, 2024"))]);
        let err = parse(&html).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidDate(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(parse("{not json").unwrap_err(), ParsingError::MalformedJson { .. }));
        assert!(matches!(
            parse(r#"{"Other": 1}"#).unwrap_err(),
            ParsingError::MalformedJson { .. }
        ));
    }

    #[test]
    fn test_card_without_link_is_error() {
        let html = r#"<div class="case-card"><h3>No link here</h3></div>"#;
        let err = parse(html).unwrap_err();
        assert!(matches!(err, ParsingError::RequiredFieldMissing { .. }));
    }
}
