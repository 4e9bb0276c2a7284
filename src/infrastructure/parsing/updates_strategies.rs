//! Strategies for the update timeline of a detail page
//!
//! Either repeated update nodes (date, title, optional document link) or an
//! entity-encoded JSON payload embedded in the page carrying a `timeline`
//! array.

use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::CaseDetailSelectors;
use super::context::absolutize;
use super::text::{
    compile_selectors, decode_entities, element_text, first_text, non_empty, select_first_matching,
};
use super::{DetailSource, ParsingError, ParsingResult, UpdatesStrategy};
use crate::domain::{CaseUpdate, CaseUpdates};

/// Double-quoted attribute value whose encoded JSON mentions `timeline`
const ENCODED_TIMELINE_ATTRIBUTE: &str =
    r#"=\s*"([^"]*(?:&#34;|&quot;)timeline(?:&#34;|&quot;)[^"]*)""#;

/// Repeated `.case-update`-style nodes, collected in source order
pub struct RepeatedNodeStrategy {
    update_selectors: Vec<Selector>,
    date_selectors: Vec<Selector>,
    title_selectors: Vec<Selector>,
    document_selectors: Vec<Selector>,
}

impl RepeatedNodeStrategy {
    pub fn new(selectors: &CaseDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            update_selectors: compile_selectors(&selectors.update)?,
            date_selectors: compile_selectors(&selectors.update_date)?,
            title_selectors: compile_selectors(&selectors.update_title)?,
            document_selectors: compile_selectors(&selectors.update_document)?,
        })
    }
}

impl UpdatesStrategy for RepeatedNodeStrategy {
    fn name(&self) -> &'static str {
        "repeated-node"
    }

    fn extract(&self, source: &DetailSource<'_>) -> Option<CaseUpdates> {
        let nodes = select_first_matching(source.html.root_element(), &self.update_selectors);
        if nodes.is_empty() {
            return None;
        }

        let events: Vec<CaseUpdate> = nodes
            .iter()
            .filter_map(|node| {
                let date = first_text(node, &self.date_selectors).unwrap_or_default();
                let title = first_text(node, &self.title_selectors).unwrap_or_default();
                if date.is_empty() && title.is_empty() {
                    return None;
                }

                let document = self.document_selectors.iter().find_map(|selector| {
                    node.select(selector).find_map(|a| {
                        a.value().attr("href").and_then(non_empty).map(|href| (a, href))
                    })
                });

                let (document_link, document_title) = match document {
                    Some((anchor, href)) => (
                        Some(absolutize(&source.context.origin, &href)),
                        non_empty(&element_text(&anchor)),
                    ),
                    None => (None, None),
                };

                Some(CaseUpdate {
                    date,
                    title,
                    document_link,
                    document_title,
                })
            })
            .collect();

        (!events.is_empty()).then_some(CaseUpdates::Events(events))
    }
}

/// `timeline` array inside an HTML-entity-encoded JSON payload
pub struct EmbeddedJsonStrategy {
    attribute_pattern: Regex,
    script_selectors: Vec<Selector>,
}

impl EmbeddedJsonStrategy {
    pub fn new(selectors: &CaseDetailSelectors) -> ParsingResult<Self> {
        let attribute_pattern =
            Regex::new(ENCODED_TIMELINE_ATTRIBUTE).map_err(|e| ParsingError::InvalidSelector {
                selector: ENCODED_TIMELINE_ATTRIBUTE.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            attribute_pattern,
            script_selectors: compile_selectors(&selectors.embedded_json_script)?,
        })
    }

    /// Encoded payloads from attributes, then script bodies that mention a timeline
    fn candidate_payloads(&self, source: &DetailSource<'_>) -> Vec<String> {
        let mut payloads: Vec<String> = self
            .attribute_pattern
            .captures_iter(source.raw)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
            .collect();

        for selector in &self.script_selectors {
            payloads.extend(
                source
                    .html
                    .select(selector)
                    .map(|script| script.text().collect::<String>())
                    .filter(|text| text.contains("timeline")),
            );
        }
        payloads
    }
}

impl UpdatesStrategy for EmbeddedJsonStrategy {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn extract(&self, source: &DetailSource<'_>) -> Option<CaseUpdates> {
        let payloads = self.candidate_payloads(source);
        if payloads.is_empty() {
            return None;
        }

        for payload in &payloads {
            match parse_timeline(payload) {
                Some(items) => {
                    debug!("Decoded {} timeline entries on {}", items.len(), source.context.url);
                    return Some(CaseUpdates::Timeline(items));
                }
                None => debug!(
                    "Embedded payload on {} is not a usable timeline",
                    source.context.url
                ),
            }
        }

        warn!(
            "Could not decode embedded timeline on {}; updates left empty",
            source.context.url
        );
        Some(CaseUpdates::Timeline(Vec::new()))
    }
}

/// Parse a payload as JSON, decoding entities first when the raw text is not JSON
fn parse_timeline(payload: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(payload)
        .or_else(|_| serde_json::from_str(&decode_entities(payload)))
        .ok()?;
    find_timeline(&value).cloned()
}

/// Depth-first search for the first `timeline` array
fn find_timeline(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Object(map) => map
            .get("timeline")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(find_timeline)),
        Value::Array(items) => items.iter().find_map(find_timeline),
        _ => None,
    }
}

/// Updates strategies in priority order
pub fn default_updates_strategies(
    selectors: &CaseDetailSelectors,
) -> ParsingResult<Vec<Box<dyn UpdatesStrategy>>> {
    Ok(vec![
        Box::new(RepeatedNodeStrategy::new(selectors)?),
        Box::new(EmbeddedJsonStrategy::new(selectors)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::DetailParseContext;
    use scraper::Html;
    use serde_json::json;

    fn extract_with(strategy: &dyn UpdatesStrategy, body: &str) -> Option<CaseUpdates> {
        let html = Html::parse_document(body);
        let context = DetailParseContext::new("https://example.org/case/1").unwrap();
        let source = DetailSource { raw: body, html: &html, context: &context };
        strategy.extract(&source)
    }

    #[test]
    fn test_repeated_nodes_in_source_order() {
        let strategy = RepeatedNodeStrategy::new(&CaseDetailSelectors::default()).unwrap();
        let body = r#"<ol>
            <li class="case-update">
              <span class="update-date">1 May 2025</span>
              <span class="update-title">Invitation to comment</span>
              <a href="/media/itc.pdf">Invitation to comment (PDF)</a>
            </li>
            <li class="case-update">
              <span class="update-date">17 October 2025</span>
              <span class="update-title">Phase 1 decision</span>
            </li>
            <li class="case-update"></li>
        </ol>"#;

        let Some(CaseUpdates::Events(events)) = extract_with(&strategy, body) else {
            panic!("expected repeated-node events");
        };
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, "1 May 2025");
        assert_eq!(events[0].title, "Invitation to comment");
        assert_eq!(events[0].document_link.as_deref(), Some("https://example.org/media/itc.pdf"));
        assert_eq!(events[0].document_title.as_deref(), Some("Invitation to comment (PDF)"));
        assert_eq!(events[1].title, "Phase 1 decision");
        assert_eq!(events[1].document_link, None);
        assert_eq!(events[1].document_title, None);
    }

    #[test]
    fn test_repeated_nodes_not_applicable() {
        let strategy = RepeatedNodeStrategy::new(&CaseDetailSelectors::default()).unwrap();
        assert!(extract_with(&strategy, "<p>none</p>").is_none());
    }

    #[test]
    fn test_embedded_attribute_timeline_is_decoded() {
        let strategy = EmbeddedJsonStrategy::new(&CaseDetailSelectors::default()).unwrap();
        let body = r#"<div data-props="{&#34;case&#34;:{&#34;timeline&#34;:[{&#34;date&#34;:&#34;2025-05-01&#34;,&#34;label&#34;:&#34;Merger notice &amp; fee&#34;}]}}"></div>"#;

        let updates = extract_with(&strategy, body).unwrap();
        assert_eq!(
            serde_json::to_value(&updates).unwrap(),
            json!([{"date": "2025-05-01", "label": "Merger notice & fee"}])
        );
    }

    #[test]
    fn test_embedded_script_timeline() {
        let strategy = EmbeddedJsonStrategy::new(&CaseDetailSelectors::default()).unwrap();
        let body =
            r#"<script type="application/json">{"timeline": [{"step": "Phase 1"}]}</script>"#;

        let updates = extract_with(&strategy, body).unwrap();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_undecodable_timeline_degrades_to_empty() {
        let strategy = EmbeddedJsonStrategy::new(&CaseDetailSelectors::default()).unwrap();
        let body = r#"<div data-props="{&#34;timeline&#34;:[{&#34;date&#34;: oops"></div>"#;

        let updates = extract_with(&strategy, body).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn test_no_payload_not_applicable() {
        let strategy = EmbeddedJsonStrategy::new(&CaseDetailSelectors::default()).unwrap();
        assert!(extract_with(&strategy, r#"<div data-props="{}"></div>"#).is_none());
    }
}
