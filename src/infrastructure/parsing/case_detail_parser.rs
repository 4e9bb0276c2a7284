//! Case detail page parser
//!
//! Produces a `CaseDetail` from one case page: the description block, the
//! labeled case-detail fields and the update timeline. Field and timeline
//! layouts are resolved through ordered strategy lists; a missing layout
//! yields an empty value rather than an error.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::case_details_strategies::default_case_details_strategies;
use super::config::CaseDetailSelectors;
use super::context::DetailParseContext;
use super::text::{compile_selectors, element_text, select_first_matching};
use super::updates_strategies::default_updates_strategies;
use super::{
    CaseDetailsStrategy, ContextualParser, DetailSource, ParsingError, ParsingResult,
    UpdatesStrategy,
};
use crate::domain::CaseDetail;

const PARAGRAPH_SELECTOR: &str = "p, li, h2, h3, h4";

/// Parser for a single case detail page
pub struct CaseDetailParser {
    description_selectors: Vec<Selector>,
    paragraph_selector: Selector,
    case_details_strategies: Vec<Box<dyn CaseDetailsStrategy>>,
    updates_strategies: Vec<Box<dyn UpdatesStrategy>>,
}

impl CaseDetailParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&CaseDetailSelectors::default())
    }

    pub fn with_config(selectors: &CaseDetailSelectors) -> ParsingResult<Self> {
        let paragraph_selector =
            Selector::parse(PARAGRAPH_SELECTOR).map_err(|e| ParsingError::InvalidSelector {
                selector: PARAGRAPH_SELECTOR.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            description_selectors: compile_selectors(&selectors.description)?,
            paragraph_selector,
            case_details_strategies: default_case_details_strategies(selectors)?,
            updates_strategies: default_updates_strategies(selectors)?,
        })
    }

    fn extract_description(&self, html: &Html) -> String {
        let Some(block) = select_first_matching(html.root_element(), &self.description_selectors)
            .into_iter()
            .next()
        else {
            return String::new();
        };

        let paragraphs: Vec<String> = block
            .select(&self.paragraph_selector)
            .filter(|element| !self.nested_in_paragraph(element, &block))
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty())
            .collect();

        if paragraphs.is_empty() {
            element_text(&block)
        } else {
            paragraphs.join("\n")
        }
    }

    /// Whether a paragraph-level element sits inside another one within `block`
    fn nested_in_paragraph(&self, element: &ElementRef<'_>, block: &ElementRef<'_>) -> bool {
        element
            .ancestors()
            .take_while(|node| node.id() != block.id())
            .filter_map(ElementRef::wrap)
            .any(|ancestor| self.paragraph_selector.matches(&ancestor))
    }
}

impl ContextualParser for CaseDetailParser {
    type Output = CaseDetail;
    type Context = DetailParseContext;

    fn parse_with_context(
        &self,
        content: &str,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output> {
        let html = Html::parse_document(content);
        let source = DetailSource {
            raw: content,
            html: &html,
            context,
        };

        let description = self.extract_description(&html);

        let case_details = self
            .case_details_strategies
            .iter()
            .find_map(|strategy| {
                let fields = strategy.extract(&source)?;
                debug!("case_details for {} via {}", context.url, strategy.name());
                Some(fields)
            })
            .unwrap_or_default();

        let updates = self
            .updates_strategies
            .iter()
            .find_map(|strategy| {
                let updates = strategy.extract(&source)?;
                debug!("updates for {} via {}", context.url, strategy.name());
                Some(updates)
            })
            .unwrap_or_default();

        let detail = CaseDetail {
            description,
            case_details,
            updates,
        };

        validate_detail(&detail, context)?;
        Ok(detail)
    }
}

/// Serialize and re-parse the assembled detail before it is attached
fn validate_detail(detail: &CaseDetail, context: &DetailParseContext) -> ParsingResult<()> {
    let invalid = |reason: String| ParsingError::InvalidDetailOutput {
        url: context.url.clone(),
        reason,
    };

    let serialized = serde_json::to_string(detail).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str::<serde_json::Value>(&serialized).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaseUpdates;

    const URL: &str = "https://example.org/cases/alpha-beta";

    fn parse(body: &str) -> CaseDetail {
        let parser = CaseDetailParser::new().unwrap();
        let context = DetailParseContext::new(URL).unwrap();
        parser.parse_with_context(body, &context).unwrap()
    }

    const FULL_PAGE: &str = r#"<html><body><main>
        <div class="case-description">
          <p>The CMA is   investigating
             the anticipated acquisition.</p>
          <ul><li>Phase 1 opened</li><li><p>Nested paragraph</p></li></ul>
        </div>
        <dl class="case-details">
          <dt>Case type:</dt><dd>Mergers</dd>
          <dt>Market sector</dt><dd>Retail</dd><dd>Wholesale</dd>
        </dl>
        <ol>
          <li class="case-update">
            <span class="update-date">2 June 2025</span>
            <span class="update-title">Phase 1 decision</span>
            <a href="/media/decision.pdf">Decision</a>
          </li>
        </ol>
    </main></body></html>"#;

    #[test]
    fn test_full_page() {
        let detail = parse(FULL_PAGE);

        assert_eq!(
            detail.description,
            "The CMA is investigating the anticipated acquisition.\nPhase 1 opened\nNested paragraph"
        );
        assert_eq!(detail.case_details.get("case_type").map(String::as_str), Some("Mergers"));
        assert_eq!(
            detail.case_details.get("market_sector").map(String::as_str),
            Some("Retail\nWholesale")
        );

        let CaseUpdates::Events(events) = &detail.updates else {
            panic!("expected repeated-node updates");
        };
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].document_link.as_deref(),
            Some("https://example.org/media/decision.pdf")
        );
    }

    #[test]
    fn test_description_without_paragraphs_uses_block_text() {
        let detail = parse(r#"<div class="case-description">  Plain   text only </div>"#);
        assert_eq!(detail.description, "Plain text only");
    }

    #[test]
    fn test_page_without_known_layouts_is_empty() {
        let detail = parse("<html><body><h1>Nothing here</h1></body></html>");
        assert!(detail.is_empty());
        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            serde_json::json!({"description": "", "case_details": {}, "updates": []})
        );
    }

    #[test]
    fn test_flat_records_used_when_no_definition_list() {
        let detail = parse(
            r#"<div class="case-detail-record">
                 <span class="record__title">Date Closed :</span>
                 <span class="record__value">3 March 2025</span>
               </div>"#,
        );
        assert_eq!(
            detail.case_details.get("date_closed").map(String::as_str),
            Some("3 March 2025")
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = serde_json::to_string(&parse(FULL_PAGE)).unwrap();
        let second = serde_json::to_string(&parse(FULL_PAGE)).unwrap();
        assert_eq!(first, second);
    }
}
