//! HTML/JSON parsing infrastructure for merger case extraction
//!
//! Listing and detail parsers share a contextual parser trait. Detail fields
//! that appear in more than one known layout are extracted through ordered
//! strategy lists: each strategy either produces a result or reports that its
//! layout is not present.

pub mod case_detail_parser;
pub mod case_details_strategies;
pub mod case_list_parser;
pub mod config;
pub mod context;
pub mod text;
pub mod updates_strategies;

pub use super::parsing_error::{ParsingError, ParsingResult};
pub use case_detail_parser::CaseDetailParser;
pub use case_list_parser::CaseListParser;
pub use config::{CaseDetailSelectors, CaseListSelectors, ParsingConfig};
pub use context::{DetailParseContext, ListingParseContext};

use scraper::Html;
use std::collections::BTreeMap;

use crate::domain::CaseUpdates;

/// Parser that turns raw content into `Output` with contextual information
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(
        &self,
        content: &str,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output>;
}

/// Everything a detail-page strategy may inspect
pub struct DetailSource<'a> {
    /// Raw page text, before entity decoding
    pub raw: &'a str,
    pub html: &'a Html,
    pub context: &'a DetailParseContext,
}

/// One known layout for labeled case-detail fields
pub trait CaseDetailsStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when this layout is not present on the page
    fn extract(&self, source: &DetailSource<'_>) -> Option<BTreeMap<String, String>>;
}

/// One known layout for the update timeline
pub trait UpdatesStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when this layout is not present on the page
    fn extract(&self, source: &DetailSource<'_>) -> Option<CaseUpdates>;
}
