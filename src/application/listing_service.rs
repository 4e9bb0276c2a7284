//! Listing stage: fetch the index once and extract sorted summaries

use std::sync::Arc;
use tracing::info;

use super::error::PipelineResult;
use crate::domain::CaseSummary;
use crate::infrastructure::parsing::{CaseListSelectors, ContextualParser, ListingParseContext};
use crate::infrastructure::{CaseListParser, FetchMode, PageFetcher};

pub struct ListingService<F: PageFetcher> {
    fetcher: Arc<F>,
    parser: CaseListParser,
    mode: FetchMode,
}

impl<F: PageFetcher> ListingService<F> {
    pub fn new(
        fetcher: Arc<F>,
        selectors: &CaseListSelectors,
        json_api: bool,
    ) -> PipelineResult<Self> {
        Ok(Self {
            fetcher,
            parser: CaseListParser::with_config(selectors)?,
            mode: if json_api { FetchMode::Json } else { FetchMode::Html },
        })
    }

    /// Fetch and parse the listing; any failure here is fatal for the run
    pub async fn collect(&self, listing_url: &str) -> PipelineResult<Vec<CaseSummary>> {
        let context = ListingParseContext::new(listing_url)?;

        info!("Fetching case listing from {}", listing_url);
        let content = self.fetcher.fetch_text(listing_url, self.mode).await?;

        let cases = self.parser.parse_with_context(&content, &context)?;
        info!("Listing contains {} cases", cases.len());
        Ok(cases)
    }
}
