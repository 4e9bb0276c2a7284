//! Detail stage: one case page in, one `CaseDetail` out

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, warn};

use super::error::{DetailError, PipelineResult};
use crate::domain::{CaseDetail, CaseSummary};
use crate::infrastructure::parsing::{CaseDetailSelectors, ContextualParser, DetailParseContext};
use crate::infrastructure::{CaseDetailParser, FetchMode, PageFetcher, ParsingError};

/// Per-run diagnostics for detail pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugOptions {
    /// Directory receiving raw detail pages
    pub dump_dir: Option<PathBuf>,

    /// Dump only the first fetched page instead of every page
    pub dump_first_detail: bool,
}

pub struct DetailService<F: PageFetcher> {
    fetcher: Arc<F>,
    parser: CaseDetailParser,
    debug: DebugOptions,
    first_dumped: AtomicBool,
}

impl<F: PageFetcher> DetailService<F> {
    pub fn new(
        fetcher: Arc<F>,
        selectors: &CaseDetailSelectors,
        debug: DebugOptions,
    ) -> PipelineResult<Self> {
        Ok(Self {
            fetcher,
            parser: CaseDetailParser::with_config(selectors)?,
            debug,
            first_dumped: AtomicBool::new(false),
        })
    }

    /// Fetch and parse one case page
    pub async fn fetch_detail(
        &self,
        index: usize,
        summary: &CaseSummary,
    ) -> Result<CaseDetail, DetailError> {
        let raw = self.fetcher.fetch_text(&summary.link, FetchMode::Html).await?;

        if self.should_dump() {
            self.dump(index, summary, &raw, "html").await;
        }

        match self.parse(&raw, &summary.link) {
            Ok(detail) => {
                debug!(
                    "Parsed {} fields and {} updates for {}",
                    detail.case_details.len(),
                    detail.updates.len(),
                    summary.link
                );
                Ok(detail)
            }
            Err(e) => {
                if self.debug.dump_dir.is_some() {
                    self.dump(index, summary, &raw, "failed.html").await;
                }
                Err(e.into())
            }
        }
    }

    /// Details for one case, degraded to the empty value on any failure
    pub async fn detail_or_empty(&self, index: usize, summary: &CaseSummary) -> (CaseDetail, bool) {
        match self.fetch_detail(index, summary).await {
            Ok(detail) => (detail, false),
            Err(e) if e.is_recoverable() => {
                warn!("Details unavailable for {}: {}", summary.link, e);
                (CaseDetail::empty(), true)
            }
            Err(e) => {
                error!("Detail parser failed on {}: {}", summary.link, e);
                (CaseDetail::empty(), true)
            }
        }
    }

    fn parse(&self, raw: &str, link: &str) -> Result<CaseDetail, ParsingError> {
        let context = DetailParseContext::new(link)?;
        self.parser.parse_with_context(raw, &context)
    }

    fn should_dump(&self) -> bool {
        if self.debug.dump_dir.is_none() {
            return false;
        }
        !self.debug.dump_first_detail || !self.first_dumped.swap(true, Ordering::SeqCst)
    }

    async fn dump(&self, index: usize, summary: &CaseSummary, raw: &str, extension: &str) {
        let Some(dir) = &self.debug.dump_dir else {
            return;
        };

        let path = dir.join(format!("{index:04}-{}.{extension}", dump_slug(&summary.link)));
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Failed to create dump directory {}: {}", dir.display(), e);
            return;
        }
        match tokio::fs::write(&path, raw).await {
            Ok(()) => debug!("Dumped {} to {}", summary.link, path.display()),
            Err(e) => warn!("Failed to dump {} to {}: {}", summary.link, path.display(), e),
        }
    }
}

/// File-name-safe tail of a case link
fn dump_slug(link: &str) -> String {
    let tail = link
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let slug: String = tail
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .take(80)
        .collect();

    if slug.is_empty() { "case".to_string() } else { slug }
}
