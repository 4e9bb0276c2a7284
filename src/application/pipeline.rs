//! Two-stage crawl orchestration
//!
//! The listing is fetched once; every summary then gets its own detail task,
//! bounded by a semaphore. Results land in a buffer keyed by listing index so
//! the artifact keeps listing order regardless of completion order.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::detail_service::{DebugOptions, DetailService};
use super::error::PipelineResult;
use super::listing_service::ListingService;
use crate::domain::{CaseDetail, CaseSummary, EnrichedCase};
use crate::infrastructure::{AppConfig, PageFetcher, ParsingConfig, read_listing, write_json_atomic};

/// Everything one run needs besides the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub listing_url: String,
    pub json_api: bool,
    /// Maximum in-flight detail fetches, clamped to what a semaphore can hold
    pub detail_max_concurrent: usize,
    pub listing_path: PathBuf,
    pub detailed_path: PathBuf,
    pub debug: DebugOptions,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            listing_url: config.source.listing_url.clone(),
            json_api: config.source.json_api,
            detail_max_concurrent: config.crawling.detail_max_concurrent,
            listing_path: config.source.listing_path.clone(),
            detailed_path: config.source.detailed_path.clone(),
            debug: DebugOptions {
                dump_dir: config.crawling.dump_dir.clone(),
                dump_first_detail: config.crawling.dump_first_detail,
            },
        }
    }
}

/// Permits for the detail worker pool; at least one, at most `Semaphore::MAX_PERMITS`
fn worker_permits(configured: usize) -> usize {
    configured.clamp(1, Semaphore::MAX_PERMITS)
}

/// Summary of a completed stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub artifact: PathBuf,
    pub cases: usize,
    /// Cases whose details degraded to the empty value
    pub degraded: usize,
}

pub struct CasePipeline<F: PageFetcher + 'static> {
    listing: ListingService<F>,
    details: Arc<DetailService<F>>,
    options: PipelineOptions,
}

impl<F: PageFetcher + 'static> CasePipeline<F> {
    pub fn new(
        fetcher: Arc<F>,
        parsing: &ParsingConfig,
        options: PipelineOptions,
    ) -> PipelineResult<Self> {
        let listing = ListingService::new(
            Arc::clone(&fetcher),
            &parsing.case_list_selectors,
            options.json_api,
        )?;
        let details =
            DetailService::new(fetcher, &parsing.case_detail_selectors, options.debug.clone())?;

        Ok(Self {
            listing,
            details: Arc::new(details),
            options,
        })
    }

    /// Listing stage only: write the sorted summaries
    pub async fn run_listing(&self) -> PipelineResult<RunReport> {
        let cases = self.listing.collect(&self.options.listing_url).await?;
        write_json_atomic(&self.options.listing_path, &cases)?;

        Ok(RunReport {
            artifact: self.options.listing_path.clone(),
            cases: cases.len(),
            degraded: 0,
        })
    }

    /// Detail stage only, reading the listing artifact of an earlier run.
    ///
    /// An empty or malformed listing is fatal and leaves the detailed artifact untouched.
    pub async fn run_details(&self) -> PipelineResult<RunReport> {
        let cases = read_listing(&self.options.listing_path)?;
        info!("Read {} cases from {}", cases.len(), self.options.listing_path.display());
        self.write_enriched(cases).await
    }

    /// Both stages, writing both artifacts
    pub async fn run_full(&self) -> PipelineResult<RunReport> {
        let cases = self.listing.collect(&self.options.listing_url).await?;
        write_json_atomic(&self.options.listing_path, &cases)?;
        self.write_enriched(cases).await
    }

    async fn write_enriched(&self, cases: Vec<CaseSummary>) -> PipelineResult<RunReport> {
        let (enriched, degraded) = self.enrich(cases).await;
        write_json_atomic(&self.options.detailed_path, &enriched)?;

        Ok(RunReport {
            artifact: self.options.detailed_path.clone(),
            cases: enriched.len(),
            degraded,
        })
    }

    /// Attach details to every summary, in listing order.
    ///
    /// Returns the enriched cases and how many of them degraded.
    pub async fn enrich(&self, cases: Vec<CaseSummary>) -> (Vec<EnrichedCase>, usize) {
        let concurrency = worker_permits(self.options.detail_max_concurrent);
        info!("Fetching details for {} cases ({} concurrent)", cases.len(), concurrency);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let tasks: Vec<_> = cases
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, summary)| {
                let semaphore = Arc::clone(&semaphore);
                let details = Arc::clone(&self.details);

                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        warn!("Detail worker pool closed before {}", summary.link);
                        return (index, CaseDetail::empty(), true);
                    };
                    let (detail, degraded) = details.detail_or_empty(index, &summary).await;
                    (index, detail, degraded)
                })
            })
            .collect();

        let mut slots: Vec<Option<CaseDetail>> = vec![None; cases.len()];
        let mut degraded = 0;

        for result in join_all(tasks).await {
            match result {
                Ok((index, detail, was_degraded)) => {
                    debug_assert!(slots[index].is_none(), "slot {index} written twice");
                    slots[index] = Some(detail);
                    degraded += usize::from(was_degraded);
                }
                Err(e) => warn!("Detail task failed: {}", e),
            }
        }

        let enriched: Vec<EnrichedCase> = cases
            .into_iter()
            .zip(slots)
            .map(|(summary, slot)| {
                let detail = slot.unwrap_or_else(|| {
                    warn!("No details recorded for {}", summary.link);
                    degraded += 1;
                    CaseDetail::empty()
                });
                EnrichedCase::new(summary, detail)
            })
            .collect();

        if degraded > 0 {
            warn!("{} of {} cases have empty details", degraded, enriched.len());
        }
        (enriched, degraded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_permits_are_clamped() {
        assert_eq!(worker_permits(0), 1);
        assert_eq!(worker_permits(8), 8);
        assert_eq!(worker_permits(usize::MAX), Semaphore::MAX_PERMITS);
    }
}
