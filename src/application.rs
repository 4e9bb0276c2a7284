//! Application layer: the listing and detail stages and the pipeline that
//! runs them.

pub mod detail_service;
pub mod error;
pub mod listing_service;
pub mod pipeline;

pub use detail_service::{DebugOptions, DetailService};
pub use error::{DetailError, PipelineError, PipelineResult};
pub use listing_service::ListingService;
pub use pipeline::{CasePipeline, PipelineOptions, RunReport};
