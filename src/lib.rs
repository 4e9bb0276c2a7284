//! Merger Tracker - regulator merger-case listing and detail crawler
//!
//! Fetches a competition regulator's merger case listing (server-rendered
//! HTML or a JSON API), normalizes and sorts the cases, then enriches each
//! case with the description, labeled fields and timeline from its detail
//! page. Detail failures degrade a single record; they never drop it.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CasePipeline, DebugOptions, PipelineError, PipelineOptions, RunReport};
pub use domain::{CaseDetail, CaseSummary, EnrichedCase};
