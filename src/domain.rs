//! Domain module - merger case entities and value objects
//!
//! - `case`: listing summaries, detail records and the enriched output unit
//! - `case_date`: human date parsing and the transient sort key

pub mod case;
pub mod case_date;

pub use case::{CaseDetail, CaseSummary, CaseUpdate, CaseUpdates, EnrichedCase};
pub use case_date::{DateParseError, SortKey};
