//! Run-level error types

use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::{FetchError, OutputError, ParsingError};

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Listing file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Listing file {} is not a valid case listing: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Listing extraction failed: {0}")]
    Listing(#[from] ParsingError),

    #[error("Listing fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write output: {0}")]
    Output(OutputError),
}

impl From<OutputError> for PipelineError {
    fn from(error: OutputError) -> Self {
        match error {
            OutputError::MissingInput { path } => Self::MissingInput { path },
            OutputError::InvalidInput { path, reason } => Self::InvalidInput { path, reason },
            other => Self::Output(other),
        }
    }
}

/// Why one case's details were replaced by the empty value
#[derive(Error, Debug)]
pub enum DetailError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParsingError),
}

impl DetailError {
    /// Whether the failure is expected per-case noise rather than a parser defect
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::Parse(e) => e.is_recoverable(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
