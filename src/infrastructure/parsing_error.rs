//! Parsing error types for listing and detail extraction
//!
//! Distinguishes run-aborting structural errors (the listing layout changed)
//! from per-case problems that only degrade one record's details.

use thiserror::Error;

use crate::domain::DateParseError;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Listing source is empty: {url}")]
    EmptySource { url: String },

    #[error("No cases found in listing {url} (tried: {})", tried_layouts.join(", "))]
    NoCasesFound {
        url: String,
        tried_layouts: Vec<String>,
    },

    #[error("Required field '{field}' missing in {context}")]
    RequiredFieldMissing { field: String, context: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Malformed listing JSON: {message}")]
    MalformedJson { message: String },

    #[error(transparent)]
    InvalidDate(#[from] DateParseError),

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },

    #[error("Assembled case detail for {url} is not valid JSON: {reason}")]
    InvalidDetailOutput { url: String, reason: String },
}

impl ParsingError {
    pub fn required_field_missing(field: &str, context: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.to_string(),
        }
    }

    pub fn no_cases_found(url: &str, tried_layouts: Vec<String>) -> Self {
        Self::NoCasesFound {
            url: url.to_string(),
            tried_layouts,
        }
    }

    /// Whether the error only affects one case rather than the whole run
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UrlResolutionFailed { .. } | Self::InvalidDetailOutput { .. } => true,
            Self::EmptySource { .. }
            | Self::NoCasesFound { .. }
            | Self::RequiredFieldMissing { .. }
            | Self::InvalidSelector { .. }
            | Self::MalformedJson { .. }
            | Self::InvalidDate(_) => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
