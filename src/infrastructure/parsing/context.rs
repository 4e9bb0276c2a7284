//! Parsing context for listing and detail extraction

use url::Url;

use super::{ParsingError, ParsingResult};

/// Context for parsing one listing response
#[derive(Debug, Clone)]
pub struct ListingParseContext {
    /// URL the listing was fetched from
    pub source_url: String,

    /// `scheme://host[:port]` of the source, used to absolutize links
    pub origin: String,
}

impl ListingParseContext {
    pub fn new(source_url: &str) -> ParsingResult<Self> {
        Ok(Self {
            source_url: source_url.to_string(),
            origin: origin_of(source_url)?,
        })
    }
}

/// Context for parsing one case detail page
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// Case URL being parsed
    pub url: String,

    /// Origin of the case URL, for document links
    pub origin: String,
}

impl DetailParseContext {
    pub fn new(url: &str) -> ParsingResult<Self> {
        Ok(Self {
            url: url.to_string(),
            origin: origin_of(url)?,
        })
    }
}

/// Derive `scheme://host[:port]` from an absolute URL
pub fn origin_of(url: &str) -> ParsingResult<String> {
    let parsed = Url::parse(url).map_err(|e| ParsingError::UrlResolutionFailed {
        url: url.to_string(),
        reason: format!("Invalid source URL: {e}"),
    })?;

    let host = parsed
        .host_str()
        .ok_or_else(|| ParsingError::UrlResolutionFailed {
            url: url.to_string(),
            reason: "Source URL has no host".to_string(),
        })?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Make a link absolute by prefixing the origin to relative paths
pub fn absolutize(origin: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        format!("{scheme}://{rest}")
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}
